// ==========================================
// 表面处理危险品数据引擎 - 数据清洗器
// ==========================================
// 职责: NULL 标准化 / 数值转换 / 内嵌步骤数组解析 / hazard_flags 检查
// 约束: 畸形数据按降级处理（回退或跳过），由调用方决定是否记警告
// ==========================================

use crate::importer::error::{ImportError, ImportResult};

pub struct DataCleaner;

impl DataCleaner {
    /// 标准化 NULL 值（空字符串/空白 → None）
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// program 为空时归一化为 ''
    pub fn normalize_program(&self, value: Option<&str>) -> String {
        self.normalize_null(value).unwrap_or_default()
    }

    /// 解析整数字段，空值返回 None
    ///
    /// Excel 单元格的整数可能以 "3.0" 形式出现，按整数接受
    pub fn parse_i64(&self, value: Option<&str>, field: &str, row: usize) -> ImportResult<Option<i64>> {
        let Some(raw) = self.normalize_null(value) else {
            return Ok(None);
        };
        if let Ok(v) = raw.parse::<i64>() {
            return Ok(Some(v));
        }
        match raw.parse::<f64>() {
            // i64::MAX as f64 实为 2^63，需用开区间
            Ok(f) if f.is_finite() && (f < i64::MIN as f64 || f >= i64::MAX as f64) => {
                Err(ImportError::TypeConversionError {
                    row,
                    field: field.to_string(),
                    message: format!("超出整数范围: {}", raw),
                })
            }
            Ok(f) if f.fract() == 0.0 && f.is_finite() => Ok(Some(f as i64)),
            _ => Err(ImportError::TypeConversionError {
                row,
                field: field.to_string(),
                message: format!("无法解析为整数: {}", raw),
            }),
        }
    }

    /// 解析浮点字段，空值返回 None
    pub fn parse_f64(&self, value: Option<&str>, field: &str, row: usize) -> ImportResult<Option<f64>> {
        let Some(raw) = self.normalize_null(value) else {
            return Ok(None);
        };
        raw.parse::<f64>()
            .map(Some)
            .map_err(|_| ImportError::TypeConversionError {
                row,
                field: field.to_string(),
                message: format!("无法解析为数值: {}", raw),
            })
    }

    /// 解析 seq_id；非数值降级为 0，并返回警告文本
    pub fn parse_seq_id(&self, value: Option<&str>, row: usize) -> (i64, Option<String>) {
        match self.parse_i64(value, "seq_id", row) {
            Ok(Some(v)) => (v, None),
            Ok(None) => (0, Some(format!("行 {}: seq_id 为空，按 0 处理", row))),
            Err(_) => (
                0,
                Some(format!(
                    "行 {}: seq_id 非数值 ({})，按 0 处理",
                    row,
                    value.unwrap_or_default()
                )),
            ),
        }
    }

    /// 解析内嵌步骤数组
    ///
    /// 接受两种形式:
    /// - JSON 字符串数组: ["SFT0001", "SFT0002"]
    /// - 去括号/引号后的逗号列表: [SFT0001, 'SFT0002'] 或 SFT0001,SFT0002
    ///
    /// `[]` 与空字符串视为未提供（返回空列表）
    pub fn parse_embedded_step_list(&self, value: Option<&str>) -> Vec<String> {
        let Some(raw) = self.normalize_null(value) else {
            return Vec::new();
        };

        if let Ok(items) = serde_json::from_str::<Vec<String>>(&raw) {
            return items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        raw.trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// hazard_flags 是否为合法 JSON（空值视为合法）
    pub fn is_well_formed_json(&self, value: Option<&str>) -> bool {
        match self.normalize_null(value) {
            Some(raw) => serde_json::from_str::<serde_json::Value>(&raw).is_ok(),
            None => true,
        }
    }
}

// ==========================================
// 表面处理危险品数据引擎 - 导入 Trait
// ==========================================
// 职责: 定义导入接口（不包含实现）
// ==========================================

use crate::domain::IngestReport;
use crate::importer::error::ImportResult;
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// FinishImporter Trait
// ==========================================
// 用途: 导入编排器主接口
// 实现者: FinishImporterImpl
pub trait FinishImporter {
    /// 按固定依赖顺序导入源目录中的九类文件，随后执行全量校验
    ///
    /// # 返回
    /// - Ok(IngestReport): 单文件失败已收集进报告
    /// - Err: 仅源目录不存在时返回
    fn ingest(&self, source_dir: &Path) -> ImportResult<IngestReport>;
}

/// 解析后的原始数据行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row_number: usize, // 文件中的行号（表头为第 1 行）
    pub values: HashMap<String, String>,
}

impl RawRow {
    /// 取单元格原值（已 trim），列不存在时为 None
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

/// 解析后的表格（表头 + 非空行）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为表头 + 原始行
    ///
    /// # 约束
    /// - 表头与单元格均已 trim，表头首部 BOM 已去除
    /// - 完全空白的行被跳过
    fn parse_table(&self, file_path: &Path) -> ImportResult<RawTable>;
}

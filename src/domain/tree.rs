// ==========================================
// 表面处理危险品数据引擎 - 层级视图模型
// ==========================================
// 层级: finish_code → steps → materials → chemicals → provenance
// 红线: 直接规范 / 表面处理规范 / 步骤规范三层来源分开输出，不得合并
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// FinishCodeLookup - 查询结果（找到 / 未找到）
// ==========================================
// 未找到时返回结构化载荷，不抛错
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FinishCodeLookup<T> {
    Found(T),
    NotFound(FinishCodeNotFound),
}

impl<T> FinishCodeLookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, FinishCodeLookup::Found(_))
    }

    pub fn found(&self) -> Option<&T> {
        match self {
            FinishCodeLookup::Found(value) => Some(value),
            FinishCodeLookup::NotFound(_) => None,
        }
    }

    pub fn not_found(&self) -> Option<&FinishCodeNotFound> {
        match self {
            FinishCodeLookup::Found(_) => None,
            FinishCodeLookup::NotFound(payload) => Some(payload),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishCodeNotFound {
    pub error: String,
    pub finish_code: String,
    pub available_codes: Vec<String>, // 字典序样例
}

// ==========================================
// FinishCodeTree - 单个代码的完整层级
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDescription {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFinishCode {
    pub substrate: CodeDescription,
    pub finish_applied: CodeDescription,
    pub seq_id: i64,
    pub finish_description: Option<String>,
    pub notes: Option<String>,
    pub source_doc: Option<String>,
    pub program: String,
    pub associated_specs: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalNode {
    pub name: String,
    pub cas: Option<String>,
    pub pct_wt_low: Option<f64>,
    pub pct_wt_high: Option<f64>,
    pub hazard_flags: Option<serde_json::Value>, // 解析失败时为 {"error", "raw"}
    pub default_hazard_level: Option<i64>,
    pub composition_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialNode {
    pub base_spec: String,
    pub variant: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub link_note: Option<String>,
    pub chemicals: Vec<ChemicalNode>, // 危险等级降序，名称升序
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepNode {
    pub sft_code: String,
    pub step_order: i64,
    pub parent_group: Option<String>,
    pub description: String,
    pub associated_specs: Option<String>,
    pub associated_specs_list: Vec<String>, // 长度 > 1 即为 OR 备选
    pub source_doc: Option<String>,
    pub last_review: Option<String>,
    pub notes: Option<String>,
    pub materials: Vec<MaterialNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_digests: BTreeMap<String, String>, // 源文件名 → SHA-256
    pub loaded_at: Option<String>,                // 最近一次导入时间
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishCodeTree {
    pub finish_code: String,
    pub parsed: ParsedFinishCode,
    pub direct_specs: Vec<String>,
    pub finish_applied_specs: Vec<String>,
    pub steps: Vec<StepNode>,
    pub provenance: Provenance,
}

// ==========================================
// FinishCodeSummary - 代码清单投影
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishCodeSummary {
    pub code: String,
    pub description: Option<String>,
    pub substrate: String,
    pub finish_applied: String,
    pub seq_id: i64,
    pub source_doc: Option<String>,
    pub program: String,
}

// ==========================================
// 规范交叉引用
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSpecs {
    pub sft_code: String,
    pub step_order: i64,
    pub associated_specs: String,           // 原始分组字符串
    pub associated_specs_list: Vec<String>, // 拆分后的备选列表
    pub description: String,                // 截断展示
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishCodeSpecs {
    pub finish_code: String,
    pub specifications: Vec<String>, // 去重排序
    pub spec_count: usize,
    pub steps_with_specs: Vec<StepSpecs>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecUsage {
    pub spec: String,
    pub sft_codes: Vec<String>,
    pub finish_codes: Vec<String>,
    pub usage_count: usize, // 引用该规范的代码数
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecCatalog {
    pub total_specs: usize,
    pub specifications: Vec<SpecUsage>,
}

// ==========================================
// ChemicalHazardEntry - 按危险等级筛选的化学品
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalHazardEntry {
    pub name: String,
    pub cas: Option<String>,
    pub hazard_flags: Option<serde_json::Value>,
    pub default_hazard_level: Option<i64>,
}

/// 解析 hazard_flags 文本
///
/// 解析失败时降级为 {"error": "Invalid JSON", "raw": 原文}，不抛错
pub fn parse_hazard_flags(raw: Option<&str>) -> Option<serde_json::Value> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => Some(value),
        Err(_) => Some(serde_json::json!({ "error": "Invalid JSON", "raw": raw })),
    }
}

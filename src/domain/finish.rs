// ==========================================
// 表面处理危险品数据引擎 - 源记录领域模型
// ==========================================
// 用途: 导入管道中间产物（文件解析 → 字段映射 → 此结构 → 外键解析 → *Row）
// 生命周期: 仅在导入流程内
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// SubstrateRecord - 基材
// ==========================================
// 自然键: (code, program)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstrateRecord {
    pub code: String,
    pub description: String,
    pub source_doc: Option<String>,
    pub program: String, // 未提供时为 ''，program 划分命名空间

    pub row_number: usize, // 原始文件行号（用于错误定位）
}

// ==========================================
// FinishAppliedRecord - 表面处理
// ==========================================
// 自然键: (code, program)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishAppliedRecord {
    pub code: String,
    pub description: String,
    pub source_doc: Option<String>,
    pub program: String,
    pub associated_specs: Option<String>, // 逗号分隔，OR 备选

    pub row_number: usize,
}

// ==========================================
// FinishCodeRecord - 表面处理代码（源记录）
// ==========================================
// 自然键: (finish_code, program)
// 外键: substrate_code / finish_applied_code 在同一 program 内解析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishCodeRecord {
    pub finish_code: String,
    pub substrate_code: String,
    pub finish_applied_code: String,
    pub seq_id: i64,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub source_doc: Option<String>,
    pub program: String,
    pub associated_specs: Option<String>, // 直接规范（绕过步骤层级）
    pub sft_steps: Option<String>,        // 内嵌步骤数组文本（可选）

    pub row_number: usize,
}

/// 外键解析后的 finish_codes 行
#[derive(Debug, Clone, PartialEq)]
pub struct FinishCodeRow {
    pub code: String,
    pub substrate_id: i64,
    pub finish_applied_id: i64,
    pub seq_id: i64,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub source_doc: Option<String>,
    pub program: String,
    pub associated_specs: Option<String>,
}

// ==========================================
// SftStepRecord - 工序步骤
// ==========================================
// 自然键: sft_code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SftStepRecord {
    pub sft_code: String,
    pub parent_group: Option<String>,
    pub description: String,
    pub associated_specs: Option<String>,
    pub source_doc: Option<String>,
    pub last_review: Option<String>,
    pub notes: Option<String>,

    pub row_number: usize,
}

// ==========================================
// FinishCodeStepRecord - 代码与步骤的关联
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishCodeStepRecord {
    pub finish_code: String,
    pub sft_code: String,
    pub step_order: i64,
    pub program: Option<String>, // None: 源文件未提供 program 列

    pub row_number: usize,
}

/// 外键解析后的 finish_code_steps 行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishCodeStepRow {
    pub finish_code_id: i64,
    pub sft_id: i64,
    pub step_order: i64,
}

// ==========================================
// MaterialRecord - 材料
// ==========================================
// 自然键: (base_spec, variant)，NULL variant 是独立取值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub base_spec: String,
    pub variant: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,

    pub row_number: usize,
}

// ==========================================
// SftMaterialLinkRecord - 步骤与材料的关联
// ==========================================
// 非唯一: 同一步骤可通过不同 note 多次引用同一材料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SftMaterialLinkRecord {
    pub sft_code: String,
    pub base_spec: String,
    pub variant: Option<String>,
    pub note: Option<String>,

    pub row_number: usize,
}

/// 外键解析后的 sft_material_links 行
#[derive(Debug, Clone, PartialEq)]
pub struct SftMaterialLinkRow {
    pub sft_id: i64,
    pub material_id: i64,
    pub note: Option<String>,
}

// ==========================================
// ChemicalRecord - 化学品
// ==========================================
// 自然键: cas（存在时全局唯一）；无 CAS 时按 name 对齐
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalRecord {
    pub name: String,
    pub cas: Option<String>,
    pub hazard_flags: Option<String>, // JSON 文本，原样落库
    pub default_hazard_level: Option<i64>,

    pub row_number: usize,
}

// ==========================================
// MaterialChemicalRecord - 材料成分
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialChemicalRecord {
    pub base_spec: String,
    pub variant: Option<String>,
    pub chemical_name: Option<String>, // 仅用于可读性，关联以 cas 为准
    pub cas: String,
    pub pct_wt_low: Option<f64>,
    pub pct_wt_high: Option<f64>,
    pub notes: Option<String>,

    pub row_number: usize,
}

/// 外键解析后的 material_chemicals 行
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialChemicalRow {
    pub material_id: i64,
    pub chemical_id: i64,
    pub pct_wt_low: Option<f64>,
    pub pct_wt_high: Option<f64>,
    pub notes: Option<String>,
}

/// 拆分逗号分隔的规范字段
///
/// 字段语义为 OR 备选（任选其一），不是并列要求；
/// 拆分后保持原顺序，去除空白项。
///
/// # 示例
/// - "A, B" → ["A", "B"]
/// - "A" → ["A"]
/// - "" / None → []
pub fn split_spec_alternatives(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

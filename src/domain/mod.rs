// ==========================================
// 表面处理危险品数据引擎 - 领域模型层
// ==========================================
// 职责: 定义源记录、报告、层级视图等领域结构
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod finish;
pub mod report;
pub mod tree;
pub mod types;

// 重导出核心类型
pub use finish::{
    split_spec_alternatives, ChemicalRecord, FinishAppliedRecord, FinishCodeRecord, FinishCodeRow,
    FinishCodeStepRecord, FinishCodeStepRow, MaterialChemicalRecord, MaterialChemicalRow,
    MaterialRecord, SftMaterialLinkRecord, SftMaterialLinkRow, SftStepRecord, SubstrateRecord,
};
pub use report::{
    DriftEntry, IngestIssue, IngestReport, LoadedFile, ValidationIssue, ValidationReport,
};
pub use tree::{
    ChemicalHazardEntry, ChemicalNode, CodeDescription, FinishCodeLookup, FinishCodeNotFound,
    FinishCodeSpecs, FinishCodeSummary, FinishCodeTree, MaterialNode, ParsedFinishCode,
    Provenance, SpecCatalog, SpecUsage, StepNode, StepSpecs,
};
pub use types::{DriftState, IngestStatus, IssueCategory, Severity, ValidationStatus};

// ==========================================
// 表面处理危险品数据引擎 - 领域类型定义
// ==========================================
// 职责: 报告中的状态/等级枚举
// 序列化格式: snake_case（与输出 JSON 一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 问题等级 (Severity)
// ==========================================
// 红线: error 计入失败判定，warning 仅提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

// ==========================================
// 校验问题类别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    ReferentialIntegrity, // 外键完整性
    Completeness,         // 必填字段
    Format,               // 格式/取值范围
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueCategory::ReferentialIntegrity => write!(f, "referential_integrity"),
            IssueCategory::Completeness => write!(f, "completeness"),
            IssueCategory::Format => write!(f, "format"),
        }
    }
}

// ==========================================
// 校验总体状态
// ==========================================
// 优先级: errors > warnings > pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Pass,
    Warnings,
    Errors,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Pass => write!(f, "pass"),
            ValidationStatus::Warnings => write!(f, "warnings"),
            ValidationStatus::Errors => write!(f, "errors"),
        }
    }
}

// ==========================================
// 导入总体状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    Success,             // 全部文件成功，校验通过
    SuccessWithWarnings, // 全部文件成功，校验仅有警告
    Partial,             // 部分文件失败，校验无错误
    Failed,              // 全部文件失败，或校验存在错误
}

impl IngestStatus {
    /// 由文件失败数与校验状态派生导入状态
    ///
    /// # 规则
    /// 1. 全部文件失败 → Failed
    /// 2. 校验存在错误 → Failed
    /// 3. 部分文件失败 → Partial
    /// 4. 校验仅有警告 → SuccessWithWarnings
    /// 5. 其他 → Success
    pub fn derive(failed_files: usize, total_files: usize, validation: ValidationStatus) -> Self {
        if total_files > 0 && failed_files == total_files {
            return IngestStatus::Failed;
        }
        if validation == ValidationStatus::Errors {
            return IngestStatus::Failed;
        }
        if failed_files > 0 {
            return IngestStatus::Partial;
        }
        if validation == ValidationStatus::Warnings {
            return IngestStatus::SuccessWithWarnings;
        }
        IngestStatus::Success
    }
}

impl fmt::Display for IngestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestStatus::Success => write!(f, "success"),
            IngestStatus::SuccessWithWarnings => write!(f, "success_with_warnings"),
            IngestStatus::Partial => write!(f, "partial"),
            IngestStatus::Failed => write!(f, "failed"),
        }
    }
}

// ==========================================
// 源文件漂移状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftState {
    Unchanged, // 摘要与上次导入一致
    Changed,   // 摘要不一致
    New,       // 文件存在但从未导入
    Missing,   // 文件不存在
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_status_all_files_failed() {
        assert_eq!(
            IngestStatus::derive(9, 9, ValidationStatus::Pass),
            IngestStatus::Failed
        );
    }

    #[test]
    fn test_ingest_status_validation_errors_dominate_partial() {
        assert_eq!(
            IngestStatus::derive(2, 9, ValidationStatus::Errors),
            IngestStatus::Failed
        );
        assert_eq!(
            IngestStatus::derive(2, 9, ValidationStatus::Warnings),
            IngestStatus::Partial
        );
    }

    #[test]
    fn test_ingest_status_clean_runs() {
        assert_eq!(
            IngestStatus::derive(0, 9, ValidationStatus::Warnings),
            IngestStatus::SuccessWithWarnings
        );
        assert_eq!(
            IngestStatus::derive(0, 9, ValidationStatus::Pass),
            IngestStatus::Success
        );
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&IngestStatus::SuccessWithWarnings).unwrap(),
            "\"success_with_warnings\""
        );
        assert_eq!(serde_json::to_string(&ValidationStatus::Pass).unwrap(), "\"pass\"");
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
    }
}

// ==========================================
// 表面处理危险品数据引擎 - 导入/校验报告
// ==========================================
// 用途: 导入编排器与校验器的输出结构
// 对齐: 输出 JSON 字段名即对外接口
// ==========================================

use crate::domain::types::{DriftState, IngestStatus, IssueCategory, Severity, ValidationStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ValidationIssue - 单条校验问题
// ==========================================
// 外键/必填类问题按关系聚合为一条，details 中带计数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub category: IssueCategory,
    pub severity: Severity,
    pub table: String,
    pub column: String,
    pub issue: String, // 机器可读代码，如 orphan_fk / null_value / invalid_range
    pub details: String,
}

// ==========================================
// ValidationReport - 校验报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    pub error_count: usize,
    pub warning_count: usize,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub summary: String,
}

impl ValidationReport {
    /// 按 severity 拆分问题并派生总体状态
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = issues
            .into_iter()
            .partition(|issue| issue.severity == Severity::Error);

        let error_count = errors.len();
        let warning_count = warnings.len();

        let (status, summary) = if error_count > 0 {
            (
                ValidationStatus::Errors,
                format!("校验失败: {} 个错误, {} 个警告", error_count, warning_count),
            )
        } else if warning_count > 0 {
            (
                ValidationStatus::Warnings,
                format!("校验通过，存在 {} 个警告", warning_count),
            )
        } else {
            (ValidationStatus::Pass, "校验通过: 无错误、无警告".to_string())
        };

        Self {
            status,
            error_count,
            warning_count,
            errors,
            warnings,
            summary,
        }
    }
}

// ==========================================
// IngestReport - 导入报告
// ==========================================
/// 单个源文件的导入结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedFile {
    pub rows: usize,
    pub digest: String, // SHA-256 十六进制
}

/// 导入过程中收集的问题（文件级错误或字段级降级警告）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestIssue {
    pub file: String,
    pub error: String,
    pub severity: Severity,
}

impl IngestIssue {
    pub fn error(file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            error: error.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            error: error.into(),
            severity: Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub run_id: String,
    pub status: IngestStatus,
    pub loaded_files: BTreeMap<String, LoadedFile>,
    pub validation_report: ValidationReport,
    pub errors: Vec<IngestIssue>,
    pub timestamp: String, // RFC 3339
}

impl IngestReport {
    /// 文件级错误数（不含警告）
    pub fn failed_file_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .map(|e| e.file.as_str())
            .collect::<std::collections::BTreeSet<_>>()
            .len()
    }
}

// ==========================================
// DriftEntry - 源文件漂移检测结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftEntry {
    pub source_name: String,
    pub state: DriftState,
    pub current_digest: Option<String>,
    pub recorded_digest: Option<String>,
}

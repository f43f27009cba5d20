// ==========================================
// 表面处理危险品数据引擎 - 存储校验器
// ==========================================
// 职责: 三轮只读校验（引用完整性 / 完整性 / 格式），合并为一份报告
// 红线: 只读诊断，任何问题都不中断流程
// ==========================================
// 聚合: 外键与必填问题按关系聚合，一组关系至多一条
// 跳过: 子表尚未创建时静默跳过，支持部分建表
// ==========================================

use crate::domain::{IssueCategory, Severity, ValidationIssue, ValidationReport};
use crate::engine::validation_rules::{
    composition_mismatch, is_valid_cas, FK_CHECKS, HAZARD_LEVEL_MAX, HAZARD_LEVEL_MIN,
    REQUIRED_FIELDS,
};
use crate::repository::error::RepositoryResult;
use crate::repository::integrity_repo::IntegrityRepository;
use tracing::{debug, info, instrument};

pub struct StoreValidator {
    integrity: IntegrityRepository,
    weight_total_max_pct: f64,
}

fn issue(
    category: IssueCategory,
    severity: Severity,
    table: &str,
    column: &str,
    code: &str,
    details: String,
) -> ValidationIssue {
    ValidationIssue {
        category,
        severity,
        table: table.to_string(),
        column: column.to_string(),
        issue: code.to_string(),
        details,
    }
}

fn material_label(base_spec: Option<&str>, variant: Option<&str>) -> String {
    match (base_spec, variant) {
        (Some(spec), Some(variant)) => format!("{} {}", spec, variant),
        (Some(spec), None) => spec.to_string(),
        (None, _) => "<未知材料>".to_string(),
    }
}

impl StoreValidator {
    pub fn new(integrity: IntegrityRepository, weight_total_max_pct: f64) -> Self {
        Self {
            integrity,
            weight_total_max_pct,
        }
    }

    // ==========================================
    // 第一轮: 引用完整性
    // ==========================================

    pub fn validate_referential_integrity(&self) -> RepositoryResult<Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        for check in FK_CHECKS.iter() {
            if !self.integrity.table_exists(check.child_table)? {
                debug!(table = check.child_table, "子表不存在，跳过外键检查");
                continue;
            }

            if !self.integrity.table_exists(check.parent_table)? {
                issues.push(issue(
                    IssueCategory::ReferentialIntegrity,
                    Severity::Error,
                    check.child_table,
                    check.child_column,
                    "missing_parent_table",
                    format!("父表 '{}' 不存在", check.parent_table),
                ));
                continue;
            }

            let orphans = self.integrity.count_orphans(
                check.child_table,
                check.child_column,
                check.parent_table,
                check.parent_column,
            )?;
            if orphans > 0 {
                issues.push(issue(
                    IssueCategory::ReferentialIntegrity,
                    Severity::Error,
                    check.child_table,
                    check.child_column,
                    "orphan_fk",
                    format!(
                        "{} 行引用了不存在的 {}.{} 值",
                        orphans, check.parent_table, check.parent_column
                    ),
                ));
            }
        }

        Ok(issues)
    }

    // ==========================================
    // 第二轮: 必填字段完整性
    // ==========================================

    pub fn validate_completeness(&self) -> RepositoryResult<Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        for (table, column) in REQUIRED_FIELDS.iter() {
            if !self.integrity.table_exists(table)? || !self.integrity.column_exists(table, column)? {
                continue;
            }

            let nulls = self.integrity.count_nulls(table, column)?;
            if nulls > 0 {
                issues.push(issue(
                    IssueCategory::Completeness,
                    Severity::Error,
                    table,
                    column,
                    "null_value",
                    format!("{} 行的 {} 为 NULL", nulls, column),
                ));
            }
        }

        Ok(issues)
    }

    // ==========================================
    // 第三轮: 格式规则
    // ==========================================

    pub fn validate_formats(&self) -> RepositoryResult<Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        if self.integrity.table_exists("chemicals")? {
            self.check_chemicals(&mut issues)?;
        }

        if self.tables_exist(&["material_chemicals", "materials", "chemicals"])? {
            self.check_weight_ranges(&mut issues)?;
        }

        if self.tables_exist(&["finish_codes", "substrates", "finish_applied"])? {
            self.check_code_composition(&mut issues)?;
        }

        Ok(issues)
    }

    fn tables_exist(&self, tables: &[&str]) -> RepositoryResult<bool> {
        for table in tables {
            if !self.integrity.table_exists(table)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn check_chemicals(&self, issues: &mut Vec<ValidationIssue>) -> RepositoryResult<()> {
        // CAS 形状: 警告
        for row in self.integrity.list_cas_values()? {
            if !is_valid_cas(&row.value) {
                issues.push(issue(
                    IssueCategory::Format,
                    Severity::Warning,
                    "chemicals",
                    "cas",
                    "invalid_cas_format",
                    format!(
                        "化学品 '{}' (id={}) 的 CAS 号格式不符: '{}'",
                        row.name, row.chemical_id, row.value
                    ),
                ));
            }
        }

        // hazard_flags 可解析性: 错误
        for row in self.integrity.list_hazard_flags()? {
            if serde_json::from_str::<serde_json::Value>(&row.value).is_err() {
                issues.push(issue(
                    IssueCategory::Format,
                    Severity::Error,
                    "chemicals",
                    "hazard_flags",
                    "invalid_json",
                    format!(
                        "化学品 '{}' (id={}) 的 hazard_flags 不是合法 JSON: {}",
                        row.name, row.chemical_id, row.value
                    ),
                ));
            }
        }

        // 危险等级范围: 错误（存储层 CHECK 的复核）
        for row in self.integrity.list_hazard_levels_out_of_range()? {
            issues.push(issue(
                IssueCategory::Format,
                Severity::Error,
                "chemicals",
                "default_hazard_level",
                "out_of_range",
                format!(
                    "化学品 '{}' (id={}) 的危险等级 {} 超出范围 (应为 {}-{})",
                    row.name, row.chemical_id, row.level, HAZARD_LEVEL_MIN, HAZARD_LEVEL_MAX
                ),
            ));
        }

        Ok(())
    }

    fn check_weight_ranges(&self, issues: &mut Vec<ValidationIssue>) -> RepositoryResult<()> {
        for row in self.integrity.list_inverted_weight_ranges()? {
            issues.push(issue(
                IssueCategory::Format,
                Severity::Error,
                "material_chemicals",
                "pct_wt_low, pct_wt_high",
                "invalid_range",
                format!(
                    "材料 '{}' 化学品 '{}': pct_wt_low ({}) > pct_wt_high ({})",
                    material_label(row.base_spec.as_deref(), row.variant.as_deref()),
                    row.chemical_name.as_deref().unwrap_or("<未知化学品>"),
                    row.pct_wt_low,
                    row.pct_wt_high
                ),
            ));
        }

        for row in self
            .integrity
            .list_material_weight_totals_above(self.weight_total_max_pct)?
        {
            issues.push(issue(
                IssueCategory::Format,
                Severity::Warning,
                "material_chemicals",
                "pct_wt_high",
                "exceeds_weight_total",
                format!(
                    "材料 '{}' 的最大重量百分比合计为 {:.1}% (> {}%)",
                    material_label(Some(&row.base_spec), row.variant.as_deref()),
                    row.total_pct_wt_high,
                    self.weight_total_max_pct
                ),
            ));
        }

        Ok(())
    }

    fn check_code_composition(&self, issues: &mut Vec<ValidationIssue>) -> RepositoryResult<()> {
        for row in self.integrity.list_finish_code_compositions()? {
            if let Some(expected) = composition_mismatch(
                &row.code,
                &row.substrate_code,
                &row.finish_applied_code,
                row.seq_id,
            ) {
                issues.push(issue(
                    IssueCategory::Format,
                    Severity::Warning,
                    "finish_codes",
                    "code",
                    "code_composition_mismatch",
                    format!(
                        "代码 '{}' 与约定组成 '{}' 不一致 (基材={}, 表面处理={}, seq_id={})",
                        row.code, expected, row.substrate_code, row.finish_applied_code, row.seq_id
                    ),
                ));
            }
        }
        Ok(())
    }

    // ==========================================
    // 汇总
    // ==========================================

    /// 依次执行三轮校验并合并结果
    #[instrument(skip(self))]
    pub fn validate_all(&self) -> RepositoryResult<ValidationReport> {
        let mut issues = self.validate_referential_integrity()?;
        issues.extend(self.validate_completeness()?);
        issues.extend(self.validate_formats()?);

        let report = ValidationReport::from_issues(issues);
        info!(
            status = %report.status,
            errors = report.error_count,
            warnings = report.warning_count,
            "存储校验完成"
        );
        Ok(report)
    }
}

// ==========================================
// 存储校验器集成测试
// ==========================================
// 场景: 关闭外键约束/检查约束后直接造数，验证三轮校验的判定
// ==========================================


use hazard_finish_engine::repository::IntegrityRepository;
use hazard_finish_engine::{IngestApi, IssueCategory, Severity, StoreValidator, ValidationStatus};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use test_helpers::{create_test_db, open_test_connection};

/// 以关闭外键约束的连接执行造数 SQL
fn seed_unchecked(db_path: &str, sql: &str) {
    let conn = open_test_connection(db_path);
    conn.execute_batch("PRAGMA foreign_keys = OFF; PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    conn.execute_batch(sql).unwrap();
}

#[test]
fn test_orphans_aggregate_into_one_issue() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_unchecked(
        &db_path,
        "INSERT INTO sft_steps (id, sft_code, description) VALUES (1, 'SFT0001', 'Clean');
         INSERT INTO finish_code_steps (finish_code_id, sft_id, step_order) VALUES (99, 1, 1);
         INSERT INTO finish_code_steps (finish_code_id, sft_id, step_order) VALUES (98, 1, 2);",
    );

    let report = IngestApi::new(db_path).validate().unwrap();

    assert_eq!(report.status, ValidationStatus::Errors);
    assert_eq!(report.error_count, 1);
    let issue = &report.errors[0];
    assert_eq!(issue.category, IssueCategory::ReferentialIntegrity);
    assert_eq!(issue.issue, "orphan_fk");
    assert_eq!(issue.table, "finish_code_steps");
    assert_eq!(issue.column, "finish_code_id");
    assert!(issue.details.starts_with("2 "), "{}", issue.details);
}

#[test]
fn test_hazard_level_range() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_unchecked(
        &db_path,
        "INSERT INTO chemicals (name, default_hazard_level) VALUES ('Zero', 0);
         INSERT INTO chemicals (name, default_hazard_level) VALUES ('Six', 6);
         INSERT INTO chemicals (name, default_hazard_level) VALUES ('One', 1);
         INSERT INTO chemicals (name, default_hazard_level) VALUES ('Five', 5);",
    );

    let report = IngestApi::new(db_path).validate().unwrap();

    let out_of_range: Vec<_> = report
        .errors
        .iter()
        .filter(|i| i.issue == "out_of_range")
        .collect();
    assert_eq!(out_of_range.len(), 2);
    assert!(out_of_range.iter().any(|i| i.details.contains("Zero")));
    assert!(out_of_range.iter().any(|i| i.details.contains("Six")));
    assert!(out_of_range.iter().all(|i| i.category == IssueCategory::Format));
}

#[test]
fn test_inverted_weight_range_is_error() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_unchecked(
        &db_path,
        "INSERT INTO materials (id, base_spec) VALUES (1, 'M100');
         INSERT INTO chemicals (id, name) VALUES (1, 'Ethanol');
         INSERT INTO material_chemicals (material_id, chemical_id, pct_wt_low, pct_wt_high)
             VALUES (1, 1, 60, 40);",
    );

    let report = IngestApi::new(db_path).validate().unwrap();

    assert_eq!(report.error_count, 1);
    let issue = &report.errors[0];
    assert_eq!(issue.issue, "invalid_range");
    assert!(
        issue.details.contains("pct_wt_low (60) > pct_wt_high (40)"),
        "{}",
        issue.details
    );
}

#[test]
fn test_ordered_weight_range_passes() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_unchecked(
        &db_path,
        "INSERT INTO materials (id, base_spec) VALUES (1, 'M100');
         INSERT INTO chemicals (id, name) VALUES (1, 'Ethanol');
         INSERT INTO material_chemicals (material_id, chemical_id, pct_wt_low, pct_wt_high)
             VALUES (1, 1, 10, 20);",
    );

    let report = IngestApi::new(db_path).validate().unwrap();
    assert_eq!(report.status, ValidationStatus::Pass);
}

#[test]
fn test_weight_total_above_threshold_is_warning() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_unchecked(
        &db_path,
        "INSERT INTO materials (id, base_spec) VALUES (1, 'M100');
         INSERT INTO chemicals (id, name) VALUES (1, 'Water');
         INSERT INTO chemicals (id, name) VALUES (2, 'Ethanol');
         INSERT INTO material_chemicals (material_id, chemical_id, pct_wt_low, pct_wt_high)
             VALUES (1, 1, 50, 70);
         INSERT INTO material_chemicals (material_id, chemical_id, pct_wt_low, pct_wt_high)
             VALUES (1, 2, 30, 40);",
    );

    let report = IngestApi::new(db_path).validate().unwrap();

    assert_eq!(report.status, ValidationStatus::Warnings);
    assert_eq!(report.warnings[0].issue, "exceeds_weight_total");
    assert_eq!(report.warnings[0].severity, Severity::Warning);
}

#[test]
fn test_code_composition_warning() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_unchecked(
        &db_path,
        "INSERT INTO substrates (id, code, description) VALUES (1, 'B', 'Aluminum');
         INSERT INTO finish_applied (id, code, description) VALUES (1, 'P', 'Chromate');
         INSERT INTO finish_codes (code, substrate_id, finish_applied_id, seq_id) VALUES ('BP01', 1, 1, 1);
         INSERT INTO finish_codes (code, substrate_id, finish_applied_id, seq_id) VALUES ('BP2', 1, 1, 2);
         INSERT INTO finish_codes (code, substrate_id, finish_applied_id, seq_id) VALUES ('XYZ', 1, 1, 3);",
    );

    let report = IngestApi::new(db_path).validate().unwrap();

    // 仅前导零差异的 BP2 不告警
    assert_eq!(report.error_count, 0);
    assert_eq!(report.warning_count, 1);
    let warning = &report.warnings[0];
    assert_eq!(warning.issue, "code_composition_mismatch");
    assert!(warning.details.contains("XYZ"));
    assert!(warning.details.contains("BP03"));
}

#[test]
fn test_completeness_on_partial_schema() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE substrates (id INTEGER PRIMARY KEY, code TEXT, description TEXT);
         INSERT INTO substrates (code, description) VALUES ('B', NULL);
         INSERT INTO substrates (code, description) VALUES ('C', NULL);
         INSERT INTO substrates (code, description) VALUES ('D', 'Steel');
         CREATE TABLE sft_steps (id INTEGER PRIMARY KEY, sft_code TEXT);",
    )
    .unwrap();
    let conn = Arc::new(Mutex::new(conn));
    let validator = StoreValidator::new(IntegrityRepository::from_connection(conn), 100.0);

    let issues = validator.validate_completeness().unwrap();

    // 缺列 sft_steps.description 与缺表均跳过
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].table, "substrates");
    assert_eq!(issues[0].column, "description");
    assert_eq!(issues[0].issue, "null_value");
    assert!(issues[0].details.starts_with("2 "));

    let report = validator.validate_all().unwrap();
    assert_eq!(report.status, ValidationStatus::Errors);
    assert_eq!(report.error_count, 1);
}

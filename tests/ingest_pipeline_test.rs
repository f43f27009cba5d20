// ==========================================
// 导入管道集成测试
// ==========================================
// 覆盖: 端到端导入、幂等重跑、单文件失败隔离、内嵌步骤、漂移检测
// ==========================================


use hazard_finish_engine::{
    ApiError, DriftState, FinishCodeLookup, IngestApi, IngestStatus, QueryApi, Severity,
    ValidationStatus,
};
use std::path::Path;
use test_helpers::{
    copy_xlsx_fixture, count_rows, create_test_db, remove_file, write_bp01_fixture, write_file,
};

const TABLES: [&str; 9] = [
    "substrates",
    "finish_applied",
    "finish_codes",
    "sft_steps",
    "finish_code_steps",
    "materials",
    "chemicals",
    "sft_material_links",
    "material_chemicals",
];

fn table_counts(db_path: &str) -> Vec<i64> {
    TABLES.iter().map(|t| count_rows(db_path, t)).collect()
}

#[test]
fn test_bp01_end_to_end() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_bp01_fixture(source.path());

    let report = IngestApi::new(db_path.clone()).ingest(source.path()).unwrap();

    // CAS 64-17-5 不满足 4-7 位首段，只产生一条格式警告
    assert_eq!(report.status, IngestStatus::SuccessWithWarnings);
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.loaded_files.len(), 9);
    assert!(report.loaded_files.values().all(|f| f.rows == 1));
    assert!(report
        .loaded_files
        .values()
        .all(|f| f.digest.len() == 64));
    assert!(!report.run_id.is_empty());

    let validation = &report.validation_report;
    assert_eq!(validation.status, ValidationStatus::Warnings);
    assert_eq!(validation.error_count, 0);
    assert_eq!(validation.warning_count, 1);
    assert_eq!(validation.warnings[0].issue, "invalid_cas_format");
    assert!(validation.warnings[0].details.contains("64-17-5"));

    let lookup = QueryApi::new(db_path.clone())
        .get_finish_code_tree("BP01")
        .unwrap();
    let tree = lookup.found().expect("BP01 应存在");

    assert_eq!(tree.finish_code, "BP01");
    assert_eq!(tree.parsed.seq_id, 1);
    assert_eq!(tree.parsed.substrate.code, "B");
    assert_eq!(tree.parsed.substrate.description, "Aluminum");
    assert_eq!(tree.parsed.finish_applied.code, "P");
    assert!(tree.direct_specs.is_empty());
    assert_eq!(
        tree.finish_applied_specs,
        vec!["MIL-DTL-5541".to_string(), "AMS 2473".to_string()]
    );

    assert_eq!(tree.steps.len(), 1);
    let step = &tree.steps[0];
    assert_eq!(step.sft_code, "SFT0001");
    assert_eq!(step.step_order, 1);
    assert_eq!(step.parent_group.as_deref(), Some("Cleaning"));
    assert_eq!(
        step.associated_specs_list,
        vec!["AMS 2700".to_string(), "ASTM B600".to_string()]
    );

    assert_eq!(step.materials.len(), 1);
    let material = &step.materials[0];
    assert_eq!(material.base_spec, "M100");
    assert_eq!(material.variant, None);

    assert_eq!(material.chemicals.len(), 1);
    let chemical = &material.chemicals[0];
    assert_eq!(chemical.name, "Ethanol");
    assert_eq!(chemical.cas.as_deref(), Some("64-17-5"));
    assert_eq!(chemical.pct_wt_low, Some(90.0));
    assert_eq!(chemical.pct_wt_high, Some(100.0));
    assert_eq!(chemical.default_hazard_level, Some(3));
    assert_eq!(
        chemical.hazard_flags,
        Some(serde_json::json!({ "flammable": true }))
    );

    // 血缘摘要与导入报告一致
    assert_eq!(tree.provenance.source_digests.len(), 9);
    for (name, file) in &report.loaded_files {
        assert_eq!(tree.provenance.source_digests.get(name), Some(&file.digest));
    }
    assert!(tree.provenance.loaded_at.is_some());
}

#[test]
fn test_xlsx_sources_mixed_with_csv() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_bp01_fixture(source.path());
    for stem in ["finish_codes", "finish_code_steps", "chemicals"] {
        remove_file(source.path(), &format!("{}.csv", stem));
        copy_xlsx_fixture(source.path(), &format!("{}.xlsx", stem));
    }

    let report = IngestApi::new(db_path.clone()).ingest(source.path()).unwrap();

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.loaded_files.len(), 9);
    for name in ["finish_codes.xlsx", "finish_code_steps.xlsx", "chemicals.xlsx"] {
        assert_eq!(report.loaded_files.get(name).map(|f| f.rows), Some(1), "{}", name);
    }
    assert!(!report.loaded_files.contains_key("chemicals.csv"));

    let lookup = QueryApi::new(db_path).get_finish_code_tree("BP01").unwrap();
    let tree = lookup.found().expect("BP01 应存在");

    // 数值单元格 1.0 / 3.0 按整数入库
    assert_eq!(tree.parsed.seq_id, 1);
    assert_eq!(tree.parsed.finish_description, None);
    assert_eq!(tree.steps[0].step_order, 1);
    let chemical = &tree.steps[0].materials[0].chemicals[0];
    assert_eq!(chemical.name, "Ethanol");
    assert_eq!(chemical.default_hazard_level, Some(3));
    assert_eq!(
        chemical.hazard_flags,
        Some(serde_json::json!({ "flammable": true }))
    );

    assert_eq!(
        tree.provenance.source_digests.get("chemicals.xlsx"),
        report.loaded_files.get("chemicals.xlsx").map(|f| &f.digest)
    );
}

#[test]
fn test_reingest_is_idempotent() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_bp01_fixture(source.path());
    let api = IngestApi::new(db_path.clone());

    let first = api.ingest(source.path()).unwrap();
    let counts_after_first = table_counts(&db_path);

    let second = api.ingest(source.path()).unwrap();
    let counts_after_second = table_counts(&db_path);

    assert_eq!(counts_after_first, vec![1; 9]);
    assert_eq!(counts_after_first, counts_after_second);
    assert_eq!(count_rows(&db_path, "metadata_versions"), 9);

    assert_eq!(first.status, second.status);
    assert_eq!(first.loaded_files, second.loaded_files);
    assert_eq!(first.validation_report, second.validation_report);
    assert_ne!(first.run_id, second.run_id);
}

#[test]
fn test_missing_file_is_isolated() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_bp01_fixture(source.path());
    remove_file(source.path(), "sft_material_links.csv");

    let report = IngestApi::new(db_path.clone()).ingest(source.path()).unwrap();

    assert_eq!(report.status, IngestStatus::Partial);
    assert_eq!(report.loaded_files.len(), 8);
    assert_eq!(report.failed_file_count(), 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].file, "sft_material_links.csv");
    assert_eq!(report.errors[0].severity, Severity::Error);

    // 其余文件照常落库
    assert_eq!(count_rows(&db_path, "material_chemicals"), 1);
    assert_eq!(count_rows(&db_path, "sft_material_links"), 0);
}

#[test]
fn test_missing_required_column_fails_file() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_bp01_fixture(source.path());
    write_file(
        source.path(),
        "finish_codes.csv",
        "finish_code,substrate_code,finish_applied_code\nBP01,B,P\n",
    );

    let report = IngestApi::new(db_path.clone()).ingest(source.path()).unwrap();

    let error = report
        .errors
        .iter()
        .find(|e| e.file == "finish_codes.csv")
        .expect("finish_codes.csv 应失败");
    assert!(error.error.contains("seq_id"), "{}", error.error);
    assert!(!report.loaded_files.contains_key("finish_codes.csv"));
    assert_eq!(count_rows(&db_path, "finish_codes"), 0);
    assert_eq!(report.status, IngestStatus::Partial);
}

#[test]
fn test_missing_parent_rolls_back_whole_file() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_bp01_fixture(source.path());
    write_file(
        source.path(),
        "sft_material_links.csv",
        "sft_code,base_spec,variant,note\nSFT0001,M100,,\nSFT9999,M100,,\n",
    );

    let report = IngestApi::new(db_path.clone()).ingest(source.path()).unwrap();

    let error = report
        .errors
        .iter()
        .find(|e| e.file == "sft_material_links.csv")
        .expect("sft_material_links.csv 应失败");
    assert!(error.error.contains("SFT9999"), "{}", error.error);
    assert_eq!(count_rows(&db_path, "sft_material_links"), 0);
    assert_eq!(report.status, IngestStatus::Partial);
}

#[test]
fn test_embedded_steps_resolve_on_first_run() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_bp01_fixture(source.path());
    write_file(
        source.path(),
        "finish_codes.csv",
        "finish_code,substrate_code,finish_applied_code,seq_id,sft_steps\n\
         BP01,B,P,1,\"[\"\"SFT0001\"\", \"\"SFT0002\"\"]\"\n",
    );
    write_file(
        source.path(),
        "sft_steps.csv",
        "sft_code,description\nSFT0001,Alkaline clean\nSFT0002,Deoxidize\n",
    );
    write_file(source.path(), "finish_code_steps.csv", "finish_code,sft_code,step_order\n");

    let report = IngestApi::new(db_path.clone()).ingest(source.path()).unwrap();
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.loaded_files["finish_code_steps.csv"].rows, 0);

    let lookup = QueryApi::new(db_path).get_finish_code_tree("BP01").unwrap();
    let tree = lookup.found().unwrap();
    let steps: Vec<(&str, i64)> = tree
        .steps
        .iter()
        .map(|s| (s.sft_code.as_str(), s.step_order))
        .collect();
    assert_eq!(steps, vec![("SFT0001", 1), ("SFT0002", 2)]);
}

#[test]
fn test_explicit_step_order_wins_over_embedded() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_bp01_fixture(source.path());
    write_file(
        source.path(),
        "finish_codes.csv",
        "finish_code,substrate_code,finish_applied_code,seq_id,sft_steps\n\
         BP01,B,P,1,\"[\"\"SFT0001\"\"]\"\n",
    );
    write_file(
        source.path(),
        "finish_code_steps.csv",
        "finish_code,sft_code,step_order\nBP01,SFT0001,5\n",
    );

    IngestApi::new(db_path.clone()).ingest(source.path()).unwrap();

    let lookup = QueryApi::new(db_path.clone()).get_finish_code_tree("BP01").unwrap();
    let tree = lookup.found().unwrap();
    assert_eq!(tree.steps.len(), 1);
    assert_eq!(tree.steps[0].step_order, 5);
    assert_eq!(count_rows(&db_path, "finish_code_steps"), 1);
}

#[test]
fn test_malformed_hazard_flags_stored_with_warning() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_bp01_fixture(source.path());
    write_file(
        source.path(),
        "chemicals.csv",
        "name,cas,hazard_flags,default_hazard_level\nEthanol,64-17-5,{flammable,3\n",
    );

    let report = IngestApi::new(db_path.clone()).ingest(source.path()).unwrap();

    let warning = report
        .errors
        .iter()
        .find(|e| e.file == "chemicals.csv")
        .expect("应记录 hazard_flags 警告");
    assert_eq!(warning.severity, Severity::Warning);
    assert!(report.loaded_files.contains_key("chemicals.csv"));

    let invalid_json = report
        .validation_report
        .errors
        .iter()
        .filter(|i| i.issue == "invalid_json")
        .count();
    assert_eq!(invalid_json, 1);
    assert_eq!(report.status, IngestStatus::Failed);

    let lookup = QueryApi::new(db_path).get_finish_code_tree("BP01").unwrap();
    let chemical = &lookup.found().unwrap().steps[0].materials[0].chemicals[0];
    let flags = chemical.hazard_flags.as_ref().unwrap();
    assert_eq!(flags["raw"], "{flammable");
}

#[test]
fn test_source_dir_not_found_is_fatal() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let result = IngestApi::new(db_path).ingest(Path::new("/definitely/not/here"));
    assert!(matches!(result, Err(ApiError::SourceDirNotFound(_))));
}

#[test]
fn test_empty_source_dir_fails_every_file() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();

    let report = IngestApi::new(db_path).ingest(source.path()).unwrap();
    assert_eq!(report.status, IngestStatus::Failed);
    assert_eq!(report.errors.len(), 9);
    assert!(report.loaded_files.is_empty());
}

#[test]
fn test_drift_detection() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_bp01_fixture(source.path());
    let api = IngestApi::new(db_path);

    let before = api.detect_drift(source.path()).unwrap();
    assert_eq!(before.len(), 9);
    assert!(before.iter().all(|e| e.state == DriftState::New));

    api.ingest(source.path()).unwrap();
    let after = api.detect_drift(source.path()).unwrap();
    assert!(after.iter().all(|e| e.state == DriftState::Unchanged));

    write_file(
        source.path(),
        "chemicals.csv",
        "name,cas,hazard_flags,default_hazard_level\nEthanol,64-17-5,,4\n",
    );
    remove_file(source.path(), "sft_material_links.csv");

    let drift = api.detect_drift(source.path()).unwrap();
    let state_of = |name: &str| {
        drift
            .iter()
            .find(|e| e.source_name == name)
            .map(|e| (e.state, e.recorded_digest.is_some(), e.current_digest.is_some()))
    };
    assert_eq!(state_of("chemicals.csv"), Some((DriftState::Changed, true, true)));
    assert_eq!(
        state_of("sft_material_links.csv"),
        Some((DriftState::Missing, true, false))
    );
    assert_eq!(state_of("substrates.csv"), Some((DriftState::Unchanged, true, true)));
}

#[test]
fn test_standalone_validate_matches_ingest_report() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_bp01_fixture(source.path());
    let api = IngestApi::new(db_path);

    let report = api.ingest(source.path()).unwrap();
    let validation = api.validate().unwrap();
    assert_eq!(validation, report.validation_report);

    // 确认查询接口未找到时不报错
    let lookup = QueryApi::new(api.db_path()).get_finish_code_tree("NOPE").unwrap();
    assert!(matches!(lookup, FinishCodeLookup::NotFound(_)));
}

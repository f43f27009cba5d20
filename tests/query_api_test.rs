// ==========================================
// 查询 API 集成测试
// ==========================================
// 覆盖: 未找到载荷、规范备选拆分、规范目录排序、代码清单、危险等级筛选
// ==========================================


use hazard_finish_engine::config::{config_keys, ConfigManager};
use hazard_finish_engine::{ApiError, IngestApi, QueryApi};
use std::path::Path;
use std::sync::{Arc, Mutex};
use test_helpers::{create_test_db, open_test_connection, write_bp01_fixture, write_file};

/// BP01 + BP02 两个代码，共用 SFT0001，BP02 额外包含 SFT0002
fn write_two_code_fixture(dir: &Path) {
    write_bp01_fixture(dir);
    write_file(
        dir,
        "finish_codes.csv",
        "finish_code,substrate_code,finish_applied_code,seq_id,description\n\
         BP01,B,P,1,Chromate conversion on aluminum\n\
         BP02,B,P,2,Chromate conversion with salt spray\n",
    );
    write_file(
        dir,
        "sft_steps.csv",
        &format!(
            "sft_code,description,associated_specs\n\
             SFT0001,Alkaline clean,\"AMS 2700, ASTM B600\"\n\
             SFT0002,{},ASTM B117\n",
            "S".repeat(100)
        ),
    );
    write_file(
        dir,
        "finish_code_steps.csv",
        "finish_code,sft_code,step_order\nBP01,SFT0001,1\nBP02,SFT0001,1\nBP02,SFT0002,2\n",
    );
}

fn ingest_two_codes() -> (tempfile::NamedTempFile, String) {
    let (db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_two_code_fixture(source.path());
    IngestApi::new(db_path.clone()).ingest(source.path()).unwrap();
    (db_file, db_path)
}

#[test]
fn test_not_found_returns_sorted_sample() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_bp01_fixture(source.path());

    let mut finish_codes =
        String::from("finish_code,substrate_code,finish_applied_code,seq_id\n");
    for seq in (1..=12).rev() {
        finish_codes.push_str(&format!("BP{:02},B,P,{}\n", seq, seq));
    }
    write_file(source.path(), "finish_codes.csv", &finish_codes);
    IngestApi::new(db_path.clone()).ingest(source.path()).unwrap();

    let lookup = QueryApi::new(db_path).get_finish_code_tree("ZZ99").unwrap();
    let payload = lookup.not_found().expect("ZZ99 不应存在");

    assert_eq!(payload.error, "Finish code not found");
    assert_eq!(payload.finish_code, "ZZ99");
    let expected: Vec<String> = (1..=10).map(|n| format!("BP{:02}", n)).collect();
    assert_eq!(payload.available_codes, expected);
}

#[test]
fn test_not_found_sample_limit_cannot_exceed_ten() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let source = tempfile::tempdir().unwrap();
    write_bp01_fixture(source.path());

    let mut finish_codes =
        String::from("finish_code,substrate_code,finish_applied_code,seq_id\n");
    for seq in 1..=15 {
        finish_codes.push_str(&format!("BP{:02},B,P,{}\n", seq, seq));
    }
    write_file(source.path(), "finish_codes.csv", &finish_codes);
    IngestApi::new(db_path.clone()).ingest(source.path()).unwrap();

    let config = ConfigManager::from_connection(Arc::new(Mutex::new(open_test_connection(&db_path))));
    config
        .set_global_config_value(config_keys::NOT_FOUND_SAMPLE_LIMIT, "50")
        .unwrap();

    let lookup = QueryApi::new(db_path).get_finish_code_tree("ZZ99").unwrap();
    let payload = lookup.not_found().unwrap();

    assert_eq!(payload.available_codes.len(), 10);
    assert_eq!(payload.available_codes.last().map(String::as_str), Some("BP10"));
}

#[test]
fn test_not_found_serializes_flat() {
    let (_db_file, db_path) = ingest_two_codes();

    let lookup = QueryApi::new(db_path).get_finish_code_specs("NOPE").unwrap();
    let json = serde_json::to_value(&lookup).unwrap();

    assert_eq!(json["error"], "Finish code not found");
    assert_eq!(json["finish_code"], "NOPE");
    assert_eq!(json["available_codes"], serde_json::json!(["BP01", "BP02"]));
}

#[test]
fn test_step_specs_are_or_alternatives() {
    let (_db_file, db_path) = ingest_two_codes();

    let lookup = QueryApi::new(db_path.clone()).get_finish_code_tree("BP02").unwrap();
    let tree = lookup.found().unwrap();
    assert_eq!(tree.steps.len(), 2);
    assert_eq!(
        tree.steps[0].associated_specs_list,
        vec!["AMS 2700".to_string(), "ASTM B600".to_string()]
    );
    assert_eq!(tree.steps[1].associated_specs_list, vec!["ASTM B117".to_string()]);

    let lookup = QueryApi::new(db_path).get_finish_code_specs("BP02").unwrap();
    let specs = lookup.found().unwrap();
    assert_eq!(
        specs.specifications,
        vec![
            "AMS 2700".to_string(),
            "ASTM B117".to_string(),
            "ASTM B600".to_string()
        ]
    );
    assert_eq!(specs.spec_count, 3);
    assert_eq!(specs.steps_with_specs.len(), 2);

    // 超长描述按缺省 80 字符截断
    let long = &specs.steps_with_specs[1].description;
    assert_eq!(long.chars().count(), 80);
    assert!(long.ends_with("..."));
    assert_eq!(specs.steps_with_specs[0].description, "Alkaline clean");
}

#[test]
fn test_specification_catalog_ordering() {
    let (_db_file, db_path) = ingest_two_codes();

    let catalog = QueryApi::new(db_path).get_all_specifications().unwrap();

    assert_eq!(catalog.total_specs, 3);
    let order: Vec<(&str, usize)> = catalog
        .specifications
        .iter()
        .map(|s| (s.spec.as_str(), s.usage_count))
        .collect();
    assert_eq!(
        order,
        vec![("AMS 2700", 2), ("ASTM B600", 2), ("ASTM B117", 1)]
    );
    assert_eq!(
        catalog.specifications[0].finish_codes,
        vec!["BP01".to_string(), "BP02".to_string()]
    );
    assert_eq!(catalog.specifications[2].sft_codes, vec!["SFT0002".to_string()]);
}

#[test]
fn test_list_finish_codes() {
    let (_db_file, db_path) = ingest_two_codes();

    let codes = QueryApi::new(db_path).list_finish_codes().unwrap();

    assert_eq!(codes.len(), 2);
    assert_eq!(codes[0].code, "BP01");
    assert_eq!(codes[1].code, "BP02");
    assert_eq!(codes[1].seq_id, 2);
    assert_eq!(codes[0].substrate, "Aluminum");
    assert_eq!(codes[0].finish_applied, "Anodize");
}

#[test]
fn test_chemicals_by_hazard_level() {
    let (_db_file, db_path) = ingest_two_codes();
    let api = QueryApi::new(db_path);

    let level3 = api.get_chemicals_by_hazard_level(3).unwrap();
    assert_eq!(level3.len(), 1);
    assert_eq!(level3[0].name, "Ethanol");
    assert_eq!(level3[0].hazard_flags.as_ref().unwrap()["flammable"], true);

    assert!(api.get_chemicals_by_hazard_level(4).unwrap().is_empty());

    assert!(matches!(
        api.get_chemicals_by_hazard_level(0),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.get_chemicals_by_hazard_level(6),
        Err(ApiError::InvalidInput(_))
    ));
}

#[test]
fn test_query_on_missing_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("absent.db");
    let api = QueryApi::new(db_path.to_string_lossy().to_string());

    assert!(matches!(api.list_finish_codes(), Err(ApiError::NotFound(_))));
    assert!(!db_path.exists());
}

// ==========================================
// 表面处理危险品数据引擎 - 查询 API
// ==========================================
// 职责: 层级树、代码清单、规范交叉引用、危险等级筛选
// 红线: 只读，不隐式创建数据库
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::store::open_existing;
use crate::config::{ConfigManager, PipelineConfigReader};
use crate::domain::{
    ChemicalHazardEntry, FinishCodeLookup, FinishCodeSpecs, FinishCodeSummary, FinishCodeTree,
    SpecCatalog,
};
use crate::engine::validation_rules::{HAZARD_LEVEL_MAX, HAZARD_LEVEL_MIN};
use crate::engine::{FinishTreeBuilder, SpecIndex};
use crate::repository::FinishQueryRepository;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub struct QueryApi {
    db_path: String,
}

impl QueryApi {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn tree_builder(conn: &Arc<Mutex<Connection>>) -> ApiResult<FinishTreeBuilder> {
        let config = ConfigManager::from_connection(conn.clone());
        let sample_limit = config.get_not_found_sample_limit()?;
        Ok(FinishTreeBuilder::new(
            FinishQueryRepository::from_connection(conn.clone()),
            sample_limit,
        ))
    }

    fn spec_index(conn: &Arc<Mutex<Connection>>) -> ApiResult<SpecIndex> {
        let config = ConfigManager::from_connection(conn.clone());
        let max_len = config.get_spec_description_max_len()?;
        Ok(SpecIndex::new(
            FinishQueryRepository::from_connection(conn.clone()),
            max_len,
        ))
    }

    /// 按代码重建完整层级树；未找到时返回样例代码
    pub fn get_finish_code_tree(
        &self,
        finish_code: &str,
    ) -> ApiResult<FinishCodeLookup<FinishCodeTree>> {
        let conn = open_existing(&self.db_path)?;
        let builder = Self::tree_builder(&conn)?;
        Ok(builder.build_tree(finish_code)?)
    }

    pub fn list_finish_codes(&self) -> ApiResult<Vec<FinishCodeSummary>> {
        let conn = open_existing(&self.db_path)?;
        let builder = Self::tree_builder(&conn)?;
        Ok(builder.list_codes()?)
    }

    pub fn get_finish_code_specs(
        &self,
        finish_code: &str,
    ) -> ApiResult<FinishCodeLookup<FinishCodeSpecs>> {
        let conn = open_existing(&self.db_path)?;
        let builder = Self::tree_builder(&conn)?;
        let index = Self::spec_index(&conn)?;
        Ok(index.finish_code_specs(finish_code, &builder)?)
    }

    pub fn get_all_specifications(&self) -> ApiResult<SpecCatalog> {
        let conn = open_existing(&self.db_path)?;
        let index = Self::spec_index(&conn)?;
        Ok(index.all_specifications()?)
    }

    /// 危险等级 >= min_level 的化学品（min_level 取 1-5）
    pub fn get_chemicals_by_hazard_level(
        &self,
        min_level: i64,
    ) -> ApiResult<Vec<ChemicalHazardEntry>> {
        if !(HAZARD_LEVEL_MIN..=HAZARD_LEVEL_MAX).contains(&min_level) {
            return Err(ApiError::InvalidInput(format!(
                "危险等级必须在 {}-{} 之间: {}",
                HAZARD_LEVEL_MIN, HAZARD_LEVEL_MAX, min_level
            )));
        }
        let conn = open_existing(&self.db_path)?;
        let builder = Self::tree_builder(&conn)?;
        Ok(builder.chemicals_by_hazard_level(min_level)?)
    }
}

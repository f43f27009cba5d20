// ==========================================
// 表面处理危险品数据引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::pipeline_config_trait::{
    PipelineConfigReader, DEFAULT_NOT_FOUND_SAMPLE_LIMIT, DEFAULT_SPEC_DESCRIPTION_MAX_LEN,
    DEFAULT_WEIGHT_TOTAL_MAX_PCT,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

const GLOBAL_SCOPE: &str = "global";

/// 配置键常量
pub mod config_keys {
    pub const NOT_FOUND_SAMPLE_LIMIT: &str = "not_found_sample_limit";
    pub const SPEC_DESCRIPTION_MAX_LEN: &str = "spec_description_max_len";
    pub const WEIGHT_TOTAL_MAX_PCT: &str = "weight_total_max_pct";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 读取并解析配置；不存在或无法解析时返回缺省值
    fn get_parsed_or_default<T: FromStr + Copy>(&self, key: &str, default: T) -> RepositoryResult<T> {
        match self.get_global_config_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(value) => Ok(value),
                Err(_) => {
                    warn!(key = key, value = %raw, "配置值无法解析，使用缺省值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }
}

impl PipelineConfigReader for ConfigManager {
    fn get_not_found_sample_limit(&self) -> RepositoryResult<usize> {
        let limit = self.get_parsed_or_default(
            config_keys::NOT_FOUND_SAMPLE_LIMIT,
            DEFAULT_NOT_FOUND_SAMPLE_LIMIT,
        )?;
        if limit > DEFAULT_NOT_FOUND_SAMPLE_LIMIT {
            warn!(limit, max = DEFAULT_NOT_FOUND_SAMPLE_LIMIT, "样例数量超过上限，按上限截断");
        }
        Ok(limit.min(DEFAULT_NOT_FOUND_SAMPLE_LIMIT))
    }

    fn get_spec_description_max_len(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(
            config_keys::SPEC_DESCRIPTION_MAX_LEN,
            DEFAULT_SPEC_DESCRIPTION_MAX_LEN,
        )
    }

    fn get_weight_total_max_pct(&self) -> RepositoryResult<f64> {
        self.get_parsed_or_default(config_keys::WEIGHT_TOTAL_MAX_PCT, DEFAULT_WEIGHT_TOTAL_MAX_PCT)
    }
}

// ==========================================
// 表面处理危险品数据引擎 - API 作用域连接
// ==========================================
// 职责: 每次调用打开一个独立连接，调用结束即释放
// 约束: 同一调用内的仓储、配置、校验器共享同一连接
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::db::{bootstrap_schema, open_sqlite_connection};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// 打开连接并确保库结构就绪（写路径使用）
pub(crate) fn open_bootstrapped(db_path: &str) -> ApiResult<Arc<Mutex<Connection>>> {
    let conn = open_sqlite_connection(db_path)
        .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
    bootstrap_schema(&conn).map_err(|e| ApiError::SchemaBootstrapError(e.to_string()))?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 打开已存在的数据库（读路径使用，不隐式建库）
pub(crate) fn open_existing(db_path: &str) -> ApiResult<Arc<Mutex<Connection>>> {
    if !Path::new(db_path).exists() {
        return Err(ApiError::NotFound(format!("数据库文件不存在: {}", db_path)));
    }
    let conn = open_sqlite_connection(db_path)
        .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
    Ok(Arc::new(Mutex::new(conn)))
}

// ==========================================
// 表面处理危险品数据引擎 - API 层错误类型
// ==========================================
// 职责: 将导入/仓储层错误转换为调用方可读的错误
// 致命错误: 源目录不存在、数据库结构初始化失败
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 致命错误 =====
    #[error("源目录不存在: {0}")]
    SourceDirNotFound(String),

    #[error("数据库结构初始化失败: {0}")]
    SchemaBootstrapError(String),

    // ===== 调用错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ===== 数据访问错误 =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ===== 导入错误 =====
    #[error("导入失败: {0}")]
    ImportError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("检查约束违反: {}", msg))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::SourceDirNotFound(dir) => ApiError::SourceDirNotFound(dir),
            ImportError::SchemaBootstrapError(msg) => ApiError::SchemaBootstrapError(msg),
            ImportError::InvalidDigest(digest) => {
                ApiError::InvalidInput(format!("摘要格式非法: {}", digest))
            }
            ImportError::Repository(err) => ApiError::from(err),
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_import_errors_keep_their_kind() {
        let err: ApiError = ImportError::SourceDirNotFound("/nope".to_string()).into();
        assert!(matches!(err, ApiError::SourceDirNotFound(_)));

        let err: ApiError = ImportError::MissingColumns(vec!["code".to_string()]).into();
        assert!(matches!(err, ApiError::ImportError(_)));
    }

    #[test]
    fn test_lock_error_maps_to_connection_error() {
        let err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(err.to_string().contains("poisoned"));
    }
}

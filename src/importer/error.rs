// ==========================================
// 表面处理危险品数据引擎 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 传播: 单文件错误由编排器收集进报告，不中断整批导入
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 致命错误（中断整次导入）=====
    #[error("源目录不存在: {0}")]
    SourceDirNotFound(String),

    #[error("数据库结构初始化失败: {0}")]
    SchemaBootstrapError(String),

    // ===== 结构错误（单文件失败）=====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.xlsx）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("缺少必需列: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    // ===== 数据映射错误 =====
    #[error("字段缺失 (行 {row}, 字段 {field})")]
    MissingField { row: usize, field: String },

    #[error("类型转换失败 (行 {row}, 字段 {field}): {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    // ===== 外键解析错误 =====
    #[error("父记录不存在 (行 {row}): {entity} {key}")]
    MissingParent {
        row: usize,
        entity: String,
        key: String,
    },

    #[error("父记录不唯一 (行 {row}): {entity} {key} 存在于多个 program，请提供 program 列")]
    AmbiguousParent {
        row: usize,
        entity: String,
        key: String,
    },

    // ===== 摘要校验 =====
    #[error("摘要格式非法: {0}（应为 64 位十六进制）")]
    InvalidDigest(String),

    // ===== 数据库错误 =====
    #[error("数据库访问失败: {0}")]
    Repository(#[from] RepositoryError),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseQueryError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

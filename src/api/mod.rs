// ==========================================
// 表面处理危险品数据引擎 - API 层
// ==========================================
// 职责: 提供导入与查询接口，供命令行入口调用
// ==========================================

pub mod error;
pub mod ingest_api;
pub mod query_api;
mod store;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use ingest_api::IngestApi;
pub use query_api::QueryApi;

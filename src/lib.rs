// ==========================================
// 表面处理危险品数据引擎 - 核心库
// ==========================================
// 职责: 源文件导入、存储校验、表面处理代码层级还原
// 技术栈: Rust + SQLite
// 层次: domain / repository / importer / engine / api
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 源记录与报告
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 校验与层级还原
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 运行参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建库）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DriftState, IngestStatus, IssueCategory, Severity, ValidationStatus};

// 领域结构
pub use domain::{
    DriftEntry, FinishCodeLookup, FinishCodeSpecs, FinishCodeSummary, FinishCodeTree,
    IngestIssue, IngestReport, SpecCatalog, ValidationIssue, ValidationReport,
};

// 引擎
pub use engine::{FinishTreeBuilder, SpecIndex, StoreValidator};

// API
pub use api::{ApiError, ApiResult, IngestApi, QueryApi};

// ==========================================
// 系统常量
// ==========================================

/// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 系统名称
pub const APP_NAME: &str = "表面处理危险品数据引擎";

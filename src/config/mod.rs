// ==========================================
// 表面处理危险品数据引擎 - 配置层
// ==========================================
// 职责: 运行参数读取（缺省值兜底）
// 存储: config_kv 表（scope_id = 'global'）
// ==========================================

pub mod config_manager;
pub mod pipeline_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use pipeline_config_trait::{DefaultPipelineConfig, PipelineConfigReader};

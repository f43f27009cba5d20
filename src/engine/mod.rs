// ==========================================
// 表面处理危险品数据引擎 - 引擎层
// ==========================================
// 职责: 校验规则判定与层级视图组装
// 红线: Engine 不拼 SQL，数据访问经由 repository
// ==========================================

pub mod spec_index;
pub mod tree_builder;
pub mod validation_rules;
pub mod validator;

// 重导出核心引擎
pub use spec_index::SpecIndex;
pub use tree_builder::FinishTreeBuilder;
pub use validator::StoreValidator;

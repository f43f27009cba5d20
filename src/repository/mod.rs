// ==========================================
// 表面处理危险品数据引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口，屏蔽数据库细节
// 约束: 所有查询使用参数化，防止 SQL 注入
// ==========================================

pub mod error;
pub mod finish_import_repo;
pub mod finish_import_repo_impl;
pub mod finish_query_repo;
pub mod integrity_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use finish_import_repo::{FinishImportRepository, MetadataVersionEntity};
pub use finish_import_repo_impl::FinishImportRepositoryImpl;
pub use finish_query_repo::{
    ChemicalHazardRow, CompositionRow, FinishCodeHeader, FinishQueryRepository,
    LinkedMaterialRow, StepRow, StepSpecRow,
};
pub use integrity_repo::{
    ChemicalTextRow, FinishCodeCompositionRow, HazardLevelRow, IntegrityRepository,
    WeightRangeRow, WeightTotalRow,
};

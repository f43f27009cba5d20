// ==========================================
// 表面处理危险品数据引擎 - 导入 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::finish::{
    ChemicalRecord, FinishAppliedRecord, FinishCodeRow, FinishCodeStepRow, MaterialChemicalRow,
    MaterialRecord, SftMaterialLinkRow, SftStepRecord, SubstrateRecord,
};
use crate::repository::error::RepositoryResult;
use serde::{Deserialize, Serialize};

/// metadata_versions 表实体（当前态，不保留历史）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataVersionEntity {
    pub source_name: String,
    pub sha256: String,
    pub rows_loaded: i64,
    pub loaded_at: String,
}

// ==========================================
// FinishImportRepository Trait
// ==========================================
// 用途: 导入编排器的全部写入与外键查找
// 实现者: FinishImportRepositoryImpl（使用 rusqlite）
pub trait FinishImportRepository: Send + Sync {
    // ===== 外键查找（自然键 → id）=====

    /// 按 (code, program) 查找基材 id
    fn find_substrate_id(&self, code: &str, program: &str) -> RepositoryResult<Option<i64>>;

    /// 按 (code, program) 查找表面处理 id
    fn find_finish_applied_id(&self, code: &str, program: &str) -> RepositoryResult<Option<i64>>;

    /// 查找表面处理代码 id
    ///
    /// # 参数
    /// - program: Some 时精确匹配；None 时返回所有 program 下的同名代码
    fn find_finish_code_ids(
        &self,
        code: &str,
        program: Option<&str>,
    ) -> RepositoryResult<Vec<i64>>;

    /// 按 sft_code 查找步骤 id
    fn find_sft_step_id(&self, sft_code: &str) -> RepositoryResult<Option<i64>>;

    /// 按 (base_spec, variant) 查找材料 id（NULL variant 精确匹配 NULL）
    fn find_material_id(
        &self,
        base_spec: &str,
        variant: Option<&str>,
    ) -> RepositoryResult<Option<i64>>;

    /// 按 CAS 号查找化学品 id
    fn find_chemical_id_by_cas(&self, cas: &str) -> RepositoryResult<Option<i64>>;

    // ===== 批量写入（单文件单事务）=====
    //
    // 返回值: 实际写入（插入或更新）的行数
    // 出错时整个事务回滚

    fn upsert_substrates(&self, records: &[SubstrateRecord]) -> RepositoryResult<usize>;

    fn upsert_finish_applied(&self, records: &[FinishAppliedRecord]) -> RepositoryResult<usize>;

    fn upsert_finish_codes(&self, rows: &[FinishCodeRow]) -> RepositoryResult<usize>;

    fn upsert_sft_steps(&self, records: &[SftStepRecord]) -> RepositoryResult<usize>;

    /// 冲突键 (finish_code_id, sft_id)，后写入的 step_order 生效
    fn upsert_finish_code_steps(&self, rows: &[FinishCodeStepRow]) -> RepositoryResult<usize>;

    fn upsert_materials(&self, records: &[MaterialRecord]) -> RepositoryResult<usize>;

    /// 有 CAS 时按 CAS 对齐，无 CAS 时按 name 对齐
    fn upsert_chemicals(&self, records: &[ChemicalRecord]) -> RepositoryResult<usize>;

    /// 仅在完全相同的行不存在时插入
    fn insert_sft_material_links(&self, rows: &[SftMaterialLinkRow]) -> RepositoryResult<usize>;

    /// 仅在完全相同的行不存在时插入
    fn insert_material_chemicals(&self, rows: &[MaterialChemicalRow]) -> RepositoryResult<usize>;

    // ===== 数据血缘 =====

    /// 记录源文件摘要与行数（按 source_name 覆盖）
    fn record_metadata(
        &self,
        source_name: &str,
        sha256: &str,
        rows_loaded: usize,
    ) -> RepositoryResult<()>;

    /// 读取全部血缘记录（按 source_name 排序）
    fn list_metadata_versions(&self) -> RepositoryResult<Vec<MetadataVersionEntity>>;
}

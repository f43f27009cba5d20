// ==========================================
// 表面处理危险品数据引擎 - 导入 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 约束: 所有写入以 upsert 方式进行，重复导入不产生重复行
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::finish::{
    ChemicalRecord, FinishAppliedRecord, FinishCodeRow, FinishCodeStepRow, MaterialChemicalRow,
    MaterialRecord, SftMaterialLinkRow, SftStepRecord, SubstrateRecord,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::finish_import_repo::{FinishImportRepository, MetadataVersionEntity};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// FinishImportRepositoryImpl
// ==========================================
pub struct FinishImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl FinishImportRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在单事务中逐条执行写入闭包
    fn write_in_tx<T, F>(&self, items: &[T], mut write: F) -> RepositoryResult<usize>
    where
        F: FnMut(&Transaction, &T) -> rusqlite::Result<usize>,
    {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut count = 0;
        for item in items {
            count += write(&tx, item)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    fn query_optional_id<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(sql, params, |row| row.get::<_, i64>(0))
            .optional()?;
        Ok(id)
    }
}

impl FinishImportRepository for FinishImportRepositoryImpl {
    // ===== 外键查找 =====

    fn find_substrate_id(&self, code: &str, program: &str) -> RepositoryResult<Option<i64>> {
        self.query_optional_id(
            "SELECT id FROM substrates WHERE code = ?1 AND program = ?2",
            params![code, program],
        )
    }

    fn find_finish_applied_id(&self, code: &str, program: &str) -> RepositoryResult<Option<i64>> {
        self.query_optional_id(
            "SELECT id FROM finish_applied WHERE code = ?1 AND program = ?2",
            params![code, program],
        )
    }

    fn find_finish_code_ids(
        &self,
        code: &str,
        program: Option<&str>,
    ) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let ids = match program {
            Some(program) => {
                let mut stmt = conn
                    .prepare("SELECT id FROM finish_codes WHERE code = ?1 AND program = ?2 ORDER BY id")?;
                let rows = stmt.query_map(params![code, program], |row| row.get::<_, i64>(0))?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare("SELECT id FROM finish_codes WHERE code = ?1 ORDER BY id")?;
                let rows = stmt.query_map(params![code], |row| row.get::<_, i64>(0))?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(ids)
    }

    fn find_sft_step_id(&self, sft_code: &str) -> RepositoryResult<Option<i64>> {
        self.query_optional_id(
            "SELECT id FROM sft_steps WHERE sft_code = ?1",
            params![sft_code],
        )
    }

    fn find_material_id(
        &self,
        base_spec: &str,
        variant: Option<&str>,
    ) -> RepositoryResult<Option<i64>> {
        // `IS` 同时匹配 NULL = NULL 与普通等值
        self.query_optional_id(
            "SELECT id FROM materials WHERE base_spec = ?1 AND variant IS ?2",
            params![base_spec, variant],
        )
    }

    fn find_chemical_id_by_cas(&self, cas: &str) -> RepositoryResult<Option<i64>> {
        self.query_optional_id("SELECT id FROM chemicals WHERE cas = ?1", params![cas])
    }

    // ===== 批量写入 =====

    fn upsert_substrates(&self, records: &[SubstrateRecord]) -> RepositoryResult<usize> {
        self.write_in_tx(records, |tx, r| {
            tx.prepare_cached(
                r#"
                INSERT INTO substrates (code, description, source_doc, program)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(code, program) DO UPDATE SET
                    description = excluded.description,
                    source_doc = excluded.source_doc
                "#,
            )?
            .execute(params![r.code, r.description, r.source_doc, r.program])
        })
    }

    fn upsert_finish_applied(&self, records: &[FinishAppliedRecord]) -> RepositoryResult<usize> {
        self.write_in_tx(records, |tx, r| {
            tx.prepare_cached(
                r#"
                INSERT INTO finish_applied (code, description, source_doc, program, associated_specs)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(code, program) DO UPDATE SET
                    description = excluded.description,
                    source_doc = excluded.source_doc,
                    associated_specs = excluded.associated_specs
                "#,
            )?
            .execute(params![
                r.code,
                r.description,
                r.source_doc,
                r.program,
                r.associated_specs
            ])
        })
    }

    fn upsert_finish_codes(&self, rows: &[FinishCodeRow]) -> RepositoryResult<usize> {
        self.write_in_tx(rows, |tx, r| {
            tx.prepare_cached(
                r#"
                INSERT INTO finish_codes (
                    code, substrate_id, finish_applied_id, seq_id,
                    description, notes, source_doc, program, associated_specs
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(code, program) DO UPDATE SET
                    substrate_id = excluded.substrate_id,
                    finish_applied_id = excluded.finish_applied_id,
                    seq_id = excluded.seq_id,
                    description = excluded.description,
                    notes = excluded.notes,
                    source_doc = excluded.source_doc,
                    associated_specs = excluded.associated_specs
                "#,
            )?
            .execute(params![
                r.code,
                r.substrate_id,
                r.finish_applied_id,
                r.seq_id,
                r.description,
                r.notes,
                r.source_doc,
                r.program,
                r.associated_specs,
            ])
        })
    }

    fn upsert_sft_steps(&self, records: &[SftStepRecord]) -> RepositoryResult<usize> {
        self.write_in_tx(records, |tx, r| {
            tx.prepare_cached(
                r#"
                INSERT INTO sft_steps (
                    sft_code, parent_group, description, associated_specs,
                    source_doc, last_review, notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(sft_code) DO UPDATE SET
                    parent_group = excluded.parent_group,
                    description = excluded.description,
                    associated_specs = excluded.associated_specs,
                    source_doc = excluded.source_doc,
                    last_review = excluded.last_review,
                    notes = excluded.notes
                "#,
            )?
            .execute(params![
                r.sft_code,
                r.parent_group,
                r.description,
                r.associated_specs,
                r.source_doc,
                r.last_review,
                r.notes,
            ])
        })
    }

    fn upsert_finish_code_steps(&self, rows: &[FinishCodeStepRow]) -> RepositoryResult<usize> {
        self.write_in_tx(rows, |tx, r| {
            tx.prepare_cached(
                r#"
                INSERT INTO finish_code_steps (finish_code_id, sft_id, step_order)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(finish_code_id, sft_id) DO UPDATE SET
                    step_order = excluded.step_order
                "#,
            )?
            .execute(params![r.finish_code_id, r.sft_id, r.step_order])
        })
    }

    fn upsert_materials(&self, records: &[MaterialRecord]) -> RepositoryResult<usize> {
        // ON CONFLICT 无法命中 NULL variant，先查后写
        self.write_in_tx(records, |tx, r| {
            let existing: Option<i64> = tx
                .prepare_cached("SELECT id FROM materials WHERE base_spec = ?1 AND variant IS ?2")?
                .query_row(params![r.base_spec, r.variant], |row| row.get(0))
                .optional()?;

            match existing {
                Some(id) => tx
                    .prepare_cached("UPDATE materials SET description = ?1, notes = ?2 WHERE id = ?3")?
                    .execute(params![r.description, r.notes, id]),
                None => tx
                    .prepare_cached(
                        "INSERT INTO materials (base_spec, variant, description, notes) VALUES (?1, ?2, ?3, ?4)",
                    )?
                    .execute(params![r.base_spec, r.variant, r.description, r.notes]),
            }
        })
    }

    fn upsert_chemicals(&self, records: &[ChemicalRecord]) -> RepositoryResult<usize> {
        self.write_in_tx(records, |tx, r| match &r.cas {
            Some(cas) => tx
                .prepare_cached(
                    r#"
                    INSERT INTO chemicals (name, cas, hazard_flags, default_hazard_level)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(cas) DO UPDATE SET
                        name = excluded.name,
                        hazard_flags = excluded.hazard_flags,
                        default_hazard_level = excluded.default_hazard_level
                    "#,
                )?
                .execute(params![r.name, cas, r.hazard_flags, r.default_hazard_level]),
            None => {
                let existing: Option<i64> = tx
                    .prepare_cached("SELECT id FROM chemicals WHERE cas IS NULL AND name = ?1")?
                    .query_row(params![r.name], |row| row.get(0))
                    .optional()?;

                match existing {
                    Some(id) => tx
                        .prepare_cached(
                            "UPDATE chemicals SET hazard_flags = ?1, default_hazard_level = ?2 WHERE id = ?3",
                        )?
                        .execute(params![r.hazard_flags, r.default_hazard_level, id]),
                    None => tx
                        .prepare_cached(
                            "INSERT INTO chemicals (name, cas, hazard_flags, default_hazard_level) VALUES (?1, NULL, ?2, ?3)",
                        )?
                        .execute(params![r.name, r.hazard_flags, r.default_hazard_level]),
                }
            }
        })
    }

    fn insert_sft_material_links(&self, rows: &[SftMaterialLinkRow]) -> RepositoryResult<usize> {
        self.write_in_tx(rows, |tx, r| {
            tx.prepare_cached(
                r#"
                INSERT INTO sft_material_links (sft_id, material_id, note)
                SELECT ?1, ?2, ?3
                WHERE NOT EXISTS (
                    SELECT 1 FROM sft_material_links
                    WHERE sft_id = ?1 AND material_id = ?2 AND note IS ?3
                )
                "#,
            )?
            .execute(params![r.sft_id, r.material_id, r.note])
        })
    }

    fn insert_material_chemicals(&self, rows: &[MaterialChemicalRow]) -> RepositoryResult<usize> {
        self.write_in_tx(rows, |tx, r| {
            tx.prepare_cached(
                r#"
                INSERT INTO material_chemicals (material_id, chemical_id, pct_wt_low, pct_wt_high, notes)
                SELECT ?1, ?2, ?3, ?4, ?5
                WHERE NOT EXISTS (
                    SELECT 1 FROM material_chemicals
                    WHERE material_id = ?1 AND chemical_id = ?2
                      AND pct_wt_low IS ?3 AND pct_wt_high IS ?4 AND notes IS ?5
                )
                "#,
            )?
            .execute(params![
                r.material_id,
                r.chemical_id,
                r.pct_wt_low,
                r.pct_wt_high,
                r.notes
            ])
        })
    }

    // ===== 数据血缘 =====

    fn record_metadata(
        &self,
        source_name: &str,
        sha256: &str,
        rows_loaded: usize,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO metadata_versions (source_name, sha256, rows_loaded, loaded_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(source_name) DO UPDATE SET
                sha256 = excluded.sha256,
                rows_loaded = excluded.rows_loaded,
                loaded_at = excluded.loaded_at
            "#,
            params![source_name, sha256, rows_loaded as i64, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn list_metadata_versions(&self) -> RepositoryResult<Vec<MetadataVersionEntity>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT source_name, sha256, rows_loaded, loaded_at FROM metadata_versions ORDER BY source_name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(MetadataVersionEntity {
                source_name: row.get(0)?,
                sha256: row.get(1)?,
                rows_loaded: row.get(2)?,
                loaded_at: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

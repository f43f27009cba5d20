// ==========================================
// 表面处理危险品数据引擎 - 层级查询 Repository
// ==========================================
// 职责: 为树重建与规范交叉引用提供只读查询
// 红线: 排序规则在 SQL 中确定，上层不再重排
// ==========================================

use crate::domain::FinishCodeSummary;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::finish_import_repo::MetadataVersionEntity;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

/// 表面处理代码头部（含基材 / 表面处理信息）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishCodeHeader {
    pub id: i64,
    pub code: String,
    pub seq_id: i64,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub source_doc: Option<String>,
    pub program: String,
    pub associated_specs: Option<String>,
    pub substrate_code: String,
    pub substrate_description: String,
    pub finish_applied_code: String,
    pub finish_applied_description: String,
    pub finish_applied_specs: Option<String>,
}

/// 代码下的工序步骤行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRow {
    pub sft_id: i64,
    pub sft_code: String,
    pub step_order: i64,
    pub parent_group: Option<String>,
    pub description: String,
    pub associated_specs: Option<String>,
    pub source_doc: Option<String>,
    pub last_review: Option<String>,
    pub notes: Option<String>,
}

/// 步骤关联的材料行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedMaterialRow {
    pub material_id: i64,
    pub base_spec: String,
    pub variant: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub link_note: Option<String>,
}

/// 材料成分行（hazard_flags 为原始文本）
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionRow {
    pub name: String,
    pub cas: Option<String>,
    pub pct_wt_low: Option<f64>,
    pub pct_wt_high: Option<f64>,
    pub hazard_flags: Option<String>,
    pub default_hazard_level: Option<i64>,
    pub notes: Option<String>,
}

/// 步骤规范字段（全局交叉引用用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSpecRow {
    pub sft_id: i64,
    pub sft_code: String,
    pub associated_specs: String,
}

/// 化学品危险信息行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChemicalHazardRow {
    pub name: String,
    pub cas: Option<String>,
    pub hazard_flags: Option<String>,
    pub default_hazard_level: Option<i64>,
}

// ==========================================
// FinishQueryRepository
// ==========================================
pub struct FinishQueryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FinishQueryRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按代码查找头部；同名代码跨 program 时取 program 字典序最小者
    pub fn find_finish_code_header(&self, code: &str) -> RepositoryResult<Option<FinishCodeHeader>> {
        let conn = self.get_conn()?;
        let header = conn
            .query_row(
                r#"
                SELECT fc.id, fc.code, fc.seq_id, fc.description, fc.notes, fc.source_doc,
                       fc.program, fc.associated_specs,
                       s.code, s.description,
                       fa.code, fa.description, fa.associated_specs
                FROM finish_codes fc
                JOIN substrates s ON s.id = fc.substrate_id
                JOIN finish_applied fa ON fa.id = fc.finish_applied_id
                WHERE fc.code = ?1
                ORDER BY fc.program, fc.id
                LIMIT 1
                "#,
                params![code],
                |row| {
                    Ok(FinishCodeHeader {
                        id: row.get(0)?,
                        code: row.get(1)?,
                        seq_id: row.get(2)?,
                        description: row.get(3)?,
                        notes: row.get(4)?,
                        source_doc: row.get(5)?,
                        program: row.get(6)?,
                        associated_specs: row.get(7)?,
                        substrate_code: row.get(8)?,
                        substrate_description: row.get(9)?,
                        finish_applied_code: row.get(10)?,
                        finish_applied_description: row.get(11)?,
                        finish_applied_specs: row.get(12)?,
                    })
                },
            )
            .optional()?;
        Ok(header)
    }

    /// 字典序样例代码（未找到时提示用）
    pub fn list_sample_codes(&self, limit: usize) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT code FROM finish_codes ORDER BY code LIMIT ?1")?;
        let rows = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_steps_for_finish_code(&self, finish_code_id: i64) -> RepositoryResult<Vec<StepRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.id, s.sft_code, fcs.step_order, s.parent_group, s.description,
                   s.associated_specs, s.source_doc, s.last_review, s.notes
            FROM finish_code_steps fcs
            JOIN sft_steps s ON s.id = fcs.sft_id
            WHERE fcs.finish_code_id = ?1
            ORDER BY fcs.step_order, fcs.id
            "#,
        )?;
        let rows = stmt.query_map(params![finish_code_id], |row| {
            Ok(StepRow {
                sft_id: row.get(0)?,
                sft_code: row.get(1)?,
                step_order: row.get(2)?,
                parent_group: row.get(3)?,
                description: row.get(4)?,
                associated_specs: row.get(5)?,
                source_doc: row.get(6)?,
                last_review: row.get(7)?,
                notes: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_materials_for_step(&self, sft_id: i64) -> RepositoryResult<Vec<LinkedMaterialRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT m.id, m.base_spec, m.variant, m.description, m.notes, sml.note
            FROM sft_material_links sml
            JOIN materials m ON m.id = sml.material_id
            WHERE sml.sft_id = ?1
            ORDER BY sml.id
            "#,
        )?;
        let rows = stmt.query_map(params![sft_id], |row| {
            Ok(LinkedMaterialRow {
                material_id: row.get(0)?,
                base_spec: row.get(1)?,
                variant: row.get(2)?,
                description: row.get(3)?,
                notes: row.get(4)?,
                link_note: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 成分按危险等级降序、名称升序
    pub fn list_chemicals_for_material(&self, material_id: i64) -> RepositoryResult<Vec<CompositionRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.name, c.cas, mc.pct_wt_low, mc.pct_wt_high,
                   c.hazard_flags, c.default_hazard_level, mc.notes
            FROM material_chemicals mc
            JOIN chemicals c ON c.id = mc.chemical_id
            WHERE mc.material_id = ?1
            ORDER BY c.default_hazard_level DESC, c.name ASC, mc.id
            "#,
        )?;
        let rows = stmt.query_map(params![material_id], |row| {
            Ok(CompositionRow {
                name: row.get(0)?,
                cas: row.get(1)?,
                pct_wt_low: row.get(2)?,
                pct_wt_high: row.get(3)?,
                hazard_flags: row.get(4)?,
                default_hazard_level: row.get(5)?,
                notes: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_lineage(&self) -> RepositoryResult<Vec<MetadataVersionEntity>> {
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

    pub fn list_finish_code_summaries(&self) -> RepositoryResult<Vec<FinishCodeSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT fc.code, fc.description, s.description, fa.description,
                   fc.seq_id, fc.source_doc, fc.program
            FROM finish_codes fc
            JOIN substrates s ON s.id = fc.substrate_id
            JOIN finish_applied fa ON fa.id = fc.finish_applied_id
            ORDER BY fc.code, fc.program
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FinishCodeSummary {
                code: row.get(0)?,
                description: row.get(1)?,
                substrate: row.get(2)?,
                finish_applied: row.get(3)?,
                seq_id: row.get(4)?,
                source_doc: row.get(5)?,
                program: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 所有带规范字段的步骤
    pub fn list_steps_with_specs(&self) -> RepositoryResult<Vec<StepSpecRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, sft_code, associated_specs
            FROM sft_steps
            WHERE associated_specs IS NOT NULL AND TRIM(associated_specs) <> ''
            ORDER BY sft_code
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(StepSpecRow {
                sft_id: row.get(0)?,
                sft_code: row.get(1)?,
                associated_specs: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// (sft_id, finish_code) 关联对
    pub fn list_finish_code_step_pairs(&self) -> RepositoryResult<Vec<(i64, String)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT fcs.sft_id, fc.code
            FROM finish_code_steps fcs
            JOIN finish_codes fc ON fc.id = fcs.finish_code_id
            ORDER BY fc.code
            "#,
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_chemicals_min_hazard(&self, min_level: i64) -> RepositoryResult<Vec<ChemicalHazardRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT name, cas, hazard_flags, default_hazard_level
            FROM chemicals
            WHERE default_hazard_level >= ?1
            ORDER BY default_hazard_level DESC, name ASC
            "#,
        )?;
        let rows = stmt.query_map(params![min_level], |row| {
            Ok(ChemicalHazardRow {
                name: row.get(0)?,
                cas: row.get(1)?,
                hazard_flags: row.get(2)?,
                default_hazard_level: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{bootstrap_schema, configure_sqlite_connection};

    fn seeded_repo() -> FinishQueryRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        bootstrap_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO substrates (id, code, description, program) VALUES (1, 'B', 'Aluminum', '');
            INSERT INTO finish_applied (id, code, description, program) VALUES (1, 'P', 'Anodize', '');
            INSERT INTO finish_codes (id, code, substrate_id, finish_applied_id, seq_id, program)
                VALUES (1, 'BP01', 1, 1, 1, ''), (2, 'BP02', 1, 1, 2, '');
            INSERT INTO sft_steps (id, sft_code, description) VALUES (1, 'SFT0001', 'Clean'), (2, 'SFT0002', 'Seal');
            INSERT INTO finish_code_steps (finish_code_id, sft_id, step_order) VALUES (1, 2, 2), (1, 1, 1);
            INSERT INTO materials (id, base_spec) VALUES (1, 'M100');
            INSERT INTO chemicals (id, name, cas, default_hazard_level) VALUES
                (1, 'Zeta', '1111-11-1', 2), (2, 'Alpha', '2222-22-2', 2), (3, 'Ethanol', '64-17-5', 4);
            INSERT INTO material_chemicals (material_id, chemical_id) VALUES (1, 1), (1, 2), (1, 3);
            "#,
        )
        .unwrap();
        FinishQueryRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_steps_ordered_by_step_order() {
        let repo = seeded_repo();
        let steps = repo.list_steps_for_finish_code(1).unwrap();
        let codes: Vec<_> = steps.iter().map(|s| s.sft_code.as_str()).collect();
        assert_eq!(codes, vec!["SFT0001", "SFT0002"]);
    }

    #[test]
    fn test_chemicals_ordered_by_hazard_then_name() {
        let repo = seeded_repo();
        let chems = repo.list_chemicals_for_material(1).unwrap();
        let names: Vec<_> = chems.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ethanol", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_sample_codes_sorted_and_limited() {
        let repo = seeded_repo();
        assert_eq!(repo.list_sample_codes(1).unwrap(), vec!["BP01".to_string()]);
        assert_eq!(repo.list_sample_codes(10).unwrap().len(), 2);
        assert!(repo.find_finish_code_header("ZZ99").unwrap().is_none());
    }
}

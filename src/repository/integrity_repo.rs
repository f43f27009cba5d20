// ==========================================
// 表面处理危险品数据引擎 - 完整性探查 Repository
// ==========================================
// 职责: 为校验器提供只读探查查询（孤儿计数 / 空值计数 / 格式候选行）
// 红线: 只读，不修改任何数据；判定规则在 engine::validator 中
// ==========================================
// 约束: 表名/列名来自静态规则表，拼接前仍做标识符白名单检查
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

/// 化学品文本字段探查结果（cas / hazard_flags）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChemicalTextRow {
    pub chemical_id: i64,
    pub name: String,
    pub value: String,
}

/// 危险等级越界行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HazardLevelRow {
    pub chemical_id: i64,
    pub name: String,
    pub level: i64,
}

/// 重量百分比区间倒置行
#[derive(Debug, Clone, PartialEq)]
pub struct WeightRangeRow {
    pub material_chemical_id: i64,
    pub base_spec: Option<String>,
    pub variant: Option<String>,
    pub chemical_name: Option<String>,
    pub pct_wt_low: f64,
    pub pct_wt_high: f64,
}

/// 材料最大重量百分比合计
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTotalRow {
    pub material_id: i64,
    pub base_spec: String,
    pub variant: Option<String>,
    pub total_pct_wt_high: f64,
}

/// 表面处理代码组成（代码 + 父级代码 + 序号）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishCodeCompositionRow {
    pub code: String,
    pub program: String,
    pub substrate_code: String,
    pub finish_applied_code: String,
    pub seq_id: i64,
}

// ==========================================
// IntegrityRepository
// ==========================================
pub struct IntegrityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl IntegrityRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 结构探查 =====

    pub fn table_exists(&self, table: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn column_exists(&self, table: &str, column: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
            params![table, column],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ===== 聚合计数 =====

    /// 统计子表中非空、但在父表中不存在的外键值行数
    pub fn count_orphans(
        &self,
        child_table: &str,
        child_column: &str,
        parent_table: &str,
        parent_column: &str,
    ) -> RepositoryResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {ct} WHERE {cc} IS NOT NULL \
             AND {cc} NOT IN (SELECT {pc} FROM {pt} WHERE {pc} IS NOT NULL)",
            ct = quote_ident(child_table)?,
            cc = quote_ident(child_column)?,
            pt = quote_ident(parent_table)?,
            pc = quote_ident(parent_column)?,
        );
        let conn = self.get_conn()?;
        let count = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn count_nulls(&self, table: &str, column: &str) -> RepositoryResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {t} WHERE {c} IS NULL",
            t = quote_ident(table)?,
            c = quote_ident(column)?,
        );
        let conn = self.get_conn()?;
        let count = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    // ===== 格式候选行 =====

    pub fn list_cas_values(&self) -> RepositoryResult<Vec<ChemicalTextRow>> {
        self.list_chemical_text(
            "SELECT id, name, cas FROM chemicals WHERE cas IS NOT NULL AND cas <> '' ORDER BY id",
        )
    }

    pub fn list_hazard_flags(&self) -> RepositoryResult<Vec<ChemicalTextRow>> {
        self.list_chemical_text(
            "SELECT id, name, hazard_flags FROM chemicals \
             WHERE hazard_flags IS NOT NULL AND TRIM(hazard_flags) <> '' ORDER BY id",
        )
    }

    fn list_chemical_text(&self, sql: &str) -> RepositoryResult<Vec<ChemicalTextRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(ChemicalTextRow {
                chemical_id: row.get(0)?,
                name: row.get(1)?,
                value: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_hazard_levels_out_of_range(&self) -> RepositoryResult<Vec<HazardLevelRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, default_hazard_level
            FROM chemicals
            WHERE default_hazard_level IS NOT NULL
              AND (default_hazard_level < 1 OR default_hazard_level > 5)
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(HazardLevelRow {
                chemical_id: row.get(0)?,
                name: row.get(1)?,
                level: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_inverted_weight_ranges(&self) -> RepositoryResult<Vec<WeightRangeRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT mc.id, m.base_spec, m.variant, c.name, mc.pct_wt_low, mc.pct_wt_high
            FROM material_chemicals mc
            LEFT JOIN materials m ON m.id = mc.material_id
            LEFT JOIN chemicals c ON c.id = mc.chemical_id
            WHERE mc.pct_wt_low IS NOT NULL
              AND mc.pct_wt_high IS NOT NULL
              AND mc.pct_wt_low > mc.pct_wt_high
            ORDER BY mc.id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(WeightRangeRow {
                material_chemical_id: row.get(0)?,
                base_spec: row.get(1)?,
                variant: row.get(2)?,
                chemical_name: row.get(3)?,
                pct_wt_low: row.get(4)?,
                pct_wt_high: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 每种材料 pct_wt_high 之和超过阈值的记录
    pub fn list_material_weight_totals_above(
        &self,
        threshold: f64,
    ) -> RepositoryResult<Vec<WeightTotalRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT m.id, m.base_spec, m.variant, SUM(mc.pct_wt_high) AS total
            FROM material_chemicals mc
            JOIN materials m ON m.id = mc.material_id
            WHERE mc.pct_wt_high IS NOT NULL
            GROUP BY m.id, m.base_spec, m.variant
            HAVING total > ?1
            ORDER BY m.base_spec, m.variant
            "#,
        )?;
        let rows = stmt.query_map(params![threshold], |row| {
            Ok(WeightTotalRow {
                material_id: row.get(0)?,
                base_spec: row.get(1)?,
                variant: row.get(2)?,
                total_pct_wt_high: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_finish_code_compositions(&self) -> RepositoryResult<Vec<FinishCodeCompositionRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT fc.code, fc.program, s.code, fa.code, fc.seq_id
            FROM finish_codes fc
            JOIN substrates s ON s.id = fc.substrate_id
            JOIN finish_applied fa ON fa.id = fc.finish_applied_id
            ORDER BY fc.code, fc.program
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FinishCodeCompositionRow {
                code: row.get(0)?,
                program: row.get(1)?,
                substrate_code: row.get(2)?,
                finish_applied_code: row.get(3)?,
                seq_id: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// 标识符白名单检查后加双引号
fn quote_ident(name: &str) -> RepositoryResult<String> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(RepositoryError::InternalError(format!(
            "非法标识符: {}",
            name
        )));
    }
    Ok(format!("\"{}\"", name))
}

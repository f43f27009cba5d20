// ==========================================
// 表面处理危险品数据引擎 - 字段映射器
// ==========================================
// 职责: 原始行 → 强类型源记录（列存在性一次性检查，逐字段类型转换）
// 约束: 必需字段为空视为字段缺失，整个文件失败
// ==========================================

use crate::domain::finish::{
    ChemicalRecord, FinishAppliedRecord, FinishCodeRecord, FinishCodeStepRecord,
    MaterialChemicalRecord, MaterialRecord, SftMaterialLinkRecord, SftStepRecord, SubstrateRecord,
};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::finish_importer_trait::{RawRow, RawTable};
use crate::importer::source_files::SourceKind;

/// FinishCode 描述列的别名
const FINISH_CODE_DESCRIPTION_ALIASES: [&str; 2] = ["description", "finish_code_description"];

pub struct FieldMapper {
    cleaner: DataCleaner,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMapper {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 检查必需列是否齐全
    pub fn check_required_columns(&self, kind: SourceKind, table: &RawTable) -> ImportResult<()> {
        let missing: Vec<String> = kind
            .required_columns()
            .iter()
            .filter(|col| !table.has_column(col))
            .map(|col| col.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingColumns(missing))
        }
    }

    // ===== 字段提取 =====

    fn required(&self, row: &RawRow, field: &str) -> ImportResult<String> {
        self.cleaner
            .normalize_null(row.get(field))
            .ok_or_else(|| ImportError::MissingField {
                row: row.row_number,
                field: field.to_string(),
            })
    }

    fn optional(&self, row: &RawRow, field: &str) -> Option<String> {
        self.cleaner.normalize_null(row.get(field))
    }

    fn program(&self, row: &RawRow) -> String {
        self.cleaner.normalize_program(row.get("program"))
    }

    // ===== 实体映射 =====

    pub fn map_substrate(&self, row: &RawRow) -> ImportResult<SubstrateRecord> {
        Ok(SubstrateRecord {
            code: self.required(row, "code")?,
            description: self.required(row, "description")?,
            source_doc: self.optional(row, "source_doc"),
            program: self.program(row),
            row_number: row.row_number,
        })
    }

    pub fn map_finish_applied(&self, row: &RawRow) -> ImportResult<FinishAppliedRecord> {
        Ok(FinishAppliedRecord {
            code: self.required(row, "code")?,
            description: self.required(row, "description")?,
            source_doc: self.optional(row, "source_doc"),
            program: self.program(row),
            associated_specs: self.optional(row, "associated_specs"),
            row_number: row.row_number,
        })
    }

    /// seq_id 非数值时降级为 0，警告追加到 warnings
    pub fn map_finish_code(
        &self,
        row: &RawRow,
        warnings: &mut Vec<String>,
    ) -> ImportResult<FinishCodeRecord> {
        let (seq_id, seq_warning) = self.cleaner.parse_seq_id(row.get("seq_id"), row.row_number);
        warnings.extend(seq_warning);

        let description = FINISH_CODE_DESCRIPTION_ALIASES
            .iter()
            .find_map(|alias| self.optional(row, alias));

        Ok(FinishCodeRecord {
            finish_code: self.required(row, "finish_code")?,
            substrate_code: self.required(row, "substrate_code")?,
            finish_applied_code: self.required(row, "finish_applied_code")?,
            seq_id,
            description,
            notes: self.optional(row, "notes"),
            source_doc: self.optional(row, "source_doc"),
            program: self.program(row),
            associated_specs: self.optional(row, "associated_specs"),
            sft_steps: self.optional(row, "sft_steps"),
            row_number: row.row_number,
        })
    }

    pub fn map_sft_step(&self, row: &RawRow) -> ImportResult<SftStepRecord> {
        Ok(SftStepRecord {
            sft_code: self.required(row, "sft_code")?,
            parent_group: self.optional(row, "parent_group"),
            description: self.required(row, "description")?,
            associated_specs: self.optional(row, "associated_specs"),
            source_doc: self.optional(row, "source_doc"),
            last_review: self.optional(row, "last_review"),
            notes: self.optional(row, "notes"),
            row_number: row.row_number,
        })
    }

    /// program 列不存在时为 None（按代码全局查找）
    pub fn map_finish_code_step(&self, row: &RawRow, has_program: bool) -> ImportResult<FinishCodeStepRecord> {
        let step_order = self
            .cleaner
            .parse_i64(row.get("step_order"), "step_order", row.row_number)?
            .ok_or_else(|| ImportError::MissingField {
                row: row.row_number,
                field: "step_order".to_string(),
            })?;

        Ok(FinishCodeStepRecord {
            finish_code: self.required(row, "finish_code")?,
            sft_code: self.required(row, "sft_code")?,
            step_order,
            program: has_program.then(|| self.program(row)),
            row_number: row.row_number,
        })
    }

    pub fn map_material(&self, row: &RawRow) -> ImportResult<MaterialRecord> {
        Ok(MaterialRecord {
            base_spec: self.required(row, "base_spec")?,
            variant: self.optional(row, "variant"),
            description: self.optional(row, "description"),
            notes: self.optional(row, "notes"),
            row_number: row.row_number,
        })
    }

    /// hazard_flags 畸形时原样保留，警告追加到 warnings
    pub fn map_chemical(&self, row: &RawRow, warnings: &mut Vec<String>) -> ImportResult<ChemicalRecord> {
        let name = self.required(row, "name")?;
        let hazard_flags = self.optional(row, "hazard_flags");
        if !self.cleaner.is_well_formed_json(hazard_flags.as_deref()) {
            warnings.push(format!(
                "行 {}: 化学品 {} 的 hazard_flags 不是合法 JSON，已原样保存",
                row.row_number, name
            ));
        }

        Ok(ChemicalRecord {
            cas: self.optional(row, "cas"),
            hazard_flags,
            default_hazard_level: self.cleaner.parse_i64(
                row.get("default_hazard_level"),
                "default_hazard_level",
                row.row_number,
            )?,
            name,
            row_number: row.row_number,
        })
    }

    pub fn map_sft_material_link(&self, row: &RawRow) -> ImportResult<SftMaterialLinkRecord> {
        Ok(SftMaterialLinkRecord {
            sft_code: self.required(row, "sft_code")?,
            base_spec: self.required(row, "base_spec")?,
            variant: self.optional(row, "variant"),
            note: self.optional(row, "note"),
            row_number: row.row_number,
        })
    }

    pub fn map_material_chemical(&self, row: &RawRow) -> ImportResult<MaterialChemicalRecord> {
        Ok(MaterialChemicalRecord {
            base_spec: self.required(row, "base_spec")?,
            variant: self.optional(row, "variant"),
            chemical_name: self.optional(row, "chemical_name"),
            cas: self.required(row, "cas")?,
            pct_wt_low: self
                .cleaner
                .parse_f64(row.get("pct_wt_low"), "pct_wt_low", row.row_number)?,
            pct_wt_high: self
                .cleaner
                .parse_f64(row.get("pct_wt_high"), "pct_wt_high", row.row_number)?,
            notes: self.optional(row, "notes"),
            row_number: row.row_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        RawRow {
            row_number: 2,
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_check_required_columns_lists_missing() {
        let mapper = FieldMapper::new();
        let table = RawTable {
            headers: vec!["finish_code".to_string(), "seq_id".to_string()],
            rows: Vec::new(),
        };
        let err = mapper
            .check_required_columns(SourceKind::FinishCode, &table)
            .unwrap_err();
        match err {
            ImportError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["substrate_code", "finish_applied_code"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_map_finish_code_description_alias_and_seq_fallback() {
        let mapper = FieldMapper::new();
        let mut warnings = Vec::new();
        let record = mapper
            .map_finish_code(
                &row(&[
                    ("finish_code", "BP01"),
                    ("substrate_code", "B"),
                    ("finish_applied_code", "P"),
                    ("seq_id", "x"),
                    ("finish_code_description", "Anodized aluminum"),
                ]),
                &mut warnings,
            )
            .unwrap();

        assert_eq!(record.seq_id, 0);
        assert_eq!(record.description.as_deref(), Some("Anodized aluminum"));
        assert_eq!(record.program, "");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_map_chemical_keeps_malformed_flags() {
        let mapper = FieldMapper::new();
        let mut warnings = Vec::new();
        let record = mapper
            .map_chemical(
                &row(&[("name", "Ethanol"), ("cas", "64-17-5"), ("hazard_flags", "{bad")]),
                &mut warnings,
            )
            .unwrap();
        assert_eq!(record.hazard_flags.as_deref(), Some("{bad"));
        assert_eq!(record.default_hazard_level, None);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_map_material_chemical_rejects_bad_number() {
        let mapper = FieldMapper::new();
        let err = mapper
            .map_material_chemical(&row(&[
                ("base_spec", "M100"),
                ("cas", "64-17-5"),
                ("pct_wt_low", "ninety"),
            ]))
            .unwrap_err();
        assert!(matches!(err, ImportError::TypeConversionError { row: 2, .. }));
    }
}

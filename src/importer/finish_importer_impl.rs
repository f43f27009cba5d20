// ==========================================
// 表面处理危险品数据引擎 - 导入编排器实现
// ==========================================
// 职责: 按依赖顺序加载九类源文件，记录血缘，执行校验，派生状态
// 流程: 摘要 → 解析 → 列检查 → 映射 → 外键解析 → 单事务落库 → 血缘
// ==========================================
// 容错: 单文件失败收集进报告，继续处理其余文件
// 致命: 仅源目录不存在（schema 初始化在 api 层完成）
// ==========================================

use crate::domain::finish::{
    FinishCodeRow, FinishCodeStepRow, MaterialChemicalRow, SftMaterialLinkRow,
};
use crate::domain::{IngestIssue, IngestReport, IngestStatus, LoadedFile};
use crate::engine::validator::StoreValidator;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::finish_importer_trait::{FileParser, FinishImporter, RawTable};
use crate::importer::hashing::compute_sha256;
use crate::importer::source_files::{SourceKind, LOAD_ORDER};
use crate::repository::FinishImportRepository;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 单文件加载结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileLoadOutcome {
    pub rows: usize,
    pub warnings: Vec<String>,
}

/// FinishCode 行内嵌的步骤列表（待 ProcessStep 加载后落库）
#[derive(Debug, Clone, PartialEq, Eq)]
struct EmbeddedSteps {
    finish_code: String,
    program: String,
    sft_codes: Vec<String>,
    row_number: usize,
}

/// 单次导入运行的累积状态
#[derive(Default)]
struct RunState {
    loaded_files: BTreeMap<String, LoadedFile>,
    issues: Vec<IngestIssue>,
    failed_files: usize,
    pending_embedded: Vec<EmbeddedSteps>,
    embedded_source: Option<String>,
}

impl RunState {
    fn fail(&mut self, file: &str, err: &ImportError) {
        error!(file = file, error = %err, "源文件加载失败");
        self.failed_files += 1;
        self.issues.push(IngestIssue::error(file, err.to_string()));
    }

    fn warn_all(&mut self, file: &str, warnings: Vec<String>) {
        for w in warnings {
            warn!(file = file, warning = %w, "源文件数据降级");
            self.issues.push(IngestIssue::warning(file, w));
        }
    }
}

fn missing_parent(row: usize, entity: &str, key: String) -> ImportError {
    ImportError::MissingParent {
        row,
        entity: entity.to_string(),
        key,
    }
}

fn scoped_key(code: &str, program: &str) -> String {
    if program.is_empty() {
        code.to_string()
    } else {
        format!("{} (program '{}')", code, program)
    }
}

fn material_key(base_spec: &str, variant: Option<&str>) -> String {
    match variant {
        Some(v) => format!("{} / {}", base_spec, v),
        None => base_spec.to_string(),
    }
}

// ==========================================
// FinishImporterImpl - 导入编排器
// ==========================================
pub struct FinishImporterImpl<R>
where
    R: FinishImportRepository,
{
    // 数据访问层
    import_repo: R,

    // 导入后校验
    validator: StoreValidator,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    field_mapper: FieldMapper,
    data_cleaner: DataCleaner,
}

impl<R> FinishImporterImpl<R>
where
    R: FinishImportRepository,
{
    pub fn new(import_repo: R, validator: StoreValidator) -> Self {
        Self {
            import_repo,
            validator,
            file_parser: Box::new(UniversalFileParser),
            field_mapper: FieldMapper::new(),
            data_cleaner: DataCleaner,
        }
    }

    // ==========================================
    // 单文件加载
    // ==========================================

    fn load_file(
        &self,
        kind: SourceKind,
        path: &Path,
        state: &mut RunState,
    ) -> ImportResult<FileLoadOutcome> {
        let table = self.file_parser.parse_table(path)?;
        self.field_mapper.check_required_columns(kind, &table)?;
        debug!(file = %kind, rows = table.rows.len(), "文件解析完成");

        match kind {
            SourceKind::Substrate => self.load_substrates(&table),
            SourceKind::FinishApplied => self.load_finish_applied(&table),
            SourceKind::FinishCode => self.load_finish_codes(&table, state),
            SourceKind::ProcessStep => self.load_sft_steps(&table),
            SourceKind::FinishCodeStep => self.load_finish_code_steps(&table),
            SourceKind::Material => self.load_materials(&table),
            SourceKind::Chemical => self.load_chemicals(&table),
            SourceKind::SftMaterialLink => self.load_sft_material_links(&table),
            SourceKind::MaterialChemical => self.load_material_chemicals(&table),
        }
    }

    fn load_substrates(&self, table: &RawTable) -> ImportResult<FileLoadOutcome> {
        let records = table
            .rows
            .iter()
            .map(|row| self.field_mapper.map_substrate(row))
            .collect::<ImportResult<Vec<_>>>()?;
        self.import_repo.upsert_substrates(&records)?;
        Ok(FileLoadOutcome {
            rows: records.len(),
            warnings: Vec::new(),
        })
    }

    fn load_finish_applied(&self, table: &RawTable) -> ImportResult<FileLoadOutcome> {
        let records = table
            .rows
            .iter()
            .map(|row| self.field_mapper.map_finish_applied(row))
            .collect::<ImportResult<Vec<_>>>()?;
        self.import_repo.upsert_finish_applied(&records)?;
        Ok(FileLoadOutcome {
            rows: records.len(),
            warnings: Vec::new(),
        })
    }

    fn load_finish_codes(&self, table: &RawTable, state: &mut RunState) -> ImportResult<FileLoadOutcome> {
        let mut warnings = Vec::new();
        let mut rows = Vec::with_capacity(table.rows.len());
        let mut embedded = Vec::new();

        for raw in &table.rows {
            let record = self.field_mapper.map_finish_code(raw, &mut warnings)?;

            let substrate_id = self
                .import_repo
                .find_substrate_id(&record.substrate_code, &record.program)?
                .ok_or_else(|| {
                    missing_parent(
                        record.row_number,
                        "substrate",
                        scoped_key(&record.substrate_code, &record.program),
                    )
                })?;
            let finish_applied_id = self
                .import_repo
                .find_finish_applied_id(&record.finish_applied_code, &record.program)?
                .ok_or_else(|| {
                    missing_parent(
                        record.row_number,
                        "finish_applied",
                        scoped_key(&record.finish_applied_code, &record.program),
                    )
                })?;

            let sft_codes = self
                .data_cleaner
                .parse_embedded_step_list(record.sft_steps.as_deref());
            if !sft_codes.is_empty() {
                embedded.push(EmbeddedSteps {
                    finish_code: record.finish_code.clone(),
                    program: record.program.clone(),
                    sft_codes,
                    row_number: record.row_number,
                });
            }

            rows.push(FinishCodeRow {
                code: record.finish_code,
                substrate_id,
                finish_applied_id,
                seq_id: record.seq_id,
                description: record.description,
                notes: record.notes,
                source_doc: record.source_doc,
                program: record.program,
                associated_specs: record.associated_specs,
            });
        }

        self.import_repo.upsert_finish_codes(&rows)?;

        // 落库成功后才登记内嵌步骤
        state.pending_embedded.extend(embedded);
        Ok(FileLoadOutcome {
            rows: rows.len(),
            warnings,
        })
    }

    fn load_sft_steps(&self, table: &RawTable) -> ImportResult<FileLoadOutcome> {
        let records = table
            .rows
            .iter()
            .map(|row| self.field_mapper.map_sft_step(row))
            .collect::<ImportResult<Vec<_>>>()?;
        self.import_repo.upsert_sft_steps(&records)?;
        Ok(FileLoadOutcome {
            rows: records.len(),
            warnings: Vec::new(),
        })
    }

    /// 按代码查找唯一的 finish_code id
    fn resolve_finish_code(&self, code: &str, program: Option<&str>, row: usize) -> ImportResult<i64> {
        let ids = self.import_repo.find_finish_code_ids(code, program)?;
        match ids.as_slice() {
            [id] => Ok(*id),
            [] => Err(missing_parent(
                row,
                "finish_code",
                scoped_key(code, program.unwrap_or_default()),
            )),
            _ => Err(ImportError::AmbiguousParent {
                row,
                entity: "finish_code".to_string(),
                key: code.to_string(),
            }),
        }
    }

    fn load_finish_code_steps(&self, table: &RawTable) -> ImportResult<FileLoadOutcome> {
        let has_program = table.has_column("program");
        let mut rows = Vec::with_capacity(table.rows.len());

        for raw in &table.rows {
            let record = self.field_mapper.map_finish_code_step(raw, has_program)?;
            if record.step_order <= 0 {
                return Err(ImportError::TypeConversionError {
                    row: record.row_number,
                    field: "step_order".to_string(),
                    message: format!("step_order 必须为正整数: {}", record.step_order),
                });
            }

            let finish_code_id = self.resolve_finish_code(
                &record.finish_code,
                record.program.as_deref(),
                record.row_number,
            )?;
            let sft_id = self
                .import_repo
                .find_sft_step_id(&record.sft_code)?
                .ok_or_else(|| missing_parent(record.row_number, "sft_step", record.sft_code.clone()))?;

            rows.push(FinishCodeStepRow {
                finish_code_id,
                sft_id,
                step_order: record.step_order,
            });
        }

        self.import_repo.upsert_finish_code_steps(&rows)?;
        Ok(FileLoadOutcome {
            rows: rows.len(),
            warnings: Vec::new(),
        })
    }

    fn load_materials(&self, table: &RawTable) -> ImportResult<FileLoadOutcome> {
        let records = table
            .rows
            .iter()
            .map(|row| self.field_mapper.map_material(row))
            .collect::<ImportResult<Vec<_>>>()?;
        self.import_repo.upsert_materials(&records)?;
        Ok(FileLoadOutcome {
            rows: records.len(),
            warnings: Vec::new(),
        })
    }

    fn load_chemicals(&self, table: &RawTable) -> ImportResult<FileLoadOutcome> {
        let mut warnings = Vec::new();
        let records = table
            .rows
            .iter()
            .map(|row| self.field_mapper.map_chemical(row, &mut warnings))
            .collect::<ImportResult<Vec<_>>>()?;
        self.import_repo.upsert_chemicals(&records)?;
        Ok(FileLoadOutcome {
            rows: records.len(),
            warnings,
        })
    }

    fn load_sft_material_links(&self, table: &RawTable) -> ImportResult<FileLoadOutcome> {
        let mut rows = Vec::with_capacity(table.rows.len());

        for raw in &table.rows {
            let record = self.field_mapper.map_sft_material_link(raw)?;
            let sft_id = self
                .import_repo
                .find_sft_step_id(&record.sft_code)?
                .ok_or_else(|| missing_parent(record.row_number, "sft_step", record.sft_code.clone()))?;
            let material_id = self
                .import_repo
                .find_material_id(&record.base_spec, record.variant.as_deref())?
                .ok_or_else(|| {
                    missing_parent(
                        record.row_number,
                        "material",
                        material_key(&record.base_spec, record.variant.as_deref()),
                    )
                })?;

            rows.push(SftMaterialLinkRow {
                sft_id,
                material_id,
                note: record.note,
            });
        }

        self.import_repo.insert_sft_material_links(&rows)?;
        Ok(FileLoadOutcome {
            rows: rows.len(),
            warnings: Vec::new(),
        })
    }

    fn load_material_chemicals(&self, table: &RawTable) -> ImportResult<FileLoadOutcome> {
        let mut rows = Vec::with_capacity(table.rows.len());

        for raw in &table.rows {
            let record = self.field_mapper.map_material_chemical(raw)?;
            let material_id = self
                .import_repo
                .find_material_id(&record.base_spec, record.variant.as_deref())?
                .ok_or_else(|| {
                    missing_parent(
                        record.row_number,
                        "material",
                        material_key(&record.base_spec, record.variant.as_deref()),
                    )
                })?;
            let chemical_id = self
                .import_repo
                .find_chemical_id_by_cas(&record.cas)?
                .ok_or_else(|| missing_parent(record.row_number, "chemical", record.cas.clone()))?;

            rows.push(MaterialChemicalRow {
                material_id,
                chemical_id,
                pct_wt_low: record.pct_wt_low,
                pct_wt_high: record.pct_wt_high,
                notes: record.notes,
            });
        }

        self.import_repo.insert_material_chemicals(&rows)?;
        Ok(FileLoadOutcome {
            rows: rows.len(),
            warnings: Vec::new(),
        })
    }

    // ==========================================
    // 内嵌步骤落库
    // ==========================================

    /// 将内嵌步骤列表转为 finish_code_steps（step_order 按位置从 1 开始）
    ///
    /// 无法解析的步骤代码跳过并返回警告
    fn materialize_embedded_steps(&self, pending: &[EmbeddedSteps]) -> ImportResult<FileLoadOutcome> {
        let mut warnings = Vec::new();
        let mut rows = Vec::new();

        for entry in pending {
            let ids = self
                .import_repo
                .find_finish_code_ids(&entry.finish_code, Some(&entry.program))?;
            let Some(finish_code_id) = ids.first().copied() else {
                continue;
            };

            for (idx, sft_code) in entry.sft_codes.iter().enumerate() {
                match self.import_repo.find_sft_step_id(sft_code)? {
                    Some(sft_id) => rows.push(FinishCodeStepRow {
                        finish_code_id,
                        sft_id,
                        step_order: idx as i64 + 1,
                    }),
                    None => warnings.push(format!(
                        "行 {}: 代码 {} 的内嵌步骤 {} 不存在，已跳过",
                        entry.row_number, entry.finish_code, sft_code
                    )),
                }
            }
        }

        self.import_repo.upsert_finish_code_steps(&rows)?;
        Ok(FileLoadOutcome {
            rows: rows.len(),
            warnings,
        })
    }

    fn flush_embedded_steps(&self, state: &mut RunState) {
        if state.pending_embedded.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut state.pending_embedded);
        let file = state
            .embedded_source
            .clone()
            .unwrap_or_else(|| SourceKind::FinishCode.file_name());

        match self.materialize_embedded_steps(&pending) {
            Ok(outcome) => {
                info!(file = %file, rows = outcome.rows, "内嵌步骤已落库");
                state.warn_all(&file, outcome.warnings);
            }
            Err(e) => {
                error!(file = %file, error = %e, "内嵌步骤落库失败");
                state.issues.push(IngestIssue::error(&file, format!("内嵌步骤落库失败: {}", e)));
            }
        }
    }

    /// 加载单个源文件并记录血缘
    fn process_source(&self, source_dir: &Path, kind: SourceKind, state: &mut RunState) {
        let Some(path) = kind.locate(source_dir) else {
            let file = kind.file_name();
            state.fail(&file, &ImportError::FileNotFound(source_dir.join(&file).display().to_string()));
            return;
        };

        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| kind.file_name());
        if kind == SourceKind::FinishCode {
            state.embedded_source = Some(file.clone());
        }

        let result = compute_sha256(&path).and_then(|digest| {
            let outcome = self.load_file(kind, &path, state)?;
            self.import_repo.record_metadata(&file, &digest, outcome.rows)?;
            Ok((digest, outcome))
        });

        match result {
            Ok((digest, outcome)) => {
                info!(file = %file, rows = outcome.rows, digest = %digest, "源文件加载完成");
                state.loaded_files.insert(
                    file.clone(),
                    LoadedFile {
                        rows: outcome.rows,
                        digest,
                    },
                );
                state.warn_all(&file, outcome.warnings);
            }
            Err(e) => state.fail(&file, &e),
        }
    }
}

impl<R> FinishImporter for FinishImporterImpl<R>
where
    R: FinishImportRepository,
{
    #[instrument(skip(self, source_dir), fields(run_id = tracing::field::Empty))]
    fn ingest(&self, source_dir: &Path) -> ImportResult<IngestReport> {
        if !source_dir.is_dir() {
            return Err(ImportError::SourceDirNotFound(source_dir.display().to_string()));
        }

        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());
        info!(run_id = %run_id, source_dir = %source_dir.display(), "开始导入");

        let mut state = RunState::default();
        for kind in LOAD_ORDER {
            self.process_source(source_dir, kind, &mut state);

            // 内嵌步骤依赖 sft_steps，紧随其后落库，显式 finish_code_steps 随后覆盖
            if kind == SourceKind::ProcessStep {
                self.flush_embedded_steps(&mut state);
            }
        }

        let validation_report = self.validator.validate_all()?;
        let status = IngestStatus::derive(state.failed_files, LOAD_ORDER.len(), validation_report.status);

        info!(
            run_id = %run_id,
            status = %status,
            loaded = state.loaded_files.len(),
            failed = state.failed_files,
            "导入完成"
        );

        Ok(IngestReport {
            run_id,
            status,
            loaded_files: state.loaded_files,
            validation_report,
            errors: state.issues,
            timestamp: Utc::now().to_rfc3339(),
        })
    }
}

// ==========================================
// 表面处理危险品数据引擎 - 导入 API
// ==========================================
// 职责: 导入运行、独立校验、源文件漂移检测
// 连接: 每次调用独立打开，调用结束释放
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::store::open_bootstrapped;
use crate::config::{ConfigManager, PipelineConfigReader};
use crate::domain::{DriftEntry, DriftState, IngestReport, ValidationReport};
use crate::engine::StoreValidator;
use crate::importer::hashing::compute_sha256;
use crate::importer::source_files::LOAD_ORDER;
use crate::importer::{FinishImporter, FinishImporterImpl};
use crate::repository::integrity_repo::IntegrityRepository;
use crate::repository::{FinishImportRepository, FinishImportRepositoryImpl};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};

pub struct IngestApi {
    db_path: String,
}

impl IngestApi {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn build_validator(conn: &Arc<Mutex<Connection>>) -> ApiResult<StoreValidator> {
        let config = ConfigManager::from_connection(conn.clone());
        let weight_total_max_pct = config.get_weight_total_max_pct()?;
        Ok(StoreValidator::new(
            IntegrityRepository::from_connection(conn.clone()),
            weight_total_max_pct,
        ))
    }

    /// 执行一次完整导入
    ///
    /// 源目录不存在与库结构初始化失败为致命错误；
    /// 单文件失败记入报告，不中断其余文件。
    #[instrument(skip(self, source_dir), fields(source_dir = %source_dir.display()))]
    pub fn ingest(&self, source_dir: &Path) -> ApiResult<IngestReport> {
        if !source_dir.is_dir() {
            return Err(ApiError::SourceDirNotFound(source_dir.display().to_string()));
        }

        let conn = open_bootstrapped(&self.db_path)?;
        let validator = Self::build_validator(&conn)?;
        let import_repo = FinishImportRepositoryImpl::from_connection(conn.clone());
        let importer = FinishImporterImpl::new(import_repo, validator);

        let report = importer.ingest(source_dir)?;
        Ok(report)
    }

    /// 对当前库执行三轮校验（不导入）
    pub fn validate(&self) -> ApiResult<ValidationReport> {
        let conn = open_bootstrapped(&self.db_path)?;
        let validator = Self::build_validator(&conn)?;
        Ok(validator.validate_all()?)
    }

    /// 比对源目录文件摘要与上次导入记录
    pub fn detect_drift(&self, source_dir: &Path) -> ApiResult<Vec<DriftEntry>> {
        if !source_dir.is_dir() {
            return Err(ApiError::SourceDirNotFound(source_dir.display().to_string()));
        }

        let conn = open_bootstrapped(&self.db_path)?;
        let repo = FinishImportRepositoryImpl::from_connection(conn);
        let recorded: HashMap<String, String> = repo
            .list_metadata_versions()?
            .into_iter()
            .map(|v| (v.source_name, v.sha256))
            .collect();

        let mut entries = Vec::with_capacity(LOAD_ORDER.len());
        for kind in LOAD_ORDER {
            let entry = match kind.locate(source_dir) {
                Some(path) => {
                    let source_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| kind.file_name());
                    let current = compute_sha256(&path)?;
                    let recorded_digest = recorded.get(&source_name).cloned();
                    let state = match &recorded_digest {
                        None => DriftState::New,
                        Some(digest) if digest == &current => DriftState::Unchanged,
                        Some(_) => DriftState::Changed,
                    };
                    DriftEntry {
                        source_name,
                        state,
                        current_digest: Some(current),
                        recorded_digest,
                    }
                }
                None => {
                    let source_name = kind.file_name();
                    let recorded_digest = recorded
                        .get(&source_name)
                        .or_else(|| recorded.get(&format!("{}.xlsx", kind.stem())))
                        .cloned();
                    DriftEntry {
                        source_name,
                        state: DriftState::Missing,
                        current_digest: None,
                        recorded_digest,
                    }
                }
            };
            entries.push(entry);
        }

        let changed = entries
            .iter()
            .filter(|e| e.state != DriftState::Unchanged)
            .count();
        info!(total = entries.len(), changed, "漂移检测完成");
        Ok(entries)
    }
}

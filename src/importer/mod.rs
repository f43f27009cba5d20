// ==========================================
// 表面处理危险品数据引擎 - 导入层
// ==========================================
// 职责: 源文件 → 规范化存储
// 支持: CSV, Excel (.xlsx)
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod finish_importer_impl;
pub mod finish_importer_trait;
pub mod hashing;
pub mod source_files;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use finish_importer_impl::{FileLoadOutcome, FinishImporterImpl};
pub use finish_importer_trait::{FileParser, FinishImporter, RawRow, RawTable};
pub use hashing::{compute_sha256, verify_file_unchanged};
pub use source_files::{SourceKind, LOAD_ORDER};

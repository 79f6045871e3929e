// ==========================================
// 车队维修流转跟踪 - 解析/导入层
// ==========================================
// 职责: 编辑文本与旧表格 → 类型化工单
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod conflict_handler;
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod legacy_importer;

// 重导出核心类型
pub use conflict_handler::ConflictHandler as ConflictHandlerImpl;
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImportResult, MalformedField};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use legacy_importer::LegacyImporter;

// 重导出 Trait 接口
pub use importer_trait::{
    ConflictHandler, DataCleaner, FieldMapper, FileParser, MappedRow, RawRow,
};

// ==========================================
// 耐用品登记导入 - 导入层
// ==========================================
// 职责: 输入文件 → 远端耐用品/登记/服务合同
// 支持: 逗号分隔文本（首行为表头）
// ==========================================

// 模块声明
pub mod artifact_writer;
pub mod batch_submitter;
pub mod conflict_handler;
pub mod error;
pub mod field_mapper;
pub mod field_validator;
pub mod file_parser;
pub mod import_context;
pub mod reference_resolver;
pub mod transaction_builder;
pub mod warranty_importer_impl;
pub mod warranty_importer_trait;

// 重导出核心类型
pub use artifact_writer::{read_redo_records, ArtifactPaths, ArtifactWriter};
pub use batch_submitter::{fault_line, submit_window, FaultClassifier, SubmitOutcome};
pub use conflict_handler::{fetch_existing_serials, ConflictHandler as ConflictHandlerImpl};
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use field_validator::{is_field_supported, is_valid_record_type};
pub use file_parser::{parse_header, parse_record, CsvParser, ParsedFile};
pub use import_context::ImportContext;
pub use reference_resolver::{ReferenceResolver, ReferenceTable};
pub use transaction_builder::{DurableTransactionBuilder, WindowBuild};
pub use warranty_importer_impl::WarrantyImporterImpl;

// 重导出 Trait 接口
pub use warranty_importer_trait::{
    ConflictHandler, FieldMapper, FileParser, OutcomeClassifier, TransactionBuilder,
    WarrantyImporter,
};

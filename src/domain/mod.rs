// ==========================================
// 耐用品登记导入 - 领域模型层
// ==========================================
// 职责: 定义导入记录、校验记录、窗口/汇总类型
// 红线: 不含远端访问逻辑，不含管道逻辑
// ==========================================

pub mod import_batch;
pub mod import_record;

// 重导出核心类型
pub use import_batch::{ImportSummary, WindowReport, WindowStage};
pub use import_record::{
    ImportField, ImportRecord, ValidationLevel, ValidationRecord, PROCESS_TAG_NEW_CREATE,
    PROCESS_TAG_SERVICE_CONTRACT_SKIPPED, PROCESS_TAG_UNRESOLVED_REFERENCE,
};

// ==========================================
// 耐用品登记导入 - 核心库
// ==========================================
// 技术栈: Rust + tokio + reqwest + SQLite（配置）
// 系统定位: CSV 保修/登记记录批量导入 CRM 组织服务
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 导入记录与运行汇总
pub mod domain;

// CRM 组织服务访问层
pub mod crm;

// 导入层 - 解析、分窗、事务构建、提交
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（配置库连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    ImportField, ImportRecord, ImportSummary, ValidationLevel, ValidationRecord, WindowReport,
    WindowStage,
};

// 远端服务
pub use crm::{CrmError, CrmService, DynamicsWebClient, InMemoryCrmService};

// 导入器
pub use importer::{ImportContext, ImportError, WarrantyImporter, WarrantyImporterImpl};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "耐用品登记导入工具";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

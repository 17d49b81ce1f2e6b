// ==========================================
// 耐用品登记导入 - 配置层
// ==========================================
// 职责: 分组大小与 CRM 连接参数
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, get_default_db_path, ConfigManager};
pub use import_config_trait::{ImportConfigReader, DEFAULT_RECORDS_PER_GROUP};

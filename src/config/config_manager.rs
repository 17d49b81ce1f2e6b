// ==========================================
// 耐用品登记导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{ImportConfigReader, DEFAULT_RECORDS_PER_GROUP};
use crate::crm::{CrmConnectionSettings, DEFAULT_TIMEOUT_SECS};
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（表不存在时自动创建）
    ///
    /// # 参数
    /// - db_path: 配置数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.ensure_schema()?;
        Ok(manager)
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        let manager = Self { conn };
        manager.ensure_schema()?;
        Ok(manager)
    }

    /// 创建 config_kv 表（幂等）
    pub fn ensure_schema(&self) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS config_kv (
                scope_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (scope_id, key)
            );
            "#,
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_records_per_group(&self) -> ConfigResult<usize> {
        let default = DEFAULT_RECORDS_PER_GROUP.to_string();
        let value = self.get_config_or_default(config_keys::RECORDS_PER_GROUP, &default)?;

        match value.parse::<usize>() {
            Ok(size) if size > 0 => Ok(size),
            _ => {
                tracing::warn!(
                    config_key = config_keys::RECORDS_PER_GROUP,
                    raw_value = %value,
                    "每组记录数配置非法，使用默认值"
                );
                Ok(DEFAULT_RECORDS_PER_GROUP)
            }
        }
    }

    async fn get_crm_connection(&self) -> ConfigResult<CrmConnectionSettings> {
        let base_url = self.get_config_or_default(config_keys::CRM_BASE_URL, "")?;
        if base_url.is_empty() {
            return Err(format!("配置项 {} 未设置", config_keys::CRM_BASE_URL).into());
        }

        let timeout = self.get_config_or_default(
            config_keys::CRM_TIMEOUT_SECS,
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )?;

        Ok(CrmConnectionSettings {
            base_url,
            username: self.get_config_or_default(config_keys::CRM_USERNAME, "")?,
            password: self.get_config_or_default(config_keys::CRM_PASSWORD, "")?,
            timeout_secs: timeout.parse::<u64>().unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }
}

/// 默认配置数据库路径
///
/// 优先级: 环境变量 WARRANTY_IMPORT_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("WARRANTY_IMPORT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./warranty_import.db");
    if let Some(data_dir) = dirs::data_dir() {
        let app_dir = data_dir.join("warranty-import");
        if std::fs::create_dir_all(&app_dir).is_ok() {
            path = app_dir.join("warranty_import.db");
        }
    }

    path.to_string_lossy().to_string()
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 分组
    pub const RECORDS_PER_GROUP: &str = "records_per_group";

    // CRM 连接
    pub const CRM_BASE_URL: &str = "crm_base_url";
    pub const CRM_USERNAME: &str = "crm_username";
    pub const CRM_PASSWORD: &str = "crm_password";
    pub const CRM_TIMEOUT_SECS: &str = "crm_timeout_secs";
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_manager() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, manager)
    }

    #[tokio::test]
    async fn test_records_per_group_default() {
        let (_temp, manager) = create_manager();
        assert_eq!(manager.get_records_per_group().await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_records_per_group_override_and_invalid() {
        let (_temp, manager) = create_manager();

        manager
            .set_global_config_value(config_keys::RECORDS_PER_GROUP, "50")
            .unwrap();
        assert_eq!(manager.get_records_per_group().await.unwrap(), 50);

        manager
            .set_global_config_value(config_keys::RECORDS_PER_GROUP, "0")
            .unwrap();
        assert_eq!(manager.get_records_per_group().await.unwrap(), 200);

        manager
            .set_global_config_value(config_keys::RECORDS_PER_GROUP, "abc")
            .unwrap();
        assert_eq!(manager.get_records_per_group().await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_crm_connection_requires_base_url() {
        let (_temp, manager) = create_manager();
        assert!(manager.get_crm_connection().await.is_err());

        manager
            .set_global_config_value(config_keys::CRM_BASE_URL, "https://crm.example.com")
            .unwrap();
        manager
            .set_global_config_value(config_keys::CRM_USERNAME, "svc-import")
            .unwrap();

        let settings = manager.get_crm_connection().await.unwrap();
        assert_eq!(settings.base_url, "https://crm.example.com");
        assert_eq!(settings.username, "svc-import");
        assert_eq!(settings.password, "");
        assert_eq!(settings.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}

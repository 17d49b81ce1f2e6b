// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置读取/写入功能的正确性
// ==========================================


use std::sync::{Arc, Mutex};
use test_helpers::create_test_db;
use warranty_import::config::{config_keys, ConfigManager, ImportConfigReader};
use warranty_import::db::open_sqlite_connection;

#[tokio::test]
async fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[tokio::test]
async fn test_records_per_group_persisted() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    {
        let manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
        manager
            .set_global_config_value(config_keys::RECORDS_PER_GROUP, "25")
            .expect("Failed to write config");
    }

    // 重新打开后仍可读取
    let manager = ConfigManager::new(&db_path).expect("Failed to reopen ConfigManager");
    assert_eq!(manager.get_records_per_group().await.unwrap(), 25);
    assert_eq!(
        manager
            .get_global_config_value(config_keys::RECORDS_PER_GROUP)
            .unwrap()
            .as_deref(),
        Some("25")
    );
}

#[tokio::test]
async fn test_crm_connection_settings() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    manager
        .set_global_config_value(config_keys::CRM_BASE_URL, " https://org.crm.example.com ")
        .unwrap();
    manager
        .set_global_config_value(config_keys::CRM_USERNAME, "importer")
        .unwrap();
    manager
        .set_global_config_value(config_keys::CRM_PASSWORD, "s3cret")
        .unwrap();
    manager
        .set_global_config_value(config_keys::CRM_TIMEOUT_SECS, "30")
        .unwrap();

    let settings = manager.get_crm_connection().await.unwrap();
    assert_eq!(settings.base_url, "https://org.crm.example.com");
    assert_eq!(settings.username, "importer");
    assert_eq!(settings.password, "s3cret");
    assert_eq!(settings.timeout_secs, 30);
    assert!(!format!("{:?}", settings).contains("s3cret"));
}

#[tokio::test]
async fn test_from_shared_connection() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_sqlite_connection(&db_path).expect("Failed to open db");

    let manager = ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
        .expect("Failed to create ConfigManager");

    assert_eq!(manager.get_records_per_group().await.unwrap(), 200);
    assert!(manager
        .get_global_config_value(config_keys::CRM_BASE_URL)
        .unwrap()
        .is_none());
}

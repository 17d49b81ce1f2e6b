// ==========================================
// 耐用品登记导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::crm::CrmConnectionSettings;
use async_trait::async_trait;
use std::error::Error;

/// 默认每组记录数
pub const DEFAULT_RECORDS_PER_GROUP: usize = 200;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取每组记录数（窗口大小）
    ///
    /// # 默认值
    /// - 200
    ///
    /// # 用途
    /// - 控制单次批量提交的请求数，避免超出远端载荷上限
    async fn get_records_per_group(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 获取 CRM 连接参数
    ///
    /// # 返回
    /// - Ok(CrmConnectionSettings): base_url / username / password / timeout
    /// - Err: base_url 未配置
    async fn get_crm_connection(
        &self,
    ) -> Result<CrmConnectionSettings, Box<dyn Error + Send + Sync>>;
}

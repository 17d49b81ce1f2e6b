// ==========================================
// 耐用品登记导入 - CRM 组织服务 HTTP 客户端
// ==========================================
// 职责: 通过 JSON 网关访问组织服务（Basic 认证）
// 端点:
// - GET  {base}/api/data/WhoAmI
// - POST {base}/api/data/RetrieveMultiple
// - POST {base}/api/data/ExecuteMultiple
// ==========================================

use crate::crm::crm_service::CrmService;
use crate::crm::error::CrmError;
use crate::crm::model::{
    Entity, ExecuteMultipleRequest, ExecuteMultipleResponse, OrganizationServiceFault,
    QueryExpression,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// 默认请求超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

// ==========================================
// CrmConnectionSettings - 连接参数
// ==========================================
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmConnectionSettings {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
}

// 密码不进日志
impl fmt::Debug for CrmConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrmConnectionSettings")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct WhoAmIResponse {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct EntityCollection {
    #[serde(default)]
    entities: Vec<Entity>,
}

// ==========================================
// DynamicsWebClient - HTTP 实现
// ==========================================
pub struct DynamicsWebClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl DynamicsWebClient {
    /// 建立连接：构建 HTTP 客户端并做一次 WhoAmI 探测
    pub async fn connect(settings: &CrmConnectionSettings) -> Result<Self, CrmError> {
        let base_url = settings.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(CrmError::Connection("base_url 为空".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        let service = Self {
            client,
            base_url,
            username: settings.username.clone(),
            password: settings.password.clone(),
        };

        let user_id = service.who_am_i().await?;
        info!(base_url = %service.base_url, user_id = %user_id, "CRM 连接成功");

        Ok(service)
    }

    fn endpoint(&self, message: &str) -> String {
        format!("{}/api/data/{}", self.base_url, message)
    }

    /// 读取响应体；非 2xx 时优先解析为组织服务故障
    async fn read_body(response: reqwest::Response) -> Result<String, CrmError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        match serde_json::from_str::<OrganizationServiceFault>(&body) {
            Ok(fault) => Err(fault.into()),
            Err(_) => Err(CrmError::HttpStatus {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

impl Drop for DynamicsWebClient {
    fn drop(&mut self) {
        info!(base_url = %self.base_url, "CRM 连接已释放");
    }
}

#[async_trait]
impl CrmService for DynamicsWebClient {
    async fn who_am_i(&self) -> Result<Uuid, CrmError> {
        let response = self
            .client
            .get(self.endpoint("WhoAmI"))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        let parsed: WhoAmIResponse = serde_json::from_str(&body)?;
        Ok(parsed.user_id)
    }

    async fn retrieve_multiple(&self, query: &QueryExpression) -> Result<Vec<Entity>, CrmError> {
        debug!(entity = %query.entity_name, "RetrieveMultiple");

        let response = self
            .client
            .post(self.endpoint("RetrieveMultiple"))
            .basic_auth(&self.username, Some(&self.password))
            .json(query)
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        let parsed: EntityCollection = serde_json::from_str(&body)?;
        Ok(parsed.entities)
    }

    async fn execute_multiple(
        &self,
        request: &ExecuteMultipleRequest,
    ) -> Result<ExecuteMultipleResponse, CrmError> {
        debug!(requests = request.requests.len(), "ExecuteMultiple");

        let response = self
            .client
            .post(self.endpoint("ExecuteMultiple"))
            .basic_auth(&self.username, Some(&self.password))
            .json(request)
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

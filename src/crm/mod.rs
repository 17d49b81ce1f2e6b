// ==========================================
// 耐用品登记导入 - CRM 组织服务访问层
// ==========================================
// 职责: 远端记录系统的查询与批量提交
// 约束: 导入规则不进入本层
// ==========================================

pub mod crm_service;
pub mod error;
pub mod in_memory;
pub mod model;
pub mod web_client;

// 重导出核心类型
pub use crm_service::CrmService;
pub use error::{CrmError, CrmResult};
pub use in_memory::InMemoryCrmService;
pub use model::{
    AlternateKey, AttributeValue, ConditionExpression, ConditionOperator, Entity,
    EntityReference, ExecuteMultipleRequest, ExecuteMultipleResponse,
    ExecuteMultipleResponseItem, ExecuteMultipleSettings, ExecuteTransactionRequest,
    OrganizationRequest, OrganizationServiceFault, QueryExpression,
};
pub use web_client::{CrmConnectionSettings, DynamicsWebClient, DEFAULT_TIMEOUT_SECS};

// ==========================================
// 耐用品登记导入 - CRM 组织服务 Trait
// ==========================================
// 职责: 定义导入管道访问远端记录系统的接口（不包含业务逻辑）
// 红线: 服务层只做请求/响应，不含导入规则
// ==========================================

use crate::crm::error::CrmError;
use crate::crm::model::{
    Entity, ExecuteMultipleRequest, ExecuteMultipleResponse, QueryExpression,
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// CrmService Trait
// ==========================================
// 实现者: DynamicsWebClient（HTTP）、InMemoryCrmService（演练/测试）
#[async_trait]
pub trait CrmService: Send + Sync {
    /// 连通性探测，返回当前用户 ID
    async fn who_am_i(&self) -> Result<Uuid, CrmError>;

    /// 批量查询
    ///
    /// # 参数
    /// - query: 字段 IN 集合查询
    ///
    /// # 返回
    /// - Ok(Vec<Entity>): 命中的实体
    /// - Err: 远端故障/传输错误
    async fn retrieve_multiple(&self, query: &QueryExpression) -> Result<Vec<Entity>, CrmError>;

    /// 批量提交（每条请求一个响应项）
    ///
    /// # 说明
    /// - continue_on_error=true 时单条故障不影响同批其他请求
    /// - 整批调用失败以 Err 返回
    async fn execute_multiple(
        &self,
        request: &ExecuteMultipleRequest,
    ) -> Result<ExecuteMultipleResponse, CrmError>;
}

#[async_trait]
impl<T: CrmService + ?Sized> CrmService for Arc<T> {
    async fn who_am_i(&self) -> Result<Uuid, CrmError> {
        (**self).who_am_i().await
    }

    async fn retrieve_multiple(&self, query: &QueryExpression) -> Result<Vec<Entity>, CrmError> {
        (**self).retrieve_multiple(query).await
    }

    async fn execute_multiple(
        &self,
        request: &ExecuteMultipleRequest,
    ) -> Result<ExecuteMultipleResponse, CrmError> {
        (**self).execute_multiple(request).await
    }
}

#[async_trait]
impl<T: CrmService + ?Sized> CrmService for Box<T> {
    async fn who_am_i(&self) -> Result<Uuid, CrmError> {
        (**self).who_am_i().await
    }

    async fn retrieve_multiple(&self, query: &QueryExpression) -> Result<Vec<Entity>, CrmError> {
        (**self).retrieve_multiple(query).await
    }

    async fn execute_multiple(
        &self,
        request: &ExecuteMultipleRequest,
    ) -> Result<ExecuteMultipleResponse, CrmError> {
        (**self).execute_multiple(request).await
    }
}

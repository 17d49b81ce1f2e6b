// ==========================================
// 耐用品登记导入 - 内存组织服务
// ==========================================
// 职责: 在进程内执行 Upsert/Create/ExecuteTransaction
// 用途: --dry-run 演练、集成测试
// 说明: 事务内子请求出错时，之前的子请求保持已执行（与批量接口的行为一致）
// ==========================================

use crate::crm::crm_service::CrmService;
use crate::crm::error::CrmError;
use crate::crm::model::{
    AttributeValue, Entity, ExecuteMultipleRequest, ExecuteMultipleResponse,
    ExecuteMultipleResponseItem, OrganizationRequest, OrganizationServiceFault, QueryExpression,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// 注入故障的错误码
const INJECTED_FAULT_CODE: i32 = -2147220970;

/// 重复主键的错误码
const DUPLICATE_RECORD_CODE: i32 = -2147220937;

#[derive(Default)]
struct InMemoryState {
    entities: Vec<Entity>,
    queries: Vec<QueryExpression>,
    executed_batches: usize,
    rejected_serials: HashSet<String>,
    batch_fault: Option<String>,
}

// ==========================================
// InMemoryCrmService
// ==========================================
pub struct InMemoryCrmService {
    user_id: Uuid,
    state: Mutex<InMemoryState>,
}

impl Default for InMemoryCrmService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCrmService {
    pub fn new() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            state: Mutex::new(InMemoryState::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, InMemoryState>, CrmError> {
        self.state
            .lock()
            .map_err(|e| CrmError::Connection(format!("锁获取失败: {}", e)))
    }

    /// 预置实体（未指定 id 时自动分配）
    pub fn seed(&self, mut entity: Entity) -> Uuid {
        let id = *entity.id.get_or_insert_with(Uuid::new_v4);
        if let Ok(mut state) = self.lock() {
            state.entities.push(entity);
        }
        id
    }

    /// 预置 SKU
    pub fn seed_sku(&self, sku_value: &str, name: &str, display_name: &str) -> Uuid {
        let mut sku = Entity::new("dsr_sku");
        sku.set("dsr_skuvalue", sku_value);
        sku.set("dsr_name", name);
        sku.set("dsr_displayname", display_name);
        self.seed(sku)
    }

    /// 预置业务单元
    pub fn seed_business_unit(&self, country_code: &str, name: &str) -> Uuid {
        let mut unit = Entity::new("businessunit");
        unit.set("dsr_countrycode", country_code);
        unit.set("name", name);
        self.seed(unit)
    }

    /// 预置已存在的耐用品
    pub fn seed_durable(&self, serial_number: &str) -> Uuid {
        let mut durable = Entity::new("dsr_durable");
        durable.set("dsr_serialnumber", serial_number);
        self.seed(durable)
    }

    /// 指定序列号的耐用品 Upsert 返回故障
    pub fn reject_serial_number(&self, serial_number: &str) {
        if let Ok(mut state) = self.lock() {
            state.rejected_serials.insert(serial_number.to_string());
        }
    }

    /// 下一次 ExecuteMultiple 整批失败
    pub fn fail_next_batch(&self, message: &str) {
        if let Ok(mut state) = self.lock() {
            state.batch_fault = Some(message.to_string());
        }
    }

    /// 指定实体类型的全部实体（快照）
    pub fn entities(&self, logical_name: &str) -> Vec<Entity> {
        self.lock()
            .map(|state| {
                state
                    .entities
                    .iter()
                    .filter(|e| e.logical_name == logical_name)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn count(&self, logical_name: &str) -> usize {
        self.entities(logical_name).len()
    }

    /// 针对指定实体类型发出的查询次数
    pub fn query_count(&self, entity_name: &str) -> usize {
        self.lock()
            .map(|state| {
                state
                    .queries
                    .iter()
                    .filter(|q| q.entity_name == entity_name)
                    .count()
            })
            .unwrap_or(0)
    }

    /// 已执行的 ExecuteMultiple 次数
    pub fn executed_batch_count(&self) -> usize {
        self.lock().map(|state| state.executed_batches).unwrap_or(0)
    }
}

// ==========================================
// 请求执行
// ==========================================
impl InMemoryState {
    fn find_index(&self, target: &Entity) -> Option<usize> {
        self.entities.iter().position(|e| {
            e.logical_name == target.logical_name
                && match (&target.id, &target.key) {
                    (Some(id), _) => e.id == Some(*id),
                    (None, Some(key)) => e.get_string(&key.name) == Some(key.value.as_str()),
                    (None, None) => false,
                }
        })
    }

    fn insert(&mut self, mut target: Entity) {
        if target.id.is_none() {
            target.id = Some(Uuid::new_v4());
        }
        if let Some(key) = target.key.take() {
            target
                .attributes
                .entry(key.name)
                .or_insert(AttributeValue::String(key.value));
        }
        self.entities.push(target);
    }

    fn apply(&mut self, request: &OrganizationRequest) -> Result<(), OrganizationServiceFault> {
        match request {
            OrganizationRequest::Upsert { target } => {
                if let Some(key) = &target.key {
                    if self.rejected_serials.contains(&key.value) {
                        return Err(OrganizationServiceFault::new(
                            INJECTED_FAULT_CODE,
                            &format!("Upsert rejected for {} {}", key.name, key.value),
                        ));
                    }
                }
                match self.find_index(target) {
                    Some(index) => {
                        let existing = &mut self.entities[index];
                        for (name, value) in &target.attributes {
                            existing.attributes.insert(name.clone(), value.clone());
                        }
                    }
                    None => self.insert(target.clone()),
                }
                Ok(())
            }
            OrganizationRequest::Create { target } => {
                if target.id.is_some() && self.find_index(target).is_some() {
                    return Err(OrganizationServiceFault::new(
                        DUPLICATE_RECORD_CODE,
                        &format!("A record with id {:?} already exists", target.id),
                    ));
                }
                self.insert(target.clone());
                Ok(())
            }
            OrganizationRequest::ExecuteTransaction(transaction) => {
                for (index, inner) in transaction.requests.iter().enumerate() {
                    if let Err(mut fault) = self.apply(inner) {
                        fault.faulted_request_index = Some(index);
                        return Err(fault);
                    }
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl CrmService for InMemoryCrmService {
    async fn who_am_i(&self) -> Result<Uuid, CrmError> {
        Ok(self.user_id)
    }

    async fn retrieve_multiple(&self, query: &QueryExpression) -> Result<Vec<Entity>, CrmError> {
        let mut state = self.lock()?;
        state.queries.push(query.clone());

        let mut seen = HashSet::new();
        let results = state
            .entities
            .iter()
            .filter(|e| query.matches(e))
            .filter(|e| !query.distinct || seen.insert(e.id))
            .cloned()
            .collect();

        Ok(results)
    }

    async fn execute_multiple(
        &self,
        request: &ExecuteMultipleRequest,
    ) -> Result<ExecuteMultipleResponse, CrmError> {
        let mut state = self.lock()?;

        if let Some(message) = state.batch_fault.take() {
            return Err(OrganizationServiceFault::new(INJECTED_FAULT_CODE, &message).into());
        }
        state.executed_batches += 1;

        let mut response = ExecuteMultipleResponse::default();
        for (request_index, item) in request.requests.iter().enumerate() {
            let fault = state.apply(item).err();
            let faulted = fault.is_some();
            response.is_faulted |= faulted;

            if faulted || request.settings.return_responses {
                response.responses.push(ExecuteMultipleResponseItem {
                    request_index,
                    fault,
                });
            }

            if faulted && !request.settings.continue_on_error {
                break;
            }
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::model::ExecuteTransactionRequest;

    fn upsert_durable(serial: &str) -> OrganizationRequest {
        let mut durable = Entity::with_alternate_key("dsr_durable", "dsr_serialnumber", serial);
        durable.set("dsr_name", format!("SKU - {}", serial));
        OrganizationRequest::Upsert { target: durable }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let service = InMemoryCrmService::new();
        let request = ExecuteMultipleRequest::continue_on_error(vec![
            upsert_durable("SN1"),
            upsert_durable("SN1"),
        ]);

        let response = service.execute_multiple(&request).await.unwrap();

        assert!(!response.is_faulted);
        assert_eq!(response.responses.len(), 2);
        assert_eq!(service.count("dsr_durable"), 1);
        let durable = &service.entities("dsr_durable")[0];
        assert_eq!(durable.get_string("dsr_serialnumber"), Some("SN1"));
    }

    #[tokio::test]
    async fn test_transaction_fault_keeps_earlier_sub_operations() {
        let service = InMemoryCrmService::new();
        service.reject_serial_number("SN2");

        let mut transaction = ExecuteTransactionRequest::default();
        transaction.push(OrganizationRequest::Create {
            target: Entity::with_id("contact", Uuid::new_v4()),
        });
        transaction.push(upsert_durable("SN2"));

        let request = ExecuteMultipleRequest::continue_on_error(vec![
            OrganizationRequest::ExecuteTransaction(transaction),
            upsert_durable("SN3"),
        ]);
        let response = service.execute_multiple(&request).await.unwrap();

        assert!(response.is_faulted);
        let fault = response.responses[0].fault.as_ref().unwrap();
        assert_eq!(fault.faulted_request_index, Some(1));
        assert!(response.responses[1].fault.is_none());
        assert_eq!(service.count("contact"), 1);
        assert_eq!(service.count("dsr_durable"), 1);
    }

    #[tokio::test]
    async fn test_batch_fault_is_returned_once() {
        let service = InMemoryCrmService::new();
        service.fail_next_batch("Service unavailable");

        let request = ExecuteMultipleRequest::continue_on_error(vec![upsert_durable("SN1")]);
        let first = service.execute_multiple(&request).await;
        assert!(matches!(first, Err(CrmError::Fault { .. })));

        let second = service.execute_multiple(&request).await;
        assert!(second.is_ok());
        assert_eq!(service.executed_batch_count(), 1);
    }

    #[tokio::test]
    async fn test_retrieve_counts_queries() {
        let service = InMemoryCrmService::new();
        service.seed_durable("SN1");
        service.seed_sku("SKU1", "Widget", "Widget 3000");

        let query = QueryExpression::attribute_in(
            "dsr_durable",
            "dsr_serialnumber",
            vec!["SN1".to_string(), "SN9".to_string()],
            false,
        );
        let found = service.retrieve_multiple(&query).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(service.query_count("dsr_durable"), 1);
        assert_eq!(service.query_count("dsr_sku"), 0);
    }
}

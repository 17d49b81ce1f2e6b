// ==========================================
// 耐用品登记导入 - CRM 组织服务消息模型
// ==========================================
// 职责: 实体/引用/查询/请求/响应的强类型表示
// 说明: 远端 schema 对本工具是不透明的，这里只建模导入需要的部分
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ==========================================
// AlternateKey - 备用键（按业务键定位实体）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateKey {
    pub name: String,
    pub value: String,
}

// ==========================================
// EntityReference - 实体引用（查找字段的值）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReference {
    pub logical_name: String,
    pub id: Option<Uuid>,
    pub key: Option<AlternateKey>,
}

impl EntityReference {
    /// 按主键引用
    pub fn new(logical_name: &str, id: Uuid) -> Self {
        Self {
            logical_name: logical_name.to_string(),
            id: Some(id),
            key: None,
        }
    }

    /// 按备用键引用（实体可能在同一事务中尚未落库）
    pub fn by_key(logical_name: &str, key_name: &str, key_value: &str) -> Self {
        Self {
            logical_name: logical_name.to_string(),
            id: None,
            key: Some(AlternateKey {
                name: key_name.to_string(),
                value: key_value.to_string(),
            }),
        }
    }
}

// ==========================================
// AttributeValue - 属性值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum AttributeValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    DateTime(NaiveDateTime),
    Reference(EntityReference),
    Null,
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&EntityReference> {
        match self {
            AttributeValue::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<NaiveDateTime> for AttributeValue {
    fn from(value: NaiveDateTime) -> Self {
        AttributeValue::DateTime(value)
    }
}

impl From<EntityReference> for AttributeValue {
    fn from(value: EntityReference) -> Self {
        AttributeValue::Reference(value)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttributeValue::Null)
    }
}

// ==========================================
// Entity - 远端实体
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub logical_name: String,
    pub id: Option<Uuid>,
    pub key: Option<AlternateKey>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Entity {
    pub fn new(logical_name: &str) -> Self {
        Self {
            logical_name: logical_name.to_string(),
            id: None,
            key: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_id(logical_name: &str, id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::new(logical_name)
        }
    }

    pub fn with_alternate_key(logical_name: &str, key_name: &str, key_value: &str) -> Self {
        Self {
            key: Some(AlternateKey {
                name: key_name.to_string(),
                value: key_value.to_string(),
            }),
            ..Self::new(logical_name)
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// 读取字符串属性；属性缺失或非字符串返回 None
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttributeValue::as_str)
    }

    /// 生成指向本实体的引用（优先主键，其次备用键）
    pub fn to_reference(&self) -> EntityReference {
        EntityReference {
            logical_name: self.logical_name.clone(),
            id: self.id,
            key: if self.id.is_some() {
                None
            } else {
                self.key.clone()
            },
        }
    }
}

// ==========================================
// QueryExpression - 批量查询（字段 IN 集合）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionOperator {
    In,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionExpression {
    pub attribute_name: String,
    pub operator: ConditionOperator,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryExpression {
    pub entity_name: String,
    pub distinct: bool,
    pub all_columns: bool,
    pub conditions: Vec<ConditionExpression>, // AND 连接
}

impl QueryExpression {
    /// 构造 "attribute IN (values)" 查询
    pub fn attribute_in(
        entity_name: &str,
        attribute_name: &str,
        values: Vec<String>,
        distinct: bool,
    ) -> Self {
        Self {
            entity_name: entity_name.to_string(),
            distinct,
            all_columns: true,
            conditions: vec![ConditionExpression {
                attribute_name: attribute_name.to_string(),
                operator: ConditionOperator::In,
                values,
            }],
        }
    }

    /// 实体是否满足查询条件
    pub fn matches(&self, entity: &Entity) -> bool {
        entity.logical_name == self.entity_name
            && self.conditions.iter().all(|c| match c.operator {
                ConditionOperator::In => entity
                    .get_string(&c.attribute_name)
                    .map(|v| c.values.iter().any(|x| x == v))
                    .unwrap_or(false),
            })
    }
}

// ==========================================
// OrganizationRequest - 组织服务请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request_name")]
pub enum OrganizationRequest {
    Create { target: Entity },
    Upsert { target: Entity },
    ExecuteTransaction(ExecuteTransactionRequest),
}

impl OrganizationRequest {
    pub fn request_name(&self) -> &'static str {
        match self {
            OrganizationRequest::Create { .. } => "Create",
            OrganizationRequest::Upsert { .. } => "Upsert",
            OrganizationRequest::ExecuteTransaction(_) => "ExecuteTransaction",
        }
    }
}

// ==========================================
// ExecuteTransactionRequest - 组合事务（单条记录的全部子操作）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteTransactionRequest {
    pub requests: Vec<OrganizationRequest>,
    pub return_responses: bool,
}

impl ExecuteTransactionRequest {
    pub fn push(&mut self, request: OrganizationRequest) {
        self.requests.push(request);
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// 子操作名称序列（用于日志/测试）
    pub fn request_names(&self) -> Vec<&'static str> {
        self.requests.iter().map(|r| r.request_name()).collect()
    }
}

// ==========================================
// ExecuteMultipleRequest - 批量提交
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteMultipleSettings {
    pub continue_on_error: bool,
    pub return_responses: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteMultipleRequest {
    pub settings: ExecuteMultipleSettings,
    pub requests: Vec<OrganizationRequest>,
}

impl ExecuteMultipleRequest {
    /// 出错继续 + 返回每条响应
    pub fn continue_on_error(requests: Vec<OrganizationRequest>) -> Self {
        Self {
            settings: ExecuteMultipleSettings {
                continue_on_error: true,
                return_responses: true,
            },
            requests,
        }
    }
}

// ==========================================
// 响应与故障
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationServiceFault {
    pub error_code: i32,
    pub message: String,
    /// 事务内出错的子请求序号（0 起），仅 ExecuteTransaction 故障携带
    #[serde(default)]
    pub faulted_request_index: Option<usize>,
}

impl OrganizationServiceFault {
    pub fn new(error_code: i32, message: &str) -> Self {
        Self {
            error_code,
            message: message.to_string(),
            faulted_request_index: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteMultipleResponseItem {
    pub request_index: usize,
    pub fault: Option<OrganizationServiceFault>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteMultipleResponse {
    pub responses: Vec<ExecuteMultipleResponseItem>,
    #[serde(default)]
    pub is_faulted: bool,
}

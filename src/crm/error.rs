// ==========================================
// 耐用品登记导入 - CRM 组织服务错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::crm::model::OrganizationServiceFault;
use thiserror::Error;

/// CRM 组织服务错误类型
#[derive(Error, Debug)]
pub enum CrmError {
    // ===== 远端业务故障 =====
    #[error("组织服务故障 (code {error_code}): {message}")]
    Fault { error_code: i32, message: String },

    // ===== 传输层错误 =====
    #[error("组织服务请求超时: {0}")]
    Timeout(String),

    #[error("组织服务传输失败: {0}")]
    Transport(String),

    #[error("组织服务返回 HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("组织服务响应解析失败: {0}")]
    Decode(String),

    // ===== 连接错误 =====
    #[error("组织服务连接失败: {0}")]
    Connection(String),
}

impl CrmError {
    /// 是否为远端业务故障（窗口级可恢复）
    pub fn is_fault(&self) -> bool {
        matches!(self, CrmError::Fault { .. })
    }

    /// 是否为超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, CrmError::Timeout(_))
    }

    /// 故障消息（不含错误码前缀）
    pub fn fault_message(&self) -> String {
        match self {
            CrmError::Fault { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<OrganizationServiceFault> for CrmError {
    fn from(fault: OrganizationServiceFault) -> Self {
        CrmError::Fault {
            error_code: fault.error_code,
            message: fault.message,
        }
    }
}

// 实现 From<reqwest::Error>
impl From<reqwest::Error> for CrmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CrmError::Timeout(err.to_string())
        } else if err.is_decode() {
            CrmError::Decode(err.to_string())
        } else if err.is_connect() {
            CrmError::Connection(err.to_string())
        } else {
            CrmError::Transport(err.to_string())
        }
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for CrmError {
    fn from(err: serde_json::Error) -> Self {
        CrmError::Decode(err.to_string())
    }
}

/// Result 类型别名
pub type CrmResult<T> = Result<T, CrmError>;

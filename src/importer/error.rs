// ==========================================
// 耐用品登记导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: CRM 错误透传，由调用方区分窗口级故障与终止性错误
// ==========================================

use crate::crm::CrmError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 启动参数错误 =====
    #[error("Should run with CSV Input File, e.g. C:\\foo\\foo.csv")]
    MissingInputArgument,

    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("输入文件为空（缺少表头行）: {0}")]
    EmptyFile(String),

    #[error("输出文件写入失败 ({path}): {message}")]
    ArtifactWriteError { path: String, message: String },

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 远端错误 =====
    #[error(transparent)]
    Crm(#[from] CrmError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为远端超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, ImportError::Crm(e) if e.is_timeout())
    }

    /// 是否为远端业务故障
    pub fn is_fault(&self) -> bool {
        matches!(self, ImportError::Crm(e) if e.is_fault())
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

// ==========================================
// 耐用品登记导入 - 导入记录领域模型
// ==========================================
// 职责: 输入文件行 → 结构化记录
// 用途: 导入管道中间产物，同时是 redo 文件的序列化格式
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 处理结果标签：新建
pub const PROCESS_TAG_NEW_CREATE: &str = "New create;";

/// 处理结果标签：SKU 或业务单元未解析
pub const PROCESS_TAG_UNRESOLVED_REFERENCE: &str =
    "Can't create due to empty SKU or BusinessUnit;";

/// 处理结果标签：遗留保修日期不完整，跳过服务合同
pub const PROCESS_TAG_SERVICE_CONTRACT_SKIPPED: &str =
    "Service contract skipped due to missing warranty dates;";

// ==========================================
// ImportField - 表头字段
// ==========================================
// 由表头行构建，仅保留受支持的字段名，保留原始列序号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportField {
    pub name: String,        // 字段名（已去除空白）
    pub column_index: usize, // 源文件列序号（0 起）
}

// ==========================================
// ImportRecord - 导入记录
// ==========================================
// 不变量: 每个非空数据行对应一条记录
// 序列化字段名使用 PascalCase，与 redo 文件格式一致
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ImportRecord {
    // ===== 记录类型 =====
    pub record_type: String, // Durable / Component / Replacement
    pub line_number: usize,  // 源文件行号（表头 = 1）

    // ===== 制造信息 =====
    pub unit_serial_number: String,
    pub part_serial_number: String,
    pub part_number: String,
    pub part_description: String,
    pub product_sku: String,

    // ===== 发货事件 =====
    pub ship_date: Option<NaiveDateTime>,
    pub country_code: String,
    pub product_name: String,
    pub order_number: String,
    pub invoice_number: String,
    pub return_date: Option<NaiveDateTime>,

    // ===== 维修/替换件 =====
    pub repair_date_time: Option<NaiveDateTime>,
    pub order_date: Option<NaiveDateTime>,
    pub order_line_number: String,
    pub replacement_part_name: String,

    // ===== 注册信息 =====
    pub registration_date: Option<NaiveDateTime>,
    pub registrant_first_name: String,
    pub registrant_last_name: String,
    pub registrant_email: String,
    pub registration_abo_number: String,
    pub registration_source: String,

    // ===== 历史保修 =====
    pub is_legacy_warranty: bool,
    pub warranty_start_date: Option<NaiveDateTime>,
    pub warranty_end_date: Option<NaiveDateTime>,

    // 处理结果（累积的状态标签）
    pub process_type: String,
}

impl ImportRecord {
    /// 追加处理结果标签
    pub fn tag(&mut self, tag: &str) {
        self.process_type.push_str(tag);
    }

    /// 遗留保修起止日期是否齐全
    pub fn has_complete_warranty_period(&self) -> bool {
        self.warranty_start_date.is_some() && self.warranty_end_date.is_some()
    }

    /// 遗留保修天数（end - start）；任一日期缺失返回 None
    pub fn warranty_duration_days(&self) -> Option<i64> {
        match (self.warranty_start_date, self.warranty_end_date) {
            (Some(start), Some(end)) => Some((end - start).num_days()),
            _ => None,
        }
    }
}

// ==========================================
// ValidationLevel - 校验级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationLevel {
    Warning, // 仅记录（例如不支持的列）
    Error,   // 阻断处理（预留）
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationLevel::Warning => write!(f, "WARNING"),
            ValidationLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ==========================================
// ValidationRecord - 文件校验记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub file_line_id: usize,    // 文件行号
    pub record_index_id: usize, // 该行内的问题序号（1 起）
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationRecord {
    pub fn warning(file_line_id: usize, record_index_id: usize, message: String) -> Self {
        Self {
            file_line_id,
            record_index_id,
            level: ValidationLevel::Warning,
            message,
        }
    }

    /// 是否阻断处理
    pub fn is_blocking(&self) -> bool {
        matches!(self.level, ValidationLevel::Error)
    }
}

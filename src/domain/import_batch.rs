// ==========================================
// 耐用品登记导入 - 批次/窗口领域模型
// ==========================================
// 职责: 窗口处理状态与整次运行的汇总统计
// ==========================================

use crate::domain::import_record::ValidationRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ==========================================
// WindowStage - 窗口处理阶段
// ==========================================
// 状态机: Pending → Filtered → Built → Submitted → Classified
// 窗口内记录全部已存在时停在 Filtered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowStage {
    Pending,
    Filtered,
    Built,
    Submitted,
    Classified,
}

impl fmt::Display for WindowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowStage::Pending => write!(f, "PENDING"),
            WindowStage::Filtered => write!(f, "FILTERED"),
            WindowStage::Built => write!(f, "BUILT"),
            WindowStage::Submitted => write!(f, "SUBMITTED"),
            WindowStage::Classified => write!(f, "CLASSIFIED"),
        }
    }
}

// ==========================================
// WindowReport - 单个窗口的处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowReport {
    pub window_index: usize,       // 窗口序号（1 起）
    pub considered: usize,         // 窗口原始记录数
    pub skipped_existing: usize,   // 远端已存在而跳过的记录数
    pub unresolved: usize,         // SKU/业务单元未解析的记录数
    pub submitted: usize,          // 提交的组合事务数
    pub faults: Vec<String>,       // 条目级故障诊断行
    pub batch_error: Option<String>, // 整批调用故障
    pub stage: WindowStage,        // 到达的最终阶段
}

impl WindowReport {
    pub fn new(window_index: usize, considered: usize) -> Self {
        Self {
            window_index,
            considered,
            skipped_existing: 0,
            unresolved: 0,
            submitted: 0,
            faults: Vec::new(),
            batch_error: None,
            stage: WindowStage::Pending,
        }
    }

    /// 窗口是否完全成功（无条目故障且无整批故障）
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty() && self.batch_error.is_none()
    }
}

// ==========================================
// ImportSummary - 整次运行汇总
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_records: usize,
    pub group_size: usize,
    pub warnings: Vec<ValidationRecord>,
    pub windows: Vec<WindowReport>,
    pub elapsed_time: Duration,
}

impl ImportSummary {
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn submitted(&self) -> usize {
        self.windows.iter().map(|w| w.submitted).sum()
    }

    pub fn skipped_existing(&self) -> usize {
        self.windows.iter().map(|w| w.skipped_existing).sum()
    }

    pub fn unresolved(&self) -> usize {
        self.windows.iter().map(|w| w.unresolved).sum()
    }

    pub fn fault_count(&self) -> usize {
        self.windows
            .iter()
            .map(|w| w.faults.len() + usize::from(w.batch_error.is_some()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_totals() {
        let mut first = WindowReport::new(1, 3);
        first.submitted = 2;
        first.unresolved = 1;
        first.faults.push("fault".to_string());

        let mut second = WindowReport::new(2, 1);
        second.skipped_existing = 1;
        second.batch_error = Some("boom".to_string());

        let summary = ImportSummary {
            total_records: 4,
            group_size: 3,
            warnings: Vec::new(),
            windows: vec![first, second],
            elapsed_time: Duration::from_millis(5),
        };

        assert_eq!(summary.window_count(), 2);
        assert_eq!(summary.submitted(), 2);
        assert_eq!(summary.unresolved(), 1);
        assert_eq!(summary.skipped_existing(), 1);
        assert_eq!(summary.fault_count(), 2);
    }

    #[test]
    fn test_stage_order() {
        assert!(WindowStage::Pending < WindowStage::Filtered);
        assert!(WindowStage::Submitted < WindowStage::Classified);
        assert_eq!(WindowStage::Built.to_string(), "BUILT");
    }
}

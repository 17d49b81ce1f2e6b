// ==========================================
// 耐用品登记导入 - 分窗与已存在过滤
// ==========================================
// 职责: 记录按固定大小分窗；移除远端已存在序列号的记录（幂等导入）
// ==========================================

use crate::crm::{CrmResult, CrmService, QueryExpression};
use crate::domain::ImportRecord;
use crate::importer::warranty_importer_trait::ConflictHandler as ConflictHandlerTrait;
use std::collections::HashSet;

pub const DURABLE_ENTITY: &str = "dsr_durable";
pub const DURABLE_SERIAL_FIELD: &str = "dsr_serialnumber";

pub struct ConflictHandler;

impl ConflictHandlerTrait for ConflictHandler {
    fn partition<'a>(
        &self,
        records: &'a [ImportRecord],
        group_size: usize,
    ) -> Vec<&'a [ImportRecord]> {
        records.chunks(group_size.max(1)).collect()
    }

    /// 跨批次重复（远端已存在）静默移除
    fn filter_existing(
        &self,
        window: &[ImportRecord],
        existing_serials: &HashSet<String>,
    ) -> (Vec<ImportRecord>, usize) {
        let remaining: Vec<ImportRecord> = window
            .iter()
            .filter(|r| !existing_serials.contains(&r.unit_serial_number))
            .cloned()
            .collect();
        let skipped = window.len() - remaining.len();
        (remaining, skipped)
    }
}

/// 查询窗口内已存在于远端的耐用品序列号（每个窗口一次查询）
pub async fn fetch_existing_serials<S: CrmService + ?Sized>(
    service: &S,
    window: &[ImportRecord],
) -> CrmResult<HashSet<String>> {
    let mut seen = HashSet::new();
    let serials: Vec<String> = window
        .iter()
        .map(|r| r.unit_serial_number.clone())
        .filter(|s| seen.insert(s.clone()))
        .collect();

    let query = QueryExpression::attribute_in(DURABLE_ENTITY, DURABLE_SERIAL_FIELD, serials, false);
    let existing = service.retrieve_multiple(&query).await?;

    Ok(existing
        .iter()
        .filter_map(|e| e.get_string(DURABLE_SERIAL_FIELD))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::InMemoryCrmService;

    fn create_test_record(serial: &str, line_number: usize) -> ImportRecord {
        ImportRecord {
            unit_serial_number: serial.to_string(),
            line_number,
            ..Default::default()
        }
    }

    fn records(count: usize) -> Vec<ImportRecord> {
        (0..count)
            .map(|i| create_test_record(&format!("SN{:03}", i), i + 2))
            .collect()
    }

    #[test]
    fn test_partition_sizes() {
        let handler = ConflictHandler;
        let all = records(450);

        let windows = handler.partition(&all, 200);

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].len(), 200);
        assert_eq!(windows[1].len(), 200);
        assert_eq!(windows[2].len(), 50);
        assert_eq!(windows[2][0].unit_serial_number, "SN400");
    }

    #[test]
    fn test_partition_exact_multiple() {
        let handler = ConflictHandler;
        let all = records(6);

        let windows = handler.partition(&all, 3);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].len(), 3);

        assert!(handler.partition(&[], 3).is_empty());
    }

    #[test]
    fn test_filter_existing() {
        let handler = ConflictHandler;
        let window = records(3);
        let existing: HashSet<String> = ["SN001".to_string()].into_iter().collect();

        let (remaining, skipped) = handler.filter_existing(&window, &existing);

        assert_eq!(skipped, 1);
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|r| r.unit_serial_number != "SN001"));
    }

    #[tokio::test]
    async fn test_fetch_existing_serials() {
        let service = InMemoryCrmService::new();
        service.seed_durable("SN002");

        let existing = fetch_existing_serials(&service, &records(5)).await.unwrap();

        assert_eq!(existing.len(), 1);
        assert!(existing.contains("SN002"));
        assert_eq!(service.query_count(DURABLE_ENTITY), 1);
    }
}

// ==========================================
// 耐用品登记导入 - 引用数据解析
// ==========================================
// 职责: 批量查询 SKU / 业务单元，构建 自然键 → 实体 查找表
// 约束: 每次运行每类引用只查询一次；查找表只读
// ==========================================

use crate::crm::{CrmResult, CrmService, Entity, QueryExpression};
use crate::domain::ImportRecord;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// 自然键 → 远端实体
pub type ReferenceTable = HashMap<String, Entity>;

pub const SKU_ENTITY: &str = "dsr_sku";
pub const SKU_LOOKUP_FIELD: &str = "dsr_skuvalue";
pub const BUSINESS_UNIT_ENTITY: &str = "businessunit";
pub const BUSINESS_UNIT_LOOKUP_FIELD: &str = "dsr_countrycode";

/// 去重并丢弃空白键（保持首次出现顺序）
pub fn distinct_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter()
        .filter(|k| !k.trim().is_empty())
        .filter(|k| seen.insert(*k))
        .map(str::to_string)
        .collect()
}

// ==========================================
// ReferenceResolver
// ==========================================
pub struct ReferenceResolver<'a, S: CrmService + ?Sized> {
    service: &'a S,
}

impl<'a, S: CrmService + ?Sized> ReferenceResolver<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// 按自然键批量查询实体
    ///
    /// # 参数
    /// - keys: 已去重的非空键
    /// - lookup_field: 实体上的自然键属性
    /// - entity_kind: 实体逻辑名
    /// - distinct: 查询是否去重
    ///
    /// # 返回
    /// - 键为空时返回空表，不发起远端调用
    /// - 同一键对应多个实体时保留第一个
    pub async fn fetch_by_keys(
        &self,
        keys: Vec<String>,
        lookup_field: &str,
        entity_kind: &str,
        distinct: bool,
    ) -> CrmResult<ReferenceTable> {
        if keys.is_empty() {
            debug!(entity_kind, "无查询键，跳过远端查询");
            return Ok(ReferenceTable::new());
        }

        let key_count = keys.len();
        let query = QueryExpression::attribute_in(entity_kind, lookup_field, keys, distinct);
        let entities = self.service.retrieve_multiple(&query).await?;

        let mut table = ReferenceTable::new();
        for entity in entities {
            if let Some(key) = entity.get_string(lookup_field).map(str::to_string) {
                table.entry(key).or_insert(entity);
            }
        }

        info!(
            entity_kind,
            requested = key_count,
            resolved = table.len(),
            "引用数据查询完成"
        );
        Ok(table)
    }

    /// 查询记录涉及的全部 SKU
    pub async fn fetch_skus(&self, records: &[ImportRecord]) -> CrmResult<ReferenceTable> {
        let keys = distinct_keys(records.iter().map(|r| r.product_sku.as_str()));
        self.fetch_by_keys(keys, SKU_LOOKUP_FIELD, SKU_ENTITY, true)
            .await
    }

    /// 查询记录涉及的全部业务单元（按国家代码）
    pub async fn fetch_business_units(
        &self,
        records: &[ImportRecord],
    ) -> CrmResult<ReferenceTable> {
        let keys = distinct_keys(records.iter().map(|r| r.country_code.as_str()));
        self.fetch_by_keys(
            keys,
            BUSINESS_UNIT_LOOKUP_FIELD,
            BUSINESS_UNIT_ENTITY,
            false,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::InMemoryCrmService;

    fn record(sku: &str, country: &str) -> ImportRecord {
        ImportRecord {
            product_sku: sku.to_string(),
            country_code: country.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_distinct_keys_drops_blank_and_duplicates() {
        let keys = distinct_keys(vec!["A", "", "B", "A", "  ", "C"]);
        assert_eq!(keys, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_fetch_by_keys_empty_skips_remote_call() {
        let service = InMemoryCrmService::new();
        let resolver = ReferenceResolver::new(&service);

        let table = resolver.fetch_skus(&[record("", "US")]).await.unwrap();

        assert!(table.is_empty());
        assert_eq!(service.query_count(SKU_ENTITY), 0);
    }

    #[tokio::test]
    async fn test_fetch_skus_first_match_wins() {
        let service = InMemoryCrmService::new();
        let first = service.seed_sku("SKU1", "Widget", "Widget 3000");
        service.seed_sku("SKU1", "Widget (dup)", "Widget dup");
        service.seed_sku("SKU9", "Other", "Other");

        let resolver = ReferenceResolver::new(&service);
        let records = vec![record("SKU1", "US"), record("SKU1", "US"), record("SKU2", "CA")];
        let table = resolver.fetch_skus(&records).await.unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table["SKU1"].id, Some(first));
        assert_eq!(service.query_count(SKU_ENTITY), 1);
    }

    #[tokio::test]
    async fn test_fetch_business_units() {
        let service = InMemoryCrmService::new();
        service.seed_business_unit("US", "United States");

        let resolver = ReferenceResolver::new(&service);
        let records = vec![record("SKU1", "US"), record("SKU1", "CA")];
        let table = resolver.fetch_business_units(&records).await.unwrap();

        assert!(table.contains_key("US"));
        assert!(!table.contains_key("CA"));
        assert_eq!(service.query_count(BUSINESS_UNIT_ENTITY), 1);
    }
}

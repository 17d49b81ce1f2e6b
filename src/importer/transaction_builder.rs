// ==========================================
// 耐用品登记导入 - 组合事务构建
// ==========================================
// 职责: 单条记录 → ExecuteTransaction（多实体子操作）
// 子操作顺序（固定）:
//   1. Upsert 耐用品（备用键 dsr_serialnumber）
//   2. Create 联系人          ┐
//   3. Create 登记            ├ 业务单元已解析且有登记日期
//   4. Upsert 耐用品关联登记  ┘
//   5. Create 遗留服务合同    （遗留保修且起止日期齐全）
// ==========================================

use crate::crm::{
    AttributeValue, Entity, EntityReference, ExecuteTransactionRequest, OrganizationRequest,
};
use crate::domain::{
    ImportRecord, PROCESS_TAG_NEW_CREATE, PROCESS_TAG_SERVICE_CONTRACT_SKIPPED,
    PROCESS_TAG_UNRESOLVED_REFERENCE,
};
use crate::importer::conflict_handler::{DURABLE_ENTITY, DURABLE_SERIAL_FIELD};
use crate::importer::reference_resolver::{ReferenceTable, BUSINESS_UNIT_ENTITY};
use crate::importer::warranty_importer_trait::TransactionBuilder;
use tracing::warn;
use uuid::Uuid;

/// 登记来源缺省值
pub const DEFAULT_REGISTRATION_SOURCE: &str = "adhoc -file-import";

// ==========================================
// WindowBuild - 窗口构建结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct WindowBuild {
    pub transactions: Vec<OrganizationRequest>, // 每条已解析记录一个 ExecuteTransaction
    pub redo_records: Vec<ImportRecord>,        // 窗口内全部记录（含标签）
    pub unresolved: usize,
}

pub struct DurableTransactionBuilder;

impl DurableTransactionBuilder {
    /// 耐用品主 Upsert
    fn durable_upsert(
        &self,
        record: &ImportRecord,
        sku: &Entity,
        business_unit: Option<&Entity>,
    ) -> Entity {
        let serial = record.unit_serial_number.as_str();
        let mut durable = Entity::with_alternate_key(DURABLE_ENTITY, DURABLE_SERIAL_FIELD, serial);

        let sku_name = sku.get_string("dsr_name").unwrap_or_default();
        let sku_display_name = sku.get_string("dsr_displayname").unwrap_or_default();

        durable.set("dsr_name", format!("{} - {}", sku_name, serial));
        durable.set("dsr_displayname", sku_display_name);
        durable.set("dsr_islegacywarranty", record.is_legacy_warranty);

        if !record.product_sku.trim().is_empty() {
            durable.set("new_skunumber", record.product_sku.as_str());
            durable.set("dsr_skuid", sku.to_reference());
        }

        // 未解析业务单元时显式置空
        durable.set(
            "dsr_relatedbusinessunit",
            business_unit.map(Entity::to_reference),
        );

        if let Some(ship_date) = record.ship_date {
            durable.set("dsr_shipdate", ship_date);
        }
        if !record.order_number.trim().is_empty() {
            durable.set("dsr_ordernumber", record.order_number.as_str());
        }
        if !record.invoice_number.trim().is_empty() {
            durable.set("dsr_invoicenumber", record.invoice_number.as_str());
        }
        if let Some(registration_date) = record.registration_date {
            durable.set("dsr_registrationdate", registration_date);
        }

        durable
    }

    /// 联系人 + 登记 + 耐用品关联登记
    fn registration_requests(
        &self,
        record: &ImportRecord,
        business_unit: &Entity,
    ) -> Vec<OrganizationRequest> {
        let serial = record.unit_serial_number.as_str();

        let mut contact = Entity::with_id("contact", Uuid::new_v4());
        contact.set("firstname", record.registrant_first_name.as_str());
        contact.set("lastname", record.registrant_last_name.as_str());
        contact.set("emailaddress1", record.registrant_email.as_str());
        contact.set("dsr_abonumber", record.registration_abo_number.as_str());

        let source = if record.registration_source.trim().is_empty() {
            DEFAULT_REGISTRATION_SOURCE
        } else {
            record.registration_source.as_str()
        };

        let mut registration = Entity::with_id("dsr_registration", Uuid::new_v4());
        registration.set(
            "dsr_name",
            format!(
                "Registration: {} Serial: {}",
                record.registrant_email, serial
            ),
        );
        if let Some(unit_id) = business_unit.id {
            registration.set(
                "dsr_businessunitid",
                EntityReference::new(BUSINESS_UNIT_ENTITY, unit_id),
            );
        }
        registration.set(
            "dsr_productid",
            EntityReference::by_key(DURABLE_ENTITY, DURABLE_SERIAL_FIELD, serial),
        );
        registration.set("dsr_customerid", contact.to_reference());
        registration.set(
            "dsr_registrationdate",
            AttributeValue::from(record.registration_date),
        );
        registration.set("new_registrationsource", source);

        let mut link = Entity::with_alternate_key(DURABLE_ENTITY, DURABLE_SERIAL_FIELD, serial);
        link.set("dsr_relatedregistration", registration.to_reference());

        vec![
            OrganizationRequest::Create { target: contact },
            OrganizationRequest::Create {
                target: registration,
            },
            OrganizationRequest::Upsert { target: link },
        ]
    }

    /// 遗留服务合同；保修起止日期不全时返回 None
    fn service_contract_request(&self, record: &ImportRecord) -> Option<OrganizationRequest> {
        let start_date = record.warranty_start_date?;
        let duration_days = record.warranty_duration_days()?;
        let serial = record.unit_serial_number.as_str();

        let mut contract = Entity::with_id("dsr_servicecontract", Uuid::new_v4());
        contract.set("dsr_name", format!("Legacy Service Contract - {}", serial));
        contract.set("dsr_startdate", start_date);
        contract.set("dsr_scduration", duration_days);
        contract.set(
            "dsr_productid",
            EntityReference::by_key(DURABLE_ENTITY, DURABLE_SERIAL_FIELD, serial),
        );

        Some(OrganizationRequest::Create { target: contract })
    }
}

impl TransactionBuilder for DurableTransactionBuilder {
    fn build_transaction(
        &self,
        record: &ImportRecord,
        sku: &Entity,
        business_unit: Option<&Entity>,
    ) -> ExecuteTransactionRequest {
        let mut transaction = ExecuteTransactionRequest::default();

        transaction.push(OrganizationRequest::Upsert {
            target: self.durable_upsert(record, sku, business_unit),
        });

        if let (Some(unit), Some(_)) = (business_unit, record.registration_date) {
            for request in self.registration_requests(record, unit) {
                transaction.push(request);
            }
        }

        if record.is_legacy_warranty {
            if let Some(request) = self.service_contract_request(record) {
                transaction.push(request);
            }
        }

        transaction
    }

    fn build_window(
        &self,
        records: Vec<ImportRecord>,
        skus: &ReferenceTable,
        business_units: &ReferenceTable,
    ) -> WindowBuild {
        let mut build = WindowBuild::default();

        for mut record in records {
            let sku = skus.get(&record.product_sku);
            let unit = business_units.get(&record.country_code);

            match (sku, unit) {
                (Some(sku), Some(unit)) => {
                    record.tag(PROCESS_TAG_NEW_CREATE);
                    if record.is_legacy_warranty && !record.has_complete_warranty_period() {
                        record.tag(PROCESS_TAG_SERVICE_CONTRACT_SKIPPED);
                        warn!(
                            serial_number = %record.unit_serial_number,
                            line_number = record.line_number,
                            "遗留保修日期不完整，跳过服务合同"
                        );
                    }
                    let transaction = self.build_transaction(&record, sku, Some(unit));
                    build
                        .transactions
                        .push(OrganizationRequest::ExecuteTransaction(transaction));
                }
                _ => {
                    record.tag(PROCESS_TAG_UNRESOLVED_REFERENCE);
                    build.unresolved += 1;
                    warn!(
                        serial_number = %record.unit_serial_number,
                        line_number = record.line_number,
                        sku_resolved = sku.is_some(),
                        business_unit_resolved = unit.is_some(),
                        "SKU 或业务单元未解析，记录未提交"
                    );
                }
            }

            build.redo_records.push(record);
        }

        build
    }
}

// ==========================================
// 耐用品登记导入 - 字段映射器实现
// ==========================================
// 职责: 行值 + 表头字段 → ImportRecord
// 规则: 字符串原样复制；日期宽松解析，失败为 None；布尔严格 true/false，失败为 false
// ==========================================

use crate::domain::{ImportField, ImportRecord};
use crate::importer::warranty_importer_trait::FieldMapper as FieldMapperTrait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// 日期时间格式（按顺序尝试，含 en-US 12 小时制导出格式）
const DATE_TIME_FORMATS: [&str; 12] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y%m%d%H%M%S",
];

/// 日期格式（时间取 00:00:00）
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%Y%m%d",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn map_to_record(
        &self,
        values: &[&str],
        fields: &[ImportField],
        line_number: usize,
    ) -> ImportRecord {
        let text = |name: &str| get_string(values, fields, name);
        let date = |name: &str| parse_date_time(&get_string(values, fields, name));

        ImportRecord {
            // 制造标识
            record_type: text("RecordType"),
            line_number,
            unit_serial_number: text("UnitSerialNumber"),
            part_serial_number: text("PartSerialNumber"),
            part_number: text("PartNumber"),
            part_description: text("PartDescription"),
            product_sku: text("ProductSku"),

            // 发货/退货
            ship_date: date("ShipDate"),
            country_code: text("CountryCode"),
            product_name: text("ProductName"),
            order_number: text("OrderNumber"),
            invoice_number: text("InvoiceNumber"),
            return_date: date("ReturnDate"),

            // 维修/替换
            repair_date_time: date("RepairDate"),
            order_date: date("OrderDate"),
            order_line_number: text("OrderLineNumber"),
            replacement_part_name: text("ReplacementPartName"),

            // 登记
            registration_date: date("RegistrationDate"),
            registrant_first_name: text("RegistrantFirstName"),
            registrant_last_name: text("RegistrantLastName"),
            registrant_email: text("RegistrantEmail"),
            registration_abo_number: text("RegistrationAboNumber"),
            registration_source: text("RegistrationSource"),

            // 遗留保修
            is_legacy_warranty: parse_bool(&text("IsLegacyWarranty")),
            warranty_start_date: date("WarrantyStartDate"),
            warranty_end_date: date("WarrantyEndDate"),

            process_type: String::new(),
        }
    }
}

/// 按字段名（大小写不敏感）查找列
fn find_field<'a>(fields: &'a [ImportField], name: &str) -> Option<&'a ImportField> {
    fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

/// 提取字符串字段；字段缺失或列越界返回空串
fn get_string(values: &[&str], fields: &[ImportField], name: &str) -> String {
    find_field(fields, name)
        .and_then(|f| values.get(f.column_index))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// 宽松解析日期时间；空值或无法识别返回 None
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// 严格解析布尔值（true/false，大小写不敏感）；其他返回 false
pub fn parse_bool(value: &str) -> bool {
    // "false"、空值与无法识别的值都视为 false
    value.trim().eq_ignore_ascii_case("true")
}

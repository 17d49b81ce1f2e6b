// ==========================================
// 耐用品登记导入 - 字段/记录类型白名单
// ==========================================
// 职责: 表头字段名与记录类型的大小写不敏感校验
// 说明: 纯函数，白名单为不可变常量，首次使用时构建小写集合
// ==========================================

use std::collections::HashSet;
use std::sync::OnceLock;

/// 受支持的输入字段名
pub const SUPPORTED_FIELDS: [&str; 26] = [
    "RecordType",
    "UnitSerialNumber",
    "PartSerialNumber",
    "PartNumber",
    "PartDescription",
    "ProductSku",
    "ShipDate",
    "CountryCode",
    "ProductName",
    "OrderNumber",
    "InvoiceNumber",
    "ReturnDate",
    "RepairDate",
    "OrderDate",
    "OrderLineNumber",
    "ReplacementPartName",
    "RegistrationDate",
    "RegistrantFirstName",
    "RegistrantLastName",
    "RegistrantEmail",
    "RegistrationAboNumber",
    "RegistrationSource",
    "IsLegacyWarranty",
    "WarrantyStartDate",
    "WarrantyEndDate",
    "ProcessType",
];

/// 受支持的记录类型
pub const RECORD_TYPES: [&str; 3] = ["durable", "component", "replacement"];

fn lowercase_set(names: &[&str]) -> HashSet<String> {
    names.iter().map(|n| n.to_ascii_lowercase()).collect()
}

fn supported_field_set() -> &'static HashSet<String> {
    static SET: OnceLock<HashSet<String>> = OnceLock::new();
    SET.get_or_init(|| lowercase_set(&SUPPORTED_FIELDS))
}

fn record_type_set() -> &'static HashSet<String> {
    static SET: OnceLock<HashSet<String>> = OnceLock::new();
    SET.get_or_init(|| lowercase_set(&RECORD_TYPES))
}

/// 字段名是否受支持（大小写不敏感）
pub fn is_field_supported(name: &str) -> bool {
    supported_field_set().contains(&name.to_ascii_lowercase())
}

/// 记录类型是否有效（大小写不敏感）
pub fn is_valid_record_type(value: &str) -> bool {
    record_type_set().contains(&value.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_fields_any_case() {
        assert!(is_field_supported("UnitSerialNumber"));
        assert!(is_field_supported("unitserialnumber"));
        assert!(is_field_supported("REGISTRATIONDATE"));
        assert!(is_field_supported("ProcessType"));
    }

    #[test]
    fn test_unsupported_fields() {
        assert!(!is_field_supported("Foo"));
        assert!(!is_field_supported(""));
        assert!(!is_field_supported("Unit Serial Number"));
    }

    #[test]
    fn test_lookup_sets_cover_every_entry() {
        assert_eq!(supported_field_set().len(), SUPPORTED_FIELDS.len());
        assert_eq!(record_type_set().len(), RECORD_TYPES.len());
        assert!(SUPPORTED_FIELDS.iter().all(|f| is_field_supported(&f.to_uppercase())));
        assert!(supported_field_set().contains("registrationabonumber"));
    }

    #[test]
    fn test_record_types() {
        assert!(is_valid_record_type("Durable"));
        assert!(is_valid_record_type("COMPONENT"));
        assert!(is_valid_record_type("replacement"));
        assert!(!is_valid_record_type("widget"));
        assert!(!is_valid_record_type(""));
    }
}

// ==========================================
// 耐用品登记导入 - 文件解析器实现
// ==========================================
// 支持: 逗号分隔文本（首行为表头）
// 限制: 不支持引号转义，值中的逗号会导致列错位
// 编码: 按 UTF-8 读取，非法字节替换为 U+FFFD，不中断导入
// ==========================================

use crate::domain::{ImportField, ImportRecord, ValidationRecord};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::field_validator::{is_field_supported, is_valid_record_type};
use crate::importer::warranty_importer_trait::{FieldMapper as _, FileParser};
use csv::{ByteRecord, ReaderBuilder};
use std::borrow::Cow;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// 表头所在行号
const HEADER_LINE: usize = 1;

// ==========================================
// ParsedFile - 解析结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub fields: Vec<ImportField>,
    pub records: Vec<ImportRecord>,
    pub warnings: Vec<ValidationRecord>,
}

/// 解析表头单元格
///
/// 字段名去除所有空白；不受支持的字段生成一条 Warning（file_line_id = 1，序号从 1 递增）
pub fn parse_header_cells<'a>(
    cells: impl IntoIterator<Item = &'a str>,
) -> (Vec<ImportField>, Vec<ValidationRecord>) {
    let mut fields = Vec::new();
    let mut warnings = Vec::new();

    for (column_index, cell) in cells.into_iter().enumerate() {
        let name: String = cell
            .trim_start_matches('\u{feff}')
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        if is_field_supported(&name) {
            fields.push(ImportField { name, column_index });
        } else {
            let index = warnings.len() + 1;
            warnings.push(ValidationRecord::warning(
                HEADER_LINE,
                index,
                format!(
                    "Found a field name ({}) in the import file that is not supported.  The data it contains will not be included in the import",
                    name
                ),
            ));
        }
    }

    (fields, warnings)
}

/// 解析表头行
pub fn parse_header(line: &str) -> (Vec<ImportField>, Vec<ValidationRecord>) {
    parse_header_cells(line.split(','))
}

/// 解析数据行
pub fn parse_record(line: &str, fields: &[ImportField], line_number: usize) -> ImportRecord {
    let values: Vec<&str> = line.split(',').map(str::trim).collect();
    FieldMapper.map_to_record(&values, fields, line_number)
}

/// 记录类型不在白名单内时生成 Warning（不阻止导入）
fn check_record_type(record: &ImportRecord) -> Option<ValidationRecord> {
    let value = record.record_type.trim();
    if value.is_empty() || is_valid_record_type(value) {
        return None;
    }

    Some(ValidationRecord::warning(
        record.line_number,
        1,
        format!(
            "Found an unrecognized record type ({}) for serial number {}. The record is still imported",
            value, record.unit_serial_number
        ),
    ))
}

/// 逐字段宽松解码
fn decode_cells(row: &ByteRecord) -> Vec<Cow<'_, str>> {
    row.iter().map(String::from_utf8_lossy).collect()
}

fn is_blank(cells: &[Cow<'_, str>]) -> bool {
    cells.iter().all(|v| v.trim().is_empty())
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedFile> {
        // 检查文件存在
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .quoting(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows = reader.byte_records();

        // 读取表头
        let header = match rows.next() {
            Some(row) => row?,
            None => {
                return Err(ImportError::EmptyFile(file_path.display().to_string()));
            }
        };
        let header_cells = decode_cells(&header);
        let (fields, mut warnings) = parse_header_cells(header_cells.iter().map(|c| &**c));
        debug!(
            supported = fields.len(),
            unsupported = warnings.len(),
            "表头解析完成"
        );

        // 读取数据行
        let mapper = FieldMapper;
        let mut records = Vec::new();
        for result in rows {
            let row = result?;
            let cells = decode_cells(&row);

            // 跳过完全空白的行
            if is_blank(&cells) {
                continue;
            }

            let line_number = row
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(records.len() + HEADER_LINE + 1);
            let values: Vec<&str> = cells.iter().map(|c| c.trim()).collect();
            let record = mapper.map_to_record(&values, &fields, line_number);

            if let Some(warning) = check_record_type(&record) {
                warnings.push(warning);
            }
            records.push(record);
        }

        Ok(ParsedFile {
            fields,
            records,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationLevel;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_header_unsupported_field() {
        let (fields, warnings) = parse_header("UnitSerialNumber,Foo, product sku ,Bar");

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "UnitSerialNumber");
        assert_eq!(fields[0].column_index, 0);
        assert_eq!(fields[1].name, "productsku");
        assert_eq!(fields[1].column_index, 2);

        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].level, ValidationLevel::Warning);
        assert_eq!(warnings[0].file_line_id, 1);
        assert_eq!(warnings[0].record_index_id, 1);
        assert!(warnings[0].message.contains("Foo"));
        assert_eq!(warnings[1].record_index_id, 2);
        assert!(warnings[1].message.contains("Bar"));
    }

    #[test]
    fn test_parse_record_trims_values() {
        let (fields, _) = parse_header("UnitSerialNumber,CountryCode");
        let record = parse_record(" SN001 , US ", &fields, 2);

        assert_eq!(record.unit_serial_number, "SN001");
        assert_eq!(record.country_code, "US");
        assert_eq!(record.line_number, 2);
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "RecordType,UnitSerialNumber,ProductSku,Foo").unwrap();
        writeln!(temp_file, "Durable,SN001,SKU1,x").unwrap();
        writeln!(temp_file, "Durable,SN002,SKU2,y").unwrap();
        temp_file.flush().unwrap();

        let parsed = CsvParser.parse_file(temp_file.path()).unwrap();

        assert_eq!(parsed.fields.len(), 3);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].unit_serial_number, "SN001");
        assert_eq!(parsed.records[0].line_number, 2);
        assert_eq!(parsed.records[1].line_number, 3);
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn test_csv_parser_skips_blank_lines() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "UnitSerialNumber,ProductSku").unwrap();
        writeln!(temp_file, "SN001,SKU1").unwrap();
        writeln!(temp_file).unwrap();
        writeln!(temp_file, " , ").unwrap();
        writeln!(temp_file, "SN002,SKU2").unwrap();
        temp_file.flush().unwrap();

        let parsed = CsvParser.parse_file(temp_file.path()).unwrap();

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[1].unit_serial_number, "SN002");
        assert_eq!(parsed.records[1].line_number, 5);
    }

    #[test]
    fn test_csv_parser_record_type_warning() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "RecordType,UnitSerialNumber").unwrap();
        writeln!(temp_file, "Widget,SN001").unwrap();
        temp_file.flush().unwrap();

        let parsed = CsvParser.parse_file(temp_file.path()).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].file_line_id, 2);
        assert!(parsed.warnings[0].message.contains("Widget"));
        assert!(!parsed.warnings[0].is_blocking());
    }

    #[test]
    fn test_csv_parser_invalid_utf8_is_replaced() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"UnitSerialNumber,RegistrantFirstName\nSN1,Ren\xe9e\nSN2,Bob\n")
            .unwrap();
        temp_file.flush().unwrap();

        let parsed = CsvParser.parse_file(temp_file.path()).unwrap();

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].unit_serial_number, "SN1");
        assert_eq!(parsed.records[0].registrant_first_name, "Ren\u{fffd}e");
        assert_eq!(parsed.records[0].line_number, 2);
        assert_eq!(parsed.records[1].unit_serial_number, "SN2");
        assert_eq!(parsed.records[1].registrant_first_name, "Bob");
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_csv_parser_invalid_utf8_in_header() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"UnitSerialNumber,Pr\xe9nom\nSN1,x\n")
            .unwrap();
        temp_file.flush().unwrap();

        let parsed = CsvParser.parse_file(temp_file.path()).unwrap();

        assert_eq!(parsed.fields.len(), 1);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].message.contains("Pr\u{fffd}nom"));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_file(Path::new("/nonexistent/input.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_empty_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let result = CsvParser.parse_file(temp_file.path());
        assert!(matches!(result, Err(ImportError::EmptyFile(_))));
    }
}

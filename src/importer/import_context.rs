// ==========================================
// 耐用品登记导入 - 管道上下文
// ==========================================
// 职责: 持有一次运行的全部状态（取代全局变量）
// 生命周期: 由入口创建，以 &mut 传入导入器，运行结束后用于致命错误日志
// ==========================================

use crate::domain::{ImportRecord, ValidationRecord};
use crate::importer::artifact_writer::ArtifactPaths;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::reference_resolver::ReferenceTable;
use std::path::PathBuf;

#[derive(Debug)]
pub struct ImportContext {
    pub input_path: PathBuf,
    pub artifacts: ArtifactPaths,
    pub records: Vec<ImportRecord>,
    pub warnings: Vec<ValidationRecord>,
    pub skus: ReferenceTable,
    pub business_units: ReferenceTable,
    pub last_serial_number: Option<String>,
}

impl ImportContext {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        let input_path = input_path.into();
        Self {
            artifacts: ArtifactPaths::from_input(&input_path),
            input_path,
            records: Vec::new(),
            warnings: Vec::new(),
            skus: ReferenceTable::new(),
            business_units: ReferenceTable::new(),
            last_serial_number: None,
        }
    }

    /// 从命令行参数创建；参数缺失或为空白时报错
    pub fn from_argument(argument: Option<&str>) -> ImportResult<Self> {
        match argument.map(str::trim) {
            Some(path) if !path.is_empty() => Ok(Self::new(path)),
            _ => Err(ImportError::MissingInputArgument),
        }
    }

    /// 致命错误日志使用的序列号
    pub fn last_serial_number_or_empty(&self) -> &str {
        self.last_serial_number.as_deref().unwrap_or("")
    }
}

// ==========================================
// 耐用品登记导入 - 输出文件
// ==========================================
// <base> = 输入路径去掉 .csv 扩展名（大小写不敏感）
//   <base>_RunLog.txt               运行日志
//   <base>_redoRecords.txt          每行一条 JSON ImportRecord
//   <base>_executeMultipeResult.txt 批量提交诊断行
// 所有文件均为追加模式
// ==========================================

use crate::domain::ImportRecord;
use crate::importer::error::{ImportError, ImportResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

// ==========================================
// ArtifactPaths
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub base: String,
    pub run_log: PathBuf,
    pub redo_records: PathBuf,
    pub execute_result: PathBuf,
}

impl ArtifactPaths {
    pub fn from_input(input_path: &Path) -> Self {
        let raw = input_path.to_string_lossy();
        let split = raw
            .len()
            .checked_sub(4)
            .and_then(|i| raw.get(i..).map(|ext| (i, ext)));
        let base = match split {
            Some((i, ext)) if ext.eq_ignore_ascii_case(".csv") => raw[..i].to_string(),
            _ => raw.to_string(),
        };

        Self {
            run_log: PathBuf::from(format!("{}_RunLog.txt", base)),
            redo_records: PathBuf::from(format!("{}_redoRecords.txt", base)),
            execute_result: PathBuf::from(format!("{}_executeMultipeResult.txt", base)),
            base,
        }
    }
}

fn open_append(path: &Path) -> ImportResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| write_error(path, e))
}

fn write_error(path: &Path, err: impl std::fmt::Display) -> ImportError {
    ImportError::ArtifactWriteError {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

// ==========================================
// ArtifactWriter
// ==========================================
pub struct ArtifactWriter {
    paths: ArtifactPaths,
}

impl ArtifactWriter {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// 追加 redo 记录（每行一条 JSON）
    pub fn append_redo_records(&self, records: &[ImportRecord]) -> ImportResult<()> {
        let path = &self.paths.redo_records;
        let mut writer = BufWriter::new(open_append(path)?);

        for record in records {
            serde_json::to_writer(&mut writer, record).map_err(|e| write_error(path, e))?;
            writer.write_all(b"\n").map_err(|e| write_error(path, e))?;
        }

        writer.flush().map_err(|e| write_error(path, e))
    }

    /// 追加批量提交诊断行；无诊断行时也会创建文件
    pub fn append_results(&self, lines: &[String]) -> ImportResult<()> {
        let path = &self.paths.execute_result;
        let mut writer = BufWriter::new(open_append(path)?);

        for line in lines {
            writeln!(writer, "{}", line).map_err(|e| write_error(path, e))?;
        }

        writer.flush().map_err(|e| write_error(path, e))
    }
}

/// 读取 redo 文件（每行一条 JSON）
pub fn read_redo_records(path: &Path) -> ImportResult<Vec<ImportRecord>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            serde_json::from_str(l)
                .map_err(|e| ImportError::InternalError(format!("redo 记录解析失败: {}", e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_strip_csv_extension() {
        let paths = ArtifactPaths::from_input(Path::new("/data/in/foo.CSV"));

        assert_eq!(paths.base, "/data/in/foo");
        assert_eq!(paths.run_log, PathBuf::from("/data/in/foo_RunLog.txt"));
        assert_eq!(paths.redo_records, PathBuf::from("/data/in/foo_redoRecords.txt"));
        assert_eq!(
            paths.execute_result,
            PathBuf::from("/data/in/foo_executeMultipeResult.txt")
        );
    }

    #[test]
    fn test_paths_without_csv_extension() {
        let paths = ArtifactPaths::from_input(Path::new("input.txt"));
        assert_eq!(paths.base, "input.txt");
    }

    #[test]
    fn test_redo_records_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(ArtifactPaths::from_input(&dir.path().join("in.csv")));

        let first = ImportRecord {
            unit_serial_number: "SN001".to_string(),
            line_number: 2,
            process_type: "New create;".to_string(),
            ..Default::default()
        };
        let second = ImportRecord {
            unit_serial_number: "SN002".to_string(),
            line_number: 3,
            ..Default::default()
        };

        writer.append_redo_records(&[first.clone()]).unwrap();
        writer.append_redo_records(&[second.clone()]).unwrap();

        let back = read_redo_records(&writer.paths().redo_records).unwrap();
        assert_eq!(back, vec![first, second]);
    }

    #[test]
    fn test_results_file_created_when_empty() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(ArtifactPaths::from_input(&dir.path().join("in.csv")));

        writer.append_results(&[]).unwrap();
        assert!(writer.paths().execute_result.exists());

        writer.append_results(&["line one".to_string()]).unwrap();
        let content = std::fs::read_to_string(&writer.paths().execute_result).unwrap();
        assert_eq!(content, "line one\n");
    }
}

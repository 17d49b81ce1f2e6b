// ==========================================
// 耐用品登记导入 - 导入管道 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 解析 → 引用解析 → 分窗 → 已存在过滤 → 事务构建 → 批量提交 → 结果分类
// ==========================================

use crate::crm::{
    CrmError, Entity, ExecuteMultipleRequest, ExecuteMultipleResponse, ExecuteTransactionRequest,
};
use crate::domain::{ImportField, ImportRecord, ImportSummary};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::ParsedFile;
use crate::importer::import_context::ImportContext;
use crate::importer::reference_resolver::ReferenceTable;
use crate::importer::transaction_builder::WindowBuild;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

// ==========================================
// WarrantyImporter Trait
// ==========================================
// 用途: 导入主接口
// 实现者: WarrantyImporterImpl
#[async_trait]
pub trait WarrantyImporter: Send + Sync {
    /// 导入上下文指定的 CSV 文件
    ///
    /// # 参数
    /// - ctx: 本次运行的管道上下文（输入路径、输出文件路径、记录与引用表）
    ///
    /// # 返回
    /// - Ok(ImportSummary): 运行汇总（窗口报告、警告、耗时）
    /// - Err: 文件错误、配置错误、终止性远端错误（超时/传输失败/窗口外故障）
    ///
    /// # 说明
    /// - 窗口按文件顺序逐个处理
    /// - 单个窗口的整批故障写入结果文件后继续下一个窗口
    /// - ctx.last_serial_number 始终为最近处理的窗口的最后一个序列号
    async fn import_from_csv(&self, ctx: &mut ImportContext) -> ImportResult<ImportSummary>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser
pub trait FileParser: Send + Sync {
    /// 解析输入文件：第 1 行为表头，其余每个非空行生成一条记录
    fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedFile>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 行值 → ImportRecord
// 实现者: FieldMapper
pub trait FieldMapper: Send + Sync {
    /// 将一行的值映射为 ImportRecord（宽松解析，不返回错误）
    ///
    /// # 参数
    /// - values: 行内各列的值
    /// - fields: 表头中受支持的字段
    /// - line_number: 源文件行号（表头 = 1）
    fn map_to_record(
        &self,
        values: &[&str],
        fields: &[ImportField],
        line_number: usize,
    ) -> ImportRecord;
}

// ==========================================
// ConflictHandler Trait
// ==========================================
// 用途: 分窗 + 过滤远端已存在的耐用品
// 实现者: ConflictHandler
pub trait ConflictHandler: Send + Sync {
    /// 按固定大小切分为连续窗口（最后一个窗口可能不足）
    fn partition<'a>(&self, records: &'a [ImportRecord], group_size: usize)
        -> Vec<&'a [ImportRecord]>;

    /// 移除序列号已存在于远端的记录
    ///
    /// # 返回
    /// - (保留的记录, 跳过的数量)
    fn filter_existing(
        &self,
        window: &[ImportRecord],
        existing_serials: &HashSet<String>,
    ) -> (Vec<ImportRecord>, usize);
}

// ==========================================
// TransactionBuilder Trait
// ==========================================
// 用途: 记录 → 组合事务
// 实现者: DurableTransactionBuilder
pub trait TransactionBuilder: Send + Sync {
    /// 为单条记录构建组合事务（SKU 与业务单元已解析）
    fn build_transaction(
        &self,
        record: &ImportRecord,
        sku: &Entity,
        business_unit: Option<&Entity>,
    ) -> ExecuteTransactionRequest;

    /// 为一个窗口的记录构建事务列表与 redo 列表
    fn build_window(
        &self,
        records: Vec<ImportRecord>,
        skus: &ReferenceTable,
        business_units: &ReferenceTable,
    ) -> WindowBuild;
}

// ==========================================
// OutcomeClassifier Trait
// ==========================================
// 用途: 批量响应 → 诊断行
// 实现者: FaultClassifier
pub trait OutcomeClassifier: Send + Sync {
    /// 每个出错条目生成一行诊断
    fn classify(
        &self,
        request: &ExecuteMultipleRequest,
        response: &ExecuteMultipleResponse,
    ) -> Vec<String>;

    /// 整批调用故障的诊断行
    fn describe_batch_fault(&self, error: &CrmError) -> String;
}

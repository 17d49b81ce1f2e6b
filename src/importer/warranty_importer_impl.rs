// ==========================================
// 耐用品登记导入 - 导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到远端记录系统
// 流程: 解析 → 引用解析 → 分窗 → { 已存在过滤 → 事务构建 → 批量提交 → 结果分类 }
// 并发: 单逻辑线程，窗口严格按文件顺序处理
// ==========================================

use crate::config::ImportConfigReader;
use crate::crm::CrmService;
use crate::domain::{ImportRecord, ImportSummary, WindowReport, WindowStage};
use crate::importer::artifact_writer::ArtifactWriter;
use crate::importer::batch_submitter::{submit_window, FaultClassifier, SubmitOutcome};
use crate::importer::conflict_handler::{
    fetch_existing_serials, ConflictHandler as ConflictHandlerImpl,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::CsvParser;
use crate::importer::import_context::ImportContext;
use crate::importer::reference_resolver::{ReferenceResolver, ReferenceTable};
use crate::importer::transaction_builder::DurableTransactionBuilder;
use crate::importer::warranty_importer_trait::{
    ConflictHandler, FileParser, OutcomeClassifier, TransactionBuilder, WarrantyImporter,
};
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

// ==========================================
// WarrantyImporterImpl - 导入器实现
// ==========================================
pub struct WarrantyImporterImpl<S, C>
where
    S: CrmService,
    C: ImportConfigReader,
{
    // 远端组织服务
    service: S,

    // 配置读取器
    config: C,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    conflict_handler: Box<dyn ConflictHandler>,
    transaction_builder: Box<dyn TransactionBuilder>,
    outcome_classifier: Box<dyn OutcomeClassifier>,
}

impl<S, C> WarrantyImporterImpl<S, C>
where
    S: CrmService,
    C: ImportConfigReader,
{
    /// 使用默认组件创建导入器
    pub fn new(service: S, config: C) -> Self {
        Self::with_components(
            service,
            config,
            Box::new(CsvParser),
            Box::new(ConflictHandlerImpl),
            Box::new(DurableTransactionBuilder),
            Box::new(FaultClassifier),
        )
    }

    /// 创建导入器（指定各阶段组件）
    pub fn with_components(
        service: S,
        config: C,
        file_parser: Box<dyn FileParser>,
        conflict_handler: Box<dyn ConflictHandler>,
        transaction_builder: Box<dyn TransactionBuilder>,
        outcome_classifier: Box<dyn OutcomeClassifier>,
    ) -> Self {
        Self {
            service,
            config,
            file_parser,
            conflict_handler,
            transaction_builder,
            outcome_classifier,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// 处理单个窗口: Pending → Filtered → Built → Submitted → Classified
    async fn process_window(
        &self,
        report: &mut WindowReport,
        window: &[ImportRecord],
        skus: &ReferenceTable,
        business_units: &ReferenceTable,
        writer: &ArtifactWriter,
    ) -> ImportResult<()> {
        // === 已存在过滤 ===
        let existing = fetch_existing_serials(&self.service, window).await?;
        let (remaining, skipped) = self.conflict_handler.filter_existing(window, &existing);
        report.skipped_existing = skipped;
        report.stage = WindowStage::Filtered;

        if skipped > 0 {
            debug!(window = report.window_index, skipped, "跳过远端已存在的耐用品");
        }
        if remaining.is_empty() {
            info!(window = report.window_index, "窗口内无新记录");
            return Ok(());
        }

        // === 事务构建 ===
        let build = self
            .transaction_builder
            .build_window(remaining, skus, business_units);
        report.unresolved = build.unresolved;
        report.submitted = build.transactions.len();
        report.stage = WindowStage::Built;

        writer.append_redo_records(&build.redo_records)?;

        // === 批量提交 + 结果分类 ===
        let mut lines = Vec::new();
        if !build.transactions.is_empty() {
            let outcome = submit_window(
                &self.service,
                self.outcome_classifier.as_ref(),
                build.transactions,
            )
            .await?;
            report.stage = WindowStage::Submitted;

            match outcome {
                SubmitOutcome::Completed { fault_lines } => {
                    for line in &fault_lines {
                        warn!(window = report.window_index, "{}", line);
                    }
                    report.faults = fault_lines.clone();
                    lines = fault_lines;
                }
                SubmitOutcome::BatchFault { line } => {
                    report.batch_error = Some(line.clone());
                    lines.push(line);
                }
            }
        }

        writer.append_results(&lines)?;
        report.stage = WindowStage::Classified;
        Ok(())
    }
}

#[async_trait]
impl<S, C> WarrantyImporter for WarrantyImporterImpl<S, C>
where
    S: CrmService,
    C: ImportConfigReader,
{
    #[instrument(skip(self, ctx), fields(input = %ctx.input_path.display()))]
    async fn import_from_csv(&self, ctx: &mut ImportContext) -> ImportResult<ImportSummary> {
        let start_time = Instant::now();

        // === 步骤 0: 读取配置 ===
        let group_size = self
            .config
            .get_records_per_group()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: crate::config::config_keys::RECORDS_PER_GROUP.to_string(),
                message: e.to_string(),
            })?;

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let parsed = self.file_parser.parse_file(&ctx.input_path)?;
        for warning in &parsed.warnings {
            warn!(
                file_line_id = warning.file_line_id,
                record_index_id = warning.record_index_id,
                level = %warning.level,
                "{}",
                warning.message
            );
        }
        ctx.records = parsed.records;
        ctx.warnings = parsed.warnings;
        info!(
            records = ctx.records.len(),
            warnings = ctx.warnings.len(),
            "文件解析完成"
        );

        // === 步骤 2: 引用数据解析（整个文件各一次） ===
        debug!("步骤 2: 引用数据解析");
        let resolver = ReferenceResolver::new(&self.service);
        ctx.skus = resolver.fetch_skus(&ctx.records).await?;
        ctx.business_units = resolver.fetch_business_units(&ctx.records).await?;

        // === 步骤 3: 分窗处理 ===
        let windows = self.conflict_handler.partition(&ctx.records, group_size);
        let total_groups = windows.len();
        info!(
            "Found {} record(s) and divided into {} group(s) * {} to process.",
            ctx.records.len(),
            total_groups,
            group_size
        );

        let writer = ArtifactWriter::new(ctx.artifacts.clone());
        let mut reports = Vec::with_capacity(total_groups);

        for (index, window) in windows.into_iter().enumerate() {
            let window_index = index + 1;
            ctx.last_serial_number = window.last().map(|r| r.unit_serial_number.clone());
            info!(
                window = window_index,
                size = window.len(),
                "Process group {} of {}.",
                window_index,
                total_groups
            );

            let mut report = WindowReport::new(window_index, window.len());
            self.process_window(
                &mut report,
                window,
                &ctx.skus,
                &ctx.business_units,
                &writer,
            )
            .await?;

            info!(
                window = window_index,
                stage = %report.stage,
                skipped_existing = report.skipped_existing,
                unresolved = report.unresolved,
                submitted = report.submitted,
                faults = report.faults.len(),
                "窗口处理完成"
            );
            reports.push(report);
        }

        let summary = ImportSummary {
            total_records: ctx.records.len(),
            group_size,
            warnings: ctx.warnings.clone(),
            windows: reports,
            elapsed_time: start_time.elapsed(),
        };

        info!(
            total = summary.total_records,
            windows = summary.window_count(),
            submitted = summary.submitted(),
            skipped_existing = summary.skipped_existing(),
            unresolved = summary.unresolved(),
            faults = summary.fault_count(),
            elapsed_ms = summary.elapsed_time.as_millis() as u64,
            "导入完成"
        );

        Ok(summary)
    }
}

// ==========================================
// 耐用品登记导入 - 命令行入口
// ==========================================
// 用法: warranty-import <input.csv> [--dry-run]
//   --dry-run  使用内存组织服务演练，不连接 CRM
// 退出码: 成功 0；致命错误非 0
// ==========================================

use chrono::Local;
use std::process::ExitCode;
use tracing::{error, info, warn};
use warranty_import::config::{config_keys, get_default_db_path, ConfigManager, ImportConfigReader};
use warranty_import::crm::{CrmService, DynamicsWebClient, InMemoryCrmService};
use warranty_import::importer::{
    ImportContext, ImportError, ImportResult, WarrantyImporter, WarrantyImporterImpl,
};
use warranty_import::{logging, ImportSummary};

/// 命令行参数
struct CliArgs {
    input: Option<String>,
    dry_run: bool,
}

fn parse_args(args: impl Iterator<Item = String>) -> CliArgs {
    let mut cli = CliArgs {
        input: None,
        dry_run: false,
    };

    for arg in args {
        if arg == "--dry-run" {
            cli.dry_run = true;
        } else if cli.input.is_none() {
            cli.input = Some(arg);
        }
    }

    cli
}

fn main() -> ExitCode {
    let args = parse_args(std::env::args().skip(1));

    let mut ctx = match ImportContext::from_argument(args.input.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            logging::init();
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_with_run_log(&ctx.artifacts.run_log) {
        logging::init();
        warn!(
            path = %ctx.artifacts.run_log.display(),
            error = %e,
            "运行日志文件无法打开，仅输出到控制台"
        );
    }

    info!("Job start at: {}. Connecting to CRM ...", Local::now());

    let exit_code = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => match runtime.block_on(run(&mut ctx, args.dry_run)) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                log_fatal(&ctx, &e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!(error = %e, "异步运行时初始化失败");
            ExitCode::FAILURE
        }
    };

    info!("Job end at: {}.", Local::now());
    exit_code
}

/// 连接远端并执行导入；连接在本函数返回时释放
async fn run(ctx: &mut ImportContext, dry_run: bool) -> ImportResult<ImportSummary> {
    let db_path = get_default_db_path();
    info!("使用配置库: {}", db_path);

    let config = ConfigManager::new(&db_path).map_err(|e| ImportError::ConfigReadError {
        key: "config_db".to_string(),
        message: e.to_string(),
    })?;

    if dry_run {
        let service = InMemoryCrmService::new();
        service.who_am_i().await?;
        info!("CRM is connected at: {} (dry run).", Local::now());
        return WarrantyImporterImpl::new(service, config)
            .import_from_csv(ctx)
            .await;
    }

    let settings = config
        .get_crm_connection()
        .await
        .map_err(|e| ImportError::ConfigReadError {
            key: config_keys::CRM_BASE_URL.to_string(),
            message: e.to_string(),
        })?;
    let client = DynamicsWebClient::connect(&settings).await?;
    info!("CRM is connected at: {}.", Local::now());

    WarrantyImporterImpl::new(client, config)
        .import_from_csv(ctx)
        .await
}

/// 致命错误日志（附最近处理的序列号）
fn log_fatal(ctx: &ImportContext, e: &ImportError) {
    let serial_number = ctx.last_serial_number_or_empty();

    if e.is_fault() {
        error!(
            "The application terminated with a remote fault while processing serial number: {}. Fault: {}",
            serial_number, e
        );
    } else if e.is_timeout() {
        error!(
            "The application terminated with a timeout while processing serial number: {}. Timeout: {}",
            serial_number, e
        );
    } else {
        error!(
            "The application terminated with an error while processing serial number: {}. message: {}",
            serial_number, e
        );
    }
}

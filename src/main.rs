use clap::Parser;
use hr_etl::utils::error::ErrorSeverity;
use hr_etl::utils::{logger, validation::Validate};
use hr_etl::{CliConfig, EtlEngine, EtlError, HrPipeline, LocalStorage, RuleConfiguration, ValidationRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting hr-etl CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    // 規則有誤時在讀取任何資料前就中止
    tracing::info!("📁 Loading rules from: {}", config.rules);
    let runner = match RuleConfiguration::from_file(&config.rules).and_then(|rules| ValidationRunner::from_config(&rules)) {
        Ok(runner) => runner,
        Err(e) => exit_with(&e),
    };

    if config.dry_run {
        println!("🔍 Rules in {} are valid; dry run, no records processed.", config.rules);
        return Ok(());
    }

    let storage = LocalStorage::new(".");
    let pipeline = HrPipeline::new(storage, config, runner);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(report) => {
            let summary = &report.summary;
            println!("\n--- Final Summary ---");
            println!(
                "Total Records: {} | Accepted: {} | Rejected: {} | Total Errors: {}",
                summary.total_rows, summary.accepted_count, summary.rejected_count, summary.total_errors
            );
            for (field, count) in &summary.field_error_counts {
                println!("  {:<10} {}", field, count);
            }
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

fn exit_with(e: &EtlError) -> ! {
    tracing::error!(
        "❌ Validation run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

use clap::Parser;
use hr_etl::core::ConfigProvider;
use hr_etl::utils::error::ErrorSeverity;
use hr_etl::utils::{logger, validation::Validate};
use hr_etl::{EtlEngine, EtlError, HrPipeline, LocalStorage, TomlConfig, ValidationRunner};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "HR record validation driven by a TOML pipeline file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "hr-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the input file from config
    #[arg(long)]
    input: Option<String>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based HR validation");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(input) = args.input.clone() {
        tracing::info!("🔧 Input overridden to: {}", input);
        config.source.path = input;
    }

    // 驗證配置，規則也在此時編譯
    let runner = match config
        .validate()
        .and_then(|_| ValidationRunner::from_config(&config.rules))
    {
        Ok(runner) => runner,
        Err(e) => exit_with(&e),
    };

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        return Ok(());
    }

    let storage = LocalStorage::new(".");
    let pipeline = HrPipeline::new(storage, config, runner);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Validation run completed successfully!");
            println!("✅ Validation run completed successfully!");
            println!(
                "📊 {} rows: {} accepted, {} rejected",
                report.summary.total_rows, report.summary.accepted_count, report.summary.rejected_count
            );
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
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    let rules = &config.rules;

    println!("📋 Configuration Summary:");
    println!("  Pipeline: {} v{}", config.pipeline.name, config.pipeline.version.as_deref().unwrap_or("-"));
    println!("  Source: {}", config.input_path());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.load.output_formats.join(", "));

    if let Some(max_records) = config.max_records() {
        println!("  Max Records: {}", max_records);
    }
    if let Some(archive) = config.archive_name() {
        println!("  Compression: {} (ZIP)", archive);
    }

    println!("🛠️ Rules:");
    match &rules.salary_rules {
        Some(salary) => println!("  Salary: {} - {}", salary.min, salary.max),
        None => println!("  Salary: bounds disabled"),
    }
    match &rules.date_rules {
        Some(date) => println!("  Hire date: {}", date.expected_format),
        None => println!("  Hire date: disabled"),
    }
    match &rules.id_rules {
        Some(id) => println!(
            "  ID: length={:?} prefix={:?} pattern={:?}",
            id.required_length, id.prefix, id.pattern
        ),
        None => println!("  ID: disabled"),
    }
    match &rules.phone_rules {
        Some(phone) => println!("  Phone: {} digits", phone.required_digit_count),
        None => println!("  Phone: disabled"),
    }

    if let Some(mapping) = config.field_mapping() {
        println!("🔄 Field Mapping:");
        for (from, to) in mapping {
            println!("  {} -> {}", from, to);
        }
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

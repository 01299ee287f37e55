use clap::Parser;
use hplc_quant::utils::error::ErrorSeverity;
use hplc_quant::utils::{logger, validation::Validate};
use hplc_quant::{
    CliConfig, ConsolePrompt, DilutionFactor, LocalStorage, QuantEngine, QuantError,
    ReferenceTable, RunConfig, RunInputs, RunOutcome,
};

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();
    let verbose = cli.verbose;
    let dry_run = cli.dry_run;

    let config = match cli.into_run_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting hplc-quant");
    tracing::debug!("Run config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config);

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - No data will be read");
        return Ok(());
    }

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let concentrations = config.calibration.concentrations.clone();
    let dilution = if config.unknowns.prompt_dilution {
        None
    } else {
        Some(DilutionFactor::new(
            config.unknowns.dilution_factor.unwrap_or(1.0),
        )?)
    };
    let mut engine = QuantEngine::new_with_monitoring(storage, config, monitor_enabled);

    let console = || ConsolePrompt::new(std::io::stdin().lock(), std::io::stderr());
    let result = match (concentrations, dilution) {
        (Some(table), Some(factor)) => {
            engine.run(&mut RunInputs::new(ReferenceTable::new(table), factor))
        }
        (Some(table), None) => engine.run(&mut RunInputs::new(ReferenceTable::new(table), console())),
        (None, Some(factor)) => engine.run(&mut RunInputs::new(console(), factor)),
        (None, None) => engine.run(&mut console()),
    };

    match result {
        Ok(outcome) => print_outcome(&outcome),
        Err(e) => exit_with(e),
    }

    Ok(())
}

fn display_config_summary(config: &RunConfig) {
    let layout = &config.layout;
    println!("📋 Run Summary: {}", config.run_name());
    println!("  Input: {}", config.run.input);
    println!(
        "  Layout: {} delimited, {} header rows, {} gap rows, name col {}, area col {}",
        layout.delimiter,
        layout.header_rows,
        layout.section_gap_rows,
        layout.name_column,
        layout.area_column
    );
    println!("  Calibration Points: {}", config.calibration_points());
    match &config.calibration.concentrations {
        Some(values) => println!("  Concentrations: {:?}", values),
        None => println!("  Concentrations: prompted"),
    }
    match config.unknowns.count {
        Some(count) => println!("  Samples: {}", count),
        None => println!("  Samples: until end of file"),
    }
    if config.unknowns.prompt_dilution {
        println!("  Dilution: prompted");
    } else {
        println!(
            "  Dilution: {}",
            config.unknowns.dilution_factor.unwrap_or(1.0)
        );
    }
    println!("  Output: {} ({})", config.output_path(), config.output.formats.join(", "));
    if config.output.zip {
        println!("  Bundle: ZIP");
    }
    println!();
}

fn print_outcome(outcome: &RunOutcome) {
    let report = &outcome.report;
    println!("The R squared value is {}", report.r_squared());
    if report.poor_fit() {
        println!("⚠️ The calibration line fits no better than the mean concentration");
    }
    for sample in report.samples() {
        println!(
            "  {}: area {} -> {}",
            sample.sample_name, sample.measured_area, sample.estimated_concentration
        );
    }
    if !report.skipped_rows().is_empty() {
        println!("⚠️ {} malformed rows skipped", report.skipped_rows().len());
    }
    for artifact in &outcome.artifacts {
        println!("📁 Report written to '{}'", artifact);
    }
}

fn exit_with(e: QuantError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
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
    std::process::exit(exit_code)
}

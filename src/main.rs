use clap::Parser;
use gpurelperf::core::ConfigProvider;
use gpurelperf::utils::{error::Result, logger, validation::Validate};
use gpurelperf::{BenchmarkStore, CliConfig, PlatformProbe, RatioReport, RelPerfEngine, TomlConfig};

async fn run_with<C: ConfigProvider + Validate>(config: &C) -> Result<RatioReport> {
    config.validate()?;

    let store = BenchmarkStore::from_config(config)?;
    // 平台只偵測一次
    let probe = PlatformProbe::detect(config);
    RelPerfEngine::new(store, probe).run().await
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(cli.verbose, logger::LogFormat::from_flag(cli.json_logs));

    tracing::info!("Starting gpurelperf");
    tracing::debug!("CLI config: {:?}", cli);

    let result = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match TomlConfig::from_file(path) {
                Ok(file_config) => run_with(&file_config).await,
                Err(e) => Err(e),
            }
        }
        None => run_with(&cli).await,
    };

    match result {
        Ok(report) => {
            tracing::info!("✅ Computed ratios for {} cards", report.len());
            if report.is_empty() {
                println!("No NVIDIA GPUs detected");
            }
            for (index, r) in report.results.iter().enumerate() {
                println!("{}: {} score={} ratio={:.2}", index, r.name, r.score, r.ratio);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}

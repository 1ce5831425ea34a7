use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jtmd_pipeline::config::Config;
use jtmd_pipeline::dataset::MergePolicy;
use jtmd_pipeline::extract::{Period, PeriodFallback};
use jtmd_pipeline::importers::DirectoryFetcher;
use jtmd_pipeline::services::PipelineService;

#[derive(Parser)]
#[command(name = "jtmd-pipeline")]
#[command(about = "Extract JPX monthly ETF/REIT trading statistics into CSV and zip artifacts", long_about = None)]
struct Cli {
    /// Directory holding the downloaded workbooks (overrides JTMD_INPUT_DIR)
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory the artifacts are written to (overrides JTMD_OUTPUT_DIR)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Worksheet to read from each workbook (default: Value)
    #[arg(long)]
    sheet: Option<String>,

    /// Only process reports for this period, as YYYY-MM
    #[arg(long)]
    period: Option<Period>,

    /// 'last-write-wins', 'first-write-wins' or 'reject'
    #[arg(long)]
    merge_policy: Option<MergePolicy>,

    /// What to do when a file name carries no period: 'current-month' or 'reject'
    #[arg(long)]
    period_fallback: Option<PeriodFallback>,

    /// Extract and print the run report as JSON without writing artifacts
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn apply(self, mut config: Config) -> Config {
        if let Some(dir) = self.input_dir {
            config.input_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(sheet) = self.sheet {
            config.sheet_name = sheet;
        }
        if let Some(period) = self.period {
            config.target_period = Some(period);
        }
        if let Some(policy) = self.merge_policy {
            config.merge_policy = policy;
        }
        if let Some(fallback) = self.period_fallback {
            config.period_fallback = fallback;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,jtmd_pipeline=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let dry_run = cli.dry_run;
    let config = cli.apply(Config::from_env()?);
    info!("Starting JTMD extraction with config: {:?}", config);

    let fetcher = DirectoryFetcher::new(config.input_dir.clone());
    let service = PipelineService::new(&config, fetcher);
    let now = Local::now().naive_local();

    if dry_run {
        let report = service.extract(now)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let report = service.run(now)?;
    if let Some(artifacts) = &report.artifacts {
        info!("Data file: {}", artifacts.data_file.display());
        info!("Metadata file: {}", artifacts.metadata_file.display());
        info!("Archive: {}", artifacts.archive.display());
    }
    if !report.failures.is_empty() {
        info!("{} file(s) were skipped", report.failures.len());
    }

    Ok(())
}

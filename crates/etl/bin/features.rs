//! features CLI - 构建周度特征矩阵

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use etl::scraper::pacing_limiter;
use etl::scraper::twitter::TwitterScraper;
use etl::{FeaturePipeline, PipelineConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "features")]
#[command(about = "Build the weekly market + sentiment feature matrix")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download prices, join sentiment and write the feature CSV
    Build {
        /// JSON config file (missing fields use defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Data root directory
        #[arg(short, long)]
        data_root: Option<PathBuf>,

        /// Volatility window in periods
        #[arg(short, long)]
        window: Option<usize>,

        /// Drop rows before this date (YYYY-MM-DD)
        #[arg(long)]
        cutoff: Option<NaiveDate>,
    },
    /// Download raw text for every configured source
    FetchText {
        /// JSON config file (missing fields use defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Data root directory
        #[arg(short, long)]
        data_root: Option<PathBuf>,
    },
}

fn load_config(
    path: Option<PathBuf>,
    data_root: Option<PathBuf>,
) -> anyhow::Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(root) = data_root {
        config.data_root = root;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            data_root,
            window,
            cutoff,
        } => {
            let mut config = load_config(config, data_root)?;
            if let Some(window) = window {
                config.volatility_window = window;
            }
            if cutoff.is_some() {
                config.cutoff = cutoff;
            }

            let pipeline = FeaturePipeline::new(config)?;
            let table = pipeline.build().await.context("feature build failed")?;
            info!("Built {} rows x {} features", table.len(), table.columns().len());
        }
        Commands::FetchText { config, data_root } => {
            let config = load_config(config, data_root)?;
            let scraper = TwitterScraper::new()?
                .with_rate_limiter(pacing_limiter(config.requests_per_minute)?);

            let pipeline = FeaturePipeline::new(config)?;
            let total = pipeline
                .fetch_text(&scraper)
                .await
                .context("text download failed")?;
            info!("Downloaded {} text records", total);
        }
    }

    Ok(())
}

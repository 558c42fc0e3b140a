mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use garde_core::AppConfig;
use garde_pipeline::IngestionService;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "garde-cli")]
#[command(about = "Duty pharmacy directory operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the source page and replace the stored directory
    Scrape,
    /// Recompute which pharmacies are on duty without re-scraping
    Refresh {
        /// Weekday to resolve against (0 = Sunday); defaults to today
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=6))]
        day: Option<u8>,
    },
    /// Find the closest on-duty pharmacy to a point
    Nearest {
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,
        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,
    },
    /// Run the extraction chain and print the drafts without storing them
    Extract {
        /// Read HTML from a local file instead of fetching the source URL
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = garde_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scrape => commands::run_scrape(&open_service(&config).await?).await,
        Commands::Refresh { day } => {
            commands::run_refresh(&open_service(&config).await?, day).await
        }
        Commands::Nearest {
            latitude,
            longitude,
        } => commands::run_nearest(&open_service(&config).await?, latitude, longitude).await,
        Commands::Extract { file } => commands::run_extract(&config, file.as_deref()).await,
    }
}

async fn open_service(config: &AppConfig) -> anyhow::Result<IngestionService> {
    let store = garde_db::open_store(config).await?;
    Ok(IngestionService::from_app_config(config, store)?)
}

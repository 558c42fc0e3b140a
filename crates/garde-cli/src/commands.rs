//! Command handlers. Results go to stdout as JSON; logs go to stderr.

use std::path::Path;

use anyhow::Context;
use garde_core::AppConfig;
use garde_pipeline::IngestionService;
use garde_scraper::{build_client, fetch_html, StrategyChain};

pub(crate) async fn run_scrape(service: &IngestionService) -> anyhow::Result<()> {
    let summary = service.run_ingestion().await;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if !summary.success {
        anyhow::bail!(summary.message);
    }
    Ok(())
}

pub(crate) async fn run_refresh(
    service: &IngestionService,
    day: Option<u8>,
) -> anyhow::Result<()> {
    let reference_day = day.unwrap_or_else(|| service.today());
    let updated = service.refresh_duty_status(reference_day).await?;
    println!(
        "{}",
        serde_json::json!({ "updated": updated, "reference_day": reference_day })
    );
    Ok(())
}

/// An in-memory store starts empty in every process, so populate it first.
async fn ensure_populated(service: &IngestionService) -> anyhow::Result<()> {
    if service.store().get_all().await?.is_empty() {
        tracing::info!("store is empty; running ingestion before the query");
        let summary = service.run_ingestion().await;
        if !summary.success {
            anyhow::bail!(summary.message);
        }
    }
    Ok(())
}

pub(crate) async fn run_nearest(
    service: &IngestionService,
    latitude: f64,
    longitude: f64,
) -> anyhow::Result<()> {
    ensure_populated(service).await?;
    let found = service.query_nearest(latitude, longitude).await?;
    println!("{}", serde_json::to_string_pretty(&found)?);
    Ok(())
}

pub(crate) async fn run_extract(config: &AppConfig, file: Option<&Path>) -> anyhow::Result<()> {
    let html = match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let client = build_client(config.scraper_request_timeout_secs)?;
            fetch_html(&client, &config.source_url, &config.scraper_user_agent).await?
        }
    };

    let chain = StrategyChain::default();
    let report = match chain.run(&html) {
        Some(found) => {
            let count = found.drafts.len();
            serde_json::json!({
                "strategy": found.strategy,
                "count": count,
                "drafts": found.drafts,
            })
        }
        None => serde_json::json!({
            "strategy": null,
            "count": 0,
            "tried": chain.strategy_names(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

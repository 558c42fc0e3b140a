use garde_core::CoreError;
use garde_db::StoreError;
use garde_scraper::ScraperError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to fetch source page: {0}")]
    Fetch(#[from] ScraperError),

    #[error("No pharmacies found during scraping")]
    NoRecordsExtracted,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ingestion already in progress")]
    AlreadyRunning,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Malformed(#[from] CoreError),

    #[error("no on-duty pharmacy with a known location")]
    NotFound,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

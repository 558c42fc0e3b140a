//! Ingestion orchestration and the query operations built on the store.

pub mod error;
pub mod service;

pub use error::{IngestError, QueryError};
pub use service::{IngestionService, IngestionSettings, IngestionSummary};

//! The ingestion run and the operations that read its results.
//!
//! One run: fetch the source page, run the strategy chain, normalize and
//! locate every draft, resolve duty status, then swap the whole store
//! contents. At most one run is in flight; a second trigger is rejected
//! rather than queued.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use garde_core::{
    find_nearest, is_on_duty, reference_day, resolve_duty, stamp_now, AppConfig, Coordinates,
    DraftRecord, NearestMatch, NewPharmacy, PharmacyPatch,
};
use garde_db::PharmacyStore;
use garde_scraper::{
    build_client, fetch_html, normalize_draft, Locator, PlaceholderLocator, StrategyChain,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{IngestError, QueryError};

#[derive(Debug, Clone)]
pub struct IngestionSettings {
    pub source_url: String,
    pub user_agent: String,
    pub locate_concurrency: usize,
    pub utc_offset_minutes: i32,
}

impl IngestionSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            source_url: config.source_url.clone(),
            user_agent: config.scraper_user_agent.clone(),
            locate_concurrency: config.locate_concurrency,
            utc_offset_minutes: config.utc_offset_minutes,
        }
    }
}

/// Outcome of one ingestion trigger. Failures are reported here, never
/// raised to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionSummary {
    pub success: bool,
    pub count: usize,
    pub message: String,
}

impl IngestionSummary {
    fn succeeded(count: usize) -> Self {
        Self {
            success: true,
            count,
            message: format!("Successfully scraped and saved {count} pharmacies"),
        }
    }

    fn failed(err: &IngestError) -> Self {
        Self {
            success: false,
            count: 0,
            message: err.to_string(),
        }
    }
}

pub struct IngestionService {
    store: Arc<dyn PharmacyStore>,
    client: reqwest::Client,
    locator: Arc<dyn Locator>,
    chain: StrategyChain,
    settings: IngestionSettings,
    run_lock: Mutex<()>,
}

impl IngestionService {
    #[must_use]
    pub fn new(
        store: Arc<dyn PharmacyStore>,
        client: reqwest::Client,
        locator: Arc<dyn Locator>,
        settings: IngestionSettings,
    ) -> Self {
        Self {
            store,
            client,
            locator,
            chain: StrategyChain::default(),
            settings,
            run_lock: Mutex::new(()),
        }
    }

    /// Wire the service from configuration: HTTP client with the configured
    /// timeout and the placeholder locator around the city center.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Fetch`] if the HTTP client cannot be built.
    pub fn from_app_config(
        config: &AppConfig,
        store: Arc<dyn PharmacyStore>,
    ) -> Result<Self, IngestError> {
        let client = build_client(config.scraper_request_timeout_secs)?;
        let locator = PlaceholderLocator::new(
            Coordinates {
                latitude: config.city_latitude,
                longitude: config.city_longitude,
            },
            config.location_jitter_degrees,
        );
        Ok(Self::new(
            store,
            client,
            Arc::new(locator),
            IngestionSettings::from_app_config(config),
        ))
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn PharmacyStore> {
        &self.store
    }

    /// Today's weekday (0 = Sunday) at the configured UTC offset.
    #[must_use]
    pub fn today(&self) -> u8 {
        reference_day(Utc::now(), self.settings.utc_offset_minutes)
    }

    /// Run one ingestion and report the outcome.
    pub async fn run_ingestion(&self) -> IngestionSummary {
        match self.try_ingest().await {
            Ok(count) => {
                tracing::info!(
                    count,
                    source_url = %self.settings.source_url,
                    "ingestion complete"
                );
                IngestionSummary::succeeded(count)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    source_url = %self.settings.source_url,
                    "ingestion failed"
                );
                IngestionSummary::failed(&err)
            }
        }
    }

    /// Run one ingestion, returning the number of records written.
    ///
    /// The store is only touched after extraction produced at least one
    /// draft.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::AlreadyRunning`] when another run holds the
    /// guard, [`IngestError::Fetch`] when the page cannot be fetched,
    /// [`IngestError::NoRecordsExtracted`] when every strategy comes back
    /// empty, and [`IngestError::Store`] when the replace fails.
    pub async fn try_ingest(&self) -> Result<usize, IngestError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| IngestError::AlreadyRunning)?;

        let html = fetch_html(
            &self.client,
            &self.settings.source_url,
            &self.settings.user_agent,
        )
        .await?;

        let drafts = self.chain.extract(&html);
        if drafts.is_empty() {
            return Err(IngestError::NoRecordsExtracted);
        }

        let now = stamp_now();
        let today = reference_day(now, self.settings.utc_offset_minutes);
        let records = self.build_records(drafts, today, now).await;

        Ok(self.store.replace_all(records).await?)
    }

    /// Normalize and locate drafts, then resolve duty against `today`.
    /// Output order matches input order.
    async fn build_records(
        &self,
        drafts: Vec<DraftRecord>,
        today: u8,
        resolved_at: DateTime<Utc>,
    ) -> Vec<NewPharmacy> {
        let locator = self.locator.as_ref();
        let normalized = stream::iter(drafts)
            .map(|draft| async move {
                let mut pharmacy = normalize_draft(draft, today, None);
                pharmacy.coordinates = locator.locate(&pharmacy.address).await;
                pharmacy
            })
            .buffered(self.settings.locate_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let located = normalized.iter().filter(|p| p.coordinates.is_some()).count();
        tracing::debug!(total = normalized.len(), located, "normalized drafts");

        resolve_duty(normalized, today, resolved_at)
    }

    /// Recompute `is_open` for every stored record against `reference_day`
    /// without re-extracting. Waits for any in-flight ingestion to finish.
    ///
    /// Returns the number of records updated.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Store`] if reading or updating fails.
    pub async fn refresh_duty_status(&self, reference_day: u8) -> Result<usize, IngestError> {
        let _guard = self.run_lock.lock().await;

        let records = self.store.get_all().await?;
        let now = stamp_now();
        for record in &records {
            self.store
                .update_fields(
                    record.id,
                    PharmacyPatch {
                        is_open: Some(is_on_duty(record.day_of_week, reference_day)),
                        updated_at: now,
                    },
                )
                .await?;
        }

        tracing::info!(count = records.len(), reference_day, "duty status refreshed");
        Ok(records.len())
    }

    /// Closest on-duty pharmacy to the given point.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Malformed`] for out-of-range coordinates,
    /// [`QueryError::NotFound`] when no on-duty record has a location, and
    /// [`QueryError::Store`] if the read fails.
    pub async fn query_nearest(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<NearestMatch, QueryError> {
        let point = Coordinates::try_new(latitude, longitude)?;
        let on_duty = self.store.get_by_flag(true).await?;
        find_nearest(point, &on_duty).ok_or(QueryError::NotFound)
    }
}

pub mod app_config;
pub mod config;
pub mod duty;
pub mod geo;
pub mod pharmacies;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use duty::{is_on_duty, reference_day, resolve_duty, stamp_now, weekday_index};
pub use geo::{find_nearest, haversine_km, round_km, Coordinates, NearestMatch, EARTH_RADIUS_KM};
pub use pharmacies::{
    DraftRecord, NewPharmacy, NormalizedPharmacy, PharmacyPatch, PharmacyRecord,
    DEFAULT_ADDRESS, PHONE_SENTINEL,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("malformed query: {0}")]
    MalformedQuery(String),
}

use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Postgres URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub source_url: String,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub city_latitude: f64,
    pub city_longitude: f64,
    pub location_jitter_degrees: f64,
    pub locate_concurrency: usize,
    /// Offset from UTC used to decide which weekday "today" is.
    pub utc_offset_minutes: i32,
    pub scrape_cron: String,
    pub duty_refresh_cron: String,
    pub allowed_origins: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("source_url", &self.source_url)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("city_latitude", &self.city_latitude)
            .field("city_longitude", &self.city_longitude)
            .field("location_jitter_degrees", &self.location_jitter_degrees)
            .field("locate_concurrency", &self.locate_concurrency)
            .field("utc_offset_minutes", &self.utc_offset_minutes)
            .field("scrape_cron", &self.scrape_cron)
            .field("duty_refresh_cron", &self.duty_refresh_cron)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

//! Source page scraping: fetch, extraction strategies, field normalization
//! and coordinate assignment.

pub mod error;
pub mod fetch;
pub mod html;
pub mod locator;
pub mod normalize;
pub mod strategies;

pub use error::ScraperError;
pub use fetch::{build_client, fetch_html};
pub use locator::{Locator, PlaceholderLocator};
pub use normalize::{find_phone_shaped, normalize_draft, normalize_phone, resolve_day_of_week};
pub use strategies::{
    ChainMatch, ExtractionStrategy, GenericSelectorStrategy, LineScanStrategy,
    PrimarySelectorStrategy, StrategyChain,
};

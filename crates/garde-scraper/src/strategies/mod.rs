//! Extraction strategy chain.
//!
//! Strategies run in priority order (source-specific selector, generic
//! selectors, line scan) and the first one producing at least one draft wins.

mod generic;
mod line_scan;
mod primary;

use garde_core::DraftRecord;

pub use generic::GenericSelectorStrategy;
pub use line_scan::LineScanStrategy;
pub use primary::PrimarySelectorStrategy;

/// Names this short or shorter are page noise, not pharmacies.
const MIN_NAME_CHARS: usize = 4;

/// One way of turning a page into drafts.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Drafts in document order. An empty vec means the strategy did not
    /// recognise the page.
    fn extract(&self, document: &str) -> Vec<DraftRecord>;
}

pub(crate) fn is_plausible_name(name: &str) -> bool {
    name.trim().chars().count() >= MIN_NAME_CHARS
}

/// Result of a chain run: which strategy matched and what it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMatch {
    pub strategy: &'static str,
    pub drafts: Vec<DraftRecord>,
}

pub struct StrategyChain {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl StrategyChain {
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run strategies in order until one yields drafts.
    ///
    /// Returns `None` when every strategy comes back empty.
    #[must_use]
    pub fn run(&self, document: &str) -> Option<ChainMatch> {
        for strategy in &self.strategies {
            let drafts = strategy.extract(document);
            if drafts.is_empty() {
                tracing::debug!(strategy = strategy.name(), "strategy found no pharmacies");
                continue;
            }
            tracing::info!(
                strategy = strategy.name(),
                count = drafts.len(),
                "extracted pharmacies"
            );
            return Some(ChainMatch {
                strategy: strategy.name(),
                drafts,
            });
        }
        None
    }

    /// Drafts from the first successful strategy, or an empty vec.
    #[must_use]
    pub fn extract(&self, document: &str) -> Vec<DraftRecord> {
        self.run(document).map(|m| m.drafts).unwrap_or_default()
    }
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(PrimarySelectorStrategy::default()),
            Box::new(GenericSelectorStrategy::default()),
            Box::new(LineScanStrategy),
        ])
    }
}

impl std::fmt::Debug for StrategyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyChain")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

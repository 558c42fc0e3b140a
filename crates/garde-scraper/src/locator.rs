//! Coordinate assignment for pharmacy addresses.

use async_trait::async_trait;
use garde_core::Coordinates;
use rand::Rng;

/// Resolves an address to a position.
///
/// `None` means the address could not be placed; the record is kept but
/// never matches a nearest query.
#[async_trait]
pub trait Locator: Send + Sync {
    async fn locate(&self, address: &str) -> Option<Coordinates>;
}

/// Stand-in for a geocoder: a uniformly jittered point around the city
/// center. The address is ignored.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderLocator {
    center: Coordinates,
    jitter_degrees: f64,
}

impl PlaceholderLocator {
    /// Negative or non-finite jitter is treated as zero.
    #[must_use]
    pub fn new(center: Coordinates, jitter_degrees: f64) -> Self {
        let jitter_degrees = if jitter_degrees.is_finite() {
            jitter_degrees.max(0.0)
        } else {
            0.0
        };
        Self {
            center,
            jitter_degrees,
        }
    }

    fn jittered(&self) -> Coordinates {
        let j = self.jitter_degrees;
        if j <= 0.0 {
            return self.center;
        }
        let mut rng = rand::rng();
        Coordinates {
            latitude: self.center.latitude + rng.random_range(-j..=j),
            longitude: self.center.longitude + rng.random_range(-j..=j),
        }
    }
}

#[async_trait]
impl Locator for PlaceholderLocator {
    async fn locate(&self, _address: &str) -> Option<Coordinates> {
        Some(self.jittered())
    }
}

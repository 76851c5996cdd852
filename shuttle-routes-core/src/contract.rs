//! # contract: the boundary to the geocoding collaborator
//!
//! The catalog engine never looks up coordinates itself. It asks an implementor of
//! [`Geocoder`] for each stop and merges whatever comes back.
//!
//! ## Interface & Extensibility
//! - Implement [`Geocoder`] to plug in a provider client, a lookup table, or a cache wrapper.
//! - Calls are synchronous; the engine invokes `resolve` once per stop, in route order.
//! - Implementors must be idempotent for identical queries within a run. Caching, rate
//!   limiting and provider fallback are the implementor's concern.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so tests can script coordinates per stop name.

use mockall::{automock, predicate::*};
use serde::{Deserialize, Serialize};

/// A resolved WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// What the engine hands the collaborator for one stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeocodeQuery<'a> {
    /// Stop name exactly as extracted.
    pub name: &'a str,
    /// District the stop's route belongs to, when known.
    pub district_hint: Option<&'a str>,
}

/// Maps a place name to coordinates.
///
/// Returning `None` is not an error: the stop is kept without coordinates and
/// removed later by auto-repair.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Geocoder: Send + Sync {
    fn resolve<'a>(&self, query: GeocodeQuery<'a>) -> Option<Coordinates>;
}

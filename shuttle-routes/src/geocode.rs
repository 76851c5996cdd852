//! Geocoding collaborators that work without a provider account.
//!
//! [`FallbackGeocoder`] knows the major subway stations and every district centre.
//! [`CachingGeocoder`] wraps any [`Geocoder`] and remembers answers, misses included,
//! across runs through a JSON cache file.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use shuttle_routes_core::artifact;
use shuttle_routes_core::contract::{Coordinates, GeocodeQuery, Geocoder};
use shuttle_routes_core::error::Result as CatalogResult;
use tracing::debug;

const STATIONS: &[(&str, f64, f64)] = &[
    ("강남역", 37.4979, 127.0276),
    ("서울역", 37.5547, 126.9707),
    ("홍대입구역", 37.5571, 126.9246),
    ("잠실역", 37.5132, 127.1001),
    ("신촌역", 37.5599, 126.9422),
    ("여의도역", 37.5216, 126.9244),
    ("영등포역", 37.5156, 126.9074),
    ("사당역", 37.4765, 126.9816),
    ("건대입구역", 37.5403, 127.0702),
    ("왕십리역", 37.5614, 127.0378),
    ("합정역", 37.5495, 126.9138),
    ("신림역", 37.4842, 126.9293),
    ("노원역", 37.6558, 127.0617),
    ("종로3가역", 37.5710, 126.9920),
    ("을지로입구역", 37.5660, 126.9825),
    ("시청역", 37.5659, 126.9771),
    ("교대역", 37.4934, 127.0145),
    ("역삼역", 37.5006, 127.0366),
    ("선릉역", 37.5045, 127.0490),
    ("삼성역", 37.5089, 127.0630),
    ("종합운동장역", 37.5107, 127.0739),
    ("구로디지털단지역", 37.4851, 126.9015),
    ("가산디지털단지역", 37.4816, 126.8828),
    ("문래역", 37.5178, 126.8945),
    ("당산역", 37.5349, 126.9025),
];

const DISTRICT_CENTRES: &[(&str, f64, f64)] = &[
    ("종로구", 37.5735, 126.9790),
    ("중구", 37.5641, 126.9979),
    ("용산구", 37.5326, 126.9907),
    ("성동구", 37.5634, 127.0369),
    ("광진구", 37.5385, 127.0823),
    ("동대문구", 37.5744, 127.0396),
    ("중랑구", 37.6063, 127.0927),
    ("성북구", 37.5894, 127.0167),
    ("강북구", 37.6396, 127.0257),
    ("도봉구", 37.6688, 127.0471),
    ("노원구", 37.6543, 127.0568),
    ("은평구", 37.6027, 126.9291),
    ("서대문구", 37.5791, 126.9368),
    ("마포구", 37.5663, 126.9019),
    ("양천구", 37.5170, 126.8666),
    ("강서구", 37.5510, 126.8495),
    ("구로구", 37.4954, 126.8874),
    ("금천구", 37.4569, 126.8955),
    ("영등포구", 37.5264, 126.8963),
    ("동작구", 37.5124, 126.9393),
    ("관악구", 37.4784, 126.9516),
    ("서초구", 37.4837, 127.0324),
    ("강남구", 37.5172, 127.0473),
    ("송파구", 37.5145, 127.1059),
    ("강동구", 37.5301, 127.1238),
];

/// Station table first, then the centre of the hinted district.
#[derive(Debug, Clone)]
pub struct FallbackGeocoder {
    /// Station name without its trailing `역`, so exits and platform suffixes still match.
    stations: Vec<(String, Coordinates)>,
    centres: Vec<(&'static str, Coordinates)>,
}

impl Default for FallbackGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackGeocoder {
    pub fn new() -> Self {
        Self {
            stations: STATIONS
                .iter()
                .map(|(name, lat, lng)| {
                    let stem = name.strip_suffix('역').unwrap_or(*name);
                    (stem.to_string(), Coordinates::new(*lat, *lng))
                })
                .collect(),
            centres: DISTRICT_CENTRES
                .iter()
                .map(|(name, lat, lng)| (*name, Coordinates::new(*lat, *lng)))
                .collect(),
        }
    }
}

impl Geocoder for FallbackGeocoder {
    fn resolve<'a>(&self, query: GeocodeQuery<'a>) -> Option<Coordinates> {
        if let Some((_, coordinates)) = self
            .stations
            .iter()
            .find(|(stem, _)| query.name.contains(stem.as_str()))
        {
            return Some(*coordinates);
        }
        let district = query.district_hint?;
        self.centres
            .iter()
            .find(|(name, _)| *name == district)
            .map(|(_, coordinates)| *coordinates)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    /// Lookups the inner geocoder could not answer.
    pub failures: usize,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: BTreeMap<String, Option<Coordinates>>,
    stats: CacheStats,
}

/// Memoizes an inner [`Geocoder`] by `"{name}_{district}"`.
pub struct CachingGeocoder<G> {
    inner: G,
    state: Mutex<CacheState>,
}

impl<G: Geocoder> CachingGeocoder<G> {
    pub fn new(inner: G) -> Self {
        Self::with_entries(inner, BTreeMap::new())
    }

    pub fn with_entries(inner: G, entries: BTreeMap<String, Option<Coordinates>>) -> Self {
        Self {
            inner,
            state: Mutex::new(CacheState {
                entries,
                stats: CacheStats::default(),
            }),
        }
    }

    /// Restores a cache written by [`CachingGeocoder::to_json`].
    pub fn from_json(inner: G, bytes: &[u8]) -> CatalogResult<Self> {
        let entries = artifact::parse(artifact::GEOCODE_CACHE, bytes)?;
        Ok(Self::with_entries(inner, entries))
    }

    pub fn to_json(&self) -> CatalogResult<Vec<u8>> {
        artifact::render(artifact::GEOCODE_CACHE, &self.lock().entries)
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Entries are inserted whole, so a poisoned map is still consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn cache_key(query: &GeocodeQuery<'_>) -> String {
    format!("{}_{}", query.name, query.district_hint.unwrap_or(""))
}

impl<G: Geocoder> Geocoder for CachingGeocoder<G> {
    fn resolve<'a>(&self, query: GeocodeQuery<'a>) -> Option<Coordinates> {
        let key = cache_key(&query);
        {
            let mut state = self.lock();
            if let Some(cached) = state.entries.get(&key).copied() {
                state.stats.hits += 1;
                debug!(key = %key, "Geocode cache hit");
                return cached;
            }
            state.stats.misses += 1;
        }

        // The inner lookup runs without holding the lock.
        let resolved = self.inner.resolve(query);

        let mut state = self.lock();
        if resolved.is_none() {
            state.stats.failures += 1;
        }
        state.entries.insert(key, resolved);
        resolved
    }
}

//! The geocoded, not-yet-validated route catalog (`geocoded_routes.json`).
//!
//! Coordinates are kept lenient on purpose: a value of the wrong JSON type is carried
//! through as [`CoordinateValue::Invalid`] so the validator can report it.

use serde::{Deserialize, Serialize};

use crate::config::Bounds;
use crate::contract::Coordinates;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    Number(f64),
    Invalid(serde_json::Value),
}

impl CoordinateValue {
    /// The value as a finite number, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CoordinateValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for CoordinateValue {
    fn from(v: f64) -> Self {
        CoordinateValue::Number(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStop {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lat: Option<CoordinateValue>,
    #[serde(default)]
    pub lng: Option<CoordinateValue>,
}

impl CatalogStop {
    pub fn new(name: impl Into<String>, coordinates: Option<Coordinates>) -> Self {
        Self {
            name: name.into(),
            lat: coordinates.map(|c| c.lat.into()),
            lng: coordinates.map(|c| c.lng.into()),
        }
    }

    /// Both values present and numeric.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let lat = self.lat.as_ref()?.as_f64()?;
        let lng = self.lng.as_ref()?.as_f64()?;
        Some(Coordinates { lat, lng })
    }

    /// Named, numeric and inside `bounds`: the stops auto-repair keeps.
    pub fn is_placeable(&self, bounds: &Bounds) -> bool {
        !self.name.trim().is_empty()
            && self
                .coordinates()
                .map(|c| bounds.contains(c.lat, c.lng))
                .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRoute {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub stops: Vec<CatalogStop>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistrictRoutes {
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub routes: Vec<CatalogRoute>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteCatalog {
    #[serde(default)]
    pub districts: Vec<DistrictRoutes>,
}

impl RouteCatalog {
    /// Appends `route` under `district`, creating the district entry on first sight.
    pub fn push_route(&mut self, district: &str, route: CatalogRoute) {
        match self.districts.iter_mut().find(|d| d.district == district) {
            Some(entry) => entry.routes.push(route),
            None => self.districts.push(DistrictRoutes {
                district: district.to_string(),
                routes: vec![route],
            }),
        }
    }

    pub fn routes(&self) -> impl Iterator<Item = &CatalogRoute> {
        self.districts.iter().flat_map(|d| d.routes.iter())
    }

    pub fn route_count(&self) -> usize {
        self.routes().count()
    }

    pub fn stop_count(&self) -> usize {
        self.routes().map(|r| r.stops.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_typed_coordinates_survive_parsing() {
        let stop: CatalogStop =
            serde_json::from_str(r#"{"name": "합정역", "lat": "37.5", "lng": 126.91}"#).unwrap();
        assert!(matches!(stop.lat, Some(CoordinateValue::Invalid(_))));
        assert_eq!(stop.lng.as_ref().and_then(CoordinateValue::as_f64), Some(126.91));
        assert_eq!(stop.coordinates(), None);
    }

    #[test]
    fn null_coordinates_are_absent() {
        let stop: CatalogStop =
            serde_json::from_str(r#"{"name": "합정역", "lat": null}"#).unwrap();
        assert_eq!(stop.lat, None);
        assert_eq!(stop.lng, None);
    }

    #[test]
    fn push_route_groups_in_first_seen_order() {
        let mut catalog = RouteCatalog::default();
        catalog.push_route("송파구", CatalogRoute::default());
        catalog.push_route("마포구", CatalogRoute::default());
        catalog.push_route("송파구", CatalogRoute::default());
        let names: Vec<_> = catalog.districts.iter().map(|d| d.district.as_str()).collect();
        assert_eq!(names, vec!["송파구", "마포구"]);
        assert_eq!(catalog.route_count(), 3);
    }
}

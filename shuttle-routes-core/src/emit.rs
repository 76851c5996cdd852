//! The published documents: the canonical route catalog and its report.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assemble::default_route_name;
use crate::catalog_model::{CatalogRoute, RouteCatalog};
use crate::config::CatalogConfig;
use crate::quality::QualityScore;
use crate::validate::ValidationSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalStop {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRoute {
    pub name: String,
    pub hours: String,
    pub interval: String,
    pub stops: Vec<CanonicalStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDistrict {
    pub district: String,
    pub routes: Vec<CanonicalRoute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalDocument {
    /// `YYYY-MM-DD`.
    pub updated_at: String,
    pub source: String,
    pub schema_version: String,
    pub districts: Vec<CanonicalDistrict>,
}

impl CanonicalDocument {
    pub fn routes(&self) -> impl Iterator<Item = &CanonicalRoute> {
        self.districts.iter().flat_map(|d| d.routes.iter())
    }
}

/// `validation_report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogReport {
    pub validation: ValidationSummary,
    pub quality: QualityScore,
    /// `YYYY-MM-DD HH:MM:SS`.
    pub generated_at: String,
}

impl CatalogReport {
    pub fn new(validation: ValidationSummary, quality: QualityScore, now: NaiveDateTime) -> Self {
        Self {
            validation,
            quality,
            generated_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

pub struct SchemaEmitter<'c> {
    config: &'c CatalogConfig,
}

impl<'c> SchemaEmitter<'c> {
    pub fn new(config: &'c CatalogConfig) -> Self {
        Self { config }
    }

    /// Sorts districts by name, drops the empty ones and fills absent fields with the
    /// configured sentinel. Route order within a district is kept.
    pub fn emit(&self, catalog: &RouteCatalog, today: NaiveDate) -> CanonicalDocument {
        let mut districts: Vec<CanonicalDistrict> = catalog
            .districts
            .iter()
            .filter(|entry| !entry.routes.is_empty())
            .map(|entry| CanonicalDistrict {
                district: entry.district.clone(),
                routes: entry
                    .routes
                    .iter()
                    .map(|route| self.emit_route(&entry.district, route))
                    .collect(),
            })
            .collect();
        districts.sort_by(|a, b| a.district.cmp(&b.district));

        CanonicalDocument {
            updated_at: today.format("%Y-%m-%d").to_string(),
            source: self.config.source.clone(),
            schema_version: self.config.schema_version.clone(),
            districts,
        }
    }

    fn emit_route(&self, district: &str, route: &CatalogRoute) -> CanonicalRoute {
        let name = match route.name.trim() {
            "" => default_route_name(district),
            name => name.to_string(),
        };
        let stops = route
            .stops
            .iter()
            .filter_map(|stop| match stop.coordinates() {
                Some(c) => Some(CanonicalStop {
                    name: stop.name.clone(),
                    lat: c.lat,
                    lng: c.lng,
                }),
                None => {
                    debug!(stop = %stop.name, route = %name, "Omitting stop without coordinates");
                    None
                }
            })
            .collect();
        CanonicalRoute {
            hours: self.or_no_info(route.hours.as_deref()),
            interval: self.or_no_info(route.interval.as_deref()),
            name,
            stops,
        }
    }

    fn or_no_info(&self, value: Option<&str>) -> String {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => self.config.no_info.clone(),
        }
    }
}

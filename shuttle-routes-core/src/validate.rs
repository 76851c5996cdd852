//! Structural and geometric checks over a geocoded [`RouteCatalog`].
//!
//! Problems found here are data, not Rust errors. Errors block acceptance and trigger
//! auto-repair; warnings are recorded and never block.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::catalog_model::{CatalogRoute, CatalogStop, CoordinateValue, RouteCatalog};
use crate::config::CatalogConfig;

/// One error or warning, rendered as `"[context] message"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub context: Option<String>,
    pub message: String,
}

impl Finding {
    fn bare(message: impl Into<String>) -> Self {
        Self {
            context: None,
            message: message.into(),
        }
    }

    fn within(context: &str, message: impl Into<String>) -> Self {
        Self {
            context: Some(context.to_string()),
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "[{context}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl Serialize for Finding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn summary(&self) -> ValidationSummary {
        ValidationSummary {
            valid: self.is_valid(),
            errors: self.errors.iter().map(ToString::to_string).collect(),
            warnings: self.warnings.iter().map(ToString::to_string).collect(),
            error_count: self.errors.len(),
            warning_count: self.warnings.len(),
        }
    }
}

/// The `validation` block of the published report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub error_count: usize,
    pub warning_count: usize,
}

pub struct Validator<'c> {
    config: &'c CatalogConfig,
}

impl<'c> Validator<'c> {
    pub fn new(config: &'c CatalogConfig) -> Self {
        Self { config }
    }

    /// Walks district → route → stop in document order.
    pub fn validate(&self, catalog: &RouteCatalog) -> ValidationReport {
        let mut report = ValidationReport::default();

        if catalog.districts.is_empty() {
            report.errors.push(Finding::bare("no district data"));
            return report;
        }

        for entry in &catalog.districts {
            let district = entry.district.trim();
            if district.is_empty() {
                report.errors.push(Finding::bare("district name missing"));
                continue;
            }
            if !self.config.is_known_district(district) {
                report.warnings.push(Finding::within(district, "not a Seoul district"));
            }
            if entry.routes.is_empty() {
                report.warnings.push(Finding::within(district, "no routes"));
            }
            for route in &entry.routes {
                self.validate_route(route, district, &mut report);
            }
        }

        report
    }

    fn validate_route(&self, route: &CatalogRoute, district: &str, report: &mut ValidationReport) {
        let name = route.name.trim();
        let context = if name.is_empty() {
            report.errors.push(Finding::within(district, "route name missing"));
            "unnamed route"
        } else {
            name
        };

        if route.stops.len() < 2 {
            report.warnings.push(Finding::within(context, "fewer than 2 stops"));
        }
        for stop in &route.stops {
            self.validate_stop(stop, context, report);
        }

        if !self.has_info(route.hours.as_deref()) {
            report.warnings.push(Finding::within(context, "hours missing"));
        }
        if !self.has_info(route.interval.as_deref()) {
            report.warnings.push(Finding::within(context, "interval missing"));
        }
    }

    fn validate_stop(&self, stop: &CatalogStop, context: &str, report: &mut ValidationReport) {
        let name = stop.name.trim();
        if name.is_empty() {
            report.errors.push(Finding::within(context, "stop name missing"));
        }
        let label = if name.is_empty() { "?" } else { name };

        let (lat, lng) = match (&stop.lat, &stop.lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                report
                    .errors
                    .push(Finding::within(context, format!("'{label}' coordinates missing")));
                return;
            }
        };

        let (lat, lng) = match (lat.as_f64(), lng.as_f64()) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                report.errors.push(Finding::within(
                    context,
                    format!(
                        "'{label}' coordinates not numeric: lat={}, lng={}",
                        render(lat),
                        render(lng)
                    ),
                ));
                return;
            }
        };

        let bounds = &self.config.bounds;
        if !bounds.contains_lat(lat) {
            report
                .errors
                .push(Finding::within(context, format!("'{label}' latitude out of range: {lat}")));
        } else if !bounds.contains_lng(lng) {
            report
                .errors
                .push(Finding::within(context, format!("'{label}' longitude out of range: {lng}")));
        }
    }

    fn has_info(&self, value: Option<&str>) -> bool {
        value
            .map(str::trim)
            .map(|v| !v.is_empty() && v != self.config.no_info)
            .unwrap_or(false)
    }
}

fn render(value: &CoordinateValue) -> String {
    match value {
        CoordinateValue::Number(n) => n.to_string(),
        CoordinateValue::Invalid(v) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Coordinates;

    fn route(name: &str, stops: Vec<CatalogStop>) -> CatalogRoute {
        CatalogRoute {
            name: name.into(),
            hours: Some("09:00~18:00".into()),
            interval: Some("30분".into()),
            stops,
        }
    }

    fn stop(name: &str, lat: f64, lng: f64) -> CatalogStop {
        CatalogStop::new(name, Some(Coordinates::new(lat, lng)))
    }

    #[test]
    fn empty_catalog_is_a_single_error() {
        let config = CatalogConfig::seoul();
        let report = Validator::new(&config).validate(&RouteCatalog::default());
        assert!(!report.is_valid());
        assert_eq!(report.summary().errors, vec!["no district data".to_string()]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn out_of_bounds_stop_is_an_error_with_value() {
        let config = CatalogConfig::seoul();
        let mut catalog = RouteCatalog::default();
        catalog.push_route(
            "중구",
            route(
                "명동 셔틀",
                vec![stop("명동역", 37.5609, 126.9860), stop("부산역", 35.10, 129.04)],
            ),
        );
        let report = Validator::new(&config).validate(&catalog);
        assert_eq!(
            report.summary().errors,
            vec!["[명동 셔틀] '부산역' latitude out of range: 35.1".to_string()]
        );
    }

    #[test]
    fn missing_and_mistyped_coordinates_are_errors() {
        let config = CatalogConfig::seoul();
        let mut catalog = RouteCatalog::default();
        let mistyped = CatalogStop {
            name: "합정역".into(),
            lat: Some(CoordinateValue::Invalid(serde_json::json!("37.5"))),
            lng: Some(126.91.into()),
        };
        catalog.push_route(
            "마포구",
            route("", vec![CatalogStop::new("망원역", None), mistyped]),
        );
        let errors = Validator::new(&config).validate(&catalog).summary().errors;
        assert_eq!(
            errors,
            vec![
                "[마포구] route name missing".to_string(),
                "[unnamed route] '망원역' coordinates missing".to_string(),
                "[unnamed route] '합정역' coordinates not numeric: lat=\"37.5\", lng=126.91"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn completeness_problems_are_only_warnings() {
        let config = CatalogConfig::seoul();
        let mut catalog = RouteCatalog::default();
        catalog.push_route(
            "판교구",
            CatalogRoute {
                name: "판교 셔틀".into(),
                hours: None,
                interval: Some(config.no_info.clone()),
                stops: vec![stop("시청역", 37.5657, 126.9769)],
            },
        );
        let report = Validator::new(&config).validate(&catalog);
        assert!(report.is_valid());
        assert_eq!(
            report.summary().warnings,
            vec![
                "[판교구] not a Seoul district".to_string(),
                "[판교 셔틀] fewer than 2 stops".to_string(),
                "[판교 셔틀] hours missing".to_string(),
                "[판교 셔틀] interval missing".to_string(),
            ]
        );
    }

    #[test]
    fn unnamed_district_is_an_error_and_its_routes_are_skipped() {
        let config = CatalogConfig::seoul();
        let catalog = RouteCatalog {
            districts: vec![crate::catalog_model::DistrictRoutes {
                district: "  ".into(),
                routes: vec![route("", vec![CatalogStop::new("망원역", None)])],
            }],
        };
        let report = Validator::new(&config).validate(&catalog);
        assert_eq!(report.summary().errors, vec!["district name missing".to_string()]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn district_without_routes_is_a_warning() {
        let config = CatalogConfig::seoul();
        let catalog = RouteCatalog {
            districts: vec![crate::catalog_model::DistrictRoutes {
                district: "관악구".into(),
                routes: vec![],
            }],
        };
        let report = Validator::new(&config).validate(&catalog);
        assert!(report.is_valid());
        assert_eq!(report.summary().warnings, vec!["[관악구] no routes".to_string()]);
    }

    #[test]
    fn summary_serializes_with_camel_case_counts() {
        let config = CatalogConfig::seoul();
        let summary = Validator::new(&config).validate(&RouteCatalog::default()).summary();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["errorCount"], 1);
        assert_eq!(json["warningCount"], 0);
        assert_eq!(json["valid"], false);
    }
}

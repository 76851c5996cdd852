use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::CatalogConfig;
use crate::emit::CanonicalDocument;

/// The `quality` block of the published report. Percentages are in `[0, 100]`;
/// every float is rounded to one decimal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityScore {
    pub district_coverage: f64,
    pub info_completeness: f64,
    pub total_districts: usize,
    pub total_routes: usize,
    pub total_stops: usize,
    pub avg_stops_per_route: f64,
    pub overall_score: f64,
}

pub struct QualityScorer<'c> {
    config: &'c CatalogConfig,
}

impl<'c> QualityScorer<'c> {
    pub fn new(config: &'c CatalogConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, document: &CanonicalDocument) -> QualityScore {
        let covered: HashSet<&str> = document
            .districts
            .iter()
            .map(|d| d.district.as_str())
            .filter(|d| self.config.is_known_district(d))
            .collect();
        let coverage = match self.config.district_count() {
            0 => 0.0,
            n => (covered.len() as f64 / n as f64 * 100.0).min(100.0),
        };

        let total_routes = document.routes().count();
        let total_stops: usize = document.routes().map(|r| r.stops.len()).sum();
        let informed = document
            .routes()
            .map(|r| self.has_info(&r.hours) as usize + self.has_info(&r.interval) as usize)
            .sum::<usize>();

        let (completeness, avg_stops) = if total_routes == 0 {
            (0.0, 0.0)
        } else {
            (
                informed as f64 / (2 * total_routes) as f64 * 100.0,
                total_stops as f64 / total_routes as f64,
            )
        };

        QualityScore {
            district_coverage: round1(coverage),
            info_completeness: round1(completeness),
            total_districts: document.districts.len(),
            total_routes,
            total_stops,
            avg_stops_per_route: round1(avg_stops),
            overall_score: round1((coverage + completeness) / 2.0),
        }
    }

    fn has_info(&self, value: &str) -> bool {
        let value = value.trim();
        !value.is_empty() && value != self.config.no_info
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

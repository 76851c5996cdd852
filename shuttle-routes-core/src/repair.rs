use serde::Serialize;
use tracing::info;

use crate::catalog_model::{DistrictRoutes, RouteCatalog};
use crate::config::CatalogConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairStats {
    pub stops_removed: usize,
    pub routes_removed: usize,
    pub districts_removed: usize,
}

impl RepairStats {
    pub fn changed(&self) -> bool {
        self.stops_removed + self.routes_removed + self.districts_removed > 0
    }
}

/// Strips what the validator rejects: unplaceable stops, then routes left with fewer
/// than two stops, then districts left without routes or without a name.
pub struct AutoRepair<'c> {
    config: &'c CatalogConfig,
}

impl<'c> AutoRepair<'c> {
    pub fn new(config: &'c CatalogConfig) -> Self {
        Self { config }
    }

    pub fn repair(&self, catalog: RouteCatalog) -> (RouteCatalog, RepairStats) {
        let bounds = &self.config.bounds;
        let mut stats = RepairStats::default();

        let districts = catalog
            .districts
            .into_iter()
            .filter_map(|entry| {
                if entry.district.trim().is_empty() {
                    stats.routes_removed += entry.routes.len();
                    stats.districts_removed += 1;
                    return None;
                }
                let routes: Vec<_> = entry
                    .routes
                    .into_iter()
                    .filter_map(|mut route| {
                        let before = route.stops.len();
                        route.stops.retain(|s| s.is_placeable(bounds));
                        stats.stops_removed += before - route.stops.len();
                        if route.stops.len() < 2 {
                            stats.routes_removed += 1;
                            return None;
                        }
                        Some(route)
                    })
                    .collect();
                if routes.is_empty() {
                    stats.districts_removed += 1;
                    return None;
                }
                Some(DistrictRoutes {
                    district: entry.district,
                    routes,
                })
            })
            .collect();

        info!(
            stops_removed = stats.stops_removed,
            routes_removed = stats.routes_removed,
            districts_removed = stats.districts_removed,
            "Auto-repair pass finished"
        );
        (RouteCatalog { districts }, stats)
    }
}

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assemble::RouteDraft;
use crate::catalog_model::{CatalogRoute, CatalogStop, RouteCatalog};
use crate::contract::{GeocodeQuery, Geocoder};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachStats {
    pub resolved: usize,
    pub unresolved: usize,
}

/// Fans each stop out to the geocoding collaborator and folds the answers back in.
pub struct CoordinateAttacher<'g, G: Geocoder + ?Sized> {
    geocoder: &'g G,
}

impl<'g, G: Geocoder + ?Sized> CoordinateAttacher<'g, G> {
    pub fn new(geocoder: &'g G) -> Self {
        Self { geocoder }
    }

    /// Sets coordinates on every stop of `draft` that the collaborator can place.
    pub fn attach_draft(&self, draft: RouteDraft, stats: &mut AttachStats) -> RouteDraft {
        let district = draft.district.clone();
        let stops = draft
            .stops
            .into_iter()
            .map(|stop| {
                let found = self.geocoder.resolve(GeocodeQuery {
                    name: stop.text(),
                    district_hint: Some(&district),
                });
                match found {
                    Some(_) => stats.resolved += 1,
                    None => {
                        stats.unresolved += 1;
                        warn!(stop = stop.text(), district = %district, "No coordinates for stop");
                    }
                }
                stop.with_coordinates(found)
            })
            .collect();
        RouteDraft { stops, ..draft }
    }

    /// Geocodes every draft and groups the routes by district in first-seen order.
    pub fn attach(&self, drafts: Vec<RouteDraft>) -> (RouteCatalog, AttachStats) {
        let mut stats = AttachStats::default();
        let mut catalog = RouteCatalog::default();

        for draft in drafts {
            let draft = self.attach_draft(draft, &mut stats);
            let route = CatalogRoute {
                name: draft.name,
                hours: draft.hours,
                interval: draft.interval,
                stops: draft
                    .stops
                    .iter()
                    .map(|s| CatalogStop::new(s.text(), s.coordinates()))
                    .collect(),
            };
            catalog.push_route(&draft.district, route);
        }

        info!(
            districts = catalog.districts.len(),
            routes = catalog.route_count(),
            resolved = stats.resolved,
            unresolved = stats.unresolved,
            "Attached coordinates"
        );
        (catalog, stats)
    }
}

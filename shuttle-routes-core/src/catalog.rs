//! # catalog: the engine end to end
//!
//! [`CatalogEngine`] wires the components together in their fixed order:
//!
//! ```text
//! segment → extract stops + schedule → assemble → attach coordinates
//!         → validate → (errors?) repair once → revalidate → emit → score
//! ```
//!
//! The stages are also exposed one by one so an orchestrator can persist the
//! intermediate documents between them. The only wall-clock input is the `now`
//! value the caller passes in.

use chrono::NaiveDateTime;
use tracing::{error, info, warn};

use crate::assemble::{RouteAssembler, RouteDraft};
use crate::attach::{AttachStats, CoordinateAttacher};
use crate::catalog_model::RouteCatalog;
use crate::config::CatalogConfig;
use crate::contract::Geocoder;
use crate::emit::{CanonicalDocument, CatalogReport, SchemaEmitter};
use crate::error::Result;
use crate::input::SourceInput;
use crate::quality::QualityScorer;
use crate::repair::{AutoRepair, RepairStats};
use crate::validate::{ValidationReport, Validator};

/// Findings beyond this many are counted but not logged.
const LOGGED_FINDINGS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogOutcome {
    pub document: CanonicalDocument,
    pub report: CatalogReport,
    /// Set when the first validation failed and a repair pass ran.
    pub repair: Option<RepairStats>,
    /// Set when the outcome was built from raw inputs.
    pub attach: Option<AttachStats>,
}

pub struct CatalogEngine<'c> {
    assembler: RouteAssembler<'c>,
    validator: Validator<'c>,
    repair: AutoRepair<'c>,
    emitter: SchemaEmitter<'c>,
    scorer: QualityScorer<'c>,
}

impl<'c> CatalogEngine<'c> {
    pub fn new(config: &'c CatalogConfig) -> Result<Self> {
        Ok(Self {
            assembler: RouteAssembler::new(config)?,
            validator: Validator::new(config),
            repair: AutoRepair::new(config),
            emitter: SchemaEmitter::new(config),
            scorer: QualityScorer::new(config),
        })
    }

    pub fn extract(&self, inputs: &[SourceInput]) -> Vec<RouteDraft> {
        self.assembler.assemble_inputs(inputs)
    }

    pub fn geocode<G: Geocoder + ?Sized>(
        &self,
        drafts: Vec<RouteDraft>,
        geocoder: &G,
    ) -> (RouteCatalog, AttachStats) {
        CoordinateAttacher::new(geocoder).attach(drafts)
    }

    /// Validate, repair at most once, emit and score.
    ///
    /// A catalog that is still invalid after the repair pass is emitted anyway; its
    /// residual errors are carried in the report.
    pub fn finalize(&self, catalog: RouteCatalog, now: NaiveDateTime) -> CatalogOutcome {
        let report = self.validator.validate(&catalog);
        log_findings(&report);

        let (catalog, report, repair) = if report.is_valid() {
            (catalog, report, None)
        } else {
            info!(errors = report.errors.len(), "Validation failed, attempting auto-repair");
            let (repaired, stats) = self.repair.repair(catalog);
            let report = self.validator.validate(&repaired);
            info!(errors = report.errors.len(), "Revalidated after repair");
            (repaired, report, Some(stats))
        };

        let document = self.emitter.emit(&catalog, now.date());
        let quality = self.scorer.score(&document);
        info!(
            districts = quality.total_districts,
            routes = quality.total_routes,
            stops = quality.total_stops,
            coverage = quality.district_coverage,
            completeness = quality.info_completeness,
            overall = quality.overall_score,
            valid = report.is_valid(),
            "Catalog finalized"
        );

        CatalogOutcome {
            document,
            report: CatalogReport::new(report.summary(), quality, now),
            repair,
            attach: None,
        }
    }

    pub fn build<G: Geocoder + ?Sized>(
        &self,
        inputs: &[SourceInput],
        geocoder: &G,
        now: NaiveDateTime,
    ) -> CatalogOutcome {
        let drafts = self.extract(inputs);
        let (catalog, stats) = self.geocode(drafts, geocoder);
        CatalogOutcome {
            attach: Some(stats),
            ..self.finalize(catalog, now)
        }
    }
}

/// Runs the whole engine over raw inputs.
pub fn build_catalog<G: Geocoder + ?Sized>(
    inputs: &[SourceInput],
    geocoder: &G,
    config: &CatalogConfig,
    now: NaiveDateTime,
) -> Result<CatalogOutcome> {
    Ok(CatalogEngine::new(config)?.build(inputs, geocoder, now))
}

/// Runs validation onwards over an already geocoded catalog.
pub fn finalize(
    catalog: RouteCatalog,
    config: &CatalogConfig,
    now: NaiveDateTime,
) -> Result<CatalogOutcome> {
    Ok(CatalogEngine::new(config)?.finalize(catalog, now))
}

fn log_findings(report: &ValidationReport) {
    info!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Validated catalog"
    );
    for finding in report.errors.iter().take(LOGGED_FINDINGS) {
        error!("{finding}");
    }
    for finding in report.warnings.iter().take(LOGGED_FINDINGS) {
        warn!("{finding}");
    }
}

//! # stages: multi-stage pipeline over on-disk artifacts
//!
//! Each stage reads the artifact the previous one wrote under `data_dir`, so any
//! subset of stages can run on its own (e.g. `--mode validate` re-validates the last
//! geocoded catalog).
//!
//! | stage | reads | writes |
//! |---|---|---|
//! | `ocr` | (capability check only) | |
//! | `extract` | `processed/ocr_results.json`, `raw/crawl_results.json` | `processed/extracted_routes.json` |
//! | `geocode` | `processed/extracted_routes.json` | `processed/geocoded_routes.json`, geocode cache |
//! | `validate` | `processed/geocoded_routes.json` | canonical output, `processed/validation_report.json` |
//!
//! A failing stage never aborts the run: it is recorded as [`StageStatus::Failed`] and
//! the stages that consume its output are skipped. `pipeline_report.json` is always written.

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::ValueEnum;
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use shuttle_routes_core::artifact;
use shuttle_routes_core::assemble::ExtractedRoutes;
use shuttle_routes_core::catalog::CatalogEngine;
use shuttle_routes_core::catalog_model::RouteCatalog;
use shuttle_routes_core::error::CatalogError;
use shuttle_routes_core::input::{CrawlResults, OcrResults, SourceInput};

use crate::capability::{check_ocr, Capability};
use crate::geocode::{CachingGeocoder, FallbackGeocoder};
use crate::load_config::PipelineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Ocr,
    Extract,
    Geocode,
    Validate,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Ocr, Stage::Extract, Stage::Geocode, Stage::Validate];

    pub fn id(self) -> &'static str {
        match self {
            Stage::Ocr => "ocr",
            Stage::Extract => "extract",
            Stage::Geocode => "geocode",
            Stage::Validate => "validate",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Ocr => "OCR capability check",
            Stage::Extract => "Route extraction",
            Stage::Geocode => "Geocoding",
            Stage::Validate => "Validation and publishing",
        }
    }

    /// The stage whose output this one reads, if it needs one.
    ///
    /// Extraction works with whatever OCR output is already on disk, so a missing OCR
    /// toolchain does not block it.
    pub fn upstream(self) -> Option<Stage> {
        match self {
            Stage::Ocr | Stage::Extract => None,
            Stage::Geocode => Some(Stage::Extract),
            Stage::Validate => Some(Stage::Geocode),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Every stage.
    Full,
    /// Everything except OCR.
    #[default]
    Quick,
    /// Refresh from newly crawled notices; plans the same stages as `Quick`.
    Update,
    /// Validation of the last geocoded catalog only.
    Validate,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub mode: Mode,
    /// Explicit stage list; overrides `mode` when non-empty.
    pub stages: Vec<Stage>,
    pub skip: Vec<Stage>,
    pub stop_on_error: bool,
}

impl RunOptions {
    /// Stages to run, always in pipeline order.
    pub fn plan(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|stage| {
                if self.stages.is_empty() {
                    match self.mode {
                        Mode::Full => true,
                        Mode::Quick | Mode::Update => *stage != Stage::Ocr,
                        Mode::Validate => *stage == Stage::Validate,
                    }
                } else {
                    self.stages.contains(stage)
                }
            })
            .filter(|stage| !self.skip.contains(stage))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StageStatus {
    Succeeded { summary: Value },
    Failed { error: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub title: &'static str,
    #[serde(flatten)]
    pub status: StageStatus,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageError {
    pub stage: Stage,
    pub error: String,
}

/// `pipeline_report.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub pipeline_status: &'static str,
    pub start_time: String,
    pub end_time: String,
    pub total_elapsed_seconds: f64,
    pub stages_completed: usize,
    pub stages_failed: usize,
    pub stages_skipped: usize,
    pub stages: Vec<StageOutcome>,
    pub errors: Vec<StageError>,
}

impl PipelineReport {
    pub fn has_failures(&self) -> bool {
        self.stages_failed > 0
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages.iter().find(|o| o.stage == stage)
    }
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the planned stages in order and writes `pipeline_report.json`.
    ///
    /// Stage failures are recorded in the report; only a failure to write the report
    /// itself is returned as an error.
    pub async fn run(&self, options: &RunOptions) -> Result<PipelineReport> {
        let started = Instant::now();
        let start_time = Local::now();
        let plan = self.plan_with_log(options);

        let mut outcomes = Vec::with_capacity(plan.len());
        let mut unavailable: HashSet<Stage> = HashSet::new();
        let mut halted = false;

        for stage in plan {
            let stage_started = Instant::now();
            let status = if halted {
                StageStatus::Skipped {
                    reason: "pipeline stopped after an earlier failure".to_string(),
                }
            } else if let Some(upstream) = stage.upstream().filter(|u| unavailable.contains(u)) {
                StageStatus::Skipped {
                    reason: format!("upstream stage '{}' did not succeed", upstream.id()),
                }
            } else {
                info!(stage = stage.id(), "[PIPELINE] {}", stage.title());
                match self.run_stage(stage).await {
                    Ok(summary) => StageStatus::Succeeded { summary },
                    Err(e) => {
                        error!(stage = stage.id(), error = %e, "[PIPELINE][ERROR] Stage failed");
                        halted = options.stop_on_error;
                        StageStatus::Failed {
                            error: format!("{e:#}"),
                        }
                    }
                }
            };

            match &status {
                StageStatus::Succeeded { .. } => {}
                StageStatus::Skipped { reason } => {
                    warn!(stage = stage.id(), %reason, "[PIPELINE] Stage skipped");
                    unavailable.insert(stage);
                }
                StageStatus::Failed { .. } => {
                    unavailable.insert(stage);
                }
            }

            outcomes.push(StageOutcome {
                stage,
                title: stage.title(),
                status,
                elapsed_seconds: round2(stage_started.elapsed().as_secs_f64()),
            });
        }

        let report = summarise(outcomes, start_time, started);
        info!(
            status = report.pipeline_status,
            completed = report.stages_completed,
            failed = report.stages_failed,
            skipped = report.stages_skipped,
            elapsed = report.total_elapsed_seconds,
            "[PIPELINE] Run finished"
        );
        for e in &report.errors {
            warn!(stage = e.stage.id(), error = %e.error, "[PIPELINE] Stage error");
        }

        let bytes = artifact::render(artifact::PIPELINE_REPORT, &report)?;
        write_artifact(&self.config.artifact(artifact::PIPELINE_REPORT), &bytes).await?;
        Ok(report)
    }

    fn plan_with_log(&self, options: &RunOptions) -> Vec<Stage> {
        let plan = options.plan();
        for stage in &options.skip {
            info!(stage = stage.id(), "[PIPELINE] Skipping stage on request");
        }
        info!(
            stages = ?plan.iter().map(|s| s.id()).collect::<Vec<_>>(),
            data_dir = ?self.config.data_dir,
            "[PIPELINE] Starting run"
        );
        plan
    }

    async fn run_stage(&self, stage: Stage) -> Result<Value> {
        match stage {
            Stage::Ocr => self.ocr().await,
            Stage::Extract => self.extract().await,
            Stage::Geocode => self.geocode().await,
            Stage::Validate => self.validate().await,
        }
    }

    async fn ocr(&self) -> Result<Value> {
        match tokio::task::spawn_blocking(check_ocr).await? {
            Capability::Ready => Ok(json!({ "capability": "ready" })),
            missing @ Capability::Missing(_) => Err(anyhow!("OCR toolchain {missing}")),
        }
    }

    async fn extract(&self) -> Result<Value> {
        let reads = [artifact::OCR_RESULTS, artifact::CRAWL_RESULTS]
            .into_iter()
            .map(|name| read_optional(&self.config, name));
        let [ocr, crawl]: [Option<Vec<u8>>; 2] = try_join_all(reads)
            .await?
            .try_into()
            .map_err(|_| anyhow!("unexpected number of input artifacts"))?;

        if ocr.is_none() && crawl.is_none() {
            return Err(CatalogError::MissingInput {
                artifact: format!("{} or {}", artifact::OCR_RESULTS, artifact::CRAWL_RESULTS),
            }
            .into());
        }

        let mut inputs: Vec<SourceInput> = Vec::new();
        if let Some(bytes) = ocr {
            let results: OcrResults = artifact::parse(artifact::OCR_RESULTS, &bytes)?;
            info!(documents = results.results.len(), "[PIPELINE] Loaded OCR results");
            inputs.extend(Vec::<SourceInput>::from(results));
        }
        if let Some(bytes) = crawl {
            let results: CrawlResults = artifact::parse(artifact::CRAWL_RESULTS, &bytes)?;
            let fragments = Vec::<SourceInput>::from(results);
            info!(fragments = fragments.len(), "[PIPELINE] Loaded crawl results");
            inputs.extend(fragments);
        }

        let engine = CatalogEngine::new(&self.config.catalog)?;
        let drafts = engine.extract(&inputs);
        let extracted = ExtractedRoutes::from_drafts(&drafts);
        let districts: HashSet<&str> = drafts.iter().map(|d| d.district.as_str()).collect();

        self.write(artifact::EXTRACTED_ROUTES, &extracted).await?;
        Ok(json!({
            "routes": extracted.total_routes,
            "stops": extracted.total_stops,
            "districts": districts.len(),
        }))
    }

    async fn geocode(&self) -> Result<Value> {
        let extracted: ExtractedRoutes = self.read(artifact::EXTRACTED_ROUTES).await?;
        let drafts = extracted.into_drafts(&self.config.catalog);

        let geocoder = match read_optional(&self.config, artifact::GEOCODE_CACHE).await? {
            Some(bytes) if self.config.geocode.cache => {
                match CachingGeocoder::from_json(FallbackGeocoder::new(), &bytes) {
                    Ok(cache) => cache,
                    Err(e) => {
                        warn!(error = %e, "[PIPELINE] Ignoring unreadable geocode cache");
                        CachingGeocoder::new(FallbackGeocoder::new())
                    }
                }
            }
            _ => CachingGeocoder::new(FallbackGeocoder::new()),
        };

        let engine = CatalogEngine::new(&self.config.catalog)?;
        let (catalog, stats) = engine.geocode(drafts, &geocoder);

        self.write(artifact::GEOCODED_ROUTES, &catalog).await?;
        if self.config.geocode.cache {
            let bytes = geocoder.to_json()?;
            write_artifact(&self.config.artifact(artifact::GEOCODE_CACHE), &bytes).await?;
        }

        let cache = geocoder.stats();
        info!(
            hits = cache.hits,
            misses = cache.misses,
            failures = cache.failures,
            "[PIPELINE] Geocode cache statistics"
        );
        Ok(json!({
            "resolved": stats.resolved,
            "unresolved": stats.unresolved,
            "cache": cache,
        }))
    }

    async fn validate(&self) -> Result<Value> {
        let catalog: RouteCatalog = self.read(artifact::GEOCODED_ROUTES).await?;
        let engine = CatalogEngine::new(&self.config.catalog)?;
        let outcome = engine.finalize(catalog, Local::now().naive_local());

        let document = artifact::render("canonical output", &outcome.document)?;
        write_artifact(&self.config.output, &document).await?;
        self.write(artifact::VALIDATION_REPORT, &outcome.report).await?;

        let validation = &outcome.report.validation;
        if !validation.valid {
            warn!(
                errors = validation.error_count,
                "[PIPELINE] Catalog published with residual validation errors"
            );
        }
        Ok(json!({
            "valid": validation.valid,
            "errors": validation.error_count,
            "warnings": validation.warning_count,
            "repaired": outcome.repair.is_some(),
            "overallScore": outcome.report.quality.overall_score,
            "output": self.config.output.display().to_string(),
        }))
    }

    async fn read<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T> {
        let bytes = tokio::fs::read(self.config.artifact(name))
            .await
            .map_err(|e| artifact::io_error(name, e))?;
        Ok(artifact::parse(name, &bytes)?)
    }

    async fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let bytes = artifact::render(name, value)?;
        write_artifact(&self.config.artifact(name), &bytes).await
    }
}

/// `Ok(None)` when the artifact does not exist yet.
async fn read_optional(
    config: &PipelineConfig,
    name: &'static str,
) -> Result<Option<Vec<u8>>, CatalogError> {
    match tokio::fs::read(config.artifact(name)).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) => match artifact::io_error(name, e) {
            CatalogError::MissingInput { .. } => Ok(None),
            other => Err(other),
        },
    }
}

async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    info!(path = ?path, bytes = bytes.len(), "[PIPELINE] Wrote artifact");
    Ok(())
}

fn summarise(
    outcomes: Vec<StageOutcome>,
    start_time: chrono::DateTime<Local>,
    started: Instant,
) -> PipelineReport {
    let count = |pred: fn(&StageStatus) -> bool| outcomes.iter().filter(|o| pred(&o.status)).count();
    let stages_completed = count(|s| matches!(s, StageStatus::Succeeded { .. }));
    let stages_failed = count(|s| matches!(s, StageStatus::Failed { .. }));
    let stages_skipped = count(|s| matches!(s, StageStatus::Skipped { .. }));
    let errors = outcomes
        .iter()
        .filter_map(|o| match &o.status {
            StageStatus::Failed { error } => Some(StageError {
                stage: o.stage,
                error: error.clone(),
            }),
            _ => None,
        })
        .collect();

    PipelineReport {
        pipeline_status: if stages_failed == 0 {
            "completed"
        } else {
            "completed_with_errors"
        },
        start_time: start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
        end_time: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        total_elapsed_seconds: round2(started.elapsed().as_secs_f64()),
        stages_completed,
        stages_failed,
        stages_skipped,
        stages: outcomes,
        errors,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

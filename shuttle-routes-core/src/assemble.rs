//! Turns district-tagged text into [`RouteDraft`]s.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{CatalogConfig, UNKNOWN_DISTRICT};
use crate::error::Result;
use crate::input::SourceInput;
use crate::schedule::ScheduleExtractor;
use crate::segment::DistrictSegmenter;
use crate::stops::{StopCandidate, StopExtractor};

/// An assembled route that has not been geocoded or validated yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDraft {
    pub district: String,
    pub name: String,
    pub hours: Option<String>,
    pub interval: Option<String>,
    /// Travel order.
    pub stops: Vec<StopCandidate>,
    /// File name or URL the text came from.
    pub source: Option<String>,
}

impl RouteDraft {
    /// A blank or missing name becomes `"<district> 셔틀"`.
    pub fn new(district: &str, name: Option<&str>, stops: Vec<StopCandidate>) -> Self {
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => default_route_name(district),
        };
        Self {
            district: district.to_string(),
            name,
            hours: None,
            interval: None,
            stops,
            source: None,
        }
    }

    pub fn with_schedule(mut self, hours: Option<String>, interval: Option<String>) -> Self {
        self.hours = hours;
        self.interval = interval;
        self
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    /// Rebuilds a draft from its on-disk record, re-checking every stop.
    pub fn from_record(record: ExtractedRoute, config: &CatalogConfig) -> Self {
        let stops = record
            .stops
            .iter()
            .filter_map(|s| StopCandidate::new(s, config))
            .collect();
        RouteDraft::new(&record.district, Some(&record.name), stops)
            .with_schedule(record.hours, record.interval)
            .with_source(record.source)
    }

    pub fn to_record(&self) -> ExtractedRoute {
        ExtractedRoute {
            district: self.district.clone(),
            name: self.name.clone(),
            hours: self.hours.clone(),
            interval: self.interval.clone(),
            stops: self.stops.iter().map(|s| s.text().to_string()).collect(),
            source: self.source.clone(),
        }
    }
}

pub fn default_route_name(district: &str) -> String {
    format!("{district} 셔틀")
}

/// Serialized form of a [`RouteDraft`] in `extracted_routes.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRoute {
    pub district: String,
    pub name: String,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub stops: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// `extracted_routes.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRoutes {
    pub total_routes: usize,
    pub total_stops: usize,
    pub routes: Vec<ExtractedRoute>,
}

impl ExtractedRoutes {
    pub fn from_drafts(drafts: &[RouteDraft]) -> Self {
        Self {
            total_routes: drafts.len(),
            total_stops: drafts.iter().map(|d| d.stops.len()).sum(),
            routes: drafts.iter().map(RouteDraft::to_record).collect(),
        }
    }

    pub fn into_drafts(self, config: &CatalogConfig) -> Vec<RouteDraft> {
        self.routes
            .into_iter()
            .map(|r| RouteDraft::from_record(r, config))
            .collect()
    }
}

pub struct RouteAssembler<'c> {
    config: &'c CatalogConfig,
    segmenter: DistrictSegmenter<'c>,
    stops: StopExtractor<'c>,
    schedule: ScheduleExtractor,
    route_name: Regex,
}

impl<'c> RouteAssembler<'c> {
    pub fn new(config: &'c CatalogConfig) -> Result<Self> {
        Ok(Self {
            config,
            segmenter: DistrictSegmenter::new(config),
            stops: StopExtractor::new(config)?,
            schedule: ScheduleExtractor::new()?,
            // The route keyword is required: without it any Hangul word, usually a stop,
            // would be taken as the name. Words stay on one line so headers don't absorb
            // the line above them.
            route_name: Regex::new(
                r"([가-힣]+(?:[ \t]+[가-힣]+)*[ \t]*(?:셔틀|순환|노선|버스)+[ \t]*\d*[ \t]*(?:호선|번)?)",
            )?,
        })
    }

    pub fn route_name(&self, span: &str) -> Option<String> {
        self.route_name
            .captures(span)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    }

    pub fn assemble(&self, district: &str, span: &str) -> RouteDraft {
        let name = self.route_name(span);
        let stops = self.stops.extract(span);
        debug!(district, stops = stops.len(), name = ?name, "Assembled route draft");
        RouteDraft::new(district, name.as_deref(), stops)
            .with_schedule(self.schedule.hours(span), self.schedule.interval(span))
    }

    /// Normalizes every input into district-tagged spans and assembles one draft per span.
    ///
    /// Spans of the same district found in different documents are concatenated before
    /// assembly. Crawled fragments are already route-sized and are assembled one by one.
    /// Drafts without stops are dropped.
    pub fn assemble_inputs(&self, inputs: &[SourceInput]) -> Vec<RouteDraft> {
        let mut document_spans: Vec<(String, String, Option<String>)> = Vec::new();
        let mut drafts = Vec::new();

        for input in inputs {
            match input {
                SourceInput::Document(doc) => {
                    if !doc.success {
                        debug!(filename = ?doc.filename, "Skipping unsuccessful OCR document");
                        continue;
                    }
                    for span in self.segmenter.segment(&doc.full_text) {
                        match document_spans.iter_mut().find(|(d, _, _)| *d == span.district) {
                            Some((_, text, _)) => {
                                text.push('\n');
                                text.push_str(&span.text);
                            }
                            None => document_spans.push((
                                span.district,
                                span.text,
                                doc.filename.clone(),
                            )),
                        }
                    }
                }
                SourceInput::Fragment(fragment) => {
                    let district = fragment
                        .district
                        .clone()
                        .filter(|d| !d.trim().is_empty())
                        .or_else(|| {
                            self.segmenter
                                .identify(&fragment.raw_text)
                                .map(|d| d.name.clone())
                        })
                        .unwrap_or_else(|| UNKNOWN_DISTRICT.to_string());
                    drafts.push(
                        self.assemble(&district, &fragment.raw_text)
                            .with_source(fragment.source.clone()),
                    );
                }
            }
        }

        let mut assembled: Vec<RouteDraft> = document_spans
            .into_iter()
            .map(|(district, text, source)| self.assemble(&district, &text).with_source(source))
            .collect();
        assembled.extend(drafts);

        let before = assembled.len();
        assembled.retain(|d| !d.stops.is_empty());
        info!(
            inputs = inputs.len(),
            drafts = assembled.len(),
            dropped_without_stops = before - assembled.len(),
            known_districts = assembled
                .iter()
                .filter(|d| self.config.is_known_district(&d.district))
                .count(),
            "Assembled route drafts"
        );
        assembled
    }
}

//! Stop-name extraction: a compiled suffix pattern pass, a per-line keyword fallback pass,
//! and first-seen deduplication on a normalized key.

use std::collections::HashSet;

use regex::Regex;
use tracing::debug;

use crate::config::CatalogConfig;
use crate::contract::Coordinates;
use crate::error::Result;

const MIN_STOP_CHARS: usize = 3;
const MAX_STOP_CHARS: usize = 30;

/// Exit markers that trail a station name ("3번출구", "2번", "출구").
const EXIT_MARKERS: [&str; 3] = ["번출구", "출구", "번"];

/// A stop name accepted by the extractor.
///
/// Only constructed through [`StopCandidate::new`], which enforces the length,
/// keyword and exclusion rules, so every value in circulation is a plausible stop.
#[derive(Debug, Clone, PartialEq)]
pub struct StopCandidate {
    text: String,
    key: String,
    coordinates: Option<Coordinates>,
}

impl StopCandidate {
    pub fn new(text: &str, config: &CatalogConfig) -> Option<Self> {
        let text = text.trim();
        if !is_valid_stop(text, config) {
            return None;
        }
        let key = normalize_key(text);
        if key.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            key,
            coordinates: None,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn with_coordinates(mut self, coordinates: Option<Coordinates>) -> Self {
        self.coordinates = coordinates;
        self
    }
}

/// Length, keyword and exclusion checks shared by both extraction passes.
pub fn is_valid_stop(text: &str, config: &CatalogConfig) -> bool {
    let chars = text.chars().count();
    if !(MIN_STOP_CHARS..=MAX_STOP_CHARS).contains(&chars) {
        return false;
    }
    if text.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if config.exclude_keywords.iter().any(|ex| text.contains(ex.as_str())) {
        return false;
    }
    config.stop_keywords.iter().any(|kw| text.contains(kw.as_str()))
}

/// Whitespace and digits removed, then one trailing exit marker, so "영등포역 1번출구"
/// and "영등포역" share a key.
pub fn normalize_key(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_numeric())
        .collect();
    for marker in EXIT_MARKERS {
        if let Some(base) = stripped.strip_suffix(marker) {
            if !base.is_empty() {
                return base.to_string();
            }
        }
    }
    stripped
}

/// Keeps the first stop seen for each normalized key, preserving order.
pub fn deduplicate(stops: Vec<StopCandidate>) -> Vec<StopCandidate> {
    let mut seen = HashSet::new();
    stops
        .into_iter()
        .filter(|stop| seen.insert(stop.key.clone()))
        .collect()
}

pub struct StopExtractor<'c> {
    config: &'c CatalogConfig,
    stop_pattern: Regex,
    noise: Regex,
    whitespace: Regex,
    delimiters: Regex,
}

impl<'c> StopExtractor<'c> {
    pub fn new(config: &'c CatalogConfig) -> Result<Self> {
        let mut suffixes: Vec<&str> = config.stop_keywords.iter().map(String::as_str).collect();
        // Longest first so "주민센터" wins over shorter overlapping suffixes.
        suffixes.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
        let alternation = suffixes
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let stop_pattern = Regex::new(&format!(
            r"([가-힣]{{2,15}}(?:{alternation})편?\s*\d*번?\s*(?:출구)?)"
        ))?;

        Ok(Self {
            config,
            stop_pattern,
            noise: Regex::new(r"[^\w\s:~\-→↔]")?,
            whitespace: Regex::new(r"\s+")?,
            delimiters: Regex::new(r"[,\s→↔\-]")?,
        })
    }

    /// Collapses whitespace and blanks out punctuation the patterns do not use.
    pub fn clean_text(&self, text: &str) -> String {
        let text = self.noise.replace_all(text, " ");
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }

    /// Distinct stop names in first-seen order.
    pub fn extract(&self, span: &str) -> Vec<StopCandidate> {
        let mut stops = self.pattern_pass(span);
        let fallback = self.keyword_pass(span);
        debug!(
            pattern = stops.len(),
            fallback = fallback.len(),
            "Stop extraction passes finished"
        );
        stops.extend(fallback);
        deduplicate(stops)
    }

    fn pattern_pass(&self, span: &str) -> Vec<StopCandidate> {
        let cleaned = self.clean_text(span);
        self.stop_pattern
            .find_iter(&cleaned)
            .filter_map(|m| StopCandidate::new(m.as_str(), self.config))
            .collect()
    }

    /// Recovers stops the pattern misses because of irregular punctuation.
    fn keyword_pass(&self, span: &str) -> Vec<StopCandidate> {
        let mut found = Vec::new();
        for line in span.lines() {
            let line = self.clean_text(line);
            if self
                .config
                .exclude_keywords
                .iter()
                .any(|ex| line.contains(ex.as_str()))
            {
                continue;
            }
            if !self
                .config
                .stop_keywords
                .iter()
                .any(|kw| line.contains(kw.as_str()))
            {
                continue;
            }
            found.extend(
                self.delimiters
                    .split(&line)
                    .filter_map(|part| StopCandidate::new(part, self.config)),
            );
        }
        found
    }
}

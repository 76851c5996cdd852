/// `load_config` module: Loads a static YAML config, applies environment overrides and
/// adapts it into the engine's [`CatalogConfig`] plus the CLI's own [`PipelineConfig`].
///
/// This module is the only place where user-supplied YAML is parsed.
///
/// # Responsibilities
/// - Parse the YAML file into loosely-typed intermediate structs
/// - Apply `SHUTTLE_DATA_DIR` / `SHUTTLE_SOURCE` overrides from the environment (or `.env`)
/// - Merge keyword overrides onto the built-in Seoul tables
/// - Fail with a clear message naming the file on any read or parse problem
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{bail, Result};
use serde::Deserialize;
use shuttle_routes_core::config::CatalogConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const DATA_DIR_ENV: &str = "SHUTTLE_DATA_DIR";
pub const SOURCE_ENV: &str = "SHUTTLE_SOURCE";

const DEFAULT_OUTPUT: &str = "shuttle_routes.json";

#[derive(Debug, Deserialize)]
struct RawConfig {
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    source: Option<String>,
    #[serde(default)]
    geocode: GeocodeSection,
    #[serde(default)]
    keywords: KeywordSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeSection {
    /// Persist resolved coordinates between runs.
    #[serde(default = "default_true")]
    pub cache: bool,
}

impl Default for GeocodeSection {
    fn default() -> Self {
        Self { cache: true }
    }
}

#[derive(Debug, Default, Deserialize)]
struct KeywordSection {
    stop: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

/// Everything a pipeline run needs, resolved and ready.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of the `raw/` and `processed/` artifact directories.
    pub data_dir: PathBuf,
    /// Where the canonical catalog is published.
    pub output: PathBuf,
    pub geocode: GeocodeSection,
    pub catalog: CatalogConfig,
}

impl PipelineConfig {
    /// Resolves an artifact path such as `processed/geocoded_routes.json` under `data_dir`.
    pub fn artifact(&self, relative: &str) -> PathBuf {
        self.data_dir.join(relative)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e)
    })?;

    let raw: RawConfig = serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML: {e}")
    })?;
    info!(config_path = ?path_ref, "Parsed config YAML successfully");

    let env_data_dir = std::env::var(DATA_DIR_ENV).ok().filter(|v| !v.trim().is_empty());
    let data_dir = match (env_data_dir, raw.data_dir) {
        (Some(dir), _) => PathBuf::from(dir),
        (None, Some(dir)) => dir,
        (None, None) => bail!("`data_dir` is required (or set {DATA_DIR_ENV})"),
    };
    let output = raw.output.unwrap_or_else(|| data_dir.join(DEFAULT_OUTPUT));

    let mut catalog = CatalogConfig::seoul();
    let env_source = std::env::var(SOURCE_ENV).ok().filter(|v| !v.trim().is_empty());
    if let Some(source) = env_source.or(raw.source.filter(|v| !v.trim().is_empty())) {
        catalog.source = source;
    }
    if let Some(stop) = raw.keywords.stop {
        catalog.stop_keywords = non_empty("keywords.stop", stop)?;
    }
    if let Some(exclude) = raw.keywords.exclude {
        catalog.exclude_keywords = exclude;
    }
    catalog.trace_loaded();

    let config = PipelineConfig {
        data_dir,
        output,
        geocode: raw.geocode,
        catalog,
    };
    info!(
        data_dir = ?config.data_dir,
        output = ?config.output,
        geocode_cache = config.geocode.cache,
        "Resolved pipeline configuration"
    );
    Ok(config)
}

fn non_empty(key: &str, words: Vec<String>) -> Result<Vec<String>> {
    let words: Vec<String> = words
        .into_iter()
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        bail!("`{key}` must list at least one keyword");
    }
    Ok(words)
}


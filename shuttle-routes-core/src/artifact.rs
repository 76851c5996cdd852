//! JSON artifacts exchanged between pipeline stages.
//!
//! The core never touches the filesystem itself; callers hand it bytes and receive
//! bytes back, and map their I/O failures through [`io_error`].

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CatalogError, Result};

pub const OCR_RESULTS: &str = "processed/ocr_results.json";
pub const CRAWL_RESULTS: &str = "raw/crawl_results.json";
pub const EXTRACTED_ROUTES: &str = "processed/extracted_routes.json";
pub const GEOCODED_ROUTES: &str = "processed/geocoded_routes.json";
pub const VALIDATION_REPORT: &str = "processed/validation_report.json";
pub const PIPELINE_REPORT: &str = "processed/pipeline_report.json";
pub const GEOCODE_CACHE: &str = "processed/geocode_cache.json";

pub fn parse<T: DeserializeOwned>(artifact: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|source| CatalogError::Json {
        artifact: artifact.to_string(),
        source,
    })
}

/// Pretty-printed with non-ASCII text left as is.
pub fn render<T: Serialize>(artifact: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|source| CatalogError::Json {
        artifact: artifact.to_string(),
        source,
    })
}

/// A missing file is a [`CatalogError::MissingInput`]; anything else stays an I/O error.
pub fn io_error(artifact: &str, source: std::io::Error) -> CatalogError {
    match source.kind() {
        std::io::ErrorKind::NotFound => CatalogError::MissingInput {
            artifact: artifact.to_string(),
        },
        _ => CatalogError::Io {
            artifact: artifact.to_string(),
            source,
        },
    }
}

use thiserror::Error;

/// Failures the catalog engine reports to its caller.
///
/// Validation problems in the data itself are never errors; they live in
/// [`crate::validate::ValidationReport`].
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("required input artifact missing: {artifact}")]
    MissingInput { artifact: String },

    #[error("failed to parse {artifact}: {source}")]
    Json {
        artifact: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {artifact}: {source}")]
    Io {
        artifact: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<regex::Error> for CatalogError {
    fn from(e: regex::Error) -> Self {
        CatalogError::InvalidConfig(format!("pattern failed to compile: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

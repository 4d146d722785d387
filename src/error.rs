use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading reference data or submissions. The progress
/// engine itself never fails.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalogue JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("duplicate indicator id `{0}` in catalogue")]
    DuplicateIndicator(String),
}

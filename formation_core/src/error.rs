//! Error types for the formation pipeline.
//!
//! Nothing here is fatal to a running frame loop: a [`LandmarkError`] just
//! means one detector hand was discarded, and a [`ConfigError`] can only
//! happen at startup.

use std::path::PathBuf;

use thiserror::Error;

/// Why a detector hand was rejected by the normalizer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkError {
    #[error("presence score {score:.3} below threshold {threshold:.3}")]
    LowConfidence { score: f32, threshold: f32 },

    #[error("expected {expected} landmarks, got {actual}")]
    WrongLandmarkCount { expected: usize, actual: usize },

    #[error("non-finite value at landmark {index}")]
    NonFinite { index: usize },

    #[error("palm size {palm_size:e} too small to normalize")]
    DegenerateHand { palm_size: f32 },
}

/// Errors produced when loading or validating a
/// [`PipelineConfig`](crate::config::PipelineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Cannot read config file `{path}`: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue { field, reason: reason.into() }
    }
}

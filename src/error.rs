//! Central error handling for tile-labels
//!
//! Placement itself never fails: rejected candidates are reported through
//! `PlacementResult`. `LabelError` covers the surrounding plumbing, i.e. loading
//! configuration, POI tables and asset readiness.

/// Centralized error type for all non-placement operations
#[derive(thiserror::Error, Debug)]
pub enum LabelError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Asset load failed ({asset}): {reason}")]
    AssetLoad { asset: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LabelError {
    /// Short category tag, used as a log prefix
    pub fn category(&self) -> &'static str {
        match self {
            LabelError::Config(_) => "Config",
            LabelError::Json(_) => "Json",
            LabelError::AssetLoad { .. } => "AssetLoad",
            LabelError::Io(_) => "IO",
        }
    }

    pub fn config<T: ToString>(msg: T) -> Self {
        LabelError::Config(msg.to_string())
    }

    pub fn asset_load<A: ToString, R: ToString>(asset: A, reason: R) -> Self {
        LabelError::AssetLoad {
            asset: asset.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for label operations
pub type LabelResult<T> = Result<T, LabelError>;

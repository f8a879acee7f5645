use thiserror::Error;

/// Why a dataset load did not produce a renderable collection.
///
/// Every variant is handled the same way by the view: logged, and the map
/// stays in its pre-load state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// The body was not a GeoJSON feature collection this view understands.
    #[error("parse error: {0}")]
    Parse(String),

    /// A feature parsed but its geometry cannot be projected.
    #[error("feature {index} is invalid: {reason}")]
    InvalidFeature { index: usize, reason: String },
}

impl From<geojson::Error> for LoadError {
    fn from(e: geojson::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Rejected map configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown preset `{0}`")]
    UnknownPreset(String),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

//! Error types for the mortality map pipeline and service.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Primary error type for loading, joining and rendering.
#[derive(Debug, Error)]
pub enum MapError {
    // === Input Errors ===
    #[error("Cannot access {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {context}: {message}")]
    Parse { context: String, message: String },

    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Schema error: {0}")]
    Schema(String),

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    Render(String),

    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl MapError {
    /// Wrap an I/O error raised while opening or reading `path`.
    pub fn file_access(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        MapError::FileAccess {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn parse(context: impl Into<String>, message: impl ToString) -> Self {
        MapError::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Short machine-readable kind, used as a log field and metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            MapError::FileAccess { .. } => "file_access",
            MapError::Parse { .. } => "parse",
            MapError::MissingColumns { .. } | MapError::Schema(_) => "schema",
            MapError::Render(_) => "render",
            MapError::Config(_) => "config",
        }
    }

    /// Get the HTTP status code for this error.
    ///
    /// Nothing a client sends can cause these, so every kind is a server error.
    pub fn http_status_code(&self) -> u16 {
        500
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::parse("JSON", err)
    }
}

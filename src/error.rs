//! Error and warning types for screen-link.
//!
//! Hard errors (`ScreenLinkError`) only come out of the plumbing around the
//! analysis: config loading, scanning, reading or writing a graph document.
//! The analysis itself degrades instead of failing, and reports what it
//! skipped as [`Warning`]s.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScreenLinkError>;

#[derive(Error, Debug)]
pub enum ScreenLinkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("Invalid filter pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Scan failed: {0}")]
    Scan(String),
}

impl ScreenLinkError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a whole extraction layer. Demoted to a warning by the builder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("{layer} extraction failed: {message}")]
    Layer { layer: String, message: String },

    #[error("{layer} extraction panicked: {message}")]
    Panicked { layer: String, message: String },
}

impl ExtractError {
    pub fn layer(layer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Layer {
            layer: layer.into(),
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Layer { message, .. } | Self::Panicked { message, .. } => message,
        }
    }
}

/// A recoverable problem surfaced verbatim in `meta.warnings`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Warning(String);

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ExtractError> for Warning {
    fn from(err: ExtractError) -> Self {
        Self(err.to_string())
    }
}

impl From<String> for Warning {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for Warning {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Render a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

use std::io;
use thiserror::Error;

use super::config::ConfigError;
use crate::core::digest::ConstraintError;
use crate::core::io::manifest::ManifestError;
use crate::core::io::records::RecordError;
use crate::core::io::report::ReportError;
use crate::core::mass::table::MassError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid enzyme constraint: {0}")]
    Constraint(#[from] ConstraintError),

    #[error("Mass lookup failed: {0}")]
    Mass(#[from] MassError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Too many open files while opening '{path}', even after closing idle bin handles")]
    HandleExhaustion {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Index '{path}' is incompatible with this run: {reason}")]
    Incompatible { path: String, reason: String },

    #[error("Corrupted index '{path}': {reason}")]
    CorruptedIndex { path: String, reason: String },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupted(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptedIndex {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

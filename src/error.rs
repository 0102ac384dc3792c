use std::path::PathBuf;

use thiserror::Error;

use crate::dsl::error::CompileError;

/// Errors surfaced by the simulation and configuration layers.
///
/// Runtime faults inside a machine never reach this type; they are absorbed
/// where they happen.
#[derive(Debug, Error)]
pub enum AppError {
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

    #[error("unknown scenario {name:?}")]
    UnknownScenario { name: String },

    #[error("program {name:?} rejected: {source}")]
    Compile {
        name: String,
        #[source]
        source: CompileError,
    },

    #[error("invalid settings: {message}")]
    InvalidSettings { message: String },

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl AppError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        AppError::Json {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_settings(message: impl Into<String>) -> Self {
        AppError::InvalidSettings {
            message: message.into(),
        }
    }
}

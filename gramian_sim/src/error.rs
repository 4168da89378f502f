// gramian_sim/src/error.rs

use std::path::PathBuf;

use gramian_core::error::GramianError;
use thiserror::Error;

use crate::renderer::RenderError;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Gramian(#[from] GramianError),

    #[error("failed to load configuration: {0}")]
    Config(#[from] figment::Error),

    #[error("configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON (de)serialisation failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write TOML: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl SimError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimError::Io {
            path: path.into(),
            source,
        }
    }
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifeError {
    #[error("failed to load job definition {path}: {reason}")]
    DefinitionLoad { path: PathBuf, reason: String },

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("unknown output format '{0}': expected table, json, or csv")]
    UnknownFormat(String),

    #[error("execution engine '{0}' not found on PATH (set LORCHESTRA_BIN to override)")]
    EngineNotFound(String),

    #[error("execution engine failed: {0}")]
    EngineFailed(String),

    #[error("result does not match output contract: {0}")]
    RenderContract(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LifeError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReagentError {
    /// The model reply violated the step output format (e.g. no `Summary:`
    /// line). This is a prompt bug, not a recoverable runtime condition.
    #[error("Reply contract violation: {0}")]
    Contract(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Prompt template error: {0}")]
    Template(String),

    #[error("Tool registry error: {0}")]
    Registry(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ReagentError>;

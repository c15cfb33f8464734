use thiserror::Error;

/// Run-level error type.
///
/// Per-member collaborator failures never surface here: they are logged and
/// degraded where they happen. What reaches `AppError` aborts the run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid member input: {0}")]
    Input(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Process exit code for the binary. Configuration and input problems
    /// are distinguished from runtime failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 2,
            AppError::Input(_) => 3,
            AppError::Io(_) | AppError::Serialization(_) => 4,
            AppError::Llm(_) | AppError::Internal(_) => 1,
        }
    }
}

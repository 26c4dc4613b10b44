use thiserror::Error;

/// Persistence failures raised by the storage layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ServiceError {
    pub fn storage(action: &str, err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{action}: {err}"))
    }
}

use crate::domain_model::*;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Perform exactly one HTTP exchange. Any status code is a successful
    /// exchange; only the absence of a response is an error.
    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, TransportError>;
}

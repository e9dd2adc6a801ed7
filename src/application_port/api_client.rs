use crate::domain_model::*;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("authentication failed")]
    AuthFailed,
    #[error("too many requests, please try again later")]
    RateLimited { retry_after: Option<Duration> },
    #[error("network error: {0}")]
    Network(String),
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the failure ended the session.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::AuthFailed)
    }
}

#[derive(Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    /// Send `request` with the current token, refreshing and retrying as needed.
    async fn request(&self, request: RequestDescriptor) -> Result<ApiResponse, ApiError>;
    async fn login(&self, input: LoginInput) -> Result<Session, ApiError>;
    fn sign_in(&self, token: AccessToken);
    async fn sign_out(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_input_debug_hides_password() {
        let input = LoginInput {
            email: "advisor@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let printed = format!("{:?}", input);
        assert!(printed.contains("advisor@example.com"));
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("hunter2"));
    }
}

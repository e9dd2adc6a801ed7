use crate::application_impl::Failure;
use crate::application_port::ApiError;
use crate::domain_model::*;
use std::time::Duration;

pub const MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);

/// Message the backend nests in its body for a rejected sign-in.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// What went wrong with one attempt, before deciding what to do about it.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureKind {
    InvalidCredentials(String),
    /// 401 and no refresh tried yet. Recovered internally.
    AuthExpired,
    AuthFailed,
    RateLimited { retry_after: Option<Duration> },
    Network(String),
    Other { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Refresh the access token, then replay once.
    Refresh,
    /// Wait, then replay with the same token.
    Backoff(Duration),
    Propagate(ApiError),
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay before the `retry`-th replay (1-based): base * 2^(retry-1), capped.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        let delay = self.base_delay.saturating_mul(2_u32.saturating_pow(exponent));
        delay.min(self.max_delay)
    }

    /// `Retry-After` in whole seconds. HTTP-date values are ignored.
    pub fn retry_after(response: &ApiResponse) -> Option<Duration> {
        response
            .header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| Duration::from_millis(secs.saturating_mul(1000)))
    }

    pub fn classify(&self, failure: &Failure, pending: &PendingRequest) -> FailureKind {
        let response = match failure {
            Failure::Network(message) => return FailureKind::Network(message.clone()),
            Failure::Status(response) => response,
        };

        // Must win over the 401 branch: the backend answers bad sign-ins with 401.
        if let Some(message) = response.nested_message() {
            if message == INVALID_CREDENTIALS {
                return FailureKind::InvalidCredentials(message.to_string());
            }
        }

        match response.status {
            401 if !pending.refresh_attempted => FailureKind::AuthExpired,
            401 => FailureKind::AuthFailed,
            429 => FailureKind::RateLimited {
                retry_after: Self::retry_after(response),
            },
            status => FailureKind::Other {
                status,
                message: response.message(),
            },
        }
    }

    pub fn decide(&self, failure: &Failure, pending: &PendingRequest) -> Decision {
        match self.classify(failure, pending) {
            FailureKind::InvalidCredentials(message) => {
                Decision::Propagate(ApiError::InvalidCredentials(message))
            }
            FailureKind::AuthExpired => Decision::Refresh,
            FailureKind::AuthFailed => Decision::Propagate(ApiError::AuthFailed),
            FailureKind::RateLimited { retry_after } => {
                if pending.retry_count >= self.max_retries {
                    return Decision::Propagate(ApiError::RateLimited { retry_after });
                }
                let delay =
                    retry_after.unwrap_or_else(|| self.backoff_delay(pending.retry_count + 1));
                Decision::Backoff(delay)
            }
            FailureKind::Network(message) => Decision::Propagate(ApiError::Network(message)),
            FailureKind::Other { status, message } => {
                Decision::Propagate(ApiError::Http { status, message })
            }
        }
    }
}

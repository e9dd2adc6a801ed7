use crate::domain_model::*;
use crate::domain_port::Transport;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a single attempt did not produce a 2xx.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// The backend answered with a non-2xx status.
    Status(ApiResponse),
    /// No response: connection failure or the deadline elapsed.
    Network(String),
}

impl Failure {
    pub fn status(&self) -> Option<u16> {
        match self {
            Failure::Status(resp) => Some(resp.status),
            Failure::Network(_) => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Status(resp) => write!(f, "status {}", resp.status),
            Failure::Network(message) => write!(f, "network: {}", message),
        }
    }
}

pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Perform one attempt of `pending` with `token` as the bearer credential.
    pub async fn execute(
        &self,
        pending: &PendingRequest,
        token: Option<&AccessToken>,
    ) -> Result<ApiResponse, Failure> {
        let mut descriptor = pending.descriptor.clone();
        if let Some(token) = token {
            descriptor
                .headers
                .insert("authorization".to_string(), token.bearer());
        }

        debug!(
            request_id = %pending.id,
            method = %descriptor.method,
            path = %descriptor.path,
            retry_count = pending.retry_count,
            refresh_attempted = pending.refresh_attempted,
            "sending request"
        );

        let result = tokio::time::timeout(self.timeout, self.transport.send(&descriptor)).await;
        match result {
            Err(_) => Err(Failure::Network(format!(
                "no response within {} seconds",
                self.timeout.as_secs()
            ))),
            Ok(Err(e)) => Err(Failure::Network(e.to_string())),
            Ok(Ok(resp)) => {
                debug!(request_id = %pending.id, status = resp.status, "response received");
                if resp.is_success() {
                    Ok(resp)
                } else {
                    Err(Failure::Status(resp))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_port::TransportError;
    use crate::infra_fake::FakeTransport;
    use serde_json::json;

    #[tokio::test]
    async fn attaches_bearer_token() {
        let transport = Arc::new(FakeTransport::new(|_| Ok(ApiResponse::new(200, json!({})))));
        let executor = RequestExecutor::new(transport.clone(), DEFAULT_REQUEST_TIMEOUT);

        let pending = PendingRequest::new(
            RequestDescriptor::get("/students").with_header("Authorization", "Bearer caller"),
        );
        executor
            .execute(&pending, Some(&AccessToken::new("T1")))
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].header("authorization"), Some("Bearer T1"));
        // The caller's descriptor is left as it was, ready for replay.
        assert_eq!(pending.descriptor.header("authorization"), Some("Bearer caller"));
    }

    #[tokio::test]
    async fn no_token_no_header() {
        let transport = Arc::new(FakeTransport::new(|_| Ok(ApiResponse::new(204, json!(null)))));
        let executor = RequestExecutor::new(transport.clone(), DEFAULT_REQUEST_TIMEOUT);

        let pending = PendingRequest::new(RequestDescriptor::post("/auth/refresh"));
        executor.execute(&pending, None).await.unwrap();

        assert_eq!(transport.calls()[0].header("authorization"), None);
    }

    #[tokio::test]
    async fn non_success_status_is_a_failure() {
        let transport = Arc::new(FakeTransport::new(|_| {
            Ok(ApiResponse::new(404, json!({ "message": "not found" })))
        }));
        let executor = RequestExecutor::new(transport, DEFAULT_REQUEST_TIMEOUT);

        let pending = PendingRequest::new(RequestDescriptor::get("/courses/9"));
        let failure = executor.execute(&pending, None).await.unwrap_err();
        assert_eq!(failure.status(), Some(404));
    }

    #[tokio::test]
    async fn transport_error_is_network_failure() {
        let transport = Arc::new(FakeTransport::new(|_| {
            Err(TransportError::Connection("refused".to_string()))
        }));
        let executor = RequestExecutor::new(transport, DEFAULT_REQUEST_TIMEOUT);

        let pending = PendingRequest::new(RequestDescriptor::get("/courses"));
        let failure = executor.execute(&pending, None).await.unwrap_err();
        assert!(matches!(failure, Failure::Network(m) if m.contains("refused")));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_elapses_as_network_failure() {
        let transport = Arc::new(FakeTransport::new(|_| Ok(ApiResponse::new(200, json!({})))));
        let _gate = transport.gate("/slow");
        let executor = RequestExecutor::new(transport, DEFAULT_REQUEST_TIMEOUT);

        let pending = PendingRequest::new(RequestDescriptor::get("/slow"));
        let failure = executor.execute(&pending, None).await.unwrap_err();
        assert!(matches!(failure, Failure::Network(m) if m.contains("10 seconds")));
    }
}

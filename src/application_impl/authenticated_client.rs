use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::{Clock, Navigator, TokenStore, Transport};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";
pub const DEFAULT_LOGOUT_PATH: &str = "/auth/logout";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub landing_route: String,
    pub login_path: String,
    pub refresh_path: String,
    pub logout_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            landing_route: DEFAULT_LANDING_ROUTE.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
        }
    }
}

pub struct AuthenticatedClient {
    executor: Arc<RequestExecutor>,
    token_store: Arc<dyn TokenStore>,
    coordinator: RefreshCoordinator,
    session_sink: Arc<SessionSink>,
    clock: Arc<dyn Clock>,
    config: ClientConfig,
}

impl AuthenticatedClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        token_store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
        config: ClientConfig,
    ) -> Self {
        let executor = Arc::new(RequestExecutor::new(transport, config.request_timeout));
        let session_sink = Arc::new(SessionSink::new(
            token_store.clone(),
            navigator,
            config.landing_route.clone(),
        ));
        let coordinator = RefreshCoordinator::new(
            executor.clone(),
            token_store.clone(),
            session_sink.clone(),
            config.refresh_path.clone(),
        );
        Self {
            executor,
            token_store,
            coordinator,
            session_sink,
            clock,
            config,
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn session_sink(&self) -> &SessionSink {
        &self.session_sink
    }

    pub fn current_session(&self) -> Option<Session> {
        self.token_store.session()
    }

    pub fn current_claims(&self) -> Option<Claims> {
        let token = self.token_store.get()?;
        decode_claims(token.as_str()).ok()
    }

    /// Whether the stored token is past its `exp` claim.
    pub fn session_expired(&self) -> bool {
        self.current_session()
            .map(|s| s.is_expired(self.clock.now()))
            .unwrap_or(false)
    }

    pub async fn request_json<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<T, ApiError> {
        let resp = self.request(request).await?;
        serde_json::from_value(resp.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn run(
        &self,
        mut pending: PendingRequest,
        allow_refresh: bool,
    ) -> Result<ApiResponse, ApiError> {
        let mut token = if allow_refresh {
            self.token_store.get()
        } else {
            None
        };

        loop {
            let failure = match self.executor.execute(&pending, token.as_ref()).await {
                Ok(resp) => return Ok(resp),
                Err(failure) => failure,
            };

            match self.config.retry.decide(&failure, &pending) {
                Decision::Refresh if allow_refresh => {
                    pending.mark_refresh_attempted();
                    token = match self.token_store.get() {
                        // Someone refreshed after this attempt went out; reuse their token.
                        Some(current) if token.as_ref() != Some(&current) => {
                            debug!(request_id = %pending.id, "access token already rotated, replaying");
                            Some(current)
                        }
                        _ => {
                            debug!(request_id = %pending.id, "access token rejected, refreshing");
                            // Replay with exactly the token this refresh produced.
                            Some(self.coordinator.refresh().await?)
                        }
                    };
                }
                Decision::Refresh => {
                    let message = match &failure {
                        Failure::Status(resp) if !resp.message().is_empty() => resp.message(),
                        _ => INVALID_CREDENTIALS.to_string(),
                    };
                    return Err(ApiError::InvalidCredentials(message));
                }
                Decision::Backoff(delay) => {
                    pending.retry_count += 1;
                    warn!(
                        request_id = %pending.id,
                        retry = pending.retry_count,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    self.clock.sleep(delay).await;
                }
                Decision::Propagate(err) => {
                    if err.is_auth_failure() {
                        self.session_sink.clear();
                    }
                    debug!(request_id = %pending.id, error = %err, "request failed");
                    return Err(err);
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl ApiClient for AuthenticatedClient {
    async fn request(&self, request: RequestDescriptor) -> Result<ApiResponse, ApiError> {
        self.run(PendingRequest::new(request), true).await
    }

    async fn login(&self, input: LoginInput) -> Result<Session, ApiError> {
        let LoginInput { email, password } = input;
        let request = RequestDescriptor::post(self.config.login_path.as_str())
            .with_json(json!({ "email": email, "password": password }));

        let resp = self.run(PendingRequest::new(request), false).await?;
        let token = extract_access_token(&resp.body)
            .ok_or_else(|| ApiError::Decode("login response carried no access token".to_string()))?;

        self.sign_in(token);
        self.current_session()
            .ok_or_else(|| ApiError::Decode("session was not stored".to_string()))
    }

    fn sign_in(&self, token: AccessToken) {
        self.token_store.set(Some(token));
        self.session_sink.rearm();
        info!("signed in");
    }

    async fn sign_out(&self) {
        if let Some(token) = self.token_store.get() {
            let pending =
                PendingRequest::new(RequestDescriptor::post(self.config.logout_path.as_str()));
            if let Err(failure) = self.executor.execute(&pending, Some(&token)).await {
                warn!(%failure, "logout call failed, clearing session anyway");
            }
        }
        self.session_sink.clear();
    }
}

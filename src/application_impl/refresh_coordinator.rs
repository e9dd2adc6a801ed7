use crate::application_impl::{RequestExecutor, SessionSink};
use crate::application_port::ApiError;
use crate::domain_model::*;
use crate::domain_port::TokenStore;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

type Waiter = oneshot::Sender<Result<AccessToken, ApiError>>;

enum RefreshState {
    Idle,
    Refreshing { waiters: VecDeque<Waiter> },
}

enum Role {
    Owner,
    Waiter(oneshot::Receiver<Result<AccessToken, ApiError>>),
}

/// Guarantees at most one refresh call in flight; every other caller waits
/// for that call's outcome.
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    executor: Arc<RequestExecutor>,
    token_store: Arc<dyn TokenStore>,
    session_sink: Arc<SessionSink>,
    refresh_path: String,
    refresh_count: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        executor: Arc<RequestExecutor>,
        token_store: Arc<dyn TokenStore>,
        session_sink: Arc<SessionSink>,
        refresh_path: impl Into<String>,
    ) -> Self {
        Self {
            state: Mutex::new(RefreshState::Idle),
            executor,
            token_store,
            session_sink,
            refresh_path: refresh_path.into(),
            refresh_count: AtomicU64::new(0),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock(), RefreshState::Refreshing { .. })
    }

    pub fn waiter_count(&self) -> usize {
        match &*self.lock() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        }
    }

    /// Refresh calls issued since construction.
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::SeqCst)
    }

    /// Obtain a fresh access token, joining the in-flight refresh if there is one.
    pub async fn refresh(&self) -> Result<AccessToken, ApiError> {
        // Check and commit in one critical section; nothing here may await.
        let role = {
            let mut state = self.lock();
            match &mut *state {
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing {
                        waiters: VecDeque::new(),
                    };
                    Role::Owner
                }
                RefreshState::Refreshing { waiters } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push_back(tx);
                    Role::Waiter(rx)
                }
            }
        };

        match role {
            Role::Waiter(rx) => {
                debug!("joining in-flight token refresh");
                // A dropped sender means the owner went away mid-refresh.
                rx.await.unwrap_or(Err(ApiError::AuthFailed))
            }
            Role::Owner => {
                let mut in_flight = InFlight {
                    coordinator: self,
                    settled: false,
                };
                let outcome = self.issue_refresh().await;
                in_flight.settle(outcome)
            }
        }
    }

    async fn issue_refresh(&self) -> Result<AccessToken, String> {
        self.refresh_count.fetch_add(1, Ordering::SeqCst);
        info!(path = %self.refresh_path, "refreshing access token");

        let pending = PendingRequest::new(RequestDescriptor::post(self.refresh_path.as_str()));
        match self.executor.execute(&pending, None).await {
            Ok(resp) => extract_access_token(&resp.body)
                .ok_or_else(|| "refresh response carried no access token".to_string()),
            Err(failure) => Err(failure.to_string()),
        }
    }

    fn finish(&self) -> VecDeque<Waiter> {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, RefreshState::Idle) {
            RefreshState::Idle => VecDeque::new(),
            RefreshState::Refreshing { waiters } => waiters,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owner's hold on the Refreshing state. Dropping it unsettled returns the
/// coordinator to Idle and fails the waiters.
struct InFlight<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(&mut self, outcome: Result<AccessToken, String>) -> Result<AccessToken, ApiError> {
        self.settled = true;
        let c = self.coordinator;

        match outcome {
            Ok(token) => {
                // Store first so nobody released below can read a stale token.
                c.token_store.set(Some(token.clone()));
                c.session_sink.rearm();
                let waiters = c.finish();
                info!(waiters = waiters.len(), "access token refreshed");
                for waiter in waiters {
                    let _ = waiter.send(Ok(token.clone()));
                }
                Ok(token)
            }
            Err(reason) => {
                let waiters = c.finish();
                warn!(%reason, waiters = waiters.len(), "token refresh failed");
                c.session_sink.clear();
                for waiter in waiters {
                    let _ = waiter.send(Err(ApiError::AuthFailed));
                }
                Err(ApiError::AuthFailed)
            }
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let waiters = self.coordinator.finish();
            warn!(waiters = waiters.len(), "token refresh abandoned");
        }
    }
}

/// The backend has answered with a few different shapes over time.
pub fn extract_access_token(body: &Value) -> Option<AccessToken> {
    ["accessToken", "access_token", "token"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .or_else(|| {
            body.get("data")
                .and_then(|d| d.get("accessToken"))
                .and_then(Value::as_str)
        })
        .filter(|t| !t.is_empty())
        .map(AccessToken::new)
}

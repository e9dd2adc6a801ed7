use crate::domain_port::{Navigator, TokenStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

pub const DEFAULT_LANDING_ROUTE: &str = "/";

/// Reacts to unrecoverable authentication failure: drop the token and send
/// the console back to its public landing page.
pub struct SessionSink {
    token_store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    landing_route: String,
    cleared: AtomicBool,
}

impl SessionSink {
    pub fn new(
        token_store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        landing_route: impl Into<String>,
    ) -> Self {
        Self {
            token_store,
            navigator,
            landing_route: landing_route.into(),
            cleared: AtomicBool::new(false),
        }
    }

    /// Clear the session and redirect. Repeated calls redirect only once
    /// until [`SessionSink::rearm`] is called.
    pub fn clear(&self) {
        if let Some(session) = self.token_store.take() {
            debug!(expires_at = ?session.expires_at, "dropping access token");
        }
        if self.cleared.swap(true, Ordering::SeqCst) {
            debug!("session already cleared");
            return;
        }
        info!(route = %self.landing_route, "session cleared, redirecting");
        self.navigator.navigate(&self.landing_route);
    }

    /// Called when a new session starts.
    pub fn rearm(&self) {
        self.cleared.store(false, Ordering::SeqCst);
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::MemoryTokenStore;
    use crate::domain_model::AccessToken;
    use crate::infra_fake::RecordingNavigator;

    fn sink() -> (SessionSink, Arc<MemoryTokenStore>, Arc<RecordingNavigator>) {
        let store = Arc::new(MemoryTokenStore::with_token(AccessToken::new("T1")));
        let navigator = Arc::new(RecordingNavigator::new());
        let sink = SessionSink::new(store.clone(), navigator.clone(), "/");
        (sink, store, navigator)
    }

    #[test]
    fn clear_twice_redirects_once() {
        let (sink, store, navigator) = sink();

        sink.clear();
        sink.clear();

        assert!(store.get().is_none());
        assert!(sink.is_cleared());
        assert_eq!(navigator.routes(), vec!["/".to_string()]);
    }

    #[test]
    fn clear_without_session_still_redirects() {
        let store = Arc::new(MemoryTokenStore::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let sink = SessionSink::new(store.clone(), navigator.clone(), "/welcome");

        sink.clear();

        assert!(store.session().is_none());
        assert_eq!(navigator.routes(), vec!["/welcome".to_string()]);
    }

    #[test]
    fn rearm_allows_next_redirect() {
        let (sink, store, navigator) = sink();

        sink.clear();
        store.set(Some(AccessToken::new("T2")));
        sink.rearm();
        assert!(!sink.is_cleared());
        sink.clear();

        assert!(store.get().is_none());
        assert_eq!(navigator.routes().len(), 2);
    }
}

use crate::domain_port::Navigator;

/// Headless stand-in for the browser router: the redirect is only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!(%route, "navigate");
    }
}

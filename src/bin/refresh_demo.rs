//! Fires a burst of requests with a stale token at an in-memory backend and
//! shows that only one refresh goes out. One path is rate limited once and
//! waits out its `Retry-After` on the real clock.
//!
//! $ cargo run --bin refresh_demo

use admitgate::application_impl::*;
use admitgate::application_port::ApiClient;
use admitgate::domain_model::*;
use admitgate::infra_fake::FakeTransport;
use admitgate::infra_tokio::{TokioClock, TracingNavigator};
use admitgate::logger::*;
use futures_util::future::join_all;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    logger.reload_from_config(&LogConfig {
        filter: "debug".to_string(),
    })?;

    let throttled = AtomicBool::new(true);
    let transport = Arc::new(FakeTransport::new(move |req| {
        if req.path == "/organizations" && throttled.swap(false, Ordering::SeqCst) {
            return Ok(ApiResponse::new(429, json!({})).with_header("Retry-After", "1"));
        }
        if req.path == DEFAULT_REFRESH_PATH {
            return Ok(ApiResponse::new(200, json!({ "accessToken": "fresh" })));
        }
        match req.header("authorization") {
            Some("Bearer fresh") => Ok(ApiResponse::new(200, json!({ "path": req.path }))),
            _ => Ok(ApiResponse::new(401, json!({ "message": "jwt expired" }))),
        }
    }));
    let client = AuthenticatedClient::new(
        transport.clone(),
        Arc::new(MemoryTokenStore::with_token(AccessToken::new("stale"))),
        Arc::new(TokioClock),
        Arc::new(TracingNavigator),
        ClientConfig::default(),
    );

    let paths = ["/students", "/applications", "/courses", "/organizations"];
    let results = join_all(
        paths
            .iter()
            .map(|path| client.request(RequestDescriptor::get(*path))),
    )
    .await;

    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(resp) => info!(%path, status = resp.status, "ok"),
            Err(e) => error!(%path, error = %e, "failed"),
        }
    }
    info!(
        refresh_calls = transport.calls_to(DEFAULT_REFRESH_PATH).len(),
        total_calls = transport.calls().len(),
        "done"
    );
    Ok(())
}

use admitgate::application_impl::*;
use admitgate::application_port::ApiClient;
use admitgate::domain_model::*;
use admitgate::infra_http::ReqwestTransport;
use admitgate::infra_tokio::{TokioClock, TracingNavigator};
use admitgate::logger::*;
use admitgate::settings::*;
use futures_util::future::join_all;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    logger.reload_from_config(&LogConfig::from(&project_settings))?;

    let method: HttpMethod = cli.method.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    if cli.paths.is_empty() {
        return Err(anyhow::anyhow!("no paths given"));
    }

    let config = project_settings.client_config();
    let transport = ReqwestTransport::new(&project_settings.api.base_url, config.request_timeout)?;
    let client = AuthenticatedClient::new(
        Arc::new(transport),
        Arc::new(MemoryTokenStore::new()),
        Arc::new(TokioClock),
        Arc::new(TracingNavigator),
        config,
    );

    if let Some(token) = cli.token {
        client.sign_in(AccessToken::new(token));
        if let Some(claims) = client.current_claims() {
            info!(sub = ?claims.sub, role = ?claims.role, expires_at = ?claims.expires_at(), "session");
        }
        if client.session_expired() {
            warn!("access token already expired, the first call will refresh it");
        }
    }

    let requests = cli
        .paths
        .iter()
        .map(|path| client.request(RequestDescriptor::new(method, path.as_str())));
    let results = join_all(requests).await;

    let mut failed = 0;
    for (path, result) in cli.paths.iter().zip(results) {
        match result {
            Ok(resp) => println!("{} {}\n{:#}", resp.status, path, resp.body),
            Err(e) => {
                failed += 1;
                error!(%path, error = %e, "request failed");
            }
        }
    }

    if failed > 0 {
        return Err(anyhow::anyhow!("{} of {} requests failed", failed, cli.paths.len()));
    }
    Ok(())
}

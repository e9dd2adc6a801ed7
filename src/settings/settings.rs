use crate::application_impl::{ClientConfig, RetryPolicy};
use anyhow::{Result, anyhow};
use config::{Config, Environment as EnvSource, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub api: Api,
    pub client: Client,
    pub session: Session,
    pub log: Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Cookies set by the console are `Secure; SameSite=None` in production only.
    pub fn secure_cookies(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Deserialize)]
pub struct Api {
    pub base_url: String,
    pub environment: Environment,
}

#[derive(Debug, Deserialize)]
pub struct Client {
    pub max_retries: u32,
    pub request_timeout_secs: u64,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub login_path: String,
    pub refresh_path: String,
    pub logout_path: String,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub landing_route: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

impl Settings {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: Duration::from_secs(self.client.request_timeout_secs),
            retry: RetryPolicy {
                max_retries: self.client.max_retries,
                base_delay: Duration::from_millis(self.client.backoff_base_ms),
                max_delay: Duration::from_millis(self.client.backoff_max_ms),
            },
            landing_route: self.session.landing_route.clone(),
            login_path: self.client.login_path.clone(),
            refresh_path: self.client.refresh_path.clone(),
            logout_path: self.client.logout_path.clone(),
        }
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Prefix for overrides such as `ADMITGATE__API__BASE_URL`.
pub const ENV_PREFIX: &str = "ADMITGATE";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .set_default("client.max_retries", 3)?
        .set_default("client.request_timeout_secs", 10)?
        .set_default("client.backoff_base_ms", 1000)?
        .set_default("client.backoff_max_ms", 10_000)?
        .set_default("client.login_path", "/auth/login")?
        .set_default("client.refresh_path", "/auth/refresh")?
        .set_default("client.logout_path", "/auth/logout")?
        .set_default("session.landing_route", "/")?
        .set_default("log.filter", "info")?
        .add_source(File::with_name(path))
        .add_source(EnvSource::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_settings(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.toml", name, uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn minimal_file_gets_defaults() {
        let path = write_settings(
            "admitgate-minimal",
            r#"
            [api]
            base_url = "http://localhost:4000/api"
            environment = "development"
            "#,
        );

        let settings = parse_settings(path.to_str()).unwrap();
        assert_eq!(settings.api.environment, Environment::Development);
        assert!(!settings.api.environment.secure_cookies());

        let config = settings.client_config();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(config.refresh_path, "/auth/refresh");
        assert_eq!(config.landing_route, "/");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn file_values_override_defaults() {
        let path = write_settings(
            "admitgate-full",
            r#"
            [api]
            base_url = "https://crm.example.com/api"
            environment = "production"

            [client]
            max_retries = 5
            request_timeout_secs = 30
            backoff_base_ms = 250
            backoff_max_ms = 2000

            [session]
            landing_route = "/sign-in"
            "#,
        );

        let settings = parse_settings(path.to_str()).unwrap();
        assert!(settings.api.environment.secure_cookies());
        let config = settings.client_config();
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.backoff_delay(4), Duration::from_millis(2000));
        assert_eq!(config.landing_route, "/sign-in");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("does/not/exist.toml")).is_err());
    }
}

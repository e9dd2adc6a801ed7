use crate::domain_model::*;
use crate::domain_port::{Transport, TransportError};
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// The cookie store carries the http-only refresh cookie between calls.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        ReqwestTransport {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn map_error(e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_builder() {
            TransportError::InvalidRequest(e.to_string())
        } else {
            TransportError::Connection(e.to_string())
        }
    }
}

/// Empty bodies become `null`, non-JSON bodies a JSON string.
fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .client
            .request(Self::method(request.method), self.url(&request.path));
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(Self::map_error)?;

        let status = resp.status().as_u16();
        let headers: BTreeMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = resp.text().await.map_err(Self::map_error)?;

        Ok(ApiResponse {
            status,
            headers,
            body: parse_body(text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_and_path() {
        let t = ReqwestTransport::with_client(Client::new(), "http://localhost:4000/api/");
        assert_eq!(t.url("/students"), "http://localhost:4000/api/students");
        assert_eq!(t.url("students"), "http://localhost:4000/api/students");
        assert_eq!(t.url("https://cdn.example.com/x"), "https://cdn.example.com/x");
    }

    #[test]
    fn body_parsing() {
        assert_eq!(parse_body(String::new()), Value::Null);
        assert_eq!(parse_body("  ".to_string()), Value::Null);
        assert_eq!(parse_body("{\"a\":1}".to_string()), serde_json::json!({ "a": 1 }));
        assert_eq!(
            parse_body("Too Many Requests".to_string()),
            Value::String("Too Many Requests".to_string())
        );
    }
}

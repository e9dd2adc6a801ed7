use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    /// Header names are lower-cased.
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The backend nests its error text as `{ "message": { "message": "..." } }`.
    pub fn nested_message(&self) -> Option<&str> {
        self.body
            .get("message")
            .and_then(|m| m.get("message"))
            .and_then(Value::as_str)
    }

    /// Best-effort human readable message for error reporting.
    pub fn message(&self) -> String {
        if let Some(m) = self.nested_message() {
            return m.to_string();
        }
        match &self.body {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => match other.get("message").and_then(Value::as_str) {
                Some(m) => m.to_string(),
                None => other.to_string(),
            },
        }
    }
}

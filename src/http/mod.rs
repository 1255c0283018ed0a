//! HTTP transport abstraction used by pipes and authentication modules
//!
//! The core only depends on [`HttpTransport`]; [`HttpRestProvider`] is the
//! reqwest-backed implementation.

pub mod provider;

pub use provider::HttpRestProvider;

use crate::error::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Header carrying the session token on every authenticated request
pub const AUTH_TOKEN_HEADER: &str = "Auth-Token";

/// Extra request headers, keyed by header name
pub type RequestHeaders = HashMap<String, String>;

/// One HTTP exchange: request/response over a resolved URL
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, headers: &RequestHeaders) -> Result<HeaderAndBody>;

    async fn post(&self, url: &str, body: Vec<u8>, headers: &RequestHeaders)
        -> Result<HeaderAndBody>;

    async fn put(&self, url: &str, body: Vec<u8>, headers: &RequestHeaders)
        -> Result<HeaderAndBody>;

    async fn delete(&self, url: &str, headers: &RequestHeaders) -> Result<HeaderAndBody>;
}

/// Successful response: status, headers and raw body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderAndBody {
    status: u16,
    // Keys are stored lowercased
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl HeaderAndBody {
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Header value, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Named field of the response: a non-empty header of that name, else a
    /// top-level field of a JSON object body
    pub fn field(&self, name: &str) -> Option<String> {
        if let Some(value) = self.header(name).filter(|value| !value.is_empty()) {
            return Some(value.to_string());
        }

        let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;
        match value.get(name)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

//! reqwest-backed [`HttpTransport`]
//!
//! Sends JSON bodies, collects the response and maps every non-success status to
//! a [`PipeError::Http`](crate::error::PipeError) carrying the status code.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::error::handlers::HttpErrorHandler;
use crate::http::{HeaderAndBody, HttpTransport, RequestHeaders};
use crate::logging::Logger;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use std::collections::HashMap;

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct HttpRestProvider {
    client: Client,
    logger: Logger,
}

impl HttpRestProvider {
    pub fn new(client: Client, logger: Logger) -> Self {
        Self { client, logger }
    }

    pub fn from_config(config: &ClientConfig, logger: Logger) -> Result<Self> {
        let client = config.build_http_client()?;
        Ok(Self::new(client, logger))
    }

    fn request(&self, method: Method, url: &str, headers: &RequestHeaders) -> RequestBuilder {
        let with_credentials = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(crate::http::AUTH_TOKEN_HEADER));
        self.logger
            .notify_request(method.as_str(), url, with_credentials);

        headers.iter().fold(
            self.client
                .request(method, url)
                .header(ACCEPT, JSON_CONTENT_TYPE),
            |request, (name, value)| request.header(name.as_str(), value.as_str()),
        )
    }

    async fn execute(&self, request: RequestBuilder, operation: &str) -> Result<HeaderAndBody> {
        let response = request.send().await?;
        let status = response.status();

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        let body = response.bytes().await?.to_vec();

        self.logger
            .detail(&format!("{} response status: {}", operation, status));

        if status.is_success() {
            Ok(HeaderAndBody::new(status.as_u16(), headers, body))
        } else {
            let error_text = String::from_utf8_lossy(&body);
            Err(HttpErrorHandler::handle_pipe_error(
                status,
                &error_text,
                operation,
            ))
        }
    }
}

#[async_trait]
impl HttpTransport for HttpRestProvider {
    async fn get(&self, url: &str, headers: &RequestHeaders) -> Result<HeaderAndBody> {
        let request = self.request(Method::GET, url, headers);
        self.execute(request, "GET").await
    }

    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: &RequestHeaders,
    ) -> Result<HeaderAndBody> {
        let request = self
            .request(Method::POST, url, headers)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body);
        self.execute(request, "POST").await
    }

    async fn put(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: &RequestHeaders,
    ) -> Result<HeaderAndBody> {
        let request = self
            .request(Method::PUT, url, headers)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body);
        self.execute(request, "PUT").await
    }

    async fn delete(&self, url: &str, headers: &RequestHeaders) -> Result<HeaderAndBody> {
        let request = self.request(Method::DELETE, url, headers);
        self.execute(request, "DELETE").await
    }
}

//! HTTP transport that logs every request and response at debug level.

use std::time::Instant;

use reqwest::header::{AUTHORIZATION, HeaderMap};
use reqwest::{Client, Request, Response};
use tracing::debug;

/// Header values too sensitive to end up in logs.
fn is_sensitive(name: &str) -> bool {
    name.eq_ignore_ascii_case(AUTHORIZATION.as_str())
}

pub(crate) fn redacted_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if is_sensitive(name.as_str()) {
                "<redacted>"
            } else {
                value.to_str().unwrap_or("<binary>")
            };
            format!("{}: {}", name, value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone)]
pub struct LoggingTransport {
    name: &'static str,
    client: Client,
}

impl LoggingTransport {
    pub fn new(name: &'static str, client: Client) -> Self {
        Self { name, client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn execute(&self, request: Request) -> reqwest::Result<Response> {
        debug!(
            api = self.name,
            method = %request.method(),
            url = %request.url(),
            headers = %redacted_headers(request.headers()),
            "API request"
        );

        let started = Instant::now();
        let response = self.client.execute(request).await?;

        debug!(
            api = self.name,
            status = %response.status(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "API response"
        );

        Ok(response)
    }
}

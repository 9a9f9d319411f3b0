//! reqwest-backed transport for the Seer API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::debug;

use super::{Transport, TransportError, TransportResponse};
use crate::auth::Session;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Transport over a shared reqwest client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    async fn into_transport_response(
        response: reqwest::Response,
    ) -> Result<TransportResponse, TransportError> {
        let status = response.status().as_u16();
        let cookies: Vec<(String, String)> = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&text).ok()
        };
        debug!(
            status,
            cookie_count = cookies.len(),
            has_body = body.is_some(),
            "Response received"
        );
        Ok(TransportResponse {
            status,
            cookies,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError> {
        let url = reqwest::Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        let response = self.client.post(url).form(fields).send().await?;
        Self::into_transport_response(response).await
    }

    async fn get(&self, url: &str, session: &Session) -> Result<TransportResponse, TransportError> {
        let url = reqwest::Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        let mut request = self.client.get(url);
        if !session.is_empty() {
            let value = header::HeaderValue::from_str(&session.cookie_header())
                .map_err(|e| TransportError::InvalidCookie(e.to_string()))?;
            request = request.header(header::COOKIE, value);
        }
        let response = request.send().await?;
        Self::into_transport_response(response).await
    }
}

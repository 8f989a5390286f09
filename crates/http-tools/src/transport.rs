//! The network seam of the executor.
//!
//! [`Transport`] performs exactly one round trip. [`ReqwestTransport`] is the production
//! implementation; tests substitute recording doubles.

use crate::config::NetworkConfig;
use crate::error::{HttpToolsError, Result};
use crate::safety::{RedirectPolicy, redact_url};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use tracing::debug;
use url::Url;

/// A fully assembled request, ready to send.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Raw response: status plus the unparsed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text. Invalid UTF-8 sequences are replaced rather than rejected.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Implementations must not retry.
    ///
    /// # Errors
    ///
    /// Returns [`HttpToolsError::Transport`] for network/timeout failures and
    /// [`HttpToolsError::Http`] when the response exceeds the configured size cap.
    async fn send(&self, request: OutboundRequest) -> Result<HttpResponse>;
}

/// Connection-pooling transport backed by one shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    max_response_bytes: Option<usize>,
}

impl ReqwestTransport {
    /// Build the client from network settings.
    ///
    /// # Errors
    ///
    /// Returns [`HttpToolsError::Config`] if the proxy URL is invalid or the client cannot be built.
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .redirect(RedirectPolicy::from_max_redirects(network.max_redirects).to_reqwest());
        if let Some(t) = network.connect_timeout() {
            builder = builder.connect_timeout(t);
        }
        if let Some(t) = network.timeout() {
            builder = builder.timeout(t);
        }
        if let Some(proxy) = network.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| HttpToolsError::Config(format!("Invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }
        if let Some(ua) = &network.user_agent {
            builder = builder.user_agent(ua.clone());
        } else {
            builder = builder.user_agent(concat!("specbridge/", env!("CARGO_PKG_VERSION")));
        }
        let client = builder
            .build()
            .map_err(|e| HttpToolsError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_response_bytes: network.max_response_bytes,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<HttpResponse> {
        let OutboundRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let redacted = redact_url(&url);
        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = read_response_body_limited_bytes(response, self.max_response_bytes).await?;
        debug!(url = %redacted, status, bytes = body.len(), "HTTP response received");

        Ok(HttpResponse { status, body })
    }
}

async fn read_response_body_limited_bytes(
    mut response: reqwest::Response,
    max_bytes: Option<usize>,
) -> Result<Vec<u8>> {
    let Some(max) = max_bytes else {
        let bytes = response.bytes().await.map_err(HttpToolsError::from)?;
        return Ok(bytes.to_vec());
    };

    if let Some(len) = response.content_length()
        && len > max as u64
    {
        return Err(HttpToolsError::Http(format!(
            "Response too large: {len} bytes (limit {max})"
        )));
    }

    let mut out: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(HttpToolsError::from)? {
        if out.len().saturating_add(chunk.len()) > max {
            return Err(HttpToolsError::Http(format!(
                "Response too large: exceeded {max} bytes"
            )));
        }
        out.extend_from_slice(&chunk);
    }

    Ok(out)
}

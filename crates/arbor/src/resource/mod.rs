// ABOUTME: Remote document acquisition over HTTP.
// ABOUTME: Defines the Fetcher capability, the reqwest-backed HttpFetcher, charset decoding, and the https-to-http fallback.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::options::Options;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Why a single GET attempt failed.
///
/// Only `Network` failures trigger the https-to-http fallback.
#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    /// The connection could not be established or timed out.
    #[error("network error: {0}")]
    Network(#[source] anyhow::Error),
    /// A response arrived but was unusable (error status, oversized or unreadable body).
    #[error("{0}")]
    Response(#[source] anyhow::Error),
}

impl FetchFailure {
    pub fn is_network(&self) -> bool {
        matches!(self, FetchFailure::Network(_))
    }
}

/// Capability for performing a single HTTP GET and returning the body as text.
pub trait Fetcher {
    fn get(&self, url: &str) -> impl Future<Output = Result<String, FetchFailure>> + Send;
}

/// `Fetcher` backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    headers: HashMap<String, String>,
}

impl HttpFetcher {
    /// Build a fetcher from loader options, reusing `opts.http_client` when set.
    pub fn new(opts: &Options) -> Self {
        let client = opts
            .http_client
            .clone()
            .unwrap_or_else(|| build_client(&opts.user_agent, opts.timeout));
        Self {
            client,
            headers: opts.headers.clone(),
        }
    }

    /// Wrap an existing client without extra headers.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            headers: HashMap::new(),
        }
    }
}

fn build_client(user_agent: &str, timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .unwrap_or_default()
}

fn classify_reqwest(e: reqwest::Error) -> FetchFailure {
    if e.is_connect() || e.is_timeout() {
        FetchFailure::Network(anyhow::Error::new(e))
    } else {
        FetchFailure::Response(anyhow::Error::new(e))
    }
}

impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String, FetchFailure> {
        let mut request = self.client.get(url);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request.send().await.map_err(classify_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Response(anyhow::anyhow!(
                "HTTP status {}",
                status.as_u16()
            )));
        }

        if let Some(len) = response.content_length() {
            if len as usize > MAX_CONTENT_LENGTH {
                return Err(FetchFailure::Response(anyhow::anyhow!("content too large")));
            }
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let body: Bytes = response.bytes().await.map_err(classify_reqwest)?;
        if body.len() > MAX_CONTENT_LENGTH {
            return Err(FetchFailure::Response(anyhow::anyhow!("content too large")));
        }

        Ok(decode_body(&body, content_type.as_deref()))
    }
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Fetch the markup behind `url`.
///
/// A URL without an explicit scheme is tried as `https://` first; if that
/// attempt fails at the network level it is retried once as `http://`.
/// HTTP-level failures are never retried.
pub async fn fetch_markup<F: Fetcher>(fetcher: &F, url: &str) -> Result<String> {
    let url = url.trim();
    if has_http_scheme(url) {
        return fetcher
            .get(url)
            .await
            .map_err(|e| Error::fetch(url, "Fetch", Some(anyhow::Error::new(e))));
    }

    let secure = format!("https://{}", url);
    match fetcher.get(&secure).await {
        Ok(body) => Ok(body),
        Err(FetchFailure::Network(cause)) => {
            tracing::warn!(
                url = %secure,
                error = %cause,
                "https coercion failed, falling back to http"
            );
            let plain = format!("http://{}", url);
            fetcher.get(&plain).await.map_err(|e| {
                Error::fetch(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!(
                        "no response from either {} or {}: {}",
                        secure,
                        plain,
                        e
                    )),
                )
            })
        }
        Err(other) => Err(Error::fetch(url, "Fetch", Some(anyhow::Error::new(other)))),
    }
}

/// Decode body bytes to a String.
///
/// Order of precedence: charset from the content-type header, a byte order
/// mark, valid UTF-8, then `chardetng` detection.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    if encoding_rs::Encoding::for_bom(body).is_some() {
        let (decoded, _, _) = encoding_rs::UTF_8.decode(body);
        return decoded.into_owned();
    }

    if let Ok(text) = std::str::from_utf8(body) {
        return text.to_string();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

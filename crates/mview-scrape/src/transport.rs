//! Scrape transport — where exposition text comes from.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::{ScrapeError, ScrapeResult};

/// Something that yields one exposition-format document per call.
pub trait Source: Send + Sync {
    fn scrape(&self) -> impl Future<Output = ScrapeResult<String>> + Send;
}

/// GET against a metrics endpoint, optionally with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpSource {
    /// Build a source for `url`. `timeout` bounds each whole request.
    pub fn new(
        url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
        insecure: bool,
        ca_cert: Option<&Path>,
    ) -> ScrapeResult<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("metrics-viewer/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(insecure);

        if let Some(path) = ca_cert {
            let pem = std::fs::read(path).map_err(|source| ScrapeError::CaCert {
                path: path.to_path_buf(),
                source,
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|source| {
                ScrapeError::InvalidCaCert {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder.build().map_err(ScrapeError::Client)?;
        let url = url.into();
        debug!(%url, auth = token.is_some(), insecure, "http source initialized");

        Ok(Self { client, url, token })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Source for HttpSource {
    async fn scrape(&self) -> ScrapeResult<String> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await.map_err(|source| ScrapeError::Request {
            url: self.url.clone(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            debug!(%status, url = %self.url, "scrape non-2xx");
            return Err(ScrapeError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        resp.text().await.map_err(|source| ScrapeError::Body {
            url: self.url.clone(),
            source,
        })
    }
}

/// Read a bearer token, trimming surrounding whitespace. Empty is an error.
pub fn read_token(path: &Path) -> ScrapeResult<String> {
    let raw = std::fs::read_to_string(path).map_err(|source| ScrapeError::TokenRead {
        path: path.to_path_buf(),
        source,
    })?;
    let token = raw.trim();
    if token.is_empty() {
        return Err(ScrapeError::EmptyToken(PathBuf::from(path)));
    }
    Ok(token.to_string())
}

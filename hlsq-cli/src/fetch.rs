use std::sync::OnceLock;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;
use url::Url;

use crate::config::FetchConfig;
use crate::error::{AppError, Result};

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static(
            "application/vnd.apple.mpegurl,application/x-mpegurl,audio/mpegurl,*/*;q=0.8",
        ),
    );
    headers
}

/// Downloads manifest text over HTTP(S).
#[derive(Debug, Clone)]
pub struct ManifestFetcher {
    client: Client,
}

impl ManifestFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        install_rustls_provider();
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str())
            .default_headers(default_headers())
            .build()?;
        Ok(Self { client })
    }

    /// Fetches `url` and returns the response body. Non-success statuses are errors.
    pub async fn fetch(&self, url: &Url) -> Result<String> {
        debug!(%url, "Fetching manifest");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                status,
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        debug!(%url, bytes = body.len(), "Manifest fetched");
        Ok(body)
    }
}

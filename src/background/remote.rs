//! HTTP access for the background workers.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Fetches text documents over the network.
#[async_trait]
pub trait Remote: Send + Sync {
    /// GET `url` and return the body of a successful response.
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String>;
}

/// Remote backed by reqwest.
pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    /// Create a client identifying itself as tchat (crates.io rejects
    /// requests without a user agent).
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow!("Request to {} failed: {}", url, response.status()));
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {}", url))
    }
}

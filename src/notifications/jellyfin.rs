use crate::config::JellyfinConfig;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::LibraryNotifier;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Triggers library refreshes on a Jellyfin (or Emby) server.
pub struct JellyfinClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl JellyfinClient {
    pub fn new(config: &JellyfinConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LibraryNotifier for JellyfinClient {
    fn name(&self) -> &str {
        "Jellyfin"
    }

    async fn refresh_library(&self) -> Result<()> {
        let url = format!("{}/Library/Refresh", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("X-Emby-Token", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Jellyfin refresh failed ({}): {}", status, body);
        }

        Ok(())
    }
}

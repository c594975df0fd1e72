use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::services::listing_api::ListingApi;
use inmueble_stats::images::{ListingImages, expand_detail};
use inmueble_stats::listing::RawListing;
use inmueble_stats::parser::parse_batch;

const DEFAULT_BASE_URL: &str = "https://api.mardelinmueble.com/v3/mardelinmueble/inmuebles/";

/// Fixed query for the city-wide batch: houses for sale in Mar del Plata,
/// first page sized to cover the whole market.
const BATCH_QUERY: &[(&str, &str)] = &[
    ("page", "1"),
    ("items_x_page", "600"),
    ("id_tipo_operacion", "1"),
    ("id_tipo_inmueble", "1"),
    ("id_ciudad", "1"),
];

pub struct MardelClient {
    base_url: String,
    client: reqwest::Client,
}

impl MardelClient {
    /// Builds a client against `MARDEL_BASE_URL` or the production API.
    pub fn new() -> Result<Self> {
        let base_url =
            std::env::var("MARDEL_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let client = reqwest::Client::builder()
            .user_agent("inmueble-stats/0.1")
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { base_url, client })
    }

    /// The full batch URL, also used by the CLI when no source is given.
    pub fn batch_url(&self) -> Result<String> {
        let url = reqwest::Url::parse_with_params(&self.base_url, BATCH_QUERY)?;
        Ok(url.to_string())
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| anyhow!("failed to reach listing API: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(500).collect();
            return Err(anyhow!("listing API returned status {}: {}", status, excerpt));
        }

        Ok(response)
    }
}

#[async_trait]
impl ListingApi for MardelClient {
    async fn fetch_batch(&self) -> Result<Vec<RawListing>> {
        let url = self.batch_url()?;
        let bytes = self.get(&url).await?.bytes().await?;
        parse_batch(&bytes)
    }

    async fn fetch_images(&self, id: i64) -> Result<ListingImages> {
        let url = format!("{}{}", self.base_url, id);
        let detail: Value = self.get(&url).await?.json().await?;
        expand_detail(&detail, id)
    }
}

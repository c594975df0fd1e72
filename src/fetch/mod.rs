mod client;
mod basic;

pub use client::HttpClient;
pub use basic::BasicClient;

use anyhow::{Context, Result};

/// Fetches a URL and returns the response body, treating non-2xx statuses
/// as errors. The listing API needs no authentication.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client
        .execute(req)
        .await?
        .error_for_status()
        .context("upstream returned an error status")?;
    Ok(resp.bytes().await?.to_vec())
}

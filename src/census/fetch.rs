use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use serde_json::Value;

use crate::error::FetchError;

/// Download the place table. The timeout bounds the whole request; any failure is fatal.
pub async fn fetch_place_table(url: &str, timeout: Duration) -> Result<Value, FetchError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    info!("Fetching place table from {}", url);
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            code: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(resp.json::<Value>().await?)
}

/// Offline alternative: the same JSON payload saved to disk.
pub fn read_place_table(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read place table {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Place table {} is not valid JSON", path.display()))
}

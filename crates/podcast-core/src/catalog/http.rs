use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::wire::{WireDetail, WirePreview};
use super::CatalogClient;
use crate::error::{Error, Result};
use crate::models::{ShowDetail, ShowPreview};

/// Catalog client talking to the podcast HTTP/JSON service.
///
/// `GET {base}/` lists previews, `GET {base}/id/{id}` returns one show.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    /// Every request is bounded by `timeout`; expiry surfaces as
    /// `Error::Network`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<(StatusCode, Option<T>)> {
        debug!("catalog: GET {}", url);
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Ok((status, None));
        }

        let body = response.text().await?;
        let data = serde_json::from_str(&body)
            .map_err(|e| Error::Network(format!("invalid JSON from {}: {}", url, e)))?;
        Ok((status, Some(data)))
    }
}

#[async_trait]
impl CatalogClient for HttpCatalog {
    async fn list_previews(&self) -> Result<Vec<ShowPreview>> {
        let url = format!("{}/", self.base_url);
        match self.get_json::<Vec<WirePreview>>(&url).await? {
            (_, Some(previews)) => {
                info!("catalog: fetched {} previews", previews.len());
                Ok(previews.into_iter().map(ShowPreview::from).collect())
            }
            (status, None) => Err(Error::Network(format!(
                "catalog returned status {} for preview list",
                status
            ))),
        }
    }

    async fn get_show_detail(&self, id: &str) -> Result<ShowDetail> {
        let url = format!("{}/id/{}", self.base_url, id);
        match self.get_json::<WireDetail>(&url).await? {
            (_, Some(detail)) => {
                info!("catalog: fetched show {}", id);
                Ok(detail.into())
            }
            (StatusCode::NOT_FOUND, None) => Err(Error::NotFound(id.to_string())),
            (status, None) => Err(Error::Network(format!(
                "catalog returned status {} for show {}",
                status, id
            ))),
        }
    }
}

use log::{debug, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::WebflowConfig;
use crate::error::MigrateError;
use crate::model::{CollectionList, CollectionSummary, ItemPage, WebflowItem};

/// Client for the Webflow Data API (v2)
pub struct WebflowClient {
    client: Client,
    base_url: String,
    site_id: String,
    page_size: u32,
    request_delay: Duration,
}

impl WebflowClient {
    pub fn new(config: &WebflowConfig, request_delay_ms: u64) -> Result<Self, MigrateError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("accept-version", HeaderValue::from_static("2.0.0"));

        let client = Client::builder().default_headers(headers).build()?;

        Ok(WebflowClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            site_id: config.site_id.clone(),
            page_size: config.page_size,
            request_delay: Duration::from_millis(request_delay_ms),
        })
    }

    async fn check(response: Response) -> Result<Response, MigrateError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(MigrateError::Webflow {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// GET with a single retry after the pacing delay when rate limited
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, MigrateError> {
        let response = self.client.get(url).query(query).send().await?;

        let response = if response.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!("Webflow rate limit hit, retrying after {:?}", self.request_delay);
            sleep(self.request_delay).await;
            self.client.get(url).query(query).send().await?
        } else {
            response
        };

        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// List all collections on the configured site
    pub async fn list_collections(&self) -> Result<Vec<CollectionSummary>, MigrateError> {
        let url = format!("{}/v2/sites/{}/collections", self.base_url, self.site_id);
        debug!("Listing collections for site {}", self.site_id);
        let list: CollectionList = self.get_json(&url, &[]).await?;
        info!("Discovered {} collections", list.collections.len());
        Ok(list.collections)
    }

    /// Fetch a single page of items
    pub async fn fetch_page(
        &self,
        collection_id: &str,
        offset: u32,
    ) -> Result<ItemPage, MigrateError> {
        let url = format!("{}/v2/collections/{}/items", self.base_url, collection_id);
        self.get_json(
            &url,
            &[
                ("offset", offset.to_string()),
                ("limit", self.page_size.to_string()),
            ],
        )
        .await
    }

    /// Fetch every item of a collection, paging until the reported total is
    /// reached. Also stops on a short page so a shrinking total cannot loop.
    pub async fn fetch_all_items(
        &self,
        collection_id: &str,
    ) -> Result<Vec<WebflowItem>, MigrateError> {
        let mut items = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.fetch_page(collection_id, offset).await?;
            let fetched = page.items.len() as u32;
            debug!(
                "Fetched {} items at offset {} (total {})",
                fetched, offset, page.pagination.total
            );
            items.extend(page.items);
            offset += fetched;

            if offset >= page.pagination.total || fetched < self.page_size || fetched == 0 {
                break;
            }
            sleep(self.request_delay).await;
        }

        info!(
            "Collection {}: extracted {} items",
            collection_id,
            items.len()
        );
        Ok(items)
    }
}

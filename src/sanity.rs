use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde_json::{json, Map, Value};

use crate::config::SanityConfig;
use crate::error::MigrateError;
use crate::model::SanityDocument;

/// What an upsert did to the destination dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Replaced,
}

/// Client for the Sanity HTTP API (query, mutate, asset upload)
pub struct SanityClient {
    client: Client,
    api_root: String,
    api_version: String,
    dataset: String,
}

impl SanityClient {
    pub fn new(config: &SanityConfig) -> Result<Self, MigrateError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(SanityClient {
            client,
            api_root: config.api_root().trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            dataset: config.dataset.clone(),
        })
    }

    fn data_url(&self, endpoint: &str) -> String {
        format!(
            "{}/v{}/data/{}/{}",
            self.api_root, self.api_version, endpoint, self.dataset
        )
    }

    async fn check(response: Response) -> Result<Response, MigrateError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(MigrateError::Sanity {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Run a GROQ query with one string parameter per entry in `params`
    pub async fn query(
        &self,
        groq: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, MigrateError> {
        let mut query_pairs: Vec<(String, String)> =
            vec![("query".to_string(), groq.to_string())];
        for (name, value) in params {
            // GROQ parameters are JSON-encoded in the query string
            let encoded = Value::String(value.to_string()).to_string();
            query_pairs.push((format!("${name}"), encoded));
        }

        let response = self
            .client
            .get(self.data_url("query"))
            .query(&query_pairs)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let body: Value = response.json().await?;
        Ok(body["result"].clone())
    }

    /// Look up the `_id` of a previously migrated document
    pub async fn find_by_webflow_id(
        &self,
        doc_type: &str,
        webflow_id: &str,
    ) -> Result<Option<String>, MigrateError> {
        let result = self
            .query(
                "*[_type == $type && webflowId == $webflowId][0]._id",
                &[("type", doc_type), ("webflowId", webflow_id)],
            )
            .await?;
        Ok(result.as_str().map(str::to_string))
    }

    async fn mutate(&self, mutations: Value) -> Result<Value, MigrateError> {
        let response = self
            .client
            .post(self.data_url("mutate"))
            .json(&json!({ "mutations": mutations }))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// Idempotent write: replace the already-migrated document when one exists
    /// for this webflowId, otherwise create under the deterministic id.
    pub async fn upsert(&self, doc: &SanityDocument) -> Result<UpsertOutcome, MigrateError> {
        match self.find_by_webflow_id(&doc.doc_type, &doc.webflow_id).await? {
            Some(existing_id) => {
                let mut value = serde_json::to_value(doc)?;
                value["_id"] = Value::String(existing_id.clone());
                debug!("Replacing {} ({})", existing_id, doc.doc_type);
                self.mutate(json!([{ "createOrReplace": value }])).await?;
                Ok(UpsertOutcome::Replaced)
            }
            None => {
                debug!("Creating {} ({})", doc.id, doc.doc_type);
                self.mutate(json!([{ "createIfNotExists": serde_json::to_value(doc)? }]))
                    .await?;
                Ok(UpsertOutcome::Created)
            }
        }
    }

    /// Set fields on an existing document (used by the reference phase)
    pub async fn patch_set(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), MigrateError> {
        self.mutate(json!([{ "patch": { "id": id, "set": fields } }]))
            .await?;
        Ok(())
    }

    /// Upload image bytes, returning the asset document `_id`
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        mime: &str,
    ) -> Result<String, MigrateError> {
        let url = format!(
            "{}/v{}/assets/images/{}",
            self.api_root, self.api_version, self.dataset
        );

        let response = self
            .client
            .post(&url)
            .query(&[("filename", filename)])
            .header(CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let body: Value = response.json().await?;

        let asset_id = body["document"]["_id"]
            .as_str()
            .ok_or_else(|| MigrateError::Sanity {
                status: 200,
                message: "asset upload response missing document._id".to_string(),
            })?
            .to_string();
        info!("Uploaded image asset {} ({})", asset_id, filename);
        Ok(asset_id)
    }
}

/// Build the field value referencing an uploaded image asset
pub fn image_ref_value(asset_id: &str, alt: Option<&str>) -> Value {
    let mut value = json!({
        "_type": "image",
        "asset": { "_type": "reference", "_ref": asset_id }
    });
    if let Some(alt) = alt {
        value["alt"] = Value::String(alt.to_string());
    }
    value
}

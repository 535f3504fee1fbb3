use log::{debug, warn};
use reqwest::header::{HeaderMap, USER_AGENT};
use reqwest::Client;
use serde_json::Value;

use crate::enhance::{generate_alt_text, Enhancer};
use crate::error::MigrateError;
use crate::sanity::{image_ref_value, SanityClient};

const FETCH_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Downloads source images and relays them into the Sanity asset store
pub struct ImageRelay {
    client: Client,
}

fn mime_from_extension(url: &str) -> &'static str {
    let path = url.split('?').next().unwrap_or(url).to_lowercase();
    if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".gif") {
        "image/gif"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else if path.ends_with(".svg") {
        "image/svg+xml"
    } else {
        "image/jpeg"
    }
}

fn filename_from_url(url: &str) -> String {
    url.split('?')
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .unwrap_or("image")
        .to_string()
}

impl ImageRelay {
    pub fn new() -> Result<Self, MigrateError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, FETCH_USER_AGENT.parse()?);
        let client = Client::builder().default_headers(headers).build()?;
        Ok(ImageRelay { client })
    }

    /// Download image bytes, returning them with the response mime type
    pub async fn download(&self, url: &str) -> Result<(Vec<u8>, String), MigrateError> {
        debug!("Downloading image {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MigrateError::Webflow {
                status: status.as_u16(),
                message: format!("image download failed for {url}"),
            });
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .map(str::to_string)
            .unwrap_or_else(|| mime_from_extension(url).to_string());

        let bytes = response.bytes().await?.to_vec();
        Ok((bytes, mime))
    }

    /// Relay one image: download, upload to Sanity, return the asset ref
    /// field value. When an enhancer is given and the source carried no alt
    /// text, alt text is generated from the image itself; a failed analysis
    /// degrades to no alt rather than failing the relay.
    pub async fn relay(
        &self,
        sanity: &SanityClient,
        url: &str,
        source_alt: Option<&str>,
        context: Option<&str>,
        enhancer: Option<&dyn Enhancer>,
    ) -> Result<Value, MigrateError> {
        let (bytes, mime) = self.download(url).await?;

        let alt = match (source_alt, enhancer) {
            (Some(alt), _) if !alt.trim().is_empty() => Some(alt.trim().to_string()),
            (_, Some(enhancer)) => {
                match generate_alt_text(enhancer, &bytes, &mime, context).await {
                    Ok(alt) => Some(alt),
                    Err(e) => {
                        warn!("Alt text generation failed for {}: {}", url, e);
                        None
                    }
                }
            }
            _ => None,
        };

        let asset_id = sanity
            .upload_image(bytes, &filename_from_url(url), &mime)
            .await?;
        Ok(image_ref_value(&asset_id, alt.as_deref()))
    }
}

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::EnhancementConfig;
use crate::enhance::Enhancer;
use crate::error::MigrateError;

/// Enhancer backed by the OpenAI chat completions endpoint
pub struct OpenAiEnhancer {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiEnhancer {
    /// Create an enhancer from configuration.
    ///
    /// The key is taken from config first, then the OPENAI_API_KEY
    /// environment variable.
    pub fn new(config: &EnhancementConfig) -> Result<Self, MigrateError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                MigrateError::Enhancement(
                    "OPENAI_API_KEY not found in config or environment".to_string(),
                )
            })?;

        Ok(OpenAiEnhancer {
            client: Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        OpenAiEnhancer {
            client: Client::new(),
            api_key,
            base_url,
            model,
            temperature: 0.7,
            max_tokens: 400,
        }
    }

    async fn chat(&self, messages: Value) -> Result<String, MigrateError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": messages,
                "temperature": self.temperature,
                "max_tokens": self.max_tokens
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MigrateError::Enhancement(format!(
                "OpenAI API error ({status}): {body}"
            )));
        }

        let body: Value = response.json().await?;
        debug!("{:?}", body);
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                MigrateError::Enhancement("no content in completion response".to_string())
            })
    }
}

#[async_trait]
impl Enhancer for OpenAiEnhancer {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, MigrateError> {
        self.chat(json!([
            {"role": "system", "content": system_prompt},
            {"role": "user", "content": user_content}
        ]))
        .await
    }

    async fn complete_with_image(
        &self,
        system_prompt: &str,
        image_bytes: &[u8],
        mime: &str,
    ) -> Result<String, MigrateError> {
        let data_url = format!("data:{};base64,{}", mime, STANDARD.encode(image_bytes));
        self.chat(json!([
            {"role": "system", "content": system_prompt},
            {"role": "user", "content": [
                {"type": "image_url", "image_url": {"url": data_url}}
            ]}
        ]))
        .await
    }
}

mod open_ai;
mod prompt;
mod retry;

pub use open_ai::OpenAiEnhancer;
pub use prompt::{
    build_alt_text_prompt, build_description_prompt, ALT_TEXT_PROMPT, DESCRIPTION_PROMPT,
    TAGS_PROMPT,
};
pub use retry::RetryingEnhancer;

use async_trait::async_trait;

use crate::error::MigrateError;

/// Unified interface to the LLM used for content enhancement
#[async_trait]
pub trait Enhancer: Send + Sync {
    /// Provider name used in logs and the report (e.g. "openai")
    fn provider_name(&self) -> &str;

    /// One chat completion: system prompt plus user content, text reply
    async fn complete(
        &self,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, MigrateError>;

    /// Completion over an image (vision input) plus a text prompt
    async fn complete_with_image(
        &self,
        system_prompt: &str,
        image_bytes: &[u8],
        mime: &str,
    ) -> Result<String, MigrateError>;
}

/// Rewrite a description for the given kind of content
pub async fn enhance_description(
    enhancer: &dyn Enhancer,
    content_kind: &str,
    title: &str,
    original: &str,
) -> Result<String, MigrateError> {
    let prompt = build_description_prompt(Some(content_kind));
    let user_content = if original.trim().is_empty() {
        format!("Name: {title}\n(no existing description)")
    } else {
        format!("Name: {title}\n\n{original}")
    };
    let rewritten = enhancer.complete(&prompt, &user_content).await?;
    Ok(rewritten.trim().to_string())
}

/// Generate alt text for downloaded image bytes
pub async fn generate_alt_text(
    enhancer: &dyn Enhancer,
    image_bytes: &[u8],
    mime: &str,
    context: Option<&str>,
) -> Result<String, MigrateError> {
    let prompt = build_alt_text_prompt(context);
    let alt = enhancer
        .complete_with_image(&prompt, image_bytes, mime)
        .await?;
    Ok(alt.trim().trim_matches('"').to_string())
}

/// Maximum tags attached to a document
const MAX_TAGS: usize = 8;

/// Generate search tags from a title and body, parsed from a comma-separated
/// reply. Empty entries and duplicates are dropped.
pub async fn generate_tags(
    enhancer: &dyn Enhancer,
    title: &str,
    body: &str,
) -> Result<Vec<String>, MigrateError> {
    let reply = enhancer
        .complete(TAGS_PROMPT, &format!("Title: {title}\n\n{body}"))
        .await?;

    let mut tags: Vec<String> = Vec::new();
    for raw in reply.split(',') {
        let tag = raw.trim().trim_matches('"').to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
        if tags.len() == MAX_TAGS {
            break;
        }
    }
    Ok(tags)
}

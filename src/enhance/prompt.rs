/// System prompt for rewriting migrated descriptions.
///
/// Loaded from `prompts/description.txt` at compile time with `include_str!`
/// so the copy can be edited without touching Rust string syntax.
pub const DESCRIPTION_PROMPT: &str = include_str!("prompts/description.txt");

/// System prompt for image alt-text generation
pub const ALT_TEXT_PROMPT: &str = include_str!("prompts/alt_text.txt");

/// System prompt for tag generation
pub const TAGS_PROMPT: &str = include_str!("prompts/tags.txt");

/// Description prompt, optionally annotated with the kind of content being
/// rewritten ("product", "manufacturer", ...) so the model keeps register.
pub fn build_description_prompt(content_kind: Option<&str>) -> String {
    match content_kind.map(str::trim).filter(|kind| !kind.is_empty()) {
        Some(kind) => format!(
            "{}\n\nThe text describes a {kind}. Keep the rewritten copy appropriate for a {kind} page.",
            DESCRIPTION_PROMPT
        ),
        None => DESCRIPTION_PROMPT.to_string(),
    }
}

/// Alt-text prompt with optional page context (e.g. the document title)
pub fn build_alt_text_prompt(context: Option<&str>) -> String {
    match context.map(str::trim).filter(|ctx| !ctx.is_empty()) {
        Some(ctx) => format!(
            "{}\n\nThe image appears on a page about: {ctx}.",
            ALT_TEXT_PROMPT
        ),
        None => ALT_TEXT_PROMPT.to_string(),
    }
}

use serde_json::{json, Map, Value};

use crate::model::{document_id, slugify, ContentType, SanityDocument, SlugValue, WebflowItem};
use crate::richtext::html_to_blocks;

/// Inferred type of a single `fieldData` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    PlainText,
    RichText,
    Image,
    File,
    Link,
    Date,
    Reference,
    MultiReference,
    Slug,
    Number,
    Boolean,
    Color,
    Option,
    Unknown,
}

const IMAGE_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];

fn is_item_id(s: &str) -> bool {
    (s.len() == 24 || s.len() == 32) && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

fn is_iso_timestamp(s: &str) -> bool {
    // e.g. 2023-11-02T14:05:00.000Z - shape check is enough for classification
    let bytes = s.as_bytes();
    s.len() >= 19
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes[10] == b'T'
        && bytes[..4].iter().all(u8::is_ascii_digit)
}

fn looks_like_html(s: &str) -> bool {
    ["<p", "<h1", "<h2", "<h3", "<h4", "<ul", "<ol", "<li", "<blockquote", "<div"]
        .iter()
        .any(|tag| s.contains(tag))
}

fn is_image_url(s: &str) -> bool {
    let lower = s.to_lowercase();
    let path = lower.split('?').next().unwrap_or(&lower);
    (lower.starts_with("http://") || lower.starts_with("https://"))
        && IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Classify a raw Webflow field value.
///
/// Heuristics run in priority order; structured shapes (asset objects,
/// reference-id arrays) win over string sniffing.
pub fn classify(name: &str, value: &Value) -> FieldKind {
    match value {
        Value::Object(map) => {
            if map.contains_key("url") {
                if map.contains_key("alt") || is_image_url(map["url"].as_str().unwrap_or("")) {
                    FieldKind::Image
                } else {
                    FieldKind::File
                }
            } else if map.contains_key("id") && map.contains_key("name") {
                // Option fields arrive as {id, name} when the API expands them
                FieldKind::Option
            } else {
                FieldKind::Unknown
            }
        }
        Value::Array(items) => {
            if items
                .iter()
                .all(|v| matches!(v, Value::Object(m) if m.contains_key("url")))
                && !items.is_empty()
            {
                FieldKind::Image
            } else if !items.is_empty()
                && items
                    .iter()
                    .all(|v| matches!(v, Value::String(s) if is_item_id(s)))
            {
                FieldKind::MultiReference
            } else {
                FieldKind::Unknown
            }
        }
        Value::Bool(_) => FieldKind::Boolean,
        Value::Number(_) => FieldKind::Number,
        Value::String(s) => {
            if name == "slug" {
                FieldKind::Slug
            } else if is_item_id(s) {
                FieldKind::Reference
            } else if is_iso_timestamp(s) {
                FieldKind::Date
            } else if looks_like_html(s) {
                FieldKind::RichText
            } else if is_image_url(s) {
                FieldKind::Image
            } else if s.starts_with("http://") || s.starts_with("https://") {
                FieldKind::Link
            } else if is_hex_color(s) {
                FieldKind::Color
            } else {
                FieldKind::PlainText
            }
        }
        Value::Null => FieldKind::Unknown,
    }
}

/// kebab-case (Webflow field slugs) to camelCase (Sanity field names)
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '-' || c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Per-type renames applied before the generic kebab→camel fallback.
/// Left side is the Webflow field slug, right side the Sanity field name.
fn rename(content_type: ContentType, field: &str) -> Option<&'static str> {
    let table: &[(&str, &str)] = match content_type {
        ContentType::Product => &[
            ("name", "title"),
            ("company", "manufacturer"),
            ("product-categories", "categories"),
            ("vertical-markets", "verticalMarkets"),
        ],
        ContentType::Manufacturer => &[
            ("name", "title"),
            ("partner-products", "products"),
            ("website-link", "website"),
        ],
        ContentType::Project => &[
            ("name", "title"),
            ("project-description", "description"),
            ("vertical-market", "verticalMarket"),
        ],
        ContentType::TeamMember => &[("name", "title"), ("job-title", "role")],
        _ => &[("name", "title")],
    };
    table.iter().find(|(from, _)| *from == field).map(|(_, to)| *to)
}

/// Marker wrapped around unresolved reference ids during the content phase.
/// The reference phase rewrites these into real Sanity references.
pub fn webflow_ref_marker(id: &str) -> Value {
    json!({ "_webflowRef": id })
}

/// Marker kept on image fields until the image phase uploads the asset
pub fn pending_image_marker(url: &str, alt: Option<&str>) -> Value {
    match alt {
        Some(alt) => json!({ "_pendingImageUrl": url, "alt": alt }),
        None => json!({ "_pendingImageUrl": url }),
    }
}

/// Map a Webflow item to an outgoing Sanity document.
///
/// References become `_webflowRef` markers, images become `_pendingImageUrl`
/// markers, rich text becomes portable-text blocks. Everything else is carried
/// over under its renamed (or camel-cased) field name.
pub fn map_item(content_type: ContentType, item: &WebflowItem) -> SanityDocument {
    let mut fields = Map::new();

    let title = item
        .field_data
        .get("name")
        .or_else(|| item.field_data.get("title"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let slug = item
        .field_data
        .get("slug")
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            if title.is_empty() {
                slugify(&item.id)
            } else {
                slugify(&title)
            }
        });

    for (key, value) in &item.field_data {
        if key == "slug" {
            continue;
        }
        let target = rename(content_type, key)
            .map(str::to_string)
            .unwrap_or_else(|| camel_case(key));

        let mapped = match classify(key, value) {
            FieldKind::RichText => {
                Value::Array(html_to_blocks(value.as_str().unwrap_or("")))
            }
            FieldKind::Reference => {
                webflow_ref_marker(value.as_str().unwrap_or(""))
            }
            FieldKind::MultiReference => Value::Array(
                value
                    .as_array()
                    .map(|ids| {
                        ids.iter()
                            .filter_map(Value::as_str)
                            .map(webflow_ref_marker)
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            FieldKind::Image => match value {
                Value::String(url) => pending_image_marker(url, None),
                Value::Object(map) => pending_image_marker(
                    map.get("url").and_then(Value::as_str).unwrap_or(""),
                    map.get("alt").and_then(Value::as_str),
                ),
                Value::Array(assets) => Value::Array(
                    assets
                        .iter()
                        .filter_map(Value::as_object)
                        .map(|map| {
                            pending_image_marker(
                                map.get("url").and_then(Value::as_str).unwrap_or(""),
                                map.get("alt").and_then(Value::as_str),
                            )
                        })
                        .collect(),
                ),
                _ => Value::Null,
            },
            FieldKind::Option => Value::String(
                value
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            ),
            FieldKind::Unknown => continue,
            _ => value.clone(),
        };

        fields.insert(target, mapped);
    }

    if !title.is_empty() {
        fields
            .entry("title".to_string())
            .or_insert_with(|| Value::String(title));
    }

    SanityDocument {
        id: document_id(content_type, &item.id),
        doc_type: content_type.sanity_type().to_string(),
        webflow_id: item.id.clone(),
        slug: SlugValue::new(slug),
        fields,
    }
}

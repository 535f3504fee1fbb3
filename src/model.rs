use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A collection as returned by `GET /v2/sites/{site_id}/collections`
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSummary {
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct CollectionList {
    pub collections: Vec<CollectionSummary>,
}

/// A single CMS item with its raw field payload
#[derive(Debug, Clone, Deserialize)]
pub struct WebflowItem {
    pub id: String,
    #[serde(rename = "cmsLocaleId")]
    pub cms_locale_id: Option<String>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<String>,
    #[serde(rename = "lastPublished")]
    pub last_published: Option<String>,
    #[serde(rename = "createdOn")]
    pub created_on: Option<String>,
    #[serde(rename = "isArchived", default)]
    pub is_archived: bool,
    #[serde(rename = "isDraft", default)]
    pub is_draft: bool,
    #[serde(rename = "fieldData", default)]
    pub field_data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
    pub total: u32,
}

/// One page of `GET /v2/collections/{id}/items`
#[derive(Debug, Deserialize)]
pub struct ItemPage {
    pub items: Vec<WebflowItem>,
    pub pagination: Pagination,
}

/// The content types this migration knows how to map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Project,
    TeamMember,
    Manufacturer,
    Product,
    Category,
    VerticalMarket,
}

impl ContentType {
    /// The Sanity `_type` for documents of this kind
    pub fn sanity_type(&self) -> &'static str {
        match self {
            ContentType::Project => "project",
            ContentType::TeamMember => "teamMember",
            ContentType::Manufacturer => "manufacturer",
            ContentType::Product => "product",
            ContentType::Category => "category",
            ContentType::VerticalMarket => "verticalMarket",
        }
    }

    /// Match a Webflow collection by display name or slug.
    ///
    /// The source site names its manufacturer collection "Partners", so that
    /// keyword maps here too.
    pub fn from_collection_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "projects" | "project" => Some(ContentType::Project),
            "team members" | "team member" | "team" => Some(ContentType::TeamMember),
            "manufacturers" | "manufacturer" | "partners" | "partner" => {
                Some(ContentType::Manufacturer)
            }
            "products" | "product" => Some(ContentType::Product),
            "categories" | "category" => Some(ContentType::Category),
            "vertical markets" | "vertical market" | "verticals" => {
                Some(ContentType::VerticalMarket)
            }
            _ => None,
        }
    }

    /// All types in migration order: referenced types before referencing ones
    pub fn in_dependency_order() -> [ContentType; 6] {
        [
            ContentType::Category,
            ContentType::VerticalMarket,
            ContentType::Manufacturer,
            ContentType::TeamMember,
            ContentType::Product,
            ContentType::Project,
        ]
    }
}

/// An outgoing Sanity document.
///
/// `fields` is flattened on serialization so the wire shape is the usual flat
/// Sanity document with `_id`/`_type` at the top level.
#[derive(Debug, Clone, Serialize)]
pub struct SanityDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(rename = "webflowId")]
    pub webflow_id: String,
    pub slug: SlugValue,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlugValue {
    #[serde(rename = "_type")]
    pub slug_type: &'static str,
    pub current: String,
}

impl SlugValue {
    pub fn new(current: impl Into<String>) -> Self {
        SlugValue {
            slug_type: "slug",
            current: current.into(),
        }
    }
}

/// Lowercase, keep alphanumerics, collapse everything else to single hyphens.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Deterministic document id so re-runs hit the same document
pub fn document_id(content_type: ContentType, webflow_id: &str) -> String {
    format!("{}-{}", content_type.sanity_type(), slugify(webflow_id))
}

use log::warn;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Maps Webflow item ids to the Sanity `_id`s written during the content
/// phase, so the reference phase can rewrite cross-collection links.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    ids: HashMap<String, String>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, webflow_id: &str, sanity_id: &str) {
        self.ids.insert(webflow_id.to_string(), sanity_id.to_string());
    }

    pub fn get(&self, webflow_id: &str) -> Option<&str> {
        self.ids.get(webflow_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn reference_value(sanity_id: &str, key: Option<usize>) -> Value {
    match key {
        Some(index) => json!({
            "_type": "reference",
            "_ref": sanity_id,
            "_key": format!("ref-{index}")
        }),
        None => json!({ "_type": "reference", "_ref": sanity_id }),
    }
}

fn marker_id(value: &Value) -> Option<&str> {
    value.get("_webflowRef").and_then(Value::as_str)
}

/// Outcome of rewriting one document's markers
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub resolved: usize,
    pub dropped: usize,
}

/// Rewrite `_webflowRef` markers into Sanity references in place.
///
/// Returns the fields that changed (ready for a patch) plus counts. An
/// unresolvable single id is kept as its raw string value so the data
/// survives the migration (some id-shaped strings are option values, not
/// item references); unresolvable array entries are dropped.
pub fn resolve_fields(
    fields: &Map<String, Value>,
    index: &ReferenceIndex,
) -> (Map<String, Value>, Resolution) {
    let mut patched = Map::new();
    let mut resolution = Resolution::default();

    for (name, value) in fields {
        if let Some(webflow_id) = marker_id(value) {
            match index.get(webflow_id) {
                Some(sanity_id) => {
                    patched.insert(name.clone(), reference_value(sanity_id, None));
                    resolution.resolved += 1;
                }
                None => {
                    warn!(
                        "Unresolved reference {} in '{}', keeping the raw value",
                        webflow_id, name
                    );
                    patched.insert(name.clone(), Value::String(webflow_id.to_string()));
                    resolution.dropped += 1;
                }
            }
        } else if let Value::Array(items) = value {
            if !items.iter().any(|item| marker_id(item).is_some()) {
                continue;
            }
            let mut refs = Vec::new();
            for item in items {
                if let Some(webflow_id) = marker_id(item) {
                    match index.get(webflow_id) {
                        Some(sanity_id) => {
                            refs.push(reference_value(sanity_id, Some(refs.len())));
                            resolution.resolved += 1;
                        }
                        None => {
                            warn!(
                                "Dropping unresolved reference {} in '{}'",
                                webflow_id, name
                            );
                            resolution.dropped += 1;
                        }
                    }
                }
            }
            patched.insert(name.clone(), Value::Array(refs));
        }
    }

    (patched, resolution)
}

/// Build manufacturer→products back-links from product documents.
///
/// Returns, per manufacturer Sanity `_id`, the reference array for its
/// `products` field.
pub fn manufacturer_backlinks(
    products: &[(String, Option<String>)], // (product sanity id, manufacturer webflow id)
    index: &ReferenceIndex,
) -> HashMap<String, Vec<Value>> {
    let mut backlinks: HashMap<String, Vec<Value>> = HashMap::new();

    for (product_id, manufacturer_webflow_id) in products {
        let Some(webflow_id) = manufacturer_webflow_id else {
            continue;
        };
        let Some(manufacturer_id) = index.get(webflow_id) else {
            warn!(
                "Product {} references unknown manufacturer {}",
                product_id, webflow_id
            );
            continue;
        };
        let refs = backlinks.entry(manufacturer_id.to_string()).or_default();
        refs.push(reference_value(product_id, Some(refs.len())));
    }

    backlinks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index() -> ReferenceIndex {
        let mut index = ReferenceIndex::new();
        index.insert("wf-m1", "manufacturer-wf-m1");
        index.insert("wf-c1", "category-wf-c1");
        index
    }

    #[test]
    fn test_resolve_single_reference() {
        let mut fields = Map::new();
        fields.insert("manufacturer".to_string(), json!({"_webflowRef": "wf-m1"}));
        fields.insert("title".to_string(), json!("Widget"));

        let (patched, resolution) = resolve_fields(&fields, &index());
        assert_eq!(resolution, Resolution { resolved: 1, dropped: 0 });
        assert_eq!(patched["manufacturer"]["_ref"], "manufacturer-wf-m1");
        // untouched fields are not part of the patch
        assert!(patched.get("title").is_none());
    }

    #[test]
    fn test_resolve_reference_array() {
        let mut fields = Map::new();
        fields.insert(
            "categories".to_string(),
            json!([{"_webflowRef": "wf-c1"}, {"_webflowRef": "wf-missing"}]),
        );

        let (patched, resolution) = resolve_fields(&fields, &index());
        assert_eq!(resolution, Resolution { resolved: 1, dropped: 1 });
        let refs = patched["categories"].as_array().unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0]["_ref"], "category-wf-c1");
        assert_eq!(refs[0]["_key"], "ref-0");
    }

    #[test]
    fn test_unresolved_single_reference_keeps_raw_value() {
        let mut fields = Map::new();
        fields.insert(
            "manufacturer".to_string(),
            json!({"_webflowRef": "6621aa00bb11cc22dd33ee44"}),
        );

        let (patched, resolution) = resolve_fields(&fields, &index());
        assert_eq!(resolution, Resolution { resolved: 0, dropped: 1 });
        // the id-shaped value survives as a plain string
        assert_eq!(patched["manufacturer"], "6621aa00bb11cc22dd33ee44");
    }

    #[test]
    fn test_non_marker_arrays_untouched() {
        let mut fields = Map::new();
        fields.insert("tags".to_string(), json!(["a", "b"]));

        let (patched, resolution) = resolve_fields(&fields, &index());
        assert!(patched.is_empty());
        assert_eq!(resolution, Resolution::default());
    }

    #[test]
    fn test_manufacturer_backlinks() {
        let products = vec![
            ("product-p1".to_string(), Some("wf-m1".to_string())),
            ("product-p2".to_string(), Some("wf-m1".to_string())),
            ("product-p3".to_string(), None),
            ("product-p4".to_string(), Some("wf-unknown".to_string())),
        ];

        let backlinks = manufacturer_backlinks(&products, &index());
        assert_eq!(backlinks.len(), 1);
        let refs = &backlinks["manufacturer-wf-m1"];
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0]["_ref"], "product-p1");
        assert_eq!(refs[1]["_key"], "ref-1");
    }

    #[test]
    fn test_index_lookup() {
        let idx = index();
        assert_eq!(idx.len(), 2);
        assert!(!idx.is_empty());
        assert_eq!(idx.get("wf-m1"), Some("manufacturer-wf-m1"));
        assert_eq!(idx.get("wf-unknown"), None);
    }
}

use html_escape::decode_html_entities;
use scraper::{ElementRef, Html};
use serde_json::{json, Value};

// Webflow occasionally double-encodes entities in rich text exports
fn decode_text(text: &str) -> String {
    decode_html_entities(&decode_html_entities(text)).into_owned()
}

fn element_text(element: ElementRef) -> String {
    let joined: String = element.text().collect::<Vec<_>>().join("");
    decode_text(joined.trim())
}

fn block(style: &str, text: String, index: usize) -> Value {
    json!({
        "_type": "block",
        "_key": format!("block-{index}"),
        "style": style,
        "markDefs": [],
        "children": [{
            "_type": "span",
            "_key": format!("span-{index}"),
            "text": text,
            "marks": []
        }]
    })
}

/// Portable-text style for a block-level tag
fn style_for(tag: &str) -> Option<&'static str> {
    match tag {
        "h1" => Some("h1"),
        "h2" => Some("h2"),
        "h3" => Some("h3"),
        "h4" => Some("h4"),
        "blockquote" => Some("blockquote"),
        "p" | "li" => Some("normal"),
        _ => None,
    }
}

/// Walk the direct children of one container, emitting (style, text) pairs.
/// Each top-level block element yields exactly one block; nested markup is
/// flattened into that block's text, never emitted again.
fn collect_blocks(parent: ElementRef, out: &mut Vec<(&'static str, String)>) {
    for child in parent.children() {
        let Some(element) = ElementRef::wrap(child) else {
            continue;
        };
        let tag = element.value().name();
        match tag {
            "ul" | "ol" => {
                for item in element.children() {
                    if let Some(li) = ElementRef::wrap(item) {
                        if li.value().name() == "li" {
                            let text = element_text(li);
                            if !text.is_empty() {
                                out.push(("normal", text));
                            }
                        }
                    }
                }
            }
            // div is only a container; descend unless it is a leaf
            "div" => {
                if element.children().any(|c| c.value().is_element()) {
                    collect_blocks(element, out);
                } else {
                    let text = element_text(element);
                    if !text.is_empty() {
                        out.push(("normal", text));
                    }
                }
            }
            _ => {
                if let Some(style) = style_for(tag) {
                    let text = element_text(element);
                    if !text.is_empty() {
                        out.push((style, text));
                    }
                }
            }
        }
    }
}

/// Convert a Webflow rich-text HTML fragment into portable-text blocks.
///
/// Only top-level block elements produce blocks; inline markup (bold, links,
/// spans) and nested block markup are flattened into the owning block's text.
/// Empty input yields no blocks.
pub fn html_to_blocks(html: &str) -> Vec<Value> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let document = Html::parse_fragment(html);
    let mut collected = Vec::new();
    collect_blocks(document.root_element(), &mut collected);

    collected
        .into_iter()
        .enumerate()
        .map(|(index, (style, text))| block(style, text, index))
        .collect()
}

/// Flatten portable-text blocks back to plain prose, one space between
/// blocks; used when feeding an already-converted description to the
/// enhancer.
pub fn blocks_to_plain_text(blocks: &[Value]) -> String {
    let mut parts = Vec::new();
    for block in blocks {
        let Some(children) = block.get("children").and_then(Value::as_array) else {
            continue;
        };
        for span in children {
            if let Some(text) = span.get("text").and_then(Value::as_str) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed.to_string());
                }
            }
        }
    }
    parts.join(" ")
}

/// Wrap rewritten prose in a single normal block
pub fn plain_text_blocks(text: &str) -> Vec<Value> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    vec![block("normal", text.trim().to_string(), 0)]
}

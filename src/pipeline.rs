use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::MigrationConfig;
use crate::enhance::{enhance_description, generate_tags, Enhancer};
use crate::error::MigrateError;
use crate::fields::map_item;
use crate::images::ImageRelay;
use crate::model::{CollectionSummary, ContentType, SanityDocument};
use crate::references::{manufacturer_backlinks, resolve_fields, ReferenceIndex};
use crate::richtext::{blocks_to_plain_text, plain_text_blocks};
use crate::report::MigrationReport;
use crate::sanity::{SanityClient, UpsertOutcome};
use crate::webflow::WebflowClient;

/// The ordered phases of a migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discovery,
    Content,
    References,
    Images,
}

impl Phase {
    pub fn all() -> [Phase; 4] {
        [Phase::Discovery, Phase::Content, Phase::References, Phase::Images]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Content => "content",
            Phase::References => "references",
            Phase::Images => "images",
        }
    }

    pub fn parse(name: &str) -> Option<Phase> {
        match name.trim().to_lowercase().as_str() {
            "discovery" => Some(Phase::Discovery),
            "content" => Some(Phase::Content),
            "references" | "refs" => Some(Phase::References),
            "images" => Some(Phase::Images),
            _ => None,
        }
    }
}

/// A document written (or planned, in dry runs) during the content phase.
/// Later phases work from this in-memory state.
struct MigratedDoc {
    content_type: ContentType,
    sanity_id: String,
    webflow_id: String,
    fields: Map<String, Value>,
}

/// Drives the phased migration
pub struct Migrator {
    config: MigrationConfig,
    webflow: WebflowClient,
    sanity: SanityClient,
    relay: ImageRelay,
    enhancer: Option<Box<dyn Enhancer>>,
    phases: Vec<Phase>,
    only_collection: Option<String>,
    dry_run: bool,
}

/// Fields the description enhancement looks at, in order
const DESCRIPTION_FIELDS: [&str; 2] = ["description", "shortDescription"];

impl Migrator {
    pub fn new(
        config: MigrationConfig,
        enhancer: Option<Box<dyn Enhancer>>,
        phases: Vec<Phase>,
        only_collection: Option<String>,
        dry_run: bool,
    ) -> Result<Self, MigrateError> {
        let webflow = WebflowClient::new(&config.webflow, config.pacing.request_delay_ms)?;
        let sanity = SanityClient::new(&config.sanity)?;
        let relay = ImageRelay::new()?;

        Ok(Migrator {
            config,
            webflow,
            sanity,
            relay,
            enhancer,
            phases,
            only_collection,
            dry_run,
        })
    }

    fn runs(&self, phase: Phase) -> bool {
        self.phases.contains(&phase)
    }

    async fn pace(&self) {
        sleep(Duration::from_millis(self.config.pacing.request_delay_ms)).await;
    }

    /// Execute the selected phases and return the run report
    pub async fn run(&self) -> Result<MigrationReport, MigrateError> {
        let mut report = MigrationReport::new(self.dry_run);

        // Phase 1: discovery
        let collections = self.discover().await?;
        if collections.is_empty() {
            warn!("No collections matched a known content type; nothing to do");
            report.finish();
            return Ok(report);
        }

        if self.runs(Phase::Content) {
            let (index, migrated) = self.content_phase(&collections, &mut report).await?;

            if self.runs(Phase::References) {
                self.reference_phase(&index, &migrated, &mut report).await?;
            }
            if self.runs(Phase::Images) {
                self.image_phase(&migrated, &mut report).await?;
            }
        } else if self.runs(Phase::References) || self.runs(Phase::Images) {
            warn!("references/images phases need the content phase in the same run; skipping");
        }

        report.finish();
        report.log_summary();
        Ok(report)
    }

    /// List collections and match them to known content types
    async fn discover(&self) -> Result<Vec<(ContentType, CollectionSummary)>, MigrateError> {
        let all = self.webflow.list_collections().await?;
        let mut matched = Vec::new();

        for collection in all {
            match ContentType::from_collection_name(&collection.display_name)
                .or_else(|| ContentType::from_collection_name(&collection.slug))
            {
                Some(content_type) => {
                    info!(
                        "Collection '{}' -> {}",
                        collection.display_name,
                        content_type.sanity_type()
                    );
                    matched.push((content_type, collection));
                }
                None => {
                    warn!(
                        "Skipping unrecognized collection '{}' ({})",
                        collection.display_name, collection.id
                    );
                }
            }
        }

        if let Some(only) = &self.only_collection {
            let only_lower = only.to_lowercase();
            matched.retain(|(_, c)| {
                c.display_name.to_lowercase() == only_lower || c.slug.to_lowercase() == only_lower
            });
            if matched.is_empty() {
                return Err(MigrateError::UnknownCollection(only.clone()));
            }
        }

        // Referenced types must land before the types that reference them
        let order = ContentType::in_dependency_order();
        matched.sort_by_key(|(content_type, _)| {
            order.iter().position(|t| t == content_type).unwrap_or(order.len())
        });
        Ok(matched)
    }

    /// Phase 2: extract, map, enhance, and upsert every item
    async fn content_phase(
        &self,
        collections: &[(ContentType, CollectionSummary)],
        report: &mut MigrationReport,
    ) -> Result<(ReferenceIndex, Vec<MigratedDoc>), MigrateError> {
        let mut index = ReferenceIndex::new();
        let mut migrated = Vec::new();
        let total = collections.len();

        for (position, (content_type, collection)) in collections.iter().enumerate() {
            let type_name = content_type.sanity_type();
            info!(
                "[{}/{}] Migrating '{}' as {}",
                position + 1,
                total,
                collection.display_name,
                type_name
            );

            let items = self.webflow.fetch_all_items(&collection.id).await?;
            let batch_count = items.len().div_ceil(self.config.pacing.batch_size).max(1);

            for (batch_number, batch) in
                items.chunks(self.config.pacing.batch_size).enumerate()
            {
                for item in batch {
                    report.collection(type_name).attempted += 1;

                    if item.is_draft || item.is_archived {
                        debug!("Skipping draft/archived item {}", item.id);
                        report.collection(type_name).skipped += 1;
                        continue;
                    }

                    let mut doc = map_item(*content_type, item);
                    if let Some(enhancer) = self.enhancer.as_deref() {
                        let enhanced = self.enhance_document(enhancer, &mut doc).await;
                        report.collection(type_name).enhanced += enhanced;
                    }

                    if self.dry_run {
                        debug!("Dry run: would upsert {}", doc.id);
                        report.collection(type_name).skipped += 1;
                    } else {
                        match self.sanity.upsert(&doc).await {
                            Ok(UpsertOutcome::Created) => {
                                report.collection(type_name).created += 1
                            }
                            Ok(UpsertOutcome::Replaced) => {
                                report.collection(type_name).replaced += 1
                            }
                            Err(e) => {
                                warn!("Failed to upsert {}: {}", doc.id, e);
                                report.record_failure(type_name, &item.id, &e);
                                continue;
                            }
                        }
                    }

                    index.insert(&item.id, &doc.id);
                    migrated.push(MigratedDoc {
                        content_type: *content_type,
                        sanity_id: doc.id,
                        webflow_id: item.id.clone(),
                        fields: doc.fields,
                    });
                    self.pace().await;
                }

                info!(
                    "[{}/{}] {}: batch {}/{} done",
                    position + 1,
                    total,
                    type_name,
                    batch_number + 1,
                    batch_count
                );
                if batch_number + 1 < batch_count {
                    sleep(Duration::from_millis(self.config.pacing.batch_delay_ms)).await;
                }
            }
        }

        info!("Content phase complete: {} documents", migrated.len());
        Ok((index, migrated))
    }

    /// Run description rewrite and tag generation on one mapped document.
    /// Failures keep the original values; returns the number of fields
    /// that were enhanced.
    async fn enhance_document(&self, enhancer: &dyn Enhancer, doc: &mut SanityDocument) -> usize {
        let title = doc
            .fields
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let kind = doc.doc_type.clone();
        let mut enhanced = 0;

        for field in DESCRIPTION_FIELDS {
            // descriptions arrive either as plain strings or, when the
            // source was rich text, as portable-text blocks
            let (original, was_blocks) = match doc.fields.get(field) {
                Some(Value::String(s)) => (s.clone(), false),
                Some(Value::Array(blocks)) => (blocks_to_plain_text(blocks), true),
                _ => continue,
            };
            if was_blocks && original.is_empty() {
                continue;
            }
            match enhance_description(enhancer, &kind, &title, &original).await {
                Ok(rewritten) => {
                    let value = if was_blocks {
                        Value::Array(plain_text_blocks(&rewritten))
                    } else {
                        Value::String(rewritten)
                    };
                    doc.fields.insert(field.to_string(), value);
                    enhanced += 1;
                }
                Err(e) => warn!("Description enhancement failed for {}: {}", doc.id, e),
            }
        }

        if doc.fields.get("tags").is_none() {
            let body = DESCRIPTION_FIELDS
                .iter()
                .filter_map(|f| match doc.fields.get(*f) {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Array(blocks)) => Some(blocks_to_plain_text(blocks)),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n");
            if !title.is_empty() || !body.is_empty() {
                match generate_tags(enhancer, &title, &body).await {
                    Ok(tags) if !tags.is_empty() => {
                        doc.fields.insert(
                            "tags".to_string(),
                            Value::Array(tags.into_iter().map(Value::String).collect()),
                        );
                        enhanced += 1;
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Tag generation failed for {}: {}", doc.id, e),
                }
            }
        }

        enhanced
    }

    /// Phase 3: rewrite reference markers and patch the back-links
    async fn reference_phase(
        &self,
        index: &ReferenceIndex,
        migrated: &[MigratedDoc],
        report: &mut MigrationReport,
    ) -> Result<(), MigrateError> {
        info!("Reference phase: resolving links across {} documents", migrated.len());

        for doc in migrated {
            let (patch, resolution) = resolve_fields(&doc.fields, index);
            report.collection(doc.content_type.sanity_type()).unresolved_refs +=
                resolution.dropped;

            if patch.is_empty() {
                continue;
            }
            if self.dry_run {
                debug!("Dry run: would patch {} with {} fields", doc.sanity_id, patch.len());
                continue;
            }
            if let Err(e) = self.sanity.patch_set(&doc.sanity_id, patch).await {
                warn!("Reference patch failed for {}: {}", doc.sanity_id, e);
                report.record_failure(doc.content_type.sanity_type(), &doc.webflow_id, &e);
                continue;
            }
            self.pace().await;
        }

        // Manufacturer pages list their products
        let products: Vec<(String, Option<String>)> = migrated
            .iter()
            .filter(|doc| doc.content_type == ContentType::Product)
            .map(|doc| {
                let manufacturer = doc
                    .fields
                    .get("manufacturer")
                    .and_then(|v| v.get("_webflowRef"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                (doc.sanity_id.clone(), manufacturer)
            })
            .collect();

        for (manufacturer_id, refs) in manufacturer_backlinks(&products, index) {
            if self.dry_run {
                debug!(
                    "Dry run: would set {} products on {}",
                    refs.len(),
                    manufacturer_id
                );
                continue;
            }
            let mut patch = Map::new();
            patch.insert("products".to_string(), Value::Array(refs));
            if let Err(e) = self.sanity.patch_set(&manufacturer_id, patch).await {
                warn!("Back-link patch failed for {}: {}", manufacturer_id, e);
            }
            self.pace().await;
        }

        Ok(())
    }

    /// Phase 4: relay pending images and patch asset references
    async fn image_phase(
        &self,
        migrated: &[MigratedDoc],
        report: &mut MigrationReport,
    ) -> Result<(), MigrateError> {
        info!("Image phase: relaying assets for {} documents", migrated.len());

        for doc in migrated {
            let title = doc.fields.get("title").and_then(Value::as_str);
            let mut patch = Map::new();

            for (name, value) in &doc.fields {
                match value {
                    Value::Object(map) if map.contains_key("_pendingImageUrl") => {
                        let url = map["_pendingImageUrl"].as_str().unwrap_or("");
                        let alt = map.get("alt").and_then(Value::as_str);
                        if let Some(asset_value) = self.relay_one(url, alt, title).await {
                            patch.insert(name.clone(), asset_value);
                            report
                                .collection(doc.content_type.sanity_type())
                                .images_uploaded += 1;
                        }
                    }
                    Value::Array(items)
                        if items.iter().any(|item| {
                            item.get("_pendingImageUrl").is_some()
                        }) =>
                    {
                        let mut assets = Vec::new();
                        for item in items {
                            let Some(url) =
                                item.get("_pendingImageUrl").and_then(Value::as_str)
                            else {
                                continue;
                            };
                            let alt = item.get("alt").and_then(Value::as_str);
                            if let Some(mut asset_value) = self.relay_one(url, alt, title).await
                            {
                                asset_value["_key"] = Value::String(format!(
                                    "image-{}",
                                    assets.len()
                                ));
                                assets.push(asset_value);
                                report
                                    .collection(doc.content_type.sanity_type())
                                    .images_uploaded += 1;
                            }
                        }
                        if !assets.is_empty() {
                            patch.insert(name.clone(), Value::Array(assets));
                        }
                    }
                    _ => {}
                }
            }

            if patch.is_empty() {
                continue;
            }
            if self.dry_run {
                debug!(
                    "Dry run: would attach {} image fields to {}",
                    patch.len(),
                    doc.sanity_id
                );
                continue;
            }
            if let Err(e) = self.sanity.patch_set(&doc.sanity_id, patch).await {
                warn!("Image patch failed for {}: {}", doc.sanity_id, e);
                report.record_failure(doc.content_type.sanity_type(), &doc.webflow_id, &e);
            }
            self.pace().await;
        }

        Ok(())
    }

    /// Relay a single image; None on failure (soft, logged)
    async fn relay_one(
        &self,
        url: &str,
        alt: Option<&str>,
        context: Option<&str>,
    ) -> Option<Value> {
        if url.is_empty() {
            return None;
        }
        if self.dry_run {
            debug!("Dry run: would relay image {}", url);
            return None;
        }
        match self
            .relay
            .relay(&self.sanity, url, alt, context, self.enhancer.as_deref())
            .await
        {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Image relay failed for {}: {}", url, e);
                None
            }
        }
    }
}

use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::MigrateError;

fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Per-collection counters
#[derive(Debug, Default, Clone, Serialize)]
pub struct CollectionReport {
    pub attempted: usize,
    pub created: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub failed: usize,
    pub enhanced: usize,
    pub images_uploaded: usize,
    pub unresolved_refs: usize,
}

/// One item that could not be migrated
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub collection: String,
    pub webflow_id: String,
    pub error: String,
}

/// The JSON run report written at the end of a migration
#[derive(Debug, Serialize)]
pub struct MigrationReport {
    pub started_at: u64,
    pub finished_at: Option<u64>,
    pub dry_run: bool,
    pub collections: BTreeMap<String, CollectionReport>,
    pub failures: Vec<ItemFailure>,
}

impl MigrationReport {
    pub fn new(dry_run: bool) -> Self {
        MigrationReport {
            started_at: epoch_seconds(),
            finished_at: None,
            dry_run,
            collections: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    pub fn collection(&mut self, name: &str) -> &mut CollectionReport {
        self.collections.entry(name.to_string()).or_default()
    }

    pub fn record_failure(&mut self, collection: &str, webflow_id: &str, error: &MigrateError) {
        self.collection(collection).failed += 1;
        self.failures.push(ItemFailure {
            collection: collection.to_string(),
            webflow_id: webflow_id.to_string(),
            error: error.to_string(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(epoch_seconds());
    }

    pub fn total_failed(&self) -> usize {
        self.collections.values().map(|c| c.failed).sum()
    }

    /// Write the report as pretty JSON
    pub async fn write(&self, path: &Path) -> Result<(), MigrateError> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        info!("Report written to {}", path.display());
        Ok(())
    }

    /// Console summary at the end of a run
    pub fn log_summary(&self) {
        for (name, counters) in &self.collections {
            info!(
                "{}: {} attempted, {} created, {} replaced, {} skipped, {} failed",
                name,
                counters.attempted,
                counters.created,
                counters.replaced,
                counters.skipped,
                counters.failed
            );
        }
        if !self.failures.is_empty() {
            info!("{} items failed; see the report file for details", self.failures.len());
        }
    }
}

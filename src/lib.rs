pub mod builder;
pub mod config;
pub mod enhance;
pub mod error;
pub mod fields;
pub mod images;
pub mod model;
pub mod pipeline;
pub mod references;
pub mod report;
pub mod richtext;
pub mod sanity;
pub mod webflow;

pub use builder::{Migration, MigrationBuilder};
pub use config::MigrationConfig;
pub use enhance::{Enhancer, OpenAiEnhancer, RetryingEnhancer};
pub use error::MigrateError;
pub use model::{CollectionSummary, ContentType, SanityDocument, WebflowItem};
pub use pipeline::{Migrator, Phase};
pub use report::MigrationReport;
pub use sanity::{SanityClient, UpsertOutcome};
pub use webflow::WebflowClient;

use crate::config::WebflowConfig;

/// Run a full migration (all phases) with configuration from
/// `migrate.toml` and the environment.
pub async fn run_migration() -> Result<MigrationReport, MigrateError> {
    Migration::builder().run().await
}

/// List the source site's collections and how they map to content types.
/// Unmatched collections are reported with `None`.
pub async fn discover_collections(
    config: &WebflowConfig,
) -> Result<Vec<(CollectionSummary, Option<ContentType>)>, MigrateError> {
    let client = WebflowClient::new(config, 0)?;
    let collections = client.list_collections().await?;
    Ok(collections
        .into_iter()
        .map(|collection| {
            let content_type = ContentType::from_collection_name(&collection.display_name)
                .or_else(|| ContentType::from_collection_name(&collection.slug));
            (collection, content_type)
        })
        .collect())
}

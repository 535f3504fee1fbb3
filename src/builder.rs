use crate::config::MigrationConfig;
use crate::enhance::{Enhancer, OpenAiEnhancer, RetryingEnhancer};
use crate::error::MigrateError;
use crate::pipeline::{Migrator, Phase};
use crate::report::MigrationReport;

/// Builder for configuring and executing a migration run
#[derive(Default)]
pub struct MigrationBuilder {
    config: Option<MigrationConfig>,
    phases: Option<Vec<Phase>>,
    only_collection: Option<String>,
    dry_run: bool,
    enhancer: Option<Box<dyn Enhancer>>,
}

impl MigrationBuilder {
    /// Use an explicit configuration instead of loading `migrate.toml`/env
    ///
    /// # Example
    /// ```no_run
    /// use webflow_sanity_migrate::{Migration, MigrationConfig};
    ///
    /// let config = MigrationConfig::load().unwrap();
    /// let builder = Migration::builder().config(config);
    /// ```
    pub fn config(mut self, config: MigrationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Restrict the run to specific phases (discovery always runs)
    pub fn phases(mut self, phases: impl IntoIterator<Item = Phase>) -> Self {
        self.phases = Some(phases.into_iter().collect());
        self
    }

    /// Migrate only the collection with this display name or slug
    pub fn only_collection(mut self, name: impl Into<String>) -> Self {
        self.only_collection = Some(name.into());
        self
    }

    /// Log everything but write nothing to Sanity
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Supply a custom enhancer (tests use canned ones).
    /// Without this, an OpenAI enhancer is built when
    /// `enhancement.enabled` is set in the configuration.
    pub fn enhancer(mut self, enhancer: Box<dyn Enhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    /// Build the migrator and execute the run
    ///
    /// # Errors
    /// Returns `MigrateError::Builder` for invalid combinations, config
    /// errors when no explicit config was given and loading fails, and any
    /// fatal API error (auth, discovery) from the run itself.
    pub async fn run(self) -> Result<MigrationReport, MigrateError> {
        let phases = self.phases.unwrap_or_else(|| Phase::all().to_vec());
        if phases.is_empty() {
            return Err(MigrateError::Builder(
                "No phases selected. Use .phases() with at least one phase".to_string(),
            ));
        }

        let config = match self.config {
            Some(config) => config,
            None => MigrationConfig::load()?,
        };

        let enhancer: Option<Box<dyn Enhancer>> = match self.enhancer {
            Some(enhancer) => Some(enhancer),
            None if config.enhancement.enabled => {
                let inner = OpenAiEnhancer::new(&config.enhancement)?;
                Some(Box::new(RetryingEnhancer::new(
                    Box::new(inner),
                    config.enhancement.retry_attempts,
                    config.enhancement.retry_delay_ms,
                )))
            }
            None => None,
        };

        let migrator = Migrator::new(
            config,
            enhancer,
            phases,
            self.only_collection,
            self.dry_run,
        )?;
        migrator.run().await
    }
}

/// Main entry point for the builder API
pub struct Migration;

impl Migration {
    /// Creates a new builder for a migration run
    ///
    /// # Example
    /// ```no_run
    /// # use webflow_sanity_migrate::Migration;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let report = Migration::builder().dry_run().run().await?;
    /// println!("{} failures", report.total_failed());
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> MigrationBuilder {
        MigrationBuilder::default()
    }
}

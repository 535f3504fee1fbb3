use thiserror::Error;

/// Errors that can occur during a migration run
#[derive(Error, Debug)]
pub enum MigrateError {
    /// HTTP transport failure (either vendor API)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Error building HTTP headers
    #[error("Header parse error: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error (report writing)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Webflow API returned a non-success status
    #[error("Webflow API error ({status}): {message}")]
    Webflow { status: u16, message: String },

    /// Sanity API returned a non-success status
    #[error("Sanity API error ({status}): {message}")]
    Sanity { status: u16, message: String },

    /// LLM enhancement failed after retries
    #[error("Enhancement failed: {0}")]
    Enhancement(String),

    /// An item is missing a field the mapping requires
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A Webflow collection could not be matched to a known content type
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    Builder(String),
}

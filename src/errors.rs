//! Error types for the talentlens query pipeline
//!
//! Every gateway or delegate failure is recoverable at its branch; only the
//! total failure of all dispatched branches is surfaced to the caller.

use thiserror::Error;

/// Main error type for the query pipeline
#[derive(Error, Debug)]
pub enum QueryError {
    /// Neither the rule matchers nor the delegate produced a valid strategy
    #[error("Classification failed: {0}")]
    ClassificationFailed(String),

    /// A generated structured query failed to execute
    #[error("Structured query failed after {attempts} attempt(s): {message}")]
    StructuredQuery { attempts: u8, message: String },

    /// Semantic retrieval call failed
    #[error("Semantic retrieval failed: {0}")]
    SemanticRetrieval(String),

    /// An external call exceeded its bounded timeout
    #[error("Upstream call timed out after {duration_ms}ms")]
    UpstreamTimeout { duration_ms: u64 },

    /// The delegate backend failed or returned an unusable response
    #[error("Delegate unavailable: {0}")]
    DelegateUnavailable(String),

    /// Every dispatched retrieval branch failed
    #[error("All retrieval branches failed for this question")]
    AllBranchesFailed,

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("Query error: {0}")]
    Generic(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, QueryError>;

/// Convert anyhow errors to QueryError
impl From<anyhow::Error> for QueryError {
    fn from(err: anyhow::Error) -> Self {
        QueryError::Generic(err.to_string())
    }
}

impl QueryError {
    /// Whether the error only fails its own retrieval branch
    ///
    /// Branch-local errors degrade the response; they never abort it.
    pub fn is_branch_local(&self) -> bool {
        matches!(
            self,
            QueryError::StructuredQuery { .. }
                | QueryError::SemanticRetrieval(_)
                | QueryError::UpstreamTimeout { .. }
                | QueryError::DelegateUnavailable(_)
        )
    }
}

//! # Promptmem
//!
//! Memory-augmented prompt enhancement for a personal prompt library.
//!
//! Promptmem loads a hand-maintained knowledge base of success patterns,
//! failure patterns, and project templates, ranks those records against a
//! free-text query context with a cheap keyword heuristic, and uses the
//! top-ranked records to ground a prompt-enhancement request to an
//! OpenAI- or Anthropic-compatible generation provider.
//!
//! ## Pipeline
//!
//! 1. [`PatternStore`] loads and normalizes the three record families,
//!    tolerating missing files, malformed JSON, and schema drift.
//! 2. [`matcher::match_patterns`] scores every record against a
//!    [`QueryContext`] and returns a ranked, score-annotated match list.
//! 3. [`EnhanceService`] resolves a model, builds a grounded prompt from the
//!    selected matches, dispatches one chat completion, and normalizes the
//!    response.
//!
//! ## Example
//!
//! ```rust,ignore
//! use promptmem::{EnhanceRequest, EnhanceService, PatternStore, QueryContext};
//! use promptmem::matcher::{self, DEFAULT_MIN_RELEVANCE};
//!
//! let patterns = PatternStore::from_env().load_all_patterns();
//! let query = QueryContext::new("API caching", "Add a cache layer to the API")
//!     .with_tags(vec!["redis".to_string()]);
//! let matches = matcher::match_patterns(&patterns, &query, DEFAULT_MIN_RELEVANCE);
//!
//! let service = EnhanceService::new(models);
//! let response = service.enhance(&EnhanceRequest::new("Add a cache layer"), &matches[..5])?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod enhance;
pub mod llm;
pub mod matcher;
pub mod models;
pub mod store;

// Re-exports for convenience
pub use config::{AiConfig, DEFAULT_MODEL_LABEL, ModelConfig, Provider};
pub use enhance::EnhanceService;
pub use llm::{ChatClient, ChatMessage, ChatRequest, HttpChatClient};
pub use matcher::{DEFAULT_MIN_RELEVANCE, QueryContext};
pub use models::{
    EnhanceRequest, EnhanceResponse, FailurePattern, MemoryPatternMatch, PatternKind, PatternRef,
    ProjectTemplate, SuccessPattern,
};
pub use store::{LoadWarning, PatternSets, PatternStore};

/// Error type for promptmem operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed CLI arguments or request fields |
/// | `OperationFailed` | Config file read/parse failures, other infrastructure errors |
/// | `NoModelsConfigured` | The model configuration lists no models |
/// | `InvalidModelSelection` | An explicit model index is out of range |
/// | `ClientConstructionFailed` | The provider HTTP client cannot be built |
/// | `EnhancementDispatchFailed` | The chat-completion call fails (transport or provider) |
///
/// Pattern-file load failures are deliberately *not* errors: the store
/// substitutes an empty collection and reports a [`LoadWarning`] instead.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - The model configuration file cannot be read or parsed
    /// - Filesystem I/O errors occur outside the pattern store
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The model configuration lists no models at all.
    #[error("no models configured")]
    NoModelsConfigured,

    /// An explicit model index was outside the configured list.
    #[error("invalid model selection: index {index} out of range (0..{available})")]
    InvalidModelSelection {
        /// The requested index.
        index: usize,
        /// Number of configured models.
        available: usize,
    },

    /// The provider HTTP client could not be constructed.
    #[error("failed to construct provider client: {cause}")]
    ClientConstructionFailed {
        /// The underlying cause.
        cause: String,
    },

    /// The enhancement dispatch (chat-completion call) failed.
    ///
    /// Carries the underlying transport or provider message so callers can
    /// distinguish configuration problems from transient provider problems.
    #[error("enhancement dispatch failed: {cause}")]
    EnhancementDispatchFailed {
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for promptmem operations.
pub type Result<T> = std::result::Result<T, Error>;

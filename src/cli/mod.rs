//! CLI command implementations.
//!
//! This module provides the command-line interface for Promptmem. The binary
//! parses arguments and delegates to the `cmd_*` functions here.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `search` | Rank memory patterns against a free-text query |
//! | `enhance` | Enhance a prompt, grounded in the top-ranked patterns |
//! | `models` | List the configured generation models |
//!
//! # Example Usage
//!
//! ```bash
//! # Rank patterns against a query
//! promptmem search "redis cache invalidation" --tags backend
//!
//! # Enhance a prompt with memory grounding
//! promptmem enhance "Add a cache layer to the API" --category performance
//!
//! # Enhance without memory context
//! promptmem enhance "Write release notes" --no-memory
//!
//! # Show configured models
//! promptmem models
//! ```

use crate::enhance::{EnhanceService, MAX_CONTEXT_PATTERNS};
use crate::matcher::{self, DEFAULT_MIN_RELEVANCE, QueryContext};
use crate::models::EnhanceRequest;
use crate::store::PatternStore;

/// Default relevance threshold for the `search` command.
///
/// Looser than the enhancement threshold so exploratory queries surface
/// weaker matches.
pub const SEARCH_MIN_RELEVANCE: f32 = 0.2;

/// Default result cap for the `search` command.
pub const SEARCH_LIMIT: usize = 10;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable text (default).
    #[default]
    Text,
    /// JSON format.
    Json,
}

impl OutputFormat {
    /// Parses output format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Arguments for the `search` command.
#[derive(Debug, Clone, Default)]
pub struct SearchArgs {
    /// Free-text query.
    pub query: String,
    /// Optional body text matched alongside the query.
    pub content: Option<String>,
    /// Optional category to boost template matches.
    pub category: Option<String>,
    /// Optional comma-separated tags.
    pub tags: Option<String>,
    /// Minimum relevance score.
    pub threshold: f32,
    /// Maximum number of results.
    pub limit: usize,
    /// Output format.
    pub format: OutputFormat,
}

impl SearchArgs {
    /// Creates search arguments with defaults for everything but the query.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            threshold: SEARCH_MIN_RELEVANCE,
            limit: SEARCH_LIMIT,
            ..Default::default()
        }
    }

    /// Sets the body text.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the comma-separated tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    /// Sets the relevance threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the result cap.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub const fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

/// Arguments for the `enhance` command.
#[derive(Debug, Clone, Default)]
pub struct EnhanceArgs {
    /// The prompt to enhance.
    pub prompt: String,
    /// Optional category.
    pub category: Option<String>,
    /// Optional comma-separated tags.
    pub tags: Option<String>,
    /// Explicit model index into the configured list.
    pub model: Option<usize>,
    /// Optional comma-separated pattern IDs to restrict grounding to.
    pub patterns: Option<String>,
    /// Skip memory retrieval entirely.
    pub no_memory: bool,
}

impl EnhanceArgs {
    /// Creates enhance arguments with a prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the comma-separated tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    /// Sets the explicit model index.
    #[must_use]
    pub const fn with_model(mut self, index: usize) -> Self {
        self.model = Some(index);
        self
    }

    /// Restricts grounding to the given comma-separated pattern IDs.
    #[must_use]
    pub fn with_patterns(mut self, ids: impl Into<String>) -> Self {
        self.patterns = Some(ids.into());
        self
    }

    /// Sets whether memory retrieval is skipped.
    #[must_use]
    pub const fn with_no_memory(mut self, no_memory: bool) -> Self {
        self.no_memory = no_memory;
        self
    }
}

/// Splits a comma-separated argument into trimmed, non-empty values.
fn parse_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Search command.
///
/// Ranks every loaded pattern against the query and prints the matches.
///
/// # Errors
///
/// Returns an error when JSON serialization of the results fails.
pub fn cmd_search(
    store: &PatternStore,
    args: &SearchArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let patterns = store.load_all_patterns();
    let query = build_query(
        &args.query,
        args.content.as_deref().unwrap_or(&args.query),
        args.category.as_deref(),
        args.tags.as_deref(),
    );

    let mut matches = matcher::match_patterns(&patterns, &query, args.threshold);
    matches.truncate(args.limit);

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&matches)?);
        },
        OutputFormat::Text => {
            println!(
                "Found {} matching patterns (of {} loaded):",
                matches.len(),
                patterns.len()
            );
            println!();

            for m in &matches {
                println!("  [{:.2}] {} ({})", m.relevance_score, m.pattern.id(), m.kind);
                if !m.matched_keywords.is_empty() {
                    println!("       keywords: {}", m.matched_keywords.join(", "));
                }
            }
        },
    }

    Ok(())
}

/// Enhance command.
///
/// Retrieves the top-ranked patterns (unless `--no-memory`), enhances the
/// prompt through the configured provider, and prints the enhanced prompt to
/// stdout. Provenance goes to stderr so the enhanced text can be piped.
///
/// # Errors
///
/// Returns an error when the prompt is empty, no model can be resolved, or
/// the provider call fails.
pub fn cmd_enhance(
    store: &PatternStore,
    service: &EnhanceService,
    args: &EnhanceArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.prompt.trim().is_empty() {
        return Err(Box::new(crate::Error::InvalidInput(
            "prompt must not be empty".to_string(),
        )));
    }

    let tags = parse_list(args.tags.as_deref());
    let id_filter = parse_list(args.patterns.as_deref());

    let mut request = EnhanceRequest::new(&args.prompt)
        .with_tags(tags)
        .with_memory_pattern_ids(id_filter.clone());
    if let Some(category) = &args.category {
        request = request.with_category(category.clone());
    }
    if let Some(index) = args.model {
        request = request.with_model(index);
    }

    let patterns = if args.no_memory {
        crate::store::PatternSets::default()
    } else {
        store.load_all_patterns()
    };

    let query = build_query(
        &args.prompt,
        &args.prompt,
        args.category.as_deref(),
        args.tags.as_deref(),
    );
    let mut matches = matcher::match_patterns(&patterns, &query, DEFAULT_MIN_RELEVANCE);
    if !id_filter.is_empty() {
        matches.retain(|m| id_filter.iter().any(|id| id == m.pattern.id()));
    }
    matches.truncate(MAX_CONTEXT_PATTERNS);

    let response = service.enhance(&request, &matches)?;

    eprintln!("Model: {}", response.model);
    if response.memory_patterns_used.is_empty() {
        eprintln!("Memory patterns: none");
    } else {
        eprintln!(
            "Memory patterns: {}",
            response.memory_patterns_used.join(", ")
        );
    }
    eprintln!();

    println!("{}", response.enhanced_prompt);

    Ok(())
}

/// Models command.
///
/// Lists the configured models. API keys are never printed.
///
/// # Errors
///
/// Returns an error when JSON serialization fails.
pub fn cmd_models(
    service: &EnhanceService,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let models = service.models();

    match format {
        OutputFormat::Json => {
            let listing: Vec<serde_json::Value> = models
                .iter()
                .enumerate()
                .map(|(index, m)| {
                    serde_json::json!({
                        "index": index,
                        "modelDisplayName": m.model_display_name,
                        "model": m.model,
                        "provider": m.provider,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        },
        OutputFormat::Text => {
            if models.is_empty() {
                println!("No models configured.");
                return Ok(());
            }

            println!("Configured models:");
            for (index, m) in models.iter().enumerate() {
                println!(
                    "  [{index}] {} ({}, provider: {})",
                    m.model_display_name, m.model, m.provider
                );
            }
        },
    }

    Ok(())
}

/// Builds the match query from CLI arguments.
fn build_query(
    title: &str,
    content: &str,
    category: Option<&str>,
    tags: Option<&str>,
) -> QueryContext {
    let mut context = QueryContext::new(title, content).with_tags(parse_list(tags));
    if let Some(category) = category {
        context = context.with_category(category);
    }
    context
}

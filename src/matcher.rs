//! Heuristic relevance matching over the pattern knowledge base.
//!
//! Scoring is a cheap keyword heuristic, not a semantic model: no
//! embeddings, no external calls, so it can run synchronously inside a
//! request path. The weights below are hand-tuned and load-bearing for
//! ranking parity; retuning them changes which patterns surface.

use crate::models::{MemoryPatternMatch, PatternRef};
use crate::store::PatternSets;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Default minimum relevance a record must reach to be returned.
pub const DEFAULT_MIN_RELEVANCE: f32 = 0.3;

/// Score added per record technology found in the query text.
const TECHNOLOGY_WEIGHT: f32 = 0.3;
/// Score added per extracted keyword found in the record.
const KEYWORD_WEIGHT: f32 = 0.1;
/// Score added when the query text contains the record's category.
const CATEGORY_WEIGHT: f32 = 0.2;

/// English stop words excluded from keyword extraction.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "with", "is", "are",
        "was", "were",
    ])
});

/// The title/content/category/tags bundle a caller wants matches for.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    /// Title of the prompt being matched.
    pub title: String,
    /// Body of the prompt being matched.
    pub content: String,
    /// Category, if any.
    pub category: Option<String>,
    /// Tags, if any.
    pub tags: Vec<String>,
}

impl QueryContext {
    /// Creates a query context from a title and body.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// The lower-cased, space-joined concatenation scored against.
    #[must_use]
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.title,
            self.content,
            self.category.as_deref().unwrap_or(""),
            self.tags.join(" ")
        )
        .to_lowercase()
    }
}

/// Extracts keywords from free text.
///
/// Tokenizes on non-word boundaries, drops tokens of two characters or
/// fewer and the fixed stop-word set, and deduplicates preserving first
/// appearance.
#[must_use]
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut keywords: Vec<String> = Vec::new();
    for token in lower.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
        if token.chars().count() <= 2 || STOP_WORDS.contains(token) {
            continue;
        }
        if keywords.iter().any(|k| k.as_str() == token) {
            continue;
        }
        keywords.push(token.to_string());
    }
    keywords
}

/// Scores one record against a query, clamped to `[0, 1]`.
///
/// Pure and I/O-free: technology overlap (+0.3 each), keyword containment
/// in the record's serialized blob (+0.1 each), category substring match
/// (+0.2).
#[must_use]
pub fn relevance_score(pattern: &PatternRef<'_>, keywords: &[String], search_text: &str) -> f32 {
    score_blob(pattern, &pattern.search_blob(), keywords, search_text)
}

/// [`relevance_score`] with the record blob precomputed.
fn score_blob(
    pattern: &PatternRef<'_>,
    blob: &str,
    keywords: &[String],
    search_text: &str,
) -> f32 {
    let mut score = 0.0_f32;

    // Technology match (high weight). Empty strings never score: an empty
    // substring matches everything.
    for tech in pattern.technologies() {
        let tech = tech.to_lowercase();
        if !tech.is_empty() && search_text.contains(&tech) {
            score += TECHNOLOGY_WEIGHT;
        }
    }

    // Keyword matches against the serialized record.
    for keyword in keywords {
        if blob.contains(keyword.as_str()) {
            score += KEYWORD_WEIGHT;
        }
    }

    // Category match.
    if let Some(category) = pattern.category() {
        let category = category.to_lowercase();
        if !category.is_empty() && search_text.contains(&category) {
            score += CATEGORY_WEIGHT;
        }
    }

    score.clamp(0.0, 1.0)
}

/// Extracted keywords that appear in the record blob, in extraction order.
fn matched_keywords(blob: &str, keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|k| blob.contains(k.as_str()))
        .cloned()
        .collect()
}

/// Matches all records against a query context and returns the ranked list.
///
/// Candidates are scored in family order (success, failure, template) and
/// load order within a family; records scoring below `min_relevance` are
/// dropped. The result is sorted by descending score with a stable sort, so
/// ties keep that original order.
#[must_use]
pub fn match_patterns<'a>(
    patterns: &'a PatternSets,
    query: &QueryContext,
    min_relevance: f32,
) -> Vec<MemoryPatternMatch<'a>> {
    let search_text = query.search_text();
    let keywords = extract_keywords(&search_text);

    let candidates = patterns
        .success
        .iter()
        .map(PatternRef::Success)
        .chain(patterns.failure.iter().map(PatternRef::Failure))
        .chain(patterns.templates.iter().map(PatternRef::Template));

    let mut matches: Vec<MemoryPatternMatch<'a>> = Vec::new();
    for pattern in candidates {
        let blob = pattern.search_blob();
        let score = score_blob(&pattern, &blob, &keywords, &search_text);
        if score < min_relevance {
            continue;
        }
        matches.push(MemoryPatternMatch {
            kind: pattern.kind(),
            pattern,
            relevance_score: score,
            matched_keywords: matched_keywords(&blob, &keywords),
        });
    }

    // Vec::sort_by is stable; ties retain family then load order.
    matches.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    matches
}

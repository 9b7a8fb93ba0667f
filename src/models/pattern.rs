//! Knowledge-base record types and the match envelope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A pattern that worked well in a past project.
///
/// Immutable once loaded; the matcher only ever borrows these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessPattern {
    /// Stable identifier from the knowledge base.
    #[serde(default)]
    pub id: String,
    /// Human-readable pattern name.
    #[serde(default)]
    pub pattern_name: String,
    /// The situation the pattern applies to.
    #[serde(default)]
    pub use_case: String,
    /// How the pattern was implemented.
    #[serde(default)]
    pub implementation: String,
    /// Technologies involved.
    #[serde(default)]
    pub technologies: Vec<String>,
    /// Observed benefits.
    #[serde(default)]
    pub benefits: Vec<String>,
    /// Observed tradeoffs.
    #[serde(default)]
    pub tradeoffs: Vec<String>,
    /// Optional illustrative code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_example: Option<String>,
}

/// A recorded failure and its resolution.
///
/// Source records arrive in two vocabularies; the store normalizes both into
/// this shape, defaulting unresolved fields to empty string/sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailurePattern {
    /// Stable identifier from the knowledge base.
    #[serde(default)]
    pub id: String,
    /// Date the failure was recorded (`YYYY-MM-DD`).
    #[serde(default)]
    pub date: String,
    /// What went wrong.
    #[serde(default)]
    pub problem: String,
    /// Observable symptoms.
    #[serde(default)]
    pub symptoms: Vec<String>,
    /// Diagnosed root cause.
    #[serde(default)]
    pub root_cause: String,
    /// How it was resolved.
    #[serde(default)]
    pub solution: String,
    /// Technologies involved.
    #[serde(default)]
    pub technologies: Vec<String>,
    /// How to avoid it next time.
    #[serde(default)]
    pub prevention: String,
    /// Commands used to diagnose the failure.
    #[serde(default)]
    pub diagnostic_commands: Vec<String>,
}

/// A reusable project skeleton.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectTemplate {
    /// Stable identifier from the knowledge base.
    #[serde(default)]
    pub id: String,
    /// Template name.
    #[serde(default)]
    pub name: String,
    /// Category the template belongs to.
    #[serde(default)]
    pub category: String,
    /// What the template provides.
    #[serde(default)]
    pub description: String,
    /// Technology stack, grouped by layer.
    #[serde(default)]
    pub tech_stack: BTreeMap<String, Vec<String>>,
    /// Opaque file-tree description; carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_structure: Option<serde_json::Value>,
}

/// The three record families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// Success pattern.
    Success,
    /// Failure pattern.
    Failure,
    /// Project template.
    Template,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Template => "template",
        };
        f.write_str(s)
    }
}

/// A borrowed reference into one of the loaded pattern collections.
///
/// Serializes untagged, i.e. as the record's own JSON. The matcher scores
/// against exactly that serialization, so what the caller sees in a match is
/// what was matched.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum PatternRef<'a> {
    /// A success pattern.
    Success(&'a SuccessPattern),
    /// A failure pattern.
    Failure(&'a FailurePattern),
    /// A project template.
    Template(&'a ProjectTemplate),
}

impl PatternRef<'_> {
    /// The record's identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Success(p) => &p.id,
            Self::Failure(p) => &p.id,
            Self::Template(p) => &p.id,
        }
    }

    /// The record's family.
    #[must_use]
    pub const fn kind(&self) -> PatternKind {
        match self {
            Self::Success(_) => PatternKind::Success,
            Self::Failure(_) => PatternKind::Failure,
            Self::Template(_) => PatternKind::Template,
        }
    }

    /// Technologies attached to the record, if the family carries any.
    ///
    /// Templates keep their technologies nested in `tech_stack` and expose
    /// none here, matching how scoring treats them.
    #[must_use]
    pub fn technologies(&self) -> &[String] {
        match self {
            Self::Success(p) => &p.technologies,
            Self::Failure(p) => &p.technologies,
            Self::Template(_) => &[],
        }
    }

    /// The record's category, if the family carries one.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Template(p) => Some(p.category.as_str()),
            Self::Success(_) | Self::Failure(_) => None,
        }
    }

    /// The record serialized to a lower-cased JSON blob for substring
    /// matching.
    #[must_use]
    pub fn search_blob(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_default()
            .to_lowercase()
    }
}

/// A score-annotated match produced by the relevance matcher.
///
/// Created fresh per match operation and never persisted. The borrow ties
/// every match to the collection it came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryPatternMatch<'a> {
    /// The matched record.
    pub pattern: PatternRef<'a>,
    /// The record's family.
    #[serde(rename = "type")]
    pub kind: PatternKind,
    /// Heuristic relevance in `[0, 1]`.
    pub relevance_score: f32,
    /// Extracted query keywords found in the record, in extraction order.
    pub matched_keywords: Vec<String>,
}

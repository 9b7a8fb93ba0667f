//! Enhancement request/response envelope.

use serde::{Deserialize, Serialize};

/// A prompt-enhancement request.
///
/// Wire casing is camelCase, matching the caller-facing API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceRequest {
    /// The prompt text to enhance.
    pub original_prompt: String,
    /// Category of the prompt, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Tags attached to the prompt.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Pre-selected pattern ids the caller wants included, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memory_pattern_ids: Vec<String>,
    /// Explicit model selector: an index into the configured model list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<usize>,
}

impl EnhanceRequest {
    /// Creates a request for the given prompt text.
    #[must_use]
    pub fn new(original_prompt: impl Into<String>) -> Self {
        Self {
            original_prompt: original_prompt.into(),
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

    /// Sets the explicit model index.
    #[must_use]
    pub const fn with_model(mut self, model_id: usize) -> Self {
        self.model_id = Some(model_id);
        self
    }

    /// Sets the pre-selected pattern ids.
    #[must_use]
    pub fn with_memory_pattern_ids(mut self, ids: Vec<String>) -> Self {
        self.memory_pattern_ids = ids;
        self
    }
}

/// The result of a prompt enhancement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceResponse {
    /// The enhanced prompt text (never empty: falls back to the original).
    pub enhanced_prompt: String,
    /// Display name of the model that produced the enhancement.
    pub model: String,
    /// Ids of the memory patterns included in the grounded prompt,
    /// in the order they were supplied.
    pub memory_patterns_used: Vec<String>,
    /// Follow-up suggestions. Currently always empty.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

//! Prompt enhancement orchestration.
//!
//! Linear pipeline, no loops, no retries: resolve a model, construct a
//! provider client, render the selected memory matches into a grounded
//! system prompt, dispatch one chat completion, normalize the result.
//! Memory retrieval is deliberately decoupled: callers pass an
//! already-selected match list, and a failed retrieval upstream must never
//! block enhancement.

use crate::config::{DEFAULT_MODEL_LABEL, ModelConfig, Provider};
use crate::llm::{ChatClient, ChatMessage, ChatRequest, HttpChatClient};
use crate::models::{EnhanceRequest, EnhanceResponse, MemoryPatternMatch, PatternRef};
use crate::{Error, Result};

/// Sampling temperature for enhancement requests.
pub const ENHANCEMENT_TEMPERATURE: f32 = 0.7;
/// Completion token limit for enhancement requests.
pub const ENHANCEMENT_MAX_TOKENS: u32 = 2000;
/// How many matches callers are expected to cap their selection to.
pub const MAX_CONTEXT_PATTERNS: usize = 5;

/// Orchestrates model resolution, prompt assembly, and dispatch.
pub struct EnhanceService {
    /// Configured models, in priority order.
    models: Vec<ModelConfig>,
}

impl EnhanceService {
    /// Creates a service over the given model list.
    #[must_use]
    pub const fn new(models: Vec<ModelConfig>) -> Self {
        Self { models }
    }

    /// The configured models.
    #[must_use]
    pub fn models(&self) -> &[ModelConfig] {
        &self.models
    }

    /// Resolves which model a request should use.
    ///
    /// An explicit index must be in range. With no index, preference order
    /// is: the model whose display name is [`DEFAULT_MODEL_LABEL`], then the
    /// first anthropic-family model, then the first model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoModelsConfigured`] when the list is empty, or
    /// [`Error::InvalidModelSelection`] when an explicit index is out of
    /// range.
    pub fn resolve_model(&self, selector: Option<usize>) -> Result<&ModelConfig> {
        if self.models.is_empty() {
            return Err(Error::NoModelsConfigured);
        }
        match selector {
            Some(index) => self
                .models
                .get(index)
                .ok_or(Error::InvalidModelSelection {
                    index,
                    available: self.models.len(),
                }),
            None => Ok(self
                .models
                .iter()
                .find(|m| m.model_display_name == DEFAULT_MODEL_LABEL)
                .or_else(|| {
                    self.models
                        .iter()
                        .find(|m| m.provider == Provider::Anthropic)
                })
                .unwrap_or(&self.models[0])),
        }
    }

    /// Enhances a prompt using the configured provider endpoint.
    ///
    /// `matches` is the caller's pre-selected list (expected to be capped at
    /// [`MAX_CONTEXT_PATTERNS`]); it is rendered as-is, not re-ranked. An
    /// empty list grounds the prompt with no memory context, which is valid.
    ///
    /// # Errors
    ///
    /// Returns a tagged error naming the failed stage: model resolution,
    /// client construction, or dispatch.
    pub fn enhance(
        &self,
        request: &EnhanceRequest,
        matches: &[MemoryPatternMatch<'_>],
    ) -> Result<EnhanceResponse> {
        let model = self.resolve_model(request.model_id)?;
        let client = HttpChatClient::for_model(model)?;
        Self::enhance_via(&client, model, request, matches)
    }

    /// Enhances a prompt through an injected client.
    ///
    /// The seam for tests and alternate transports; model resolution and
    /// prompt assembly are identical to [`EnhanceService::enhance`].
    ///
    /// # Errors
    ///
    /// Same contract as [`EnhanceService::enhance`], minus client
    /// construction.
    pub fn enhance_with_client(
        &self,
        client: &dyn ChatClient,
        request: &EnhanceRequest,
        matches: &[MemoryPatternMatch<'_>],
    ) -> Result<EnhanceResponse> {
        let model = self.resolve_model(request.model_id)?;
        Self::enhance_via(client, model, request, matches)
    }

    fn enhance_via(
        client: &dyn ChatClient,
        model: &ModelConfig,
        request: &EnhanceRequest,
        matches: &[MemoryPatternMatch<'_>],
    ) -> Result<EnhanceResponse> {
        let memory_context = build_memory_context(matches);
        let system_prompt = build_system_prompt(&memory_context);
        let user_prompt = build_user_prompt(request);

        tracing::info!(
            model = %model.model,
            display_name = %model.model_display_name,
            patterns = matches.len(),
            "requesting prompt enhancement"
        );
        tracing::debug!(
            system_len = system_prompt.len(),
            user_len = user_prompt.len(),
            temperature = ENHANCEMENT_TEMPERATURE,
            max_tokens = ENHANCEMENT_MAX_TOKENS,
            "enhancement payload assembled"
        );

        let chat = ChatRequest {
            model: model.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
            temperature: ENHANCEMENT_TEMPERATURE,
            max_tokens: ENHANCEMENT_MAX_TOKENS,
        };

        let content = client.chat(&chat).map_err(|e| match e {
            Error::EnhancementDispatchFailed { .. } => e,
            other => Error::EnhancementDispatchFailed {
                cause: other.to_string(),
            },
        })?;

        // Never produce an empty enhancement: absent or empty content falls
        // back to the caller's original text.
        let enhanced = content
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| request.original_prompt.clone());

        Ok(EnhanceResponse {
            enhanced_prompt: enhanced.trim().to_string(),
            model: model.model_display_name.clone(),
            memory_patterns_used: matches
                .iter()
                .map(|m| m.pattern.id().to_string())
                .collect(),
            suggestions: Vec::new(),
        })
    }
}

/// Renders the selected matches into the memory-context block.
///
/// Empty selection renders an empty block, not an error.
fn build_memory_context(matches: &[MemoryPatternMatch<'_>]) -> String {
    if matches.is_empty() {
        return String::new();
    }

    let mut context = String::from("\n\n## RELEVANT MEMORY PATTERNS\n\n");
    context.push_str("The following patterns from the knowledge base are relevant to this prompt:\n\n");

    for (index, m) in matches.iter().enumerate() {
        let number = index + 1;
        let relevance = (m.relevance_score * 100.0).round() as i64;
        context.push_str(&format!("### Pattern {number}: {}\n", m.pattern.id()));
        context.push_str(&format!("Type: {}\n", m.kind));
        context.push_str(&format!("Relevance: {relevance}%\n"));

        match m.pattern {
            PatternRef::Success(p) => {
                context.push_str(&format!("Pattern: {}\n", p.pattern_name));
                context.push_str(&format!("Use Case: {}\n", p.use_case));
                context.push_str(&format!("Implementation: {}\n", p.implementation));
                if let Some(code) = &p.code_example {
                    context.push_str(&format!("Code Example:\n{code}\n"));
                }
            },
            PatternRef::Failure(p) => {
                context.push_str(&format!("Problem: {}\n", p.problem));
                context.push_str(&format!("Solution: {}\n", p.solution));
                context.push_str(&format!("Prevention: {}\n", p.prevention));
            },
            PatternRef::Template(p) => {
                context.push_str(&format!("Template: {}\n", p.name));
                context.push_str(&format!("Description: {}\n", p.description));
            },
        }

        context.push('\n');
    }

    context
}

/// Builds the fixed enhancement persona with the memory context appended.
fn build_system_prompt(memory_context: &str) -> String {
    format!(
        "You are an expert AI prompt engineer. Your task is to enhance and improve prompts for AI systems.

Your goals:
1. Make prompts more clear, specific, and actionable
2. Add relevant context and constraints
3. Improve structure and formatting
4. Incorporate best practices from memory patterns (if provided)
5. Ensure the enhanced prompt will produce better AI responses

Guidelines:
- Keep the original intent and core request
- Add clarity without over-complicating
- Use markdown formatting for structure
- Add examples if helpful
- Include relevant constraints or requirements
- Consider the category and tags when enhancing
{memory_context}

Return ONLY the enhanced prompt, no explanations or metadata."
    )
}

/// Builds the user message: the original prompt plus optional metadata lines.
fn build_user_prompt(request: &EnhanceRequest) -> String {
    let mut prompt = format!("Please enhance this prompt:\n\n{}", request.original_prompt);

    if let Some(category) = &request.category {
        prompt.push_str(&format!("\n\nCategory: {category}"));
    }

    if !request.tags.is_empty() {
        prompt.push_str(&format!("\nTags: {}", request.tags.join(", ")));
    }

    prompt
}

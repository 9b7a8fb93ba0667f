//! End-to-end tests for the memory pipeline: load patterns from disk, rank
//! them against a query, and enhance a prompt through a stub provider.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use promptmem::matcher::{self, DEFAULT_MIN_RELEVANCE, QueryContext};
use promptmem::{
    ChatClient, ChatRequest, EnhanceRequest, EnhanceService, ModelConfig, PatternKind,
    PatternStore, Provider,
};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

/// Stub provider that records the dispatched request.
struct RecordingClient {
    reply: String,
    seen: Mutex<Option<ChatRequest>>,
}

impl RecordingClient {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            seen: Mutex::new(None),
        }
    }

    fn seen(&self) -> ChatRequest {
        self.seen.lock().unwrap().clone().expect("no request seen")
    }
}

impl ChatClient for RecordingClient {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn chat(&self, request: &ChatRequest) -> promptmem::Result<Option<String>> {
        *self.seen.lock().unwrap() = Some(request.clone());
        Ok(Some(self.reply.clone()))
    }
}

fn write_pattern_files(dir: &Path) {
    fs::write(
        dir.join("success_patterns.json"),
        r#"[
            {
                "id": "sp-cache",
                "pattern_name": "Cache aside",
                "use_case": "Read-heavy REST API",
                "implementation": "Check redis before the database",
                "technologies": ["redis", "postgresql"],
                "benefits": ["lower latency"],
                "tradeoffs": ["stale reads"],
                "code_example": "let hit = cache.get(key);"
            },
            {
                "id": "sp-unrelated",
                "pattern_name": "Blue green deploys",
                "use_case": "Zero downtime releases",
                "implementation": "Run two environments",
                "technologies": ["kubernetes"],
                "benefits": [],
                "tradeoffs": []
            }
        ]"#,
    )
    .expect("write success patterns");

    fs::write(
        dir.join("failure_patterns.json"),
        r#"{"patterns": [
            {
                "id": "fp-stampede",
                "date": "2026-02-10",
                "problem": "Cache stampede after redis restart",
                "symptoms": ["latency spike", "database saturation"],
                "root_cause": "Cold cache with synchronized expiry",
                "solution": "Jitter TTLs and add request coalescing",
                "technologies": ["redis"],
                "prevention": "Stagger expirations"
            }
        ]}"#,
    )
    .expect("write failure patterns");

    fs::write(
        dir.join("project_templates.json"),
        r#"{"templates": [
            {
                "id": "tpl-api",
                "name": "REST API starter",
                "category": "backend",
                "description": "Service skeleton with caching wired in",
                "tech_stack": {"cache": ["redis"], "db": ["postgresql"]}
            }
        ]}"#,
    )
    .expect("write templates");
}

fn model(display_name: &str, provider: Provider) -> ModelConfig {
    ModelConfig {
        model_display_name: display_name.to_string(),
        model: "test-model".to_string(),
        base_url: "https://api.example.com".to_string(),
        api_key: "test-key".to_string(),
        provider,
    }
}

#[test]
fn test_full_pipeline_store_to_enhancement() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_pattern_files(dir.path());

    let store = PatternStore::new(dir.path());
    let patterns = store.load_all_patterns();
    assert_eq!(patterns.len(), 4);

    let query = QueryContext::new(
        "Add redis caching",
        "Add a redis cache layer in front of postgresql",
    )
    .with_category("backend".to_string())
    .with_tags(vec!["cache".to_string()]);

    let matches = matcher::match_patterns(&patterns, &query, DEFAULT_MIN_RELEVANCE);
    assert!(!matches.is_empty());
    assert!(matches.iter().all(|m| m.relevance_score >= DEFAULT_MIN_RELEVANCE));
    // The unrelated record never clears the default threshold.
    assert!(matches.iter().all(|m| m.pattern.id() != "sp-unrelated"));

    let service = EnhanceService::new(vec![model("Claude.Code", Provider::Anthropic)]);
    let client = RecordingClient::new("## Enhanced\n\nAdd a redis cache layer.");
    let request = EnhanceRequest::new("Add a redis cache layer")
        .with_category("backend")
        .with_tags(vec!["cache".to_string()]);

    let capped = &matches[..matches.len().min(5)];
    let response = service
        .enhance_with_client(&client, &request, capped)
        .expect("enhancement");

    assert_eq!(response.model, "Claude.Code");
    assert_eq!(response.enhanced_prompt, "## Enhanced\n\nAdd a redis cache layer.");
    let used = &response.memory_patterns_used;
    assert_eq!(used.len(), capped.len());
    for (id, m) in used.iter().zip(capped) {
        assert_eq!(id, m.pattern.id());
    }

    // The dispatched request carries the fixed generation parameters and a
    // system message grounded in the retrieved patterns.
    let seen = client.seen();
    assert!((seen.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(seen.max_tokens, 2000);
    assert_eq!(seen.messages.len(), 2);
    assert_eq!(seen.messages[0].role, "system");
    assert!(seen.messages[0].content.contains("## RELEVANT MEMORY PATTERNS"));
    assert!(seen.messages[0].content.contains("sp-cache"));
    assert_eq!(seen.messages[1].role, "user");
    assert!(seen.messages[1].content.contains("Add a redis cache layer"));
    assert!(seen.messages[1].content.contains("Category: backend"));
    assert!(seen.messages[1].content.contains("Tags: cache"));
}

#[test]
fn test_one_bad_file_does_not_block_the_others() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_pattern_files(dir.path());
    fs::write(dir.path().join("success_patterns.json"), "{not json").expect("write bad file");

    let store = PatternStore::new(dir.path());
    let patterns = store.load_all_patterns();

    // Success patterns are gone; the other two families still load.
    assert!(patterns.success.is_empty());
    assert_eq!(patterns.failure.len(), 1);
    assert_eq!(patterns.templates.len(), 1);
}

#[test]
fn test_missing_directory_yields_empty_sets() {
    let store = PatternStore::new("/nonexistent/promptmem-test");
    let patterns = store.load_all_patterns();
    assert!(patterns.is_empty());
}

#[test]
fn test_alternate_failure_vocabulary_flows_through_matching() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("failure_patterns.json"),
        r#"[
            {
                "name": "Deadlock on migration",
                "warning_signs": ["hung deploys"],
                "root_cause": "Long transaction held a table lock",
                "resolution": {
                    "approach": "Batch the migration",
                    "prevention": "Use lock timeouts"
                },
                "tech_stack": {"db": ["postgresql"]}
            }
        ]"#,
    )
    .expect("write failure patterns");

    let store = PatternStore::new(dir.path());
    let patterns = store.load_all_patterns();
    assert_eq!(patterns.failure.len(), 1);

    let record = &patterns.failure[0];
    assert_eq!(record.id, "Deadlock on migration");
    assert_eq!(record.problem, "Deadlock on migration");
    assert_eq!(record.solution, "Batch the migration");
    assert_eq!(record.prevention, "Use lock timeouts");
    assert_eq!(record.technologies, vec!["postgresql"]);

    let query = QueryContext::new("postgresql migration deadlock", "fix the deadlock");
    let matches = matcher::match_patterns(&patterns, &query, DEFAULT_MIN_RELEVANCE);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].kind, PatternKind::Failure);
}

#[test]
fn test_enhancement_succeeds_with_no_matches() {
    let service = EnhanceService::new(vec![model("Claude.Code", Provider::Anthropic)]);
    let client = RecordingClient::new("Polished.");
    let response = service
        .enhance_with_client(&client, &EnhanceRequest::new("polish this"), &[])
        .expect("enhancement");

    assert_eq!(response.enhanced_prompt, "Polished.");
    assert!(response.memory_patterns_used.is_empty());
    let seen = client.seen();
    assert!(!seen.messages[0].content.contains("RELEVANT MEMORY PATTERNS"));
}

//! Pattern knowledge-base loading and normalization.
//!
//! The knowledge base is three JSON documents maintained by hand outside the
//! application, so schema drift is expected. Each document is either a bare
//! array or an object wrapping the array under a named field. Failure
//! records may additionally arrive in an alternate vocabulary; both shapes
//! are normalized here so the rest of the crate only ever sees the canonical
//! record types.
//!
//! Load failures are never fatal: the `try_*` loaders return a
//! [`LoadWarning`] that tests can assert on, and the infallible `load_*`
//! wrappers log it and substitute an empty collection. One unreadable file
//! never blanks out the other two.

use crate::models::{FailurePattern, ProjectTemplate, SuccessPattern};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the success-pattern document.
pub const SUCCESS_PATTERNS_FILE: &str = "success_patterns.json";
/// File name of the failure-pattern document.
pub const FAILURE_PATTERNS_FILE: &str = "failure_patterns.json";
/// File name of the project-template document.
pub const PROJECT_TEMPLATES_FILE: &str = "project_templates.json";

/// Environment variable overriding the knowledge-base directory.
pub const MEMORY_DIR_ENV: &str = "PROMPTMEM_MEMORY_DIR";

/// A non-fatal pattern-file load failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// The file that could not be loaded.
    pub file: PathBuf,
    /// What went wrong.
    pub cause: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load {}: {}", self.file.display(), self.cause)
    }
}

/// The three canonical pattern collections.
///
/// Read-only after load; safe to share across concurrent match operations.
#[derive(Debug, Clone, Default)]
pub struct PatternSets {
    /// Success patterns, in load order.
    pub success: Vec<SuccessPattern>,
    /// Failure patterns, in load order.
    pub failure: Vec<FailurePattern>,
    /// Project templates, in load order.
    pub templates: Vec<ProjectTemplate>,
}

impl PatternSets {
    /// Total number of records across the three families.
    #[must_use]
    pub fn len(&self) -> usize {
        self.success.len() + self.failure.len() + self.templates.len()
    }

    /// Whether all three collections are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Loads and normalizes the pattern knowledge base.
///
/// Reloads from disk on every call; the backing files are hand-edited
/// externally and there is no invalidation hook.
#[derive(Debug, Clone)]
pub struct PatternStore {
    dir: PathBuf,
}

impl PatternStore {
    /// Creates a store rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a store from the environment.
    ///
    /// Resolves `PROMPTMEM_MEMORY_DIR`, then `~/memory`, then `./memory`.
    #[must_use]
    pub fn from_env() -> Self {
        if let Ok(dir) = std::env::var(MEMORY_DIR_ENV) {
            return Self::new(dir);
        }
        let dir = directories::BaseDirs::new()
            .map_or_else(|| PathBuf::from("memory"), |base| base.home_dir().join("memory"));
        Self::new(dir)
    }

    /// The directory this store reads from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads success patterns, or the reason they could not be loaded.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadWarning`] when the file is missing, unreadable, or
    /// not one of the two accepted document shapes.
    pub fn try_load_success_patterns(&self) -> Result<Vec<SuccessPattern>, LoadWarning> {
        self.load_array(SUCCESS_PATTERNS_FILE, "patterns")
    }

    /// Loads success patterns, substituting an empty collection on failure.
    #[must_use]
    pub fn load_success_patterns(&self) -> Vec<SuccessPattern> {
        self.try_load_success_patterns()
            .unwrap_or_else(|warning| {
                tracing::warn!(file = %warning.file.display(), cause = %warning.cause, "skipping success patterns");
                Vec::new()
            })
    }

    /// Loads failure patterns, or the reason they could not be loaded.
    ///
    /// Records in the alternate raw vocabulary are normalized field-by-field
    /// into the canonical shape.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadWarning`] when the file is missing, unreadable, or
    /// not one of the two accepted document shapes.
    pub fn try_load_failure_patterns(&self) -> Result<Vec<FailurePattern>, LoadWarning> {
        let raw: Vec<RawFailurePattern> = self.load_array(FAILURE_PATTERNS_FILE, "patterns")?;
        Ok(raw.into_iter().map(RawFailurePattern::normalize).collect())
    }

    /// Loads failure patterns, substituting an empty collection on failure.
    #[must_use]
    pub fn load_failure_patterns(&self) -> Vec<FailurePattern> {
        self.try_load_failure_patterns()
            .unwrap_or_else(|warning| {
                tracing::warn!(file = %warning.file.display(), cause = %warning.cause, "skipping failure patterns");
                Vec::new()
            })
    }

    /// Loads project templates, or the reason they could not be loaded.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadWarning`] when the file is missing, unreadable, or
    /// not one of the two accepted document shapes.
    pub fn try_load_project_templates(&self) -> Result<Vec<ProjectTemplate>, LoadWarning> {
        self.load_array(PROJECT_TEMPLATES_FILE, "templates")
    }

    /// Loads project templates, substituting an empty collection on failure.
    #[must_use]
    pub fn load_project_templates(&self) -> Vec<ProjectTemplate> {
        self.try_load_project_templates()
            .unwrap_or_else(|warning| {
                tracing::warn!(file = %warning.file.display(), cause = %warning.cause, "skipping project templates");
                Vec::new()
            })
    }

    /// Loads all three collections. Each sub-load fails independently.
    #[must_use]
    pub fn load_all_patterns(&self) -> PatternSets {
        let sets = PatternSets {
            success: self.load_success_patterns(),
            failure: self.load_failure_patterns(),
            templates: self.load_project_templates(),
        };
        tracing::debug!(
            success = sets.success.len(),
            failure = sets.failure.len(),
            templates = sets.templates.len(),
            "loaded pattern knowledge base"
        );
        sets
    }

    /// Reads one document and extracts its record array.
    ///
    /// Accepts a bare array, or an object wrapping the array under
    /// `wrapper_key`. Anything else is a warning.
    fn load_array<T: serde::de::DeserializeOwned>(
        &self,
        file_name: &str,
        wrapper_key: &str,
    ) -> Result<Vec<T>, LoadWarning> {
        let path = self.dir.join(file_name);
        let warn = |cause: String| LoadWarning {
            file: path.clone(),
            cause,
        };

        let data = fs::read_to_string(&path).map_err(|e| warn(e.to_string()))?;
        let value: Value = serde_json::from_str(&data).map_err(|e| warn(e.to_string()))?;

        let records = match value {
            Value::Array(_) => value,
            Value::Object(mut map) => map
                .remove(wrapper_key)
                .filter(Value::is_array)
                .ok_or_else(|| warn(format!("document has no `{wrapper_key}` array")))?,
            _ => return Err(warn("document is neither an array nor an object".to_string())),
        };

        serde_json::from_value(records).map_err(|e| warn(e.to_string()))
    }
}

/// A failure record as it may appear on disk, across both vocabularies.
///
/// Never leaves this module; [`RawFailurePattern::normalize`] produces the
/// canonical [`FailurePattern`].
#[derive(Debug, Default, Deserialize)]
struct RawFailurePattern {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    date: Option<String>,
    problem: Option<String>,
    #[serde(default)]
    symptoms: Vec<String>,
    #[serde(default)]
    common_issues: Vec<String>,
    #[serde(default)]
    warning_signs: Vec<String>,
    root_cause: Option<String>,
    solution: Option<String>,
    resolution: Option<RawResolution>,
    #[serde(default)]
    technologies: Vec<String>,
    tech_stack: Option<BTreeMap<String, Vec<String>>>,
    prevention: Option<String>,
    #[serde(default)]
    diagnostic_commands: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawResolution {
    approach: Option<String>,
    prevention: Option<String>,
}

impl RawFailurePattern {
    /// Maps either vocabulary into the canonical shape.
    ///
    /// Canonical fields win when present; the alternate vocabulary
    /// (`name`/`description`/`common_issues`/`warning_signs`/`resolution`/
    /// `tech_stack`) fills the gaps; anything still unresolved defaults to
    /// empty.
    fn normalize(self) -> FailurePattern {
        let resolution = self.resolution.unwrap_or_default();
        let technologies = if self.technologies.is_empty() {
            self.tech_stack
                .map(|stack| stack.into_values().flatten().collect())
                .unwrap_or_default()
        } else {
            self.technologies
        };
        let symptoms = first_non_empty([self.symptoms, self.common_issues, self.warning_signs]);

        FailurePattern {
            id: self
                .id
                .or_else(|| self.name.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            date: self
                .date
                .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
            problem: self
                .problem
                .or(self.name)
                .or_else(|| self.description.clone())
                .unwrap_or_default(),
            symptoms,
            root_cause: self.root_cause.or(self.description).unwrap_or_default(),
            solution: self.solution.or(resolution.approach).unwrap_or_default(),
            technologies,
            prevention: self
                .prevention
                .or(resolution.prevention)
                .unwrap_or_default(),
            diagnostic_commands: self.diagnostic_commands,
        }
    }
}

/// First non-empty sequence among the candidates, else empty.
fn first_non_empty<const N: usize>(candidates: [Vec<String>; N]) -> Vec<String> {
    candidates
        .into_iter()
        .find(|c| !c.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    fn store(dir: &TempDir) -> PatternStore {
        PatternStore::new(dir.path())
    }

    #[test]
    fn test_load_bare_array() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            SUCCESS_PATTERNS_FILE,
            r#"[{"id": "sp-001", "pattern_name": "Cache aside", "technologies": ["redis"]}]"#,
        );
        let patterns = store(&dir).try_load_success_patterns().unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].id, "sp-001");
        assert_eq!(patterns[0].technologies, vec!["redis"]);
    }

    #[test]
    fn test_load_wrapped_object() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            SUCCESS_PATTERNS_FILE,
            r#"{"patterns": [{"id": "sp-001"}, {"id": "sp-002"}]}"#,
        );
        let patterns = store(&dir).try_load_success_patterns().unwrap();
        assert_eq!(patterns.len(), 2);
    }

    #[test]
    fn test_templates_use_templates_key() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            PROJECT_TEMPLATES_FILE,
            r#"{"templates": [{"id": "tpl-001", "name": "API", "category": "backend"}]}"#,
        );
        let templates = store(&dir).try_load_project_templates().unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].category, "backend");
    }

    #[test]
    fn test_missing_file_yields_warning_and_empty() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let warning = s.try_load_success_patterns().unwrap_err();
        assert!(warning.file.ends_with(SUCCESS_PATTERNS_FILE));
        assert!(s.load_success_patterns().is_empty());
    }

    #[test]
    fn test_malformed_json_yields_warning_and_empty() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, SUCCESS_PATTERNS_FILE, "{not json");
        let s = store(&dir);
        assert!(s.try_load_success_patterns().is_err());
        assert!(s.load_success_patterns().is_empty());
    }

    #[test]
    fn test_object_without_wrapper_key_is_a_warning() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, SUCCESS_PATTERNS_FILE, r#"{"items": []}"#);
        let warning = store(&dir).try_load_success_patterns().unwrap_err();
        assert!(warning.cause.contains("`patterns`"));
    }

    #[test]
    fn test_one_bad_file_does_not_affect_the_others() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, SUCCESS_PATTERNS_FILE, "garbage");
        write_file(
            &dir,
            FAILURE_PATTERNS_FILE,
            r#"[{"id": "fp-001", "problem": "OOM"}]"#,
        );
        write_file(
            &dir,
            PROJECT_TEMPLATES_FILE,
            r#"[{"id": "tpl-001", "name": "API"}]"#,
        );
        let sets = store(&dir).load_all_patterns();
        assert!(sets.success.is_empty());
        assert_eq!(sets.failure.len(), 1);
        assert_eq!(sets.templates.len(), 1);
        assert_eq!(sets.len(), 2);
    }

    #[test]
    fn test_failure_alternate_vocabulary_is_normalized() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            FAILURE_PATTERNS_FILE,
            r#"{"patterns": [{
                "name": "Connection pool exhaustion",
                "description": "Pool ran dry under load",
                "common_issues": ["timeouts", "5xx spikes"],
                "resolution": {
                    "approach": "Raise pool size and add backpressure",
                    "prevention": "Load-test pool limits"
                },
                "tech_stack": {
                    "backend": ["postgresql", "sqlx"],
                    "infra": ["kubernetes"]
                }
            }]}"#,
        );
        let patterns = store(&dir).try_load_failure_patterns().unwrap();
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.id, "Connection pool exhaustion");
        assert_eq!(p.problem, "Connection pool exhaustion");
        assert_eq!(p.symptoms, vec!["timeouts", "5xx spikes"]);
        assert_eq!(p.root_cause, "Pool ran dry under load");
        assert_eq!(p.solution, "Raise pool size and add backpressure");
        assert_eq!(p.prevention, "Load-test pool limits");
        // tech_stack values flattened, key order deterministic.
        assert_eq!(p.technologies, vec!["postgresql", "sqlx", "kubernetes"]);
        assert!(!p.date.is_empty());
    }

    #[test]
    fn test_failure_canonical_fields_win() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            FAILURE_PATTERNS_FILE,
            r#"[{
                "id": "fp-001",
                "date": "2026-01-15",
                "problem": "Deadlock in migration",
                "symptoms": ["hung deploy"],
                "root_cause": "Two transactions locking in opposite order",
                "solution": "Order lock acquisition",
                "technologies": ["postgresql"],
                "prevention": "Lint migrations for lock order"
            }]"#,
        );
        let patterns = store(&dir).try_load_failure_patterns().unwrap();
        let p = &patterns[0];
        assert_eq!(p.id, "fp-001");
        assert_eq!(p.date, "2026-01-15");
        assert_eq!(p.problem, "Deadlock in migration");
        assert_eq!(p.symptoms, vec!["hung deploy"]);
        assert_eq!(p.technologies, vec!["postgresql"]);
    }

    #[test]
    fn test_failure_unresolved_fields_default_empty() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, FAILURE_PATTERNS_FILE, r"[{}]");
        let patterns = store(&dir).try_load_failure_patterns().unwrap();
        let p = &patterns[0];
        assert_eq!(p.id, "unknown");
        assert!(p.problem.is_empty());
        assert!(p.symptoms.is_empty());
        assert!(p.technologies.is_empty());
        assert!(p.prevention.is_empty());
    }

    #[test]
    fn test_reload_per_call_sees_edits() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, SUCCESS_PATTERNS_FILE, r#"[{"id": "sp-001"}]"#);
        let s = store(&dir);
        assert_eq!(s.load_success_patterns().len(), 1);
        write_file(
            &dir,
            SUCCESS_PATTERNS_FILE,
            r#"[{"id": "sp-001"}, {"id": "sp-002"}]"#,
        );
        assert_eq!(s.load_success_patterns().len(), 2);
    }
}

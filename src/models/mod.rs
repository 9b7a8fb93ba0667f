//! Domain models.
//!
//! Canonical in-memory shapes for the three knowledge-base record families,
//! the match type the relevance matcher produces, and the request/response
//! envelope of the enhancement pipeline. Raw on-disk variants never appear
//! here; the store normalizes them at the load boundary.

mod enhance;
mod pattern;

pub use enhance::{EnhanceRequest, EnhanceResponse};
pub use pattern::{
    FailurePattern, MemoryPatternMatch, PatternKind, PatternRef, ProjectTemplate, SuccessPattern,
};

//! Engine error taxonomy (§7).
//!
//! `thiserror` stays in this crate's dependency table for stack
//! alignment, but — matching every error type observed in the source
//! workspace (`ConfigError`, `ScorerError`, `ParseDateError`) — these
//! variants get a hand-written `Display`/`Error` impl rather than the
//! derive macro.

use std::fmt;

/// Fatal errors that abort a turn without mutating the world (phases
/// 1-4) or `resume` (adjudication validation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An invariant `WorldView` mutators enforce was violated: influence
    /// sum > 10, relationship asymmetry, stronghold without influence.
    InvariantViolation(String),
    /// An assignment referenced an unknown id, carried a DC outside
    /// [5,30] for a manual task, set a support flag without a +2
    /// relationship, or omitted a required check for freeform/
    /// initiate-conflict.
    AssignmentInvalid(String),
    /// An adjudication's faction sets did not partition the conflict's
    /// enrolled factions.
    AdjudicationInvalid(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvariantViolation(msg) => write!(f, "invariant violation: {}", msg),
            EngineError::AssignmentInvalid(msg) => write!(f, "invalid assignment: {}", msg),
            EngineError::AdjudicationInvalid(msg) => write!(f, "invalid adjudication: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;

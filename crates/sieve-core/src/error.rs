//! Error taxonomy shared across the engine.
//!
//! Parse and direct API-misuse errors are returned immediately; validation
//! and transformation problems are collected by a reporter and only
//! surfaced in aggregate (see `sieve-lib`). Evaluation-protocol violations
//! indicate a bug in a call implementation, never bad user input.

/// Result alias used throughout the workspace.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

/// Malformed expression text. Positions are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse error at {position}: {message}")]
pub struct ParseError {
    pub position: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    /// Malformed expression text.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// API misuse: singular node, ownership violation, bad argument.
    #[error("invalid argument: {0}")]
    Inval(String),

    /// Lookup of a node or root the graph does not know about.
    #[error("no such entity: {0}")]
    NoEnt(String),

    /// A validation pass completed and reported at least one error.
    #[error("validation failed with {errors} error(s)")]
    ValidationFailed { errors: usize },

    /// The transformation fixed point was not reached within the round
    /// limit. Distinct from "converged with errors".
    #[error("transformation did not converge after {rounds} round(s)")]
    TransformDivergence { rounds: usize },

    /// Evaluation-state protocol violation (double finish, mutate after
    /// finish, conflicting binding mode).
    #[error("evaluation state error: {0}")]
    EvalState(String),
}

impl CoreError {
    pub fn einval(message: impl Into<String>) -> Self {
        Self::Inval(message.into())
    }

    pub fn enoent(message: impl Into<String>) -> Self {
        Self::NoEnt(message.into())
    }

    pub fn eval_state(message: impl Into<String>) -> Self {
        Self::EvalState(message.into())
    }
}

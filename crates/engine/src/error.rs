//! Shared error types for the engine crate.
//!
//! Only two conditions are caller-visible failures: invalid state-machine
//! transitions (the `SessionError` variants) and catalog exhaustion
//! (`SelectionError::Exhausted`). Provider-level faults are recovered
//! locally: a failed load query degrades to a null score, a failed or
//! invalid generation degrades to exhaustion.

use thiserror::Error;

use catalog::CatalogError;
use trainer_core::model::ScenarioId;

/// Faults from external providers (load estimator, content generator).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("provider is not configured")]
    Disabled,

    #[error("provider request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("provider call timed out")]
    Timeout,

    #[error("provider returned malformed output: {0}")]
    Malformed(String),
}

/// Errors emitted by `ScenarioSelector`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SelectionError {
    /// No unseen scenario exists at any difficulty and no generator could
    /// produce a valid one. A reported condition, not a crash; the caller
    /// decides whether to end the session.
    #[error("scenario catalog exhausted")]
    Exhausted,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Errors emitted by `SessionManager`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("a session is already active on this manager")]
    AlreadyActive,

    #[error("no active session")]
    NotActive,

    #[error("session is closed")]
    Closed,

    #[error("response for scenario {got} does not match the last issued scenario {expected:?}")]
    UnexpectedResponse {
        expected: Option<ScenarioId>,
        got: ScenarioId,
    },

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

//! Error types for muster executions.
//!
//! The engine reports failures through [`MusterError`], a strongly-typed
//! enumeration of everything that can go wrong while resolving a computation.
//! Public operations return [`anyhow::Result`], so callers get the full
//! context chain (the failing source's own error is attached as the cause)
//! while still being able to recover the typed variant:
//!
//! ```rust,no_run
//! use muster::MusterError;
//!
//! fn classify(err: &anyhow::Error) -> &'static str {
//!     match err.downcast_ref::<MusterError>() {
//!         Some(MusterError::FetchFailed { .. }) => "one source failed",
//!         Some(MusterError::IncompleteBatch { .. }) => "batch contract violated",
//!         _ => "something else",
//!     }
//! }
//! ```
//!
//! The first failure observed in a round aborts that round and the whole
//! `execute`/`run` call. No partial results are returned and nothing is
//! retried; retry and backoff belong to the caller's [`DataSource`] or
//! [`Executor`] implementations.
//!
//! [`DataSource`]: crate::DataSource
//! [`Executor`]: crate::Executor

use thiserror::Error;

use crate::core::source::{Key, Kind};

/// Failure modes of a muster execution.
///
/// Variants carry the `(kind, key)` coordinates of the request that failed so
/// callers can tell which source aborted the round.
#[derive(Debug, Error)]
pub enum MusterError {
    /// An individually dispatched fetch failed. The source's own error is
    /// attached as the cause in the surrounding context chain.
    #[error("fetch for {kind}/{key} failed")]
    FetchFailed {
        /// Kind tag of the failing source.
        kind: Kind,
        /// Identity of the failing request within its kind.
        key: Key,
    },

    /// A batched fetch for a whole kind group failed.
    #[error("batched fetch for kind '{kind}' failed")]
    BatchFailed {
        /// Kind tag of the failing group.
        kind: Kind,
    },

    /// A batched fetch completed but omitted one or more of the keys it was
    /// asked for. Accepting such a response would leave the omitted requests
    /// permanently unresolved, so the round is failed instead.
    #[error("batched fetch for kind '{kind}' returned no value for keys {missing:?}")]
    IncompleteBatch {
        /// Kind tag of the offending group.
        kind: Kind,
        /// Requested keys with no entry in the response.
        missing: Vec<Key>,
    },

    /// `traverse` resolved its source node to a value that the value type
    /// cannot expose as a sequence ([`FetchValue::into_seq`] returned `None`).
    ///
    /// [`FetchValue::into_seq`]: crate::FetchValue::into_seq
    #[error("traverse expects its source node to resolve to a sequence")]
    NotASequence,

    /// The scheduling policy lost a fetch task, e.g. the spawned task
    /// panicked or was aborted out from under the engine.
    #[error("scheduling policy lost the fetch task: {reason}")]
    ExecutorFailure {
        /// Human-readable description of what the policy reported.
        reason: String,
    },
}

//! Scheduling policies for fetch tasks.
//!
//! Every dispatch a round makes, batched or individual, runs through an
//! [`Executor`]. The policy decides *where* the task runs (ambient task
//! queue, current task, a pool of its own) but must hand back the task's
//! outcome unchanged: the engine relies on success and failure passing
//! through untouched.
//!
//! Two policies ship with the crate:
//!
//! - [`TokioExecutor`] (the default) spawns onto the ambient tokio runtime,
//!   so fetches from one round proceed in parallel with each other and with
//!   whatever else the runtime is driving.
//! - [`InlineExecutor`] returns the task as-is, running it on the caller's
//!   own poll. Same-round fetches still interleave cooperatively, which
//!   makes call accounting in tests deterministic without a multithreaded
//!   runtime.

use std::collections::HashMap;

use anyhow::Result;
use futures::future::BoxFuture;

use crate::core::error::MusterError;
use crate::core::source::Key;

/// A dispatched fetch: resolves to the keyed responses it produced.
///
/// Individual fetches produce a single-entry map; batched fetches produce
/// one entry per key in their group.
pub type FetchTask<V> = BoxFuture<'static, Result<HashMap<Key, V>>>;

/// A policy for running fetch tasks.
///
/// Implementations must preserve the task's result: no swallowing errors,
/// no substituting values. Anything else (queueing, pooling, instrumenting,
/// deadline enforcement) is fair game.
pub trait Executor<V>: Send + Sync {
    /// Hands `task` to the policy and returns a future for its outcome.
    fn execute(&self, task: FetchTask<V>) -> FetchTask<V>;
}

/// Default policy: defer to the ambient tokio task queue.
///
/// The task is spawned immediately (fire-and-continue), so sibling
/// dispatches in a round run concurrently even before the engine awaits
/// them. Requires a running tokio runtime; a lost task (panic or abort)
/// surfaces as [`MusterError::ExecutorFailure`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioExecutor;

impl<V: Send + 'static> Executor<V> for TokioExecutor {
    fn execute(&self, task: FetchTask<V>) -> FetchTask<V> {
        let handle = tokio::task::spawn(task);
        Box::pin(async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(err) => Err(MusterError::ExecutorFailure { reason: err.to_string() }.into()),
            }
        })
    }
}

/// Run the task inline on whichever task awaits it.
///
/// No spawning and no parallelism; concurrency within a round comes only
/// from the engine joining its dispatches cooperatively.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl<V> Executor<V> for InlineExecutor {
    fn execute(&self, task: FetchTask<V>) -> FetchTask<V> {
        task
    }
}

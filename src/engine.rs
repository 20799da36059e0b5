//! The round-based interpreter.
//!
//! Resolving a tree proceeds in synchronized rounds. Each round injects the
//! cache into the tree, collects the unfetched leaves that remain, dispatches
//! them through the scheduling policy, and merges the responses back into the
//! cache for the next round:
//!
//! ```text
//! inject -> collect -> dispatch -> merge -> inject -> ...
//! ```
//!
//! The dispatch step is the only suspension point and acts as a barrier: a
//! new round's injection begins only after every fetch of the current round
//! has completed. Within a round fetches run concurrently with no ordering
//! guarantees; responses merge by key, so completion order cannot affect the
//! result. A round with nothing to dispatch but an unresolved tree (a flat
//! transform just produced new structure) loops straight into the next
//! injection.
//!
//! The loop is iterative, so executions with many rounds cost no call-stack
//! depth.
//!
//! # Example
//!
//! ```rust
//! use futures::future::BoxFuture;
//! use serde_json::{Value, json};
//! use muster::{ExecuteOptions, DataSource, Key, Kind, map, request, run};
//!
//! struct UserName {
//!     id: u64,
//! }
//!
//! impl DataSource<Value> for UserName {
//!     fn kind(&self) -> Kind {
//!         "user-name"
//!     }
//!
//!     fn identity(&self) -> Key {
//!         self.id.to_string()
//!     }
//!
//!     fn fetch(&self, _env: &()) -> BoxFuture<'static, anyhow::Result<Value>> {
//!         let id = self.id;
//!         Box::pin(async move { Ok(json!(format!("user-{id}"))) })
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let greeting = map(
//!         |mut values: Vec<Value>| {
//!             json!(format!("hello {}", values.remove(0).as_str().unwrap_or_default()))
//!         },
//!         vec![request(UserName { id: 7 })],
//!     );
//!     let result = run(greeting, ExecuteOptions::default()).await?;
//!     assert_eq!(result, json!("hello user-7"));
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, trace};

use crate::ast::Node;
use crate::cache::Cache;
use crate::core::value::FetchValue;
use crate::dispatch::dispatch_round;
use crate::executor::{Executor, TokioExecutor};

/// Per-call configuration for [`execute`] and [`run`].
///
/// Every field is individually overridable and every call gets its own
/// instance; there is no shared default state between executions.
///
/// ```rust
/// use std::sync::Arc;
/// use muster::{Cache, ExecuteOptions, InlineExecutor};
/// use serde_json::{Value, json};
///
/// let options: ExecuteOptions<Value> = ExecuteOptions::default()
///     .with_cache(Cache::new().seed("friends", [("1".to_string(), json!([0]))]))
///     .with_executor(Arc::new(InlineExecutor));
/// ```
pub struct ExecuteOptions<V, E = ()> {
    /// Starting cache; seeded entries resolve without fetching. Defaults to
    /// empty.
    pub cache: Cache<V>,
    /// Scheduling policy for fetch tasks. Defaults to [`TokioExecutor`].
    pub executor: Arc<dyn Executor<V>>,
    /// Opaque environment passed unchanged to every fetch.
    pub env: E,
}

impl<V: FetchValue, E: Default> Default for ExecuteOptions<V, E> {
    fn default() -> Self {
        Self::new(E::default())
    }
}

impl<V: FetchValue, E> ExecuteOptions<V, E> {
    /// Creates options with the given environment and the default cache and
    /// executor.
    pub fn new(env: E) -> Self {
        Self {
            cache: Cache::new(),
            executor: Arc::new(TokioExecutor),
            env,
        }
    }

    /// Replaces the starting cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Cache<V>) -> Self {
        self.cache = cache;
        self
    }

    /// Replaces the scheduling policy.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn Executor<V>>) -> Self {
        self.executor = executor;
        self
    }

    /// Replaces the environment.
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.env = env;
        self
    }
}

/// Resolves `node` to its terminal value, returning the value together with
/// the final cache.
///
/// The cache covers everything fetched during this execution (plus whatever
/// the caller seeded) and can be carried into a follow-up execution to reuse
/// the responses.
///
/// # Errors
///
/// Fails on the first fetch failure, batched-response contract violation, or
/// flat-transform defect of any round. No partial results are returned.
pub async fn execute<V, E>(node: Node<V, E>, options: ExecuteOptions<V, E>) -> Result<(V, Cache<V>)>
where
    V: FetchValue,
    E: Send + Sync,
{
    let ExecuteOptions { mut cache, executor, env } = options;
    let mut node = node;
    let mut round: u64 = 0;

    loop {
        node = match node.inject(&cache)?.into_resolved() {
            Ok(value) => {
                debug!(rounds = round, "computation resolved");
                return Ok((value, cache));
            }
            Err(unresolved) => unresolved,
        };

        let pending = node.pending_sources();
        if pending.is_empty() {
            // a flat transform produced new structure; no fetches needed yet
            trace!(round, "structural progress without dispatch");
            continue;
        }

        round += 1;
        debug!(round, requests = pending.len(), "dispatching round");
        let responses = dispatch_round(pending, &executor, &env).await?;
        cache = cache.merge(responses);
    }
}

/// Resolves `node` to its terminal value, discarding the final cache.
///
/// Identical to [`execute`] otherwise, including its failure behavior.
pub async fn run<V, E>(node: Node<V, E>, options: ExecuteOptions<V, E>) -> Result<V>
where
    V: FetchValue,
    E: Send + Sync,
{
    execute(node, options).await.map(|(value, _cache)| value)
}

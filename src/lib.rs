//! muster - declarative concurrent data fetching
//!
//! Callers describe a computation as a composition of remote-data requests
//! and pure transforms; muster resolves it while automatically:
//!
//! - **Deduplicating** identical requests - the same `(kind, key)` is
//!   fetched at most once per execution
//! - **Batching** same-kind requests into a single round trip when the
//!   source supports it
//! - **Caching** every resolved value for the rest of the execution
//! - **Fetching concurrently** - independent requests in a round run in
//!   parallel, with no ordering assumptions between them
//!
//! Execution proceeds in synchronized rounds (inject cached values, collect
//! what is still unfetched, dispatch, merge responses) until the whole
//! computation is resolved.
//!
//! # Architecture
//!
//! - [`core`] - the [`DataSource`] contract (`kind`/`identity`/`fetch`/
//!   `fetch_multi`), the [`FetchValue`] capability, and [`MusterError`]
//! - [`ast`] - the deferred-computation tree and its builders: [`value`],
//!   [`request`], [`map`], [`mapcat`], [`collect`], [`traverse`]
//! - [`cache`] - the immutable per-execution response [`Cache`]
//! - [`executor`] - scheduling policies: [`TokioExecutor`] (ambient
//!   runtime, the default) and [`InlineExecutor`]
//! - [`engine`] - [`ExecuteOptions`] plus the [`execute`] / [`run`] entry
//!   points driving the round loop
//!
//! # Quick start
//!
//! Describe your remote data as [`DataSource`] implementations, compose a
//! tree, and run it:
//!
//! ```rust
//! use futures::future::BoxFuture;
//! use serde_json::{Value, json};
//! use muster::{DataSource, ExecuteOptions, Key, Kind, collect, request, run};
//!
//! struct FriendsOf {
//!     user: u64,
//! }
//!
//! impl DataSource<Value> for FriendsOf {
//!     fn kind(&self) -> Kind {
//!         "friends"
//!     }
//!
//!     fn identity(&self) -> Key {
//!         self.user.to_string()
//!     }
//!
//!     fn fetch(&self, _env: &()) -> BoxFuture<'static, anyhow::Result<Value>> {
//!         let user = self.user;
//!         Box::pin(async move { Ok(json!((0..user).collect::<Vec<_>>())) })
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     // friends of 2 and of 3, fetched concurrently in one round; the
//!     // duplicate request for 3 is deduplicated away
//!     let tree = collect(vec![
//!         request(FriendsOf { user: 2 }),
//!         request(FriendsOf { user: 3 }),
//!         request(FriendsOf { user: 3 }),
//!     ]);
//!     let resolved = run(tree, ExecuteOptions::default()).await?;
//!     assert_eq!(resolved, json!([[0, 1], [0, 1, 2], [0, 1, 2]]));
//!     Ok(())
//! }
//! ```
//!
//! Dependent fetches chain with [`mapcat`] and [`traverse`]; the engine
//! keeps fetching in rounds until nothing is left unresolved. See
//! [`engine`] for the round semantics and [`core::source`] for the batching
//! contract.
//!
//! # Scope
//!
//! muster coordinates fetches within a single process and a single
//! execution. It does not retry failures, persist the cache across
//! executions, or talk to the network itself - sources own their wire
//! protocol, and retry/backoff policy belongs in the source or a custom
//! [`Executor`].

pub mod ast;
pub mod cache;
pub mod core;
mod dispatch;
pub mod engine;
pub mod executor;

pub use crate::ast::{Node, collect, map, mapcat, request, traverse, value};
pub use crate::cache::{Cache, Responses};
pub use crate::core::{DataSource, FetchValue, Key, Kind, MusterError};
pub use crate::engine::{ExecuteOptions, execute, run};
pub use crate::executor::{Executor, FetchTask, InlineExecutor, TokioExecutor};

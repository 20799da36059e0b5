//! The remote data source contract.
//!
//! A [`DataSource`] is the engine's only window onto the outside world: it
//! names itself with a stable `(kind, key)` pair and knows how to fetch its
//! own value, optionally as part of a same-kind batch. Everything else the
//! engine does (deduplication, caching, grouping, round scheduling) is
//! derived from this contract.
//!
//! # Identity and grouping
//!
//! - [`DataSource::kind`] is an explicit, caller-declared tag shared by every
//!   instance of the same logical source type. It is the unit of grouping and
//!   batching: all same-kind requests collected in one round are dispatched
//!   together. Declare it as a constant; deriving it from a type name would
//!   make grouping incidental rather than intentional.
//! - [`DataSource::identity`] distinguishes requests within a kind. Two
//!   sources with equal `(kind, identity)` are treated as the same request:
//!   only one of them is fetched per round, and a cached value satisfies both
//!   for the rest of the execution.
//!
//! # Batched fetches
//!
//! A source type opts into batching by returning `Some` from
//! [`DataSource::fetch_multi`]. When a round collects two or more distinct
//! requests of one kind, the engine calls `fetch_multi` once on the group's
//! representative, passing the entire deduplicated group (the representative
//! included). The response must contain a value for every key in the group;
//! the engine fails the round otherwise, because silently dropping a key
//! would leave its requesters unresolvable.
//!
//! # Example
//!
//! ```rust
//! use futures::future::BoxFuture;
//! use serde_json::{json, Value};
//! use muster::{DataSource, Key, Kind};
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
//!         Box::pin(async move {
//!             // a real implementation would hit the network here
//!             Ok(json!((0..user).collect::<Vec<_>>()))
//!         })
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;

/// Grouping tag shared by all sources of one logical type.
///
/// Requests with the same kind collected in one round are dispatched as a
/// group, and batched together when the source supports it.
pub type Kind = &'static str;

/// Per-request identity, unique within a kind and stable for one execution.
pub type Key = String;

/// A remote data source the engine can fetch on the caller's behalf.
///
/// `V` is the resolved value type and `E` an opaque environment passed
/// through to every fetch unchanged (connection pools, credentials,
/// deadlines). The engine never inspects `E`.
///
/// Implementations must be cheap to construct: an instance describes a
/// single request, and computations routinely create many instances that
/// the engine then deduplicates by `(kind, identity)`.
pub trait DataSource<V, E = ()>: Send + Sync {
    /// The caller-declared grouping tag for this source type.
    ///
    /// Must be identical for all instances meant to be grouped or batched
    /// together, and should be unique across source types to keep their
    /// cache entries apart.
    fn kind(&self) -> Kind;

    /// The identity of this particular request within its kind.
    ///
    /// Must be stable and comparable for the lifetime of one execution;
    /// it is the deduplication and cache key.
    fn identity(&self) -> Key;

    /// Fetch this source's value.
    ///
    /// The future must be `'static`: implementations clone whatever they
    /// need out of `env` rather than borrowing it, so the scheduling policy
    /// is free to move the task onto the ambient task queue.
    ///
    /// # Errors
    ///
    /// Any error fails the round and the whole execution; the engine does
    /// not retry.
    fn fetch(&self, env: &E) -> BoxFuture<'static, Result<V>>;

    /// Fetch a whole same-kind group in one round trip.
    ///
    /// Returning `Some` declares batch support for this source's kind.
    /// `peers` is the entire deduplicated group for the current round,
    /// including `self`. The returned mapping must contain a value for
    /// every key in the group.
    ///
    /// The default implementation returns `None`, which makes the engine
    /// fall back to concurrent individual fetches.
    fn fetch_multi(
        &self,
        peers: &[Arc<dyn DataSource<V, E>>],
        env: &E,
    ) -> Option<BoxFuture<'static, Result<HashMap<Key, V>>>> {
        let _ = (peers, env);
        None
    }
}

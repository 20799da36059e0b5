//! Per-round request dispatch.
//!
//! Takes the unfetched sources collected from an injected tree and turns
//! them into one round's worth of responses:
//!
//! 1. **Dedup** - requests with equal `(kind, identity)` collapse to their
//!    first occurrence; later duplicates are equivalent by contract.
//!    Deduplication is per kind-and-key, never by key alone, since distinct
//!    kinds may reuse the same key space.
//! 2. **Group** - surviving requests are grouped by kind, preserving
//!    first-seen order.
//! 3. **Strategy** - a singleton group is fetched individually. A larger
//!    group whose representative supports [`DataSource::fetch_multi`] gets
//!    exactly one batched call carrying the whole group; otherwise every
//!    member is fetched individually and concurrently.
//! 4. **Join** - all kind groups run concurrently with each other, every
//!    task routed through the round's [`Executor`]. The first failure
//!    aborts the round; sibling fetches may still finish but their
//!    outcomes are discarded.
//!
//! Batched responses are checked for completeness before they are accepted:
//! a reply that omits a requested key would strand that request forever, so
//! it fails the round instead.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::try_join_all;
use tracing::{debug, trace, warn};

use crate::cache::Responses;
use crate::core::error::MusterError;
use crate::core::source::{DataSource, Key, Kind};
use crate::core::value::FetchValue;
use crate::executor::{Executor, FetchTask};

type SharedSource<V, E> = Arc<dyn DataSource<V, E>>;

/// Resolves one round of collected requests into keyed responses per kind.
pub(crate) async fn dispatch_round<V, E>(
    sources: Vec<SharedSource<V, E>>,
    executor: &Arc<dyn Executor<V>>,
    env: &E,
) -> Result<Responses<V>>
where
    V: FetchValue,
    E: Send + Sync,
{
    let groups = group_by_kind(dedup_sources(sources));
    debug!(kinds = groups.len(), "dispatching request groups");

    let group_futures = groups.into_iter().map(|(kind, group)| async move {
        let responses = fetch_group(kind, group, executor, env).await?;
        Ok::<_, anyhow::Error>((kind, responses))
    });

    let fetched = try_join_all(group_futures).await?;
    Ok(fetched.into_iter().collect())
}

/// Collapses duplicate `(kind, key)` requests, keeping first occurrences in
/// their original order.
fn dedup_sources<V, E>(sources: Vec<SharedSource<V, E>>) -> Vec<SharedSource<V, E>> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|source| seen.insert((source.kind(), source.identity())))
        .collect()
}

/// Groups deduplicated sources by kind, preserving first-seen group order.
fn group_by_kind<V, E>(sources: Vec<SharedSource<V, E>>) -> Vec<(Kind, Vec<SharedSource<V, E>>)> {
    let mut slots: HashMap<Kind, usize> = HashMap::new();
    let mut groups: Vec<(Kind, Vec<SharedSource<V, E>>)> = Vec::new();
    for source in sources {
        let kind = source.kind();
        let slot = *slots.entry(kind).or_insert_with(|| {
            groups.push((kind, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(source);
    }
    groups
}

async fn fetch_group<V, E>(
    kind: Kind,
    group: Vec<SharedSource<V, E>>,
    executor: &Arc<dyn Executor<V>>,
    env: &E,
) -> Result<HashMap<Key, V>>
where
    V: FetchValue,
    E: Send + Sync,
{
    if group.len() > 1 {
        if let Some(task) = group[0].fetch_multi(&group, env) {
            trace!(kind, size = group.len(), "batched fetch");
            return await_batch(kind, &group, executor.execute(task)).await;
        }
    }

    trace!(kind, size = group.len(), "individual fetches");
    let tasks: Vec<FetchTask<V>> =
        group.iter().map(|source| individual_fetch(kind, source, env, executor)).collect();
    let maps = try_join_all(tasks).await?;

    let mut responses = HashMap::with_capacity(maps.len());
    for map in maps {
        responses.extend(map);
    }
    Ok(responses)
}

/// Wraps a single source's fetch as a keyed task and hands it to the
/// scheduling policy. The task starts as soon as the policy decides it
/// does, not when the caller awaits.
fn individual_fetch<V, E>(
    kind: Kind,
    source: &SharedSource<V, E>,
    env: &E,
    executor: &Arc<dyn Executor<V>>,
) -> FetchTask<V>
where
    V: FetchValue,
{
    let key = source.identity();
    let fetch = source.fetch(env);
    let task: FetchTask<V> = Box::pin(async move {
        let value = fetch
            .await
            .with_context(|| MusterError::FetchFailed { kind, key: key.clone() })?;
        Ok(HashMap::from([(key, value)]))
    });
    executor.execute(task)
}

async fn await_batch<V, E>(
    kind: Kind,
    group: &[SharedSource<V, E>],
    running: FetchTask<V>,
) -> Result<HashMap<Key, V>> {
    let responses = running.await.with_context(|| MusterError::BatchFailed { kind })?;

    let requested: HashSet<Key> = group.iter().map(|source| source.identity()).collect();
    let missing: Vec<Key> =
        requested.iter().filter(|key| !responses.contains_key(*key)).cloned().collect();
    if !missing.is_empty() {
        return Err(MusterError::IncompleteBatch { kind, missing }.into());
    }

    let extra = responses.keys().filter(|key| !requested.contains(*key)).count();
    if extra > 0 {
        warn!(kind, extra, "batched response carries keys outside the requested group");
    }
    Ok(responses)
}

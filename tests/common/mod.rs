//! Shared fixture sources for the engine integration tests.
//!
//! Each source simulates a remote endpoint with a small latency and records
//! its wire activity in a [`CallLog`], so tests can assert how many fetches
//! and batched calls actually happened and in which order they completed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use tokio::time::sleep;

use muster::{DataSource, Key, Kind, Node, request};

const SIMULATED_LATENCY: Duration = Duration::from_millis(5);

/// Installs a log subscriber once, so `RUST_LOG=muster=debug` shows round
/// activity while the tests run.
fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Records every wire call the fixture sources make.
#[derive(Clone, Default)]
pub struct CallLog {
    fetches: Arc<AtomicUsize>,
    batches: Arc<AtomicUsize>,
    completions: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        init_tracing();
        Self::default()
    }

    /// Number of individual `fetch` calls made so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of batched `fetch_multi` calls made so far.
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    /// Kind labels in the order their fetches finished.
    pub fn completions(&self) -> Vec<String> {
        self.completions.lock().unwrap().clone()
    }

    fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::SeqCst);
    }

    fn record_batch(&self) {
        self.batches.fetch_add(1, Ordering::SeqCst);
    }

    fn record_completion(&self, label: &str) {
        self.completions.lock().unwrap().push(label.to_string());
    }
}

/// `friends/<id>` resolves to the integer list `[0, id)`.
pub struct FriendsOf {
    id: u64,
    delay: Duration,
    log: CallLog,
}

impl FriendsOf {
    pub fn node(id: u64, log: &CallLog) -> Node<Value> {
        Self::node_with_delay(id, SIMULATED_LATENCY, log)
    }

    pub fn node_with_delay(id: u64, delay: Duration, log: &CallLog) -> Node<Value> {
        request(Self { id, delay, log: log.clone() })
    }
}

impl DataSource<Value> for FriendsOf {
    fn kind(&self) -> Kind {
        "friends"
    }

    fn identity(&self) -> Key {
        self.id.to_string()
    }

    fn fetch(&self, _env: &()) -> BoxFuture<'static, Result<Value>> {
        self.log.record_fetch();
        let (id, delay, log) = (self.id, self.delay, self.log.clone());
        Box::pin(async move {
            sleep(delay).await;
            log.record_completion("friends");
            Ok(json!((0..id).collect::<Vec<_>>()))
        })
    }
}

/// `activity/<id>` resolves to `id + 1`.
pub struct Activity {
    id: u64,
    log: CallLog,
}

impl Activity {
    pub fn node(id: u64, log: &CallLog) -> Node<Value> {
        request(Self { id, log: log.clone() })
    }
}

impl DataSource<Value> for Activity {
    fn kind(&self) -> Kind {
        "activity"
    }

    fn identity(&self) -> Key {
        self.id.to_string()
    }

    fn fetch(&self, _env: &()) -> BoxFuture<'static, Result<Value>> {
        self.log.record_fetch();
        let (id, log) = (self.id, self.log.clone());
        Box::pin(async move {
            sleep(SIMULATED_LATENCY).await;
            log.record_completion("activity");
            Ok(json!(id + 1))
        })
    }
}

/// Like [`Activity`], but the whole kind group resolves through one
/// `fetch_multi` round trip.
pub struct BatchedActivity {
    id: u64,
    log: CallLog,
}

impl BatchedActivity {
    pub fn node(id: u64, log: &CallLog) -> Node<Value> {
        request(Self { id, log: log.clone() })
    }
}

impl DataSource<Value> for BatchedActivity {
    fn kind(&self) -> Kind {
        "batched-activity"
    }

    fn identity(&self) -> Key {
        self.id.to_string()
    }

    fn fetch(&self, _env: &()) -> BoxFuture<'static, Result<Value>> {
        self.log.record_fetch();
        let (id, log) = (self.id, self.log.clone());
        Box::pin(async move {
            sleep(SIMULATED_LATENCY).await;
            log.record_completion("batched-activity");
            Ok(json!(id + 1))
        })
    }

    fn fetch_multi(
        &self,
        peers: &[Arc<dyn DataSource<Value, ()>>],
        _env: &(),
    ) -> Option<BoxFuture<'static, Result<HashMap<Key, Value>>>> {
        self.log.record_batch();
        let log = self.log.clone();
        let ids: Vec<u64> =
            peers.iter().map(|peer| peer.identity().parse().unwrap()).collect();
        Some(Box::pin(async move {
            sleep(SIMULATED_LATENCY).await;
            log.record_completion("batched-activity");
            Ok(ids.into_iter().map(|id| (id.to_string(), json!(id + 1))).collect())
        }))
    }
}

/// `pet/<id>` resolves to `"DOG"`.
pub struct Pet {
    id: u64,
    delay: Duration,
    log: CallLog,
}

impl Pet {
    pub fn node(id: u64, log: &CallLog) -> Node<Value> {
        Self::node_with_delay(id, SIMULATED_LATENCY, log)
    }

    pub fn node_with_delay(id: u64, delay: Duration, log: &CallLog) -> Node<Value> {
        request(Self { id, delay, log: log.clone() })
    }
}

impl DataSource<Value> for Pet {
    fn kind(&self) -> Kind {
        "pet"
    }

    fn identity(&self) -> Key {
        self.id.to_string()
    }

    fn fetch(&self, _env: &()) -> BoxFuture<'static, Result<Value>> {
        self.log.record_fetch();
        let (delay, log) = (self.delay, self.log.clone());
        Box::pin(async move {
            sleep(delay).await;
            log.record_completion("pet");
            Ok(json!("DOG"))
        })
    }
}

/// Always fails at the wire.
pub struct Failing;

impl Failing {
    pub fn node() -> Node<Value> {
        request(Self)
    }
}

impl DataSource<Value> for Failing {
    fn kind(&self) -> Kind {
        "flaky"
    }

    fn identity(&self) -> Key {
        "0".to_string()
    }

    fn fetch(&self, _env: &()) -> BoxFuture<'static, Result<Value>> {
        Box::pin(async { Err(anyhow!("remote exploded")) })
    }
}

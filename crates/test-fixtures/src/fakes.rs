//! In-memory fakes: scripted layers, scripted inference, and a routing cache
//! driven by a manual clock.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use strata_core::errors::{InferenceError, LayerError};
use strata_core::models::{LayerId, LayerItem, RoutingCacheKey, RoutingResult};
use strata_core::traits::{InferenceClient, LayerQueryOptions, MemoryLayer, RoutingCache};

/// Returns the same items for every query and counts calls.
pub struct StaticLayer {
    id: LayerId,
    items: Vec<LayerItem>,
    calls: AtomicUsize,
}

impl StaticLayer {
    pub fn new(id: LayerId, items: &[(&str, f64)]) -> Self {
        Self {
            id,
            items: items.iter().map(|(c, s)| LayerItem::new(*c, *s)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MemoryLayer for StaticLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    async fn query(&self, _text: &str, _opts: &LayerQueryOptions) -> Result<Vec<LayerItem>, LayerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.clone())
    }
}

/// Always fails.
pub struct FailingLayer {
    id: LayerId,
}

impl FailingLayer {
    pub fn new(id: LayerId) -> Self {
        Self { id }
    }
}

#[async_trait]
impl MemoryLayer for FailingLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    async fn query(&self, _text: &str, _opts: &LayerQueryOptions) -> Result<Vec<LayerItem>, LayerError> {
        Err(LayerError::QueryFailed {
            layer: self.id,
            reason: "backend unavailable".to_string(),
        })
    }
}

/// Sleeps before answering. Queries containing a registered substring use that
/// delay, others the default. Stops early when cancelled.
pub struct DelayedLayer {
    id: LayerId,
    default_delay: Duration,
    delays: Vec<(String, Duration)>,
}

impl DelayedLayer {
    pub fn new(id: LayerId, default_delay: Duration) -> Self {
        Self {
            id,
            default_delay,
            delays: Vec::new(),
        }
    }

    pub fn with_delay(mut self, substring: &str, delay: Duration) -> Self {
        self.delays.push((substring.to_lowercase(), delay));
        self
    }

    fn delay_for(&self, text: &str) -> Duration {
        let text = text.to_lowercase();
        self.delays
            .iter()
            .find(|(s, _)| text.contains(s.as_str()))
            .map(|(_, d)| *d)
            .unwrap_or(self.default_delay)
    }
}

#[async_trait]
impl MemoryLayer for DelayedLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    async fn query(&self, text: &str, opts: &LayerQueryOptions) -> Result<Vec<LayerItem>, LayerError> {
        tokio::select! {
            _ = opts.cancel.cancelled() => Err(LayerError::Cancelled { layer: self.id }),
            _ = tokio::time::sleep(self.delay_for(text)) => {
                Ok(vec![LayerItem::new(format!("{} context for {text}", self.id), 0.8)])
            }
        }
    }
}

/// Returns corpus entries sharing at least one word with the query, scored by
/// the fraction of query words they contain.
pub struct KeywordLayer {
    id: LayerId,
    corpus: Vec<String>,
}

impl KeywordLayer {
    pub fn new(id: LayerId, corpus: &[&str]) -> Self {
        Self {
            id,
            corpus: corpus.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl MemoryLayer for KeywordLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    async fn query(&self, text: &str, opts: &LayerQueryOptions) -> Result<Vec<LayerItem>, LayerError> {
        let query_words = words(text);
        if query_words.is_empty() {
            return Ok(Vec::new());
        }
        let mut hits: Vec<LayerItem> = self
            .corpus
            .iter()
            .filter_map(|entry| {
                let overlap = words(entry).intersection(&query_words).count();
                (overlap > 0).then(|| {
                    LayerItem::new(entry.clone(), overlap as f64 / query_words.len() as f64)
                })
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(opts.limit);
        Ok(hits)
    }
}

/// Replays queued responses in order; once the queue is empty every call fails
/// as unavailable. Optional per-call delay.
pub struct ScriptedInference {
    responses: Mutex<VecDeque<Result<Value, InferenceError>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedInference {
    pub fn new(responses: Vec<Result<Value, InferenceError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceClient for ScriptedInference {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete_json(&self, _prompt: &str, _schema: &Value) -> Result<Value, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        next.unwrap_or_else(|| {
            Err(InferenceError::Unavailable {
                provider: "scripted".to_string(),
            })
        })
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms.load(Ordering::SeqCst))
    }
}

/// Routing cache whose TTL is measured on a [`ManualClock`]. Capacity evicts the
/// oldest entry.
pub struct FakeRoutingCache {
    clock: ManualClock,
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<RoutingCacheKey, (RoutingResult, Duration)>>,
}

impl FakeRoutingCache {
    pub fn new(clock: ManualClock, ttl: Duration, capacity: usize) -> Self {
        Self {
            clock,
            ttl,
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn is_live(&self, inserted_at: Duration) -> bool {
        self.clock.now().saturating_sub(inserted_at) < self.ttl
    }
}

impl RoutingCache for FakeRoutingCache {
    fn get(&self, key: &RoutingCacheKey) -> Option<RoutingResult> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some((value, inserted_at)) if self.is_live(*inserted_at) => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn insert_if_absent(&self, key: RoutingCacheKey, value: RoutingResult) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries
            .get(&key)
            .is_some_and(|(_, inserted_at)| self.is_live(*inserted_at))
        {
            return false;
        }
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, (_, inserted_at))| *inserted_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(key, (value, self.clock.now()));
        true
    }

    fn invalidate_all(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn len(&self) -> u64 {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|(_, t)| self.is_live(*t)).count() as u64
    }
}

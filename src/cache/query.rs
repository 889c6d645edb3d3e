use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use tokio::sync::Mutex;
use tracing::debug;

/// Loading / error / data, as a view sees one query.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum QueryState<T> {
    Loading,
    Error { message: String, data: Option<T> },
    Data { data: T },
}

impl<T> QueryState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Loading => None,
            QueryState::Error { data, .. } => data.as_ref(),
            QueryState::Data { data } => Some(data),
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            QueryState::Loading => None,
            QueryState::Error { data, .. } => data,
            QueryState::Data { data } => Some(data),
        }
    }
}

/// Proof that a fetch started under a given generation of its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    key: K,
    generation: u64,
}

struct Slot<T> {
    generation: u64,
    state: Option<QueryState<T>>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot {
            generation: 0,
            state: None,
        }
    }
}

/// Cached query results keyed by `K`. Invalidation bumps the key's
/// generation, so a fetch that was in flight at the time is dropped when it
/// lands instead of overwriting fresher state.
pub struct QueryCache<K, T> {
    name: &'static str,
    slots: Mutex<HashMap<K, Slot<T>>>,
}

impl<K, T> QueryCache<K, T>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    T: Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &K) -> QueryState<T> {
        self.slots
            .lock()
            .await
            .get(key)
            .and_then(|slot| slot.state.clone())
            .unwrap_or(QueryState::Loading)
    }

    pub async fn begin(&self, key: &K) -> Ticket<K> {
        let mut slots = self.slots.lock().await;
        let slot = slots.entry(key.clone()).or_default();
        if slot.state.is_none() {
            slot.state = Some(QueryState::Loading);
        }
        Ticket {
            key: key.clone(),
            generation: slot.generation,
        }
    }

    /// Stores the outcome of a fetch. Returns false when the ticket is stale.
    /// A failure keeps the last good data next to the error.
    pub async fn complete(&self, ticket: Ticket<K>, outcome: Result<T, String>) -> bool {
        let mut slots = self.slots.lock().await;
        let slot = slots.entry(ticket.key.clone()).or_default();
        if slot.generation != ticket.generation {
            debug!("{}: dropping stale response for {:?}", self.name, ticket.key);
            return false;
        }
        slot.state = Some(match outcome {
            Ok(data) => QueryState::Data { data },
            Err(message) => QueryState::Error {
                message,
                data: slot.state.take().and_then(QueryState::into_data),
            },
        });
        true
    }

    pub async fn invalidate(&self, key: &K) {
        let mut slots = self.slots.lock().await;
        let slot = slots.entry(key.clone()).or_default();
        slot.generation += 1;
        slot.state = None;
    }

    pub async fn invalidate_all(&self) {
        let mut slots = self.slots.lock().await;
        for slot in slots.values_mut() {
            slot.generation += 1;
            slot.state = None;
        }
    }

    /// Always goes to the remote store, then reports the stored state.
    pub async fn refresh<F, Fut, E>(&self, key: &K, fetch: F) -> QueryState<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let ticket = self.begin(key).await;
        let outcome = fetch().await.map_err(|e| e.to_string());
        if !self.complete(ticket, outcome.clone()).await {
            // superseded while in flight: hand the caller what it fetched without caching it
            return match outcome {
                Ok(data) => QueryState::Data { data },
                Err(message) => QueryState::Error { message, data: None },
            };
        }
        self.get(key).await
    }

    /// Serves cached data when there is some, otherwise fetches.
    pub async fn fetch<F, Fut, E>(&self, key: &K, fetch: F) -> QueryState<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        if let QueryState::Data { data } = self.get(key).await {
            return QueryState::Data { data };
        }
        self.refresh(key, fetch).await
    }
}

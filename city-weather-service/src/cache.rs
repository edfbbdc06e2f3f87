use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

struct CacheEntry {
    temperature: f64,
    stored_at: Instant,
    last_used: u64,
}

#[derive(Default)]
struct LruState {
    entries: HashMap<String, CacheEntry>,
    // last_used tick -> key, oldest first
    recency: BTreeMap<u64, String>,
    tick: u64,
}

impl LruState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn touch(&mut self, key: &str) {
        let tick = self.next_tick();
        if let Some(entry) = self.entries.get_mut(key) {
            self.recency.remove(&entry.last_used);
            entry.last_used = tick;
            self.recency.insert(tick, key.to_string());
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.recency.remove(&entry.last_used);
        }
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.recency.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// Bounded least-recently-used cache of temperatures keyed by country name.
///
/// Lookups and inserts take the lock only for the map operation; it is never
/// held across an upstream request. Two concurrent fetches for the same
/// uncached key can therefore both miss and both call the API. The later
/// `set` wins.
pub struct WeatherCache {
    state: Mutex<LruState>,
    capacity: usize,
    ttl: Option<Duration>,
}

impl WeatherCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_ttl(capacity, None)
    }

    pub fn with_ttl(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(LruState::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn get(&self, key: &str) -> Option<f64> {
        let mut state = self.state.lock().await;

        let (temperature, stored_at) = {
            let entry = state.entries.get(key)?;
            (entry.temperature, entry.stored_at)
        };

        if let Some(ttl) = self.ttl
            && stored_at.elapsed() >= ttl
        {
            state.remove(key);
            return None;
        }

        state.touch(key);
        Some(temperature)
    }

    pub async fn set(&self, key: String, temperature: f64) {
        let mut state = self.state.lock().await;

        if let Some(entry) = state.entries.get_mut(&key) {
            entry.temperature = temperature;
            entry.stored_at = Instant::now();
            state.touch(&key);
            return;
        }

        if state.entries.len() >= self.capacity {
            state.evict_oldest();
        }

        let tick = state.next_tick();
        state.recency.insert(tick, key.clone());
        state.entries.insert(
            key,
            CacheEntry {
                temperature,
                stored_at: Instant::now(),
                last_used: tick,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

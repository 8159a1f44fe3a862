use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::MapConfig;
use crate::entry::Entry;
use crate::error::MapError;
use crate::expirer::Expirer;

/// Storage shared between the map handles and the expirer task.
///
/// Timestamps are milliseconds relative to `epoch` so entries can keep them
/// in a plain atomic instead of an `Instant`.
pub(crate) struct Shared<K, V> {
    storage: DashMap<K, Entry<V>>,
    epoch: Instant,
}

impl<K, V> Shared<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// One sweep pass: evicts every entry whose idle time has reached
    /// `time_to_live`. A zero lifetime disables eviction entirely.
    ///
    /// Returns the number of entries evicted.
    pub(crate) fn sweep(&self, time_to_live: Duration) -> usize {
        if time_to_live.is_zero() {
            return 0;
        }
        let ttl_ms = u64::try_from(time_to_live.as_millis()).unwrap_or(u64::MAX);
        let now_ms = self.now_ms();

        // Snapshot the idle keys first: DashMap must not be mutated while
        // an iterator still holds shard locks.
        let idle: Vec<K> = self
            .storage
            .iter()
            .filter(|entry| entry.value().idle_ms(now_ms) >= ttl_ms)
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = 0;
        for key in idle {
            // The entry may have been touched, replaced, or removed since
            // the snapshot; re-check idleness and skip if it no longer
            // qualifies. A skipped key gets another chance next pass.
            if self
                .storage
                .remove_if(&key, |_, entry| entry.idle_ms(now_ms) >= ttl_ms)
                .is_some()
            {
                evicted += 1;
            }
        }
        evicted
    }
}

/// A thread-safe key-value map whose entries expire after a period of
/// inactivity.
///
/// Every successful `get` or `put` refreshes the entry's idle clock; a
/// background [`Expirer`] evicts entries that have sat unaccessed longer
/// than the configured time-to-live. The expirer is created alongside the
/// map but must be started explicitly.
///
/// Cloning the handle is cheap and shares the underlying storage.
///
/// By contract the map does not enumerate its values or entries:
/// [`values`](IdleMap::values) and [`entries`](IdleMap::entries) return a
/// typed error so the gap cannot be mistaken for emptiness. Callers that
/// need iteration enumerate [`keys`](IdleMap::keys) and fetch each value
/// with [`get`](IdleMap::get).
///
/// # Example
///
/// ```rust,no_run
/// use idle_map::{IdleMap, MapConfig};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let config = MapConfig::default()
///         .with_time_to_live(Duration::from_secs(30));
///     let sessions: IdleMap<String, String> = IdleMap::with_config(config);
///     sessions.start_expiring();
///
///     sessions.put("token".to_string(), "alice".to_string());
///     assert_eq!(sessions.get(&"token".to_string()), Some("alice".to_string()));
/// }
/// ```
pub struct IdleMap<K, V> {
    shared: Arc<Shared<K, V>>,
    expirer: Expirer<K, V>,
}

impl<K, V> Clone for IdleMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            expirer: self.expirer.clone(),
        }
    }
}

impl<K, V> IdleMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a map with the default configuration: 60 second entry
    /// lifetime, one sweep pass per second.
    ///
    /// The expirer is not started; call
    /// [`start_expiring`](IdleMap::start_expiring) to begin evicting.
    pub fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    /// Creates a map with custom configuration.
    pub fn with_config(config: MapConfig) -> Self {
        let shared = Arc::new(Shared {
            storage: DashMap::new(),
            epoch: Instant::now(),
        });
        let expirer = Expirer::new(Arc::downgrade(&shared), &config);
        Self { shared, expirer }
    }

    /// Looks up a key, refreshing the entry's idle clock on a hit.
    ///
    /// The refresh is what makes expiration idle-based rather than a fixed
    /// deadline from insertion: an entry read at least once per lifetime
    /// never expires.
    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.shared.storage.get(key)?;
        entry.value().touch(self.shared.now_ms());
        Some(entry.value().value().clone())
    }

    /// Inserts or replaces a value, stamping the entry as just accessed.
    ///
    /// Returns the previous value if the key already existed. The old entry
    /// is replaced wholesale, never mutated in place, so concurrent readers
    /// observe either the complete old value or the complete new one.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let entry = Entry::new(value, self.shared.now_ms());
        self.shared
            .storage
            .insert(key, entry)
            .map(Entry::into_value)
    }

    /// Inserts a possibly-absent value, rejecting `None`.
    ///
    /// This is the entry point for callers holding optional values
    /// (deserialized input, upstream lookups). Storing an absent value is a
    /// contract violation, so `None` fails with [`MapError::AbsentValue`]
    /// and the map, including any existing entry under `key`, is left
    /// unmodified.
    pub fn put_opt(&self, key: K, value: Option<V>) -> Result<Option<V>, MapError> {
        match value {
            Some(value) => Ok(self.put(key, value)),
            None => Err(MapError::AbsentValue),
        }
    }

    /// Inserts every pair from `entries`.
    ///
    /// Pairs are applied in no particular order; when a key appears more
    /// than once, the last occurrence wins.
    pub fn put_all(&self, entries: impl IntoIterator<Item = (K, V)>) {
        for (key, value) in entries {
            self.put(key, value);
        }
    }

    /// Removes a key, returning its value if it was present.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.shared
            .storage
            .remove(key)
            .map(|(_, entry)| entry.into_value())
    }

    /// Returns `true` if the key is present. Does not refresh the entry's
    /// idle clock.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.shared.storage.contains_key(key)
    }

    /// Returns `true` if any entry holds the given value.
    ///
    /// Linear scan over current values; does not refresh any idle clock.
    #[must_use]
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.shared
            .storage
            .iter()
            .any(|entry| entry.value().value() == value)
    }

    /// Returns the number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.storage.len()
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.storage.is_empty()
    }

    /// Returns a snapshot of the current keys, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.shared
            .storage
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Removes all entries. The expirer, if running, keeps running.
    pub fn clear(&self) {
        self.shared.storage.clear();
    }

    /// Value enumeration is deliberately not provided; always fails with
    /// [`MapError::Unsupported`]. Enumerate [`keys`](IdleMap::keys) and
    /// fetch each value with [`get`](IdleMap::get) instead.
    pub fn values(&self) -> Result<Vec<V>, MapError> {
        Err(MapError::Unsupported("value"))
    }

    /// Entry enumeration is deliberately not provided; always fails with
    /// [`MapError::Unsupported`]. Enumerate [`keys`](IdleMap::keys) and
    /// fetch each value with [`get`](IdleMap::get) instead.
    pub fn entries(&self) -> Result<Vec<(K, V)>, MapError> {
        Err(MapError::Unsupported("entry"))
    }

    /// The expirer monitoring this map.
    pub fn expirer(&self) -> &Expirer<K, V> {
        &self.expirer
    }

    /// Starts the background expirer. No-op if it is already running.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context; see
    /// [`Expirer::start`].
    pub fn start_expiring(&self) {
        self.expirer.start();
    }

    /// Stops the background expirer. No-op if it is already stopped.
    pub fn stop_expiring(&self) {
        self.expirer.stop();
    }

    /// Returns `true` while the background expirer is running.
    #[must_use]
    pub fn is_expiring(&self) -> bool {
        self.expirer.is_running()
    }

    /// The idle lifetime after which entries are evicted.
    pub fn time_to_live(&self) -> Duration {
        self.expirer.time_to_live()
    }

    /// Changes the idle lifetime. Takes effect on the expirer's next pass;
    /// `Duration::ZERO` disables eviction.
    pub fn set_time_to_live(&self, time_to_live: Duration) {
        self.expirer.set_time_to_live(time_to_live);
    }

    /// The delay between sweep passes.
    pub fn sweep_interval(&self) -> Duration {
        self.expirer.sweep_interval()
    }

    /// Changes the delay between sweep passes. Takes effect after the
    /// expirer's next pass.
    pub fn set_sweep_interval(&self, sweep_interval: Duration) {
        self.expirer.set_sweep_interval(sweep_interval);
    }
}

impl<K, V> Default for IdleMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

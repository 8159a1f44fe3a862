use std::sync::atomic::{AtomicU64, Ordering};

/// A stored value together with the time it was last accessed.
///
/// The timestamp is kept as milliseconds relative to the owning map's
/// creation instant, in an atomic, so a reader refreshing it never blocks
/// (or is blocked by) concurrent access to the value. The value itself is
/// immutable for the lifetime of the entry; overwriting a key installs a
/// wholly new entry instead.
#[derive(Debug)]
pub struct Entry<V> {
    value: V,
    last_access_ms: AtomicU64,
}

impl<V> Entry<V> {
    /// Creates a new entry stamped with the given access time.
    pub fn new(value: V, now_ms: u64) -> Self {
        Self {
            value,
            last_access_ms: AtomicU64::new(now_ms),
        }
    }

    /// Returns the stored value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the entry, returning the stored value.
    pub fn into_value(self) -> V {
        self.value
    }

    /// Refreshes the last-access timestamp.
    ///
    /// Relaxed ordering is sufficient: a sweep pass that misses an
    /// in-flight refresh at worst evicts an entry the caller immediately
    /// repopulates, which the eviction contract tolerates.
    pub fn touch(&self, now_ms: u64) {
        self.last_access_ms.store(now_ms, Ordering::Relaxed);
    }

    /// Last access time in milliseconds since the owning map was created.
    pub fn last_access_ms(&self) -> u64 {
        self.last_access_ms.load(Ordering::Relaxed)
    }

    /// Milliseconds of inactivity as of `now_ms`.
    ///
    /// Saturates to zero if the entry was touched after `now_ms` was taken.
    pub fn idle_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_access_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_records_access_time() {
        let entry = Entry::new("value", 1_000);

        assert_eq!(entry.value(), &"value");
        assert_eq!(entry.last_access_ms(), 1_000);
    }

    #[test]
    fn test_touch_refreshes_access_time() {
        let entry = Entry::new(42, 1_000);

        entry.touch(5_000);

        assert_eq!(entry.last_access_ms(), 5_000);
        assert_eq!(entry.idle_ms(7_500), 2_500);
    }

    #[test]
    fn test_idle_saturates_when_touched_after_snapshot() {
        let entry = Entry::new(42, 1_000);

        // A concurrent get can stamp a time later than the sweep snapshot.
        entry.touch(2_000);

        assert_eq!(entry.idle_ms(1_500), 0);
    }

    #[test]
    fn test_into_value_returns_stored_value() {
        let entry = Entry::new(String::from("owned"), 0);

        assert_eq!(entry.into_value(), "owned");
    }
}

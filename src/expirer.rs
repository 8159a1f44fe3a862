//! Background eviction of idle entries.

use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::config::MapConfig;
use crate::map::Shared;

/// Process-wide counter assigning each expirer an id, used only in logs.
static EXPIRER_COUNT: AtomicUsize = AtomicUsize::new(1);

struct ExpirerState {
    time_to_live: Duration,
    sweep_interval: Duration,
    running: bool,
    /// Wakes the active task so `stop` does not wait out a full interval.
    /// Present exactly while `running` is true.
    shutdown_tx: Option<watch::Sender<bool>>,
    /// Bumped on every start; a task that exits late must not clobber the
    /// state of its successor.
    generation: u64,
}

struct ExpirerInner<K, V> {
    /// Weak so the sweep task can never keep a discarded map alive; the
    /// task exits on its next wake-up once the map is gone.
    shared: Weak<Shared<K, V>>,
    state: Mutex<ExpirerState>,
    id: usize,
}

/// Periodically evicts idle entries from the map that owns it.
///
/// The expirer is created alongside its map and lives exactly as long as
/// the map does. It starts stopped; `start` and `stop` may be called from
/// any thread, in any order, and are no-ops when the expirer is already in
/// the requested state. Stopping a sleeping expirer wakes it rather than
/// waiting out the interval, and a stopped expirer can be started again.
///
/// Lifetime and sweep interval are mutable at runtime; changes take effect
/// on the next pass. A zero lifetime disables eviction without stopping
/// the task.
pub struct Expirer<K, V> {
    inner: Arc<ExpirerInner<K, V>>,
}

impl<K, V> Clone for Expirer<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Expirer<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub(crate) fn new(shared: Weak<Shared<K, V>>, config: &MapConfig) -> Self {
        Self {
            inner: Arc::new(ExpirerInner {
                shared,
                state: Mutex::new(ExpirerState {
                    time_to_live: config.time_to_live,
                    sweep_interval: config.sweep_interval,
                    running: false,
                    shutdown_tx: None,
                    generation: 0,
                }),
                id: EXPIRER_COUNT.fetch_add(1, Ordering::Relaxed),
            }),
        }
    }

    /// Starts the sweep task. No-op if it is already running.
    ///
    /// The check and the start happen under one lock, so concurrent calls
    /// spawn at most one task.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context. The expirer
    /// needs a runtime to spawn its sweep task on.
    pub fn start(&self) {
        // Fail with a clear message instead of a cryptic panic from
        // tokio::spawn.
        if tokio::runtime::Handle::try_current().is_err() {
            panic!(
                "idle_map::Expirer requires a Tokio runtime. \
                 Ensure start() is called from within a #[tokio::main] or \
                 #[tokio::test] context, or from code running on a Tokio \
                 runtime."
            );
        }

        let mut state = self.inner.state.lock();
        if state.running {
            return;
        }
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        state.shutdown_tx = Some(shutdown_tx);
        state.running = true;
        state.generation += 1;
        let generation = state.generation;
        drop(state);

        tokio::spawn(Self::run(Arc::clone(&self.inner), shutdown_rx, generation));
        tracing::debug!(expirer = self.inner.id, "expirer started");
    }

    /// Stops the sweep task. No-op if it is already stopped.
    ///
    /// An in-flight sweep pass completes; a sleeping task is woken and
    /// exits without finishing its interval.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        if !state.running {
            return;
        }
        state.running = false;
        if let Some(shutdown_tx) = state.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }
        drop(state);

        tracing::debug!(expirer = self.inner.id, "expirer stopped");
    }

    /// Returns `true` while the sweep task is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// The idle lifetime after which entries are evicted. Zero means
    /// eviction is disabled.
    pub fn time_to_live(&self) -> Duration {
        self.inner.state.lock().time_to_live
    }

    /// Changes the idle lifetime. Takes effect on the next pass, not
    /// retroactively; `Duration::ZERO` disables eviction.
    pub fn set_time_to_live(&self, time_to_live: Duration) {
        self.inner.state.lock().time_to_live = time_to_live;
    }

    /// The delay between sweep passes.
    pub fn sweep_interval(&self) -> Duration {
        self.inner.state.lock().sweep_interval
    }

    /// Changes the delay between sweep passes. Takes effect after the
    /// next pass.
    pub fn set_sweep_interval(&self, sweep_interval: Duration) {
        self.inner.state.lock().sweep_interval = sweep_interval;
    }

    async fn run(
        inner: Arc<ExpirerInner<K, V>>,
        mut shutdown_rx: watch::Receiver<bool>,
        generation: u64,
    ) {
        loop {
            let (time_to_live, sweep_interval) = {
                let state = inner.state.lock();
                if !state.running || state.generation != generation {
                    break;
                }
                (state.time_to_live, state.sweep_interval)
            };

            match inner.shared.upgrade() {
                Some(shared) => {
                    let evicted = shared.sweep(time_to_live);
                    if evicted > 0 {
                        tracing::debug!(expirer = inner.id, evicted, "evicted idle entries");
                    }
                }
                // The owning map is gone, nothing left to monitor.
                None => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(sweep_interval) => {}
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        let mut state = inner.state.lock();
        if state.generation == generation && state.running {
            // Exited on its own rather than through stop(); record it.
            state.running = false;
            state.shutdown_tx = None;
        }
    }
}

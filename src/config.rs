use std::time::Duration;

/// Entry lifetime used when none is configured (60 seconds).
pub const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(60);

/// Delay between sweep passes used when none is configured (1 second).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for an [`IdleMap`](crate::IdleMap) and its expirer.
///
/// Both settings can also be changed after construction through the map's
/// expirer; the values here only seed the initial state.
///
/// # Example
///
/// ```rust
/// use idle_map::MapConfig;
/// use std::time::Duration;
///
/// let config = MapConfig::default()
///     .with_time_to_live(Duration::from_secs(30))
///     .with_sweep_interval(Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// How long an entry may sit unaccessed before the expirer evicts it.
    /// `Duration::ZERO` disables eviction entirely.
    pub time_to_live: Duration,
    /// How long the expirer sleeps between sweep passes.
    pub sweep_interval: Duration,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            time_to_live: DEFAULT_TIME_TO_LIVE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl MapConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the idle lifetime after which entries are evicted.
    ///
    /// `Duration::ZERO` disables eviction: entries then live until they are
    /// removed explicitly.
    pub fn with_time_to_live(mut self, time_to_live: Duration) -> Self {
        self.time_to_live = time_to_live;
        self
    }

    /// Sets the delay between sweep passes.
    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }
}

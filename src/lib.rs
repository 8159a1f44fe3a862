//! # Idle Map
//!
//! A thread-safe key-value map whose entries expire after a period of
//! inactivity, for short-lived caches (session tokens, rate-limit counters,
//! connection metadata) where stale entries must be reclaimed without an
//! explicit delete.
//!
//! ## Features
//!
//! - Thread-safe storage using `DashMap` (per-key operations on different
//!   keys never block each other)
//! - Idle-based expiry: every successful `get` or `put` resets an entry's
//!   idle clock, so only genuinely unused entries are evicted
//! - A background expirer per map, started and stopped explicitly, with
//!   lifetime and sweep interval reconfigurable at runtime
//! - Cheap cloneable handles sharing one underlying map
//!
//! ## Example
//!
//! ```rust,no_run
//! use idle_map::IdleMap;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     // One-minute idle lifetime, swept once per second.
//!     let sessions: IdleMap<String, String> = IdleMap::new();
//!
//!     // Nothing is evicted until the expirer is started.
//!     sessions.start_expiring();
//!
//!     sessions.put("token:123".to_string(), "alice".to_string());
//!
//!     // Reading resets the idle clock.
//!     if let Some(user) = sessions.get(&"token:123".to_string()) {
//!         println!("session belongs to {}", user);
//!     }
//!
//!     // Lifetimes can be tuned while the expirer runs.
//!     sessions.set_time_to_live(Duration::from_secs(300));
//!
//!     sessions.stop_expiring();
//! }
//! ```

mod config;
mod entry;
mod error;
mod expirer;
mod map;

pub use config::MapConfig;
pub use config::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TIME_TO_LIVE};
pub use entry::Entry;
pub use error::MapError;
pub use expirer::Expirer;
pub use map::IdleMap;

//! Tilewatch: sub-category tile monitor
//!
//! Periodically checks a fixed list of category pages, counts their
//! sub-category links, and texts a human exactly once per incident when a
//! page drops below the minimum. Repeat notifications are suppressed until
//! the page recovers.
//!
//! # Features
//!
//! - **Edge-triggered alerts**: notify on good→bad, silent reset on bad→good
//! - **Commit on delivery**: an incident is only marked alerted once the SMS went out
//! - **Durable state**: per-URL alert state in a JSON file, replaced atomically
//! - **Bounded concurrency**: pages fetched in parallel, evaluated in order
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tilewatch::alerts::LogNotifier;
//! use tilewatch::observe::{HttpObserver, TileMatcher};
//! use tilewatch::storage::FileBackend;
//! use tilewatch::{Monitor, MonitorConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MonitorConfig::new(vec!["https://shop.example/eu/mens/".to_string()])
//!     .with_threshold(8);
//! let observer = HttpObserver::new(
//!     TileMatcher::new(config.tile_class.clone()),
//!     &config.user_agent,
//!     Duration::from_secs(30),
//! )?;
//!
//! let monitor = Monitor::new(config, Arc::new(observer), Arc::new(LogNotifier));
//! let report = monitor.run_once(&FileBackend::new("alert_state.json")).await;
//! println!("degraded: {}", report.is_degraded());
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod config;
pub mod monitor;
pub mod observe;
pub mod storage;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use alerts::{evaluate, Action, AlertState};
pub use config::{ConfigError, MonitorConfig, NotifyChannel};
pub use monitor::{Monitor, RunReport};
pub use observe::Observation;
pub use storage::StateStore;

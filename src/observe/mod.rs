//! Page observation
//!
//! An observer turns a target URL into a tile count. All failure modes
//! collapse into [`Observation::Failed`] so a bad target never aborts a run.

pub mod http;

pub use http::{HttpObserver, ObserveError, TileMatcher};

use async_trait::async_trait;

/// Result of checking one target once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Number of matching sub-category links on the page
    Measured(u32),
    /// The page could not be checked
    Failed(String),
}

impl Observation {
    pub fn count(&self) -> Option<u32> {
        match self {
            Observation::Measured(count) => Some(*count),
            Observation::Failed(_) => None,
        }
    }
}

/// Counts sub-category links on a page
#[async_trait]
pub trait Observer: Send + Sync {
    async fn observe(&self, url: &str) -> Observation;
}

/// Short human label for a target URL: its last non-empty path segment,
/// else its host, else the URL itself.
pub fn target_label(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let without_scheme = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);

    let mut parts = without_scheme.split('/');
    let host = parts.next().unwrap_or_default();

    parts
        .filter(|segment| !segment.is_empty())
        .last()
        .or(Some(host).filter(|h| !h.is_empty()))
        .unwrap_or(url)
        .to_string()
}

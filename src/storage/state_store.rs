//! Per-target alert state, keyed by target URL

use std::collections::BTreeMap;

use super::{PersistenceBackend, PersistenceError};
use crate::alerts::AlertState;

/// Mapping from target URL to its last known alert state.
///
/// A missing entry means "never alerted". Entries are kept sorted so the
/// saved file is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateStore {
    entries: BTreeMap<String, AlertState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store, treating a missing or unreadable blob as empty
    pub fn load(backend: &dyn PersistenceBackend) -> Self {
        match backend.read() {
            Ok(Some(data)) => Self::from_json(&data),
            Ok(None) => {
                tracing::info!(
                    location = %backend.describe(),
                    "No alert state found, starting fresh"
                );
                Self::new()
            }
            Err(e) => {
                tracing::warn!(
                    location = %backend.describe(),
                    error = %e,
                    "Failed to read alert state, starting fresh"
                );
                Self::new()
            }
        }
    }

    /// Parse a saved blob. Entries whose `alerted` flag is unreadable are
    /// dropped, a malformed document yields an empty store.
    pub fn from_json(data: &[u8]) -> Self {
        let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_slice(data) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Alert state is corrupt, starting fresh");
                return Self::new();
            }
        };

        let mut entries = BTreeMap::new();
        for (target, value) in raw {
            match AlertState::from_json_value(&value) {
                Ok(state) => {
                    entries.insert(target, state);
                }
                Err(e) => {
                    tracing::warn!(
                        target_url = %target,
                        error = %e,
                        "Dropping malformed alert state entry"
                    );
                }
            }
        }

        Self { entries }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, PersistenceError> {
        serde_json::to_vec_pretty(&self.entries)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    /// Write the whole store
    pub fn save(&self, backend: &dyn PersistenceBackend) -> Result<(), PersistenceError> {
        let data = self.to_json()?;
        backend.write(&data)?;
        tracing::debug!(
            location = %backend.describe(),
            entries = self.entries.len(),
            "Alert state saved"
        );
        Ok(())
    }

    /// State for `target`, defaulting to not alerted
    pub fn get(&self, target: &str) -> AlertState {
        self.entries.get(target).cloned().unwrap_or_default()
    }

    pub fn contains(&self, target: &str) -> bool {
        self.entries.contains_key(target)
    }

    pub fn set(&mut self, target: impl Into<String>, state: AlertState) {
        self.entries.insert(target.into(), state);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

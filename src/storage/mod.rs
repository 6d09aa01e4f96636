//! Durable alert state
//!
//! The state store is loaded once at the start of a run and written back
//! once at the end through a [`PersistenceBackend`].

pub mod file;
pub mod state_store;

pub use file::FileBackend;
pub use state_store::StateStore;

/// Somewhere a single state blob can be kept between runs
pub trait PersistenceBackend: Send + Sync {
    /// Read the stored blob, `None` when nothing was saved yet
    fn read(&self) -> Result<Option<Vec<u8>>, PersistenceError>;

    /// Replace the stored blob
    fn write(&self, data: &[u8]) -> Result<(), PersistenceError>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

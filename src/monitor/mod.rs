//! Monitor runs: orchestration and outcome reporting

pub mod report;
pub mod runner;

pub use report::{
    DeliveryOutcome, RunReport, TargetOutcome, EXIT_DEGRADED, EXIT_OK, EXIT_PERSISTENCE_FAILED,
};
pub use runner::Monitor;

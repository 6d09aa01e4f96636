//! Run outcome reporting

use chrono::{DateTime, Utc};

use crate::alerts::Action;
use crate::observe::Observation;

/// Process exit code for a healthy run
pub const EXIT_OK: u8 = 0;
/// A target is below threshold, could not be checked, or could not be notified
pub const EXIT_DEGRADED: u8 = 1;
/// Alert state could not be saved
pub const EXIT_PERSISTENCE_FAILED: u8 = 2;

/// What happened to a notification attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { id: Option<String> },
    Failed { reason: String },
}

/// Outcome for one target in one run
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    pub target: String,
    pub label: String,
    pub observation: Observation,
    pub action: Action,
    /// Observed count was below threshold
    pub below_threshold: bool,
    /// Present only for `Action::Notify`
    pub delivery: Option<DeliveryOutcome>,
}

impl TargetOutcome {
    pub fn delivery_failed(&self) -> bool {
        matches!(self.delivery, Some(DeliveryOutcome::Failed { .. }))
    }

    pub fn observation_failed(&self) -> bool {
        matches!(self.observation, Observation::Failed(_))
    }
}

/// Aggregate result of one monitor run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub threshold: u32,
    /// One entry per target, in configured order
    pub outcomes: Vec<TargetOutcome>,
    /// Set when the state could not be saved at the end of the run
    pub persistence_error: Option<String>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>, threshold: u32) -> Self {
        Self {
            started_at,
            threshold,
            outcomes: Vec::new(),
            persistence_error: None,
        }
    }

    pub fn any_below_threshold(&self) -> bool {
        self.below_threshold_count() > 0
    }

    /// Targets measured under `threshold` this run
    pub fn below_threshold_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.below_threshold).count()
    }

    /// Time since the run started
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    pub fn observation_failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.observation_failed()).count()
    }

    pub fn delivery_failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.delivery_failed()).count()
    }

    fn with_action(&self, action: Action) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes.iter().filter(move |o| o.action == action)
    }

    /// Targets whose incident was notified and committed this run
    pub fn notified(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.with_action(Action::Notify).filter(|o| !o.delivery_failed())
    }

    pub fn suppressed(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.with_action(Action::Suppress)
    }

    pub fn recovered(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.with_action(Action::Reset)
    }

    /// Whether the external trigger should flag this run
    pub fn is_degraded(&self) -> bool {
        self.any_below_threshold()
            || self.observation_failures() > 0
            || self.delivery_failures() > 0
            || self.persistence_error.is_some()
    }

    pub fn exit_code(&self) -> u8 {
        if self.persistence_error.is_some() {
            EXIT_PERSISTENCE_FAILED
        } else if self.is_degraded() {
            EXIT_DEGRADED
        } else {
            EXIT_OK
        }
    }

    /// Log an end-of-run summary
    pub fn log_summary(&self) {
        for outcome in self.notified() {
            tracing::warn!(
                target_url = %outcome.target,
                "New alert sent for {}",
                outcome.label
            );
        }
        for outcome in self.suppressed() {
            tracing::info!(
                target_url = %outcome.target,
                "Incident ongoing for {}, already alerted",
                outcome.label
            );
        }
        for outcome in self.recovered() {
            tracing::info!(target_url = %outcome.target, "{} recovered", outcome.label);
        }

        tracing::info!(
            run_time = %self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            elapsed_ms = self.elapsed().num_milliseconds(),
            threshold = self.threshold,
            targets = self.outcomes.len(),
            below_threshold = self.below_threshold_count(),
            notified = self.notified().count(),
            suppressed = self.suppressed().count(),
            recovered = self.recovered().count(),
            observation_failures = self.observation_failures(),
            delivery_failures = self.delivery_failures(),
            degraded = self.is_degraded(),
            "Monitoring run complete"
        );

        if let Some(e) = &self.persistence_error {
            tracing::error!(
                error = %e,
                "Alert state was NOT saved; the next run may notify again"
            );
        }
    }
}

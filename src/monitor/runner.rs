//! Run orchestration
//!
//! A run has two phases. Observation fetches every target with bounded
//! concurrency, each under its own timeout. Evaluation then walks the
//! targets one by one in configured order: evaluate, deliver when the
//! evaluator asks for it, and only then commit the new state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use super::report::{DeliveryOutcome, RunReport, TargetOutcome};
use crate::alerts::{evaluate, Action, AlertMessage, Notifier};
use crate::config::MonitorConfig;
use crate::observe::{target_label, Observation, Observer};
use crate::storage::{PersistenceBackend, StateStore};

/// Runs the check → evaluate → notify → persist cycle
pub struct Monitor {
    config: MonitorConfig,
    observer: Arc<dyn Observer>,
    notifier: Arc<dyn Notifier>,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        observer: Arc<dyn Observer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            observer,
            notifier,
        }
    }

    /// Load state, run every target, save state once.
    ///
    /// The save happens even when targets failed; a save failure is
    /// recorded on the report.
    pub async fn run_once(&self, backend: &dyn PersistenceBackend) -> RunReport {
        let mut store = StateStore::load(backend);
        let mut report = self.run(&mut store).await;

        if let Err(e) = store.save(backend) {
            tracing::error!(
                location = %backend.describe(),
                error = %e,
                "Failed to save alert state"
            );
            report.persistence_error = Some(e.to_string());
        }

        report
    }

    /// Observe and evaluate all targets against `store`, without persisting
    pub async fn run(&self, store: &mut StateStore) -> RunReport {
        let started_at = Utc::now();
        tracing::info!(
            run_time = %started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            targets = self.config.targets.len(),
            threshold = self.config.threshold,
            "Starting tile check"
        );

        let observations = self.observe_all().await;
        self.evaluate_all(store, observations, started_at).await
    }

    /// Observe every target. Results come back in configured order.
    pub async fn observe_all(&self) -> Vec<Observation> {
        let timeout = self.config.timeout;

        stream::iter(self.config.targets.iter())
            .map(|url| async move {
                match tokio::time::timeout(timeout, self.observer.observe(url)).await {
                    Ok(observation) => observation,
                    Err(_) => Observation::Failed(format!("Timed out after {:?}", timeout)),
                }
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await
    }

    async fn evaluate_all(
        &self,
        store: &mut StateStore,
        observations: Vec<Observation>,
        now: DateTime<Utc>,
    ) -> RunReport {
        let mut report = RunReport::new(now, self.config.threshold);

        for (target, observation) in self.config.targets.iter().zip(observations) {
            let outcome = self.process_target(store, target, observation, now).await;
            report.outcomes.push(outcome);
        }

        report
    }

    async fn process_target(
        &self,
        store: &mut StateStore,
        target: &str,
        observation: Observation,
        now: DateTime<Utc>,
    ) -> TargetOutcome {
        let threshold = self.config.threshold;
        let label = target_label(target);
        let prior = store.get(target);
        let eval = evaluate(&prior, &observation, threshold, now);

        let below_threshold = observation.count().map(|c| c < threshold).unwrap_or(false);
        match &observation {
            Observation::Measured(count) if below_threshold => tracing::warn!(
                target_url = %target,
                count,
                threshold,
                "{}: {} sub-categories, below minimum",
                label,
                count
            ),
            Observation::Measured(count) => tracing::info!(
                target_url = %target,
                count,
                "{}: {} sub-categories",
                label,
                count
            ),
            Observation::Failed(reason) => tracing::error!(
                target_url = %target,
                error = %reason,
                "{}: check failed",
                label
            ),
        }

        let mut delivery = None;
        match eval.action {
            Action::Notify => {
                let alert = AlertMessage {
                    target: target.to_string(),
                    label: label.clone(),
                    count: eval.next.count.unwrap_or_default(),
                    threshold,
                };

                let notify_timeout = self.config.notify_timeout;
                let sending = tokio::time::timeout(notify_timeout, self.notifier.notify(&alert));
                let result = match sending.await {
                    Ok(result) => result.map_err(|e| e.to_string()),
                    Err(_) => Err(format!("Timed out after {:?}", notify_timeout)),
                };

                match result {
                    Ok(receipt) => {
                        store.set(target, eval.next);
                        delivery = Some(DeliveryOutcome::Delivered { id: receipt.id });
                    }
                    Err(reason) => {
                        tracing::error!(
                            target_url = %target,
                            error = %reason,
                            "Alert delivery failed, will retry next run"
                        );
                        delivery = Some(DeliveryOutcome::Failed { reason });
                    }
                }
            }
            Action::Reset => {
                tracing::info!(target_url = %target, "{}: recovered", label);
                store.set(target, eval.next);
            }
            Action::Suppress => {
                tracing::info!(target_url = %target, "{}: already alerted", label);
            }
            Action::None | Action::Skip => {}
        }

        TargetOutcome {
            target: target.to_string(),
            label,
            observation,
            action: eval.action,
            below_threshold,
            delivery,
        }
    }
}

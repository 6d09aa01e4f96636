//! Edge-triggered incident evaluation
//!
//! A target is either `Normal` (not alerted) or `Alerted`. Only the
//! transitions fire an action: Normal→Alerted notifies, Alerted→Normal
//! resets silently. Failed observations never move the state.

use chrono::{DateTime, Utc};

use super::state::{Action, AlertState};
use crate::observe::Observation;

/// Result of evaluating one observation against the prior state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub action: Action,
    /// State to commit. For `Notify` it must only be committed once delivery succeeds.
    pub next: AlertState,
}

/// Decide the action and next state for one target.
///
/// `threshold` is the minimum acceptable count. `now` stamps the new state
/// on transitions, which keeps this function pure.
pub fn evaluate(
    prior: &AlertState,
    observation: &Observation,
    threshold: u32,
    now: DateTime<Utc>,
) -> Evaluation {
    let count = match observation {
        Observation::Measured(count) => *count,
        Observation::Failed(_) => {
            return Evaluation {
                action: Action::Skip,
                next: prior.clone(),
            }
        }
    };

    let below = count < threshold;
    match (prior.alerted, below) {
        (false, false) => Evaluation {
            action: Action::None,
            next: prior.clone(),
        },
        (false, true) => Evaluation {
            action: Action::Notify,
            next: AlertState::alerted(count, now),
        },
        (true, true) => Evaluation {
            action: Action::Suppress,
            next: prior.clone(),
        },
        (true, false) => Evaluation {
            action: Action::Reset,
            next: AlertState::recovered(count, now),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn earlier() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 11, 40, 0).unwrap()
    }

    #[test]
    fn test_first_low_count_notifies() {
        let eval = evaluate(&AlertState::default(), &Observation::Measured(4), 6, now());

        assert_eq!(eval.action, Action::Notify);
        assert!(eval.next.alerted);
        assert_eq!(eval.next.count, Some(4));
        assert_eq!(eval.next.parsed_timestamp(), Some(now()));
    }

    #[test]
    fn test_ongoing_incident_is_suppressed() {
        let prior = AlertState::alerted(4, earlier());
        let eval = evaluate(&prior, &Observation::Measured(4), 6, now());

        assert_eq!(eval.action, Action::Suppress);
        assert_eq!(eval.next, prior);
    }

    #[test]
    fn test_recovery_resets_without_notifying() {
        let prior = AlertState::alerted(4, earlier());
        let eval = evaluate(&prior, &Observation::Measured(9), 6, now());

        assert_eq!(eval.action, Action::Reset);
        assert!(!eval.next.alerted);
        assert_eq!(eval.next.count, Some(9));
        assert_eq!(eval.next.parsed_timestamp(), Some(now()));
    }

    #[test]
    fn test_healthy_count_does_nothing() {
        let eval = evaluate(&AlertState::default(), &Observation::Measured(9), 6, now());

        assert_eq!(eval.action, Action::None);
        assert_eq!(eval.next, AlertState::default());
    }

    #[test]
    fn test_count_equal_to_threshold_is_healthy() {
        let eval = evaluate(&AlertState::default(), &Observation::Measured(6), 6, now());
        assert_eq!(eval.action, Action::None);

        let prior = AlertState::alerted(2, earlier());
        let eval = evaluate(&prior, &Observation::Measured(6), 6, now());
        assert_eq!(eval.action, Action::Reset);
    }

    #[test]
    fn test_failure_never_changes_state() {
        let failed = Observation::Failed("timeout".to_string());
        let priors = [
            AlertState::default(),
            AlertState::alerted(3, earlier()),
            AlertState::recovered(12, earlier()),
        ];

        for prior in priors {
            let eval = evaluate(&prior, &failed, 6, now());
            assert_eq!(eval.action, Action::Skip);
            assert_eq!(eval.next, prior);
        }
    }

    #[test]
    fn test_one_notification_per_incident() {
        let counts = [10, 9, 3, 2, 4, 1, 7, 8, 5, 5, 9, 2];
        let mut state = AlertState::default();
        let mut notifications = 0;

        for count in counts {
            let eval = evaluate(&state, &Observation::Measured(count), 6, now());
            if eval.action == Action::Notify {
                notifications += 1;
            }
            state = eval.next;
        }

        // Incidents: [3,2,4,1], [5,5], [2]
        assert_eq!(notifications, 3);
        assert!(state.alerted);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let prior = AlertState::alerted(4, earlier());
        let observation = Observation::Measured(11);

        let first = evaluate(&prior, &observation, 8, now());
        let second = evaluate(&prior, &observation, 8, now());
        assert_eq!(first, second);
    }
}

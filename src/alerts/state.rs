//! Persisted alert state and evaluator actions

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert state remembered for one target between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    /// True while a notification has been delivered for the ongoing incident
    #[serde(default)]
    pub alerted: bool,
    /// ISO-8601 time of the last transition, kept exactly as stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Count observed at the last transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl AlertState {
    /// State recorded when an incident opens
    pub fn alerted(count: u32, at: DateTime<Utc>) -> Self {
        Self {
            alerted: true,
            timestamp: Some(at.to_rfc3339()),
            count: Some(count),
        }
    }

    /// State recorded when an incident recovers
    pub fn recovered(count: u32, at: DateTime<Utc>) -> Self {
        Self {
            alerted: false,
            timestamp: Some(at.to_rfc3339()),
            count: Some(count),
        }
    }

    /// Decode one stored entry.
    ///
    /// Only `alerted` decides whether the entry is usable. An unreadable
    /// `timestamp` or `count` is dropped with a warning.
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, String> {
        let entry = value
            .as_object()
            .ok_or_else(|| format!("expected an object, got {}", value))?;

        let alerted = match entry.get("alerted") {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(b)) => *b,
            Some(other) => return Err(format!("alerted must be a boolean, got {}", other)),
        };

        let timestamp = match entry.get("timestamp") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => {
                tracing::warn!(value = %other, "Ignoring non-string alert timestamp");
                None
            }
        };

        let count = match entry.get("count") {
            None | Some(serde_json::Value::Null) => None,
            Some(v) => match v.as_u64().and_then(|c| u32::try_from(c).ok()) {
                Some(c) => Some(c),
                None => {
                    tracing::warn!(value = %v, "Ignoring invalid alert count");
                    None
                }
            },
        };

        Ok(Self {
            alerted,
            timestamp,
            count,
        })
    }

    /// The stored timestamp as UTC, when it is readable.
    ///
    /// Accepts RFC 3339 and offset-less ISO-8601 (read as UTC) with either
    /// `T` or a space between date and time.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.as_deref()?.trim();

        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }

        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}

/// What the orchestrator should do with one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Count is healthy and no incident is open
    None,
    /// New incident: send a notification, then commit the alerted state
    Notify,
    /// Incident already notified, stay quiet
    Suppress,
    /// Incident recovered, clear the alert without notifying
    Reset,
    /// Observation failed; state is left untouched
    Skip,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::None => "none",
            Action::Notify => "notify",
            Action::Suppress => "suppress",
            Action::Reset => "reset",
            Action::Skip => "skip",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn state_with_timestamp(raw: &str) -> AlertState {
        AlertState {
            alerted: true,
            timestamp: Some(raw.to_string()),
            count: Some(3),
        }
    }

    #[test]
    fn test_default_is_not_alerted() {
        let state = AlertState::default();
        assert!(!state.alerted);
        assert!(state.timestamp.is_none());
        assert!(state.count.is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let json = serde_json::to_value(AlertState::alerted(4, at)).unwrap();

        assert_eq!(json["alerted"], true);
        assert_eq!(json["count"], 4);
        assert_eq!(json["timestamp"], "2025-03-14T09:30:00+00:00");
    }

    #[test]
    fn test_parses_timestamp_variants() {
        let base = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();

        let naive = state_with_timestamp("2025-03-14T09:30:00.123456");
        assert_eq!(
            naive.parsed_timestamp(),
            Some(base + chrono::Duration::microseconds(123_456))
        );

        let spaced = state_with_timestamp("2025-03-14 09:30:00");
        assert_eq!(spaced.parsed_timestamp(), Some(base));

        let offset = state_with_timestamp("2025-03-14T10:30:00+01:00");
        assert_eq!(offset.parsed_timestamp(), Some(base));

        assert!(state_with_timestamp("yesterday").parsed_timestamp().is_none());
    }

    #[test]
    fn test_unreadable_timestamp_keeps_alerted() {
        let value = json!({"alerted": true, "timestamp": "yesterday", "count": 3});
        let state = AlertState::from_json_value(&value).unwrap();

        assert!(state.alerted);
        assert_eq!(state.timestamp.as_deref(), Some("yesterday"));
        assert_eq!(state.count, Some(3));
    }

    #[test]
    fn test_bad_optional_fields_are_dropped() {
        let value = json!({"alerted": true, "timestamp": 1741944600, "count": -2});
        let state = AlertState::from_json_value(&value).unwrap();

        assert!(state.alerted);
        assert!(state.timestamp.is_none());
        assert!(state.count.is_none());
    }

    #[test]
    fn test_unreadable_alerted_is_an_error() {
        assert!(AlertState::from_json_value(&json!({"alerted": "sometimes"})).is_err());
        assert!(AlertState::from_json_value(&json!([true])).is_err());
    }

    #[test]
    fn test_missing_alerted_means_not_alerted() {
        let state = AlertState::from_json_value(&json!({"count": 9})).unwrap();
        assert!(!state.alerted);
        assert_eq!(state.count, Some(9));
    }
}

//! Monitor configuration from the environment
//!
//! - `TILEWATCH_TARGETS`: comma-separated URLs, checked in this order (required)
//! - `TILEWATCH_THRESHOLD`: minimum acceptable tile count (default: 8)
//! - `TILEWATCH_TIMEOUT_SECS`: per-target timeout (default: 60)
//! - `TILEWATCH_NOTIFY_TIMEOUT_SECS`: upper bound on one notification (default: 30)
//! - `TILEWATCH_CONCURRENCY`: pages fetched at once (default: 4)
//! - `TILEWATCH_STATE_FILE`: alert state path (default: alert_state.json)
//! - `TILEWATCH_TILE_CLASS`: class fragment of a sub-category link
//!   (default: CategoryTile_categoryTile)
//! - `TILEWATCH_USER_AGENT`: User-Agent for page fetches
//! - `TILEWATCH_NOTIFY`: `sms` or `log` (default: sms)
//! - `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_PHONE_FROM`, `TWILIO_PHONE_TO`

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::alerts::SmsCredentials;

pub const DEFAULT_THRESHOLD: u32 = 8;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_STATE_FILE: &str = "alert_state.json";
pub const DEFAULT_TILE_CLASS: &str = "CategoryTile_categoryTile";

/// Where notifications go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyChannel {
    Sms,
    Log,
}

impl FromStr for NotifyChannel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sms" | "twilio" => Ok(NotifyChannel::Sms),
            "log" => Ok(NotifyChannel::Log),
            other => Err(ConfigError::Invalid {
                var: "TILEWATCH_NOTIFY",
                value: other.to_string(),
            }),
        }
    }
}

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Target URLs, in check order
    pub targets: Vec<String>,
    /// Minimum acceptable count; anything below is an incident
    pub threshold: u32,
    /// Upper bound on one target's observation
    pub timeout: Duration,
    /// Upper bound on one notification delivery
    pub notify_timeout: Duration,
    /// Observations in flight at once
    pub concurrency: usize,
    pub state_file: PathBuf,
    pub tile_class: String,
    pub user_agent: String,
    pub notify: NotifyChannel,
    pub sms: Option<SmsCredentials>,
}

impl MonitorConfig {
    /// Config with defaults for everything but the targets
    pub fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            threshold: DEFAULT_THRESHOLD,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            notify_timeout: Duration::from_secs(DEFAULT_NOTIFY_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            tile_class: DEFAULT_TILE_CLASS.to_string(),
            user_agent: default_user_agent(),
            notify: NotifyChannel::Sms,
            sms: None,
        }
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let targets: Vec<String> = var("TILEWATCH_TARGETS")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }

        let mut config = Self::new(targets);

        if let Some(v) = var("TILEWATCH_THRESHOLD") {
            config.threshold = parse_var("TILEWATCH_THRESHOLD", &v)?;
        }
        if let Some(v) = var("TILEWATCH_TIMEOUT_SECS") {
            config.timeout = parse_secs("TILEWATCH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("TILEWATCH_NOTIFY_TIMEOUT_SECS") {
            config.notify_timeout = parse_secs("TILEWATCH_NOTIFY_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("TILEWATCH_CONCURRENCY") {
            let concurrency: usize = parse_var("TILEWATCH_CONCURRENCY", &v)?;
            config.concurrency = concurrency.max(1);
        }
        if let Some(v) = var("TILEWATCH_STATE_FILE") {
            config.state_file = PathBuf::from(v);
        }
        if let Some(v) = var("TILEWATCH_TILE_CLASS") {
            config.tile_class = v;
        }
        if let Some(v) = var("TILEWATCH_USER_AGENT") {
            config.user_agent = v;
        }
        if let Some(v) = var("TILEWATCH_NOTIFY") {
            config.notify = v.parse()?;
        }

        config.sms = sms_credentials(&var);

        Ok(config)
    }
}

/// Twilio credentials, present only when all four variables are set
pub fn sms_credentials<F>(var: F) -> Option<SmsCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    Some(SmsCredentials {
        account_sid: var("TWILIO_ACCOUNT_SID")?,
        auth_token: var("TWILIO_AUTH_TOKEN")?,
        from: var("TWILIO_PHONE_FROM")?,
        to: var("TWILIO_PHONE_TO")?,
    })
}

fn default_user_agent() -> String {
    format!("tilewatch/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_var<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
    })
}

/// Non-zero number of seconds
fn parse_secs(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match parse_var::<u64>(var, value)? {
        0 => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TILEWATCH_TARGETS must list at least one URL")]
    NoTargets,

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

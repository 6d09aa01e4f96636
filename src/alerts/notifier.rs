//! Notification channels for new incidents

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// A new incident for one target
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub target: String,
    pub label: String,
    pub count: u32,
    pub threshold: u32,
}

impl AlertMessage {
    /// SMS-sized body naming the page and the observed count
    pub fn body(&self) -> String {
        format!(
            "Tile alert: {} has {} sub-categories (minimum {})\n{}",
            self.label, self.count, self.threshold, self.target
        )
    }
}

/// Receipt for a delivered notification
#[derive(Debug, Clone, Default)]
pub struct Delivery {
    /// Provider message id, when the channel has one
    pub id: Option<String>,
}

/// A channel that delivers alert messages to a human
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one alert. An `Err` means the human was not reached.
    async fn notify(&self, alert: &AlertMessage) -> Result<Delivery, NotifierError>;
}

/// Logs alerts instead of sending them
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, alert: &AlertMessage) -> Result<Delivery, NotifierError> {
        tracing::warn!(
            target_url = %alert.target,
            count = alert.count,
            threshold = alert.threshold,
            "Alert triggered: {}",
            alert.body()
        );
        Ok(Delivery::default())
    }
}

/// Twilio account and phone numbers
#[derive(Debug, Clone)]
pub struct SmsCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from: String,
    pub to: String,
}

/// Sends alerts as SMS through the Twilio Messages API
pub struct SmsNotifier {
    client: reqwest::Client,
    credentials: Option<SmsCredentials>,
    api_base: String,
}

impl SmsNotifier {
    /// Create a notifier whose requests give up after `timeout`.
    /// Without credentials every delivery fails.
    pub fn new(
        credentials: Option<SmsCredentials>,
        timeout: Duration,
    ) -> Result<Self, NotifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::Client(e.to_string()))?;

        Ok(Self {
            client,
            credentials,
            api_base: TWILIO_API_BASE.to_string(),
        })
    }

    /// Point the notifier at a different API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Send an arbitrary body to the configured destination
    pub async fn send(&self, body: &str) -> Result<Delivery, NotifierError> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or(NotifierError::NotConfigured)?;

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, creds.account_sid
        );
        let form = [
            ("To", creds.to.as_str()),
            ("From", creds.from.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&creds.account_sid, Some(&creds.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifierError::Timeout(e.to_string())
                } else {
                    NotifierError::Http(format!("Failed to reach Twilio: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<TwilioError>().await {
                Ok(err) => match err.code {
                    Some(code) => format!("{} (code {})", err.message, code),
                    None => err.message,
                },
                Err(_) => "no error details".to_string(),
            };
            return Err(NotifierError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let created: TwilioMessage = response.json().await.map_err(|e| {
            if e.is_timeout() {
                NotifierError::Timeout(e.to_string())
            } else {
                NotifierError::Http(format!("Invalid Twilio response: {}", e))
            }
        })?;

        tracing::info!(
            sid = %created.sid,
            status = created.status.as_deref().unwrap_or("unknown"),
            "SMS sent"
        );

        Ok(Delivery {
            id: Some(created.sid),
        })
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    async fn notify(&self, alert: &AlertMessage) -> Result<Delivery, NotifierError> {
        self.send(&alert.body()).await
    }
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioError {
    #[serde(default)]
    code: Option<u32>,
    message: String,
}

/// Notification delivery errors
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("SMS credentials not configured")]
    NotConfigured,

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Timed out delivering notification: {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Provider rejected message with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

//! Incident alerting
//!
//! Decides per target whether a fresh observation opens, continues or
//! closes an incident, and delivers one notification per incident.

pub mod evaluator;
pub mod notifier;
pub mod state;

pub use evaluator::{evaluate, Evaluation};
pub use notifier::{
    AlertMessage, Delivery, LogNotifier, Notifier, NotifierError, SmsCredentials, SmsNotifier,
};
pub use state::{Action, AlertState};

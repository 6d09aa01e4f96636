//! Tilewatch monitor
//!
//! Runs one check of every configured page and exits. Schedule it with cron
//! or a CI workflow; see `tilewatch::config` for the environment variables.
//!
//! Exit codes:
//! - 0: every page at or above the minimum
//! - 1: degraded (a page below the minimum, a failed check, or a failed SMS)
//! - 2: alert state could not be saved
//!
//! Set `RUST_LOG` to change the log level (default: tilewatch=info).

use std::process::ExitCode;
use std::sync::Arc;

use tilewatch::alerts::{LogNotifier, Notifier, SmsNotifier};
use tilewatch::observe::{HttpObserver, TileMatcher};
use tilewatch::storage::FileBackend;
use tilewatch::{Monitor, MonitorConfig, NotifyChannel};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tilewatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MonitorConfig::from_env()?;

    tracing::info!("Tilewatch configuration:");
    tracing::info!("  Targets: {}", config.targets.len());
    for target in &config.targets {
        tracing::info!("    - {}", target);
    }
    tracing::info!("  Minimum tiles: {}", config.threshold);
    tracing::info!("  Timeout per page: {:?}", config.timeout);
    tracing::info!("  Timeout per notification: {:?}", config.notify_timeout);
    tracing::info!("  Concurrency: {}", config.concurrency);
    tracing::info!("  State file: {}", config.state_file.display());

    let notifier: Arc<dyn Notifier> = match config.notify {
        NotifyChannel::Log => {
            tracing::info!("  Notifications: log only");
            Arc::new(LogNotifier)
        }
        NotifyChannel::Sms => {
            let sms = SmsNotifier::new(config.sms.clone(), config.notify_timeout)?;
            if sms.is_configured() {
                tracing::info!("  Notifications: SMS");
            } else {
                tracing::error!(
                    "  Notifications: SMS, but Twilio credentials are not configured"
                );
            }
            Arc::new(sms)
        }
    };

    let observer = HttpObserver::new(
        TileMatcher::new(config.tile_class.clone()),
        &config.user_agent,
        config.timeout,
    )?;

    let backend = FileBackend::new(&config.state_file);
    let monitor = Monitor::new(config, Arc::new(observer), notifier);

    let report = monitor.run_once(&backend).await;
    report.log_summary();

    Ok(ExitCode::from(report.exit_code()))
}

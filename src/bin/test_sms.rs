//! Sends one test SMS to check the Twilio settings
//!
//! Run with: cargo run --bin test-sms
//!
//! Reads TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN, TWILIO_PHONE_FROM and
//! TWILIO_PHONE_TO from the environment.

use std::process::ExitCode;
use std::time::Duration;

use tilewatch::alerts::SmsNotifier;
use tilewatch::config::sms_credentials;

const TEST_MESSAGE: &str =
    "Test message from tilewatch. If you receive this, SMS alerts are working.";

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

fn status(name: &str, show_value: bool) -> String {
    match std::env::var(name).ok().filter(|v| !v.trim().is_empty()) {
        Some(value) if show_value => value,
        Some(_) => "set".to_string(),
        None => "MISSING".to_string(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    println!("Checking configuration...");
    println!("  TWILIO_ACCOUNT_SID: {}", status("TWILIO_ACCOUNT_SID", false));
    println!("  TWILIO_AUTH_TOKEN:  {}", status("TWILIO_AUTH_TOKEN", false));
    println!("  TWILIO_PHONE_FROM:  {}", status("TWILIO_PHONE_FROM", true));
    println!("  TWILIO_PHONE_TO:    {}", status("TWILIO_PHONE_TO", true));
    println!();

    let credentials =
        sms_credentials(|name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty()));
    let Some(credentials) = credentials else {
        eprintln!("ERROR: missing Twilio settings, set the variables above");
        return ExitCode::FAILURE;
    };

    let to = credentials.to.clone();
    let notifier = match SmsNotifier::new(Some(credentials), SEND_TIMEOUT) {
        Ok(notifier) => notifier,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Sending test SMS to {}...", to);
    match notifier.send(TEST_MESSAGE).await {
        Ok(delivery) => {
            println!("SUCCESS");
            println!("  Message SID: {}", delivery.id.as_deref().unwrap_or("unknown"));
            println!("Check your phone for the test message.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            eprintln!();
            eprintln!("Common issues:");
            eprintln!("  1. Wrong Account SID or Auth Token");
            eprintln!("  2. Phone numbers not in E.164 format (+1234567890)");
            eprintln!("  3. Trial accounts can only send to verified numbers");
            eprintln!("  4. The From number must be a Twilio number on this account");
            ExitCode::FAILURE
        }
    }
}

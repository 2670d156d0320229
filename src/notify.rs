use color_eyre::Result;
use resend_rs::{Resend, types::CreateEmailBaseOptions};
use tracing::{debug, warn};

use crate::config::NotifyConfig;

/// Fire the check-in email on a detached task. Failures are logged and
/// swallowed; the save path never waits for this.
pub fn spawn_notification(cfg: &NotifyConfig, mood: &str, date: &str) {
    let (Some(api_key), Some(to)) = (cfg.api_key.clone(), cfg.to.clone()) else {
        debug!("email notification not configured, skipping");
        return;
    };
    let from = cfg.from.clone();
    let (mood, date) = (mood.to_string(), date.to_string());

    tokio::spawn(async move {
        if let Err(err) = send(&api_key, from, to, &mood, &date).await {
            warn!("mood notification failed: {err:?}");
        }
    });
}

async fn send(api_key: &str, from: String, to: String, mood: &str, date: &str) -> Result<()> {
    let resend = Resend::new(api_key);
    let subject = format!("Mood logged for {date}");
    let text = format!("You checked in feeling \"{mood}\" on {date}. Keep the streak going!");

    let email = CreateEmailBaseOptions::new(from, [to], subject).with_text(&text);
    resend.emails.send(email).await?;
    Ok(())
}

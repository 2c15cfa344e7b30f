use llm_client::BoxError;
use std::time::Duration;
use tracing::info;

const NOTIFY_TIMEOUT_SECS: u64 = 15;
/// Console preview length when no webhook is configured
const CONSOLE_PREVIEW_CHARS: usize = 1200;

/// Post the run summary to the Slack incoming webhook, or print a truncated
/// console dummy when none is configured. The caller decides whether a
/// failure matters; for this pipeline it is a warning, never fatal.
pub async fn notify(
    client: &reqwest::Client,
    webhook_url: Option<&str>,
    text: &str,
) -> Result<(), BoxError> {
    let Some(url) = webhook_url else {
        let preview: String = text.chars().take(CONSOLE_PREVIEW_CHARS).collect();
        info!(preview = %preview, "SLACK_WEBHOOK_URL not set, console-only notification");
        return Ok(());
    };

    let res = client
        .post(url)
        .timeout(Duration::from_secs(NOTIFY_TIMEOUT_SECS))
        .json(&serde_json::json!({ "text": text }))
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(format!("Slack webhook returned {}: {}", status, body).into());
    }

    Ok(())
}

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::process::Command;

use crate::models::{BreakRecommendation, BreakUrgency};
use crate::notify::BreakNotifier;

/// Native desktop notification via the platform's own tooling, same
/// shell-out approach on every OS rather than three FFI bindings.
pub struct DesktopNotifier;

const TITLE: &str = "Time for a break";

fn body(recommendation: &BreakRecommendation) -> String {
    // Keep shell payloads free of quote characters.
    let reason = recommendation.reason.replace(['"', '\''], "");
    format!(
        "{} (suggested: {} min)",
        reason, recommendation.suggested_break_minutes
    )
}

#[cfg(target_os = "linux")]
async fn show(recommendation: &BreakRecommendation) -> Result<()> {
    let urgency = if recommendation.urgency >= BreakUrgency::High {
        "critical"
    } else {
        "normal"
    };

    let status = Command::new("notify-send")
        .arg("-u")
        .arg(urgency)
        .arg(TITLE)
        .arg(body(recommendation))
        .status()
        .await?;

    if !status.success() {
        return Err(anyhow!("notify-send exited with {status}"));
    }
    Ok(())
}

#[cfg(target_os = "macos")]
async fn show(recommendation: &BreakRecommendation) -> Result<()> {
    let script = format!(
        "display notification \"{}\" with title \"{}\"",
        body(recommendation),
        TITLE
    );

    let status = Command::new("osascript").arg("-e").arg(script).status().await?;

    if !status.success() {
        return Err(anyhow!("osascript exited with {status}"));
    }
    Ok(())
}

#[cfg(target_os = "windows")]
async fn show(recommendation: &BreakRecommendation) -> Result<()> {
    let script = format!(
        "[void][System.Reflection.Assembly]::LoadWithPartialName('System.Windows.Forms'); \
         [System.Windows.Forms.MessageBox]::Show('{}', '{}')",
        body(recommendation),
        TITLE
    );

    let status = Command::new("powershell")
        .arg("-NoProfile")
        .arg("-Command")
        .arg(script)
        .status()
        .await?;

    if !status.success() {
        return Err(anyhow!("powershell exited with {status}"));
    }
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
async fn show(_recommendation: &BreakRecommendation) -> Result<()> {
    Err(anyhow!("no desktop notification support on this platform"))
}

#[async_trait]
impl BreakNotifier for DesktopNotifier {
    async fn notify(&self, recommendation: &BreakRecommendation) -> Result<()> {
        show(recommendation).await
    }

    fn name(&self) -> &str {
        "desktop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::IntensityMetrics;
    use chrono::Duration;

    #[test]
    fn body_strips_quote_characters() {
        let rec = BreakRecommendation::new(
            BreakUrgency::Medium,
            "it's \"urgent\"",
            5,
            IntensityMetrics::from_counts(0, 0, 0, Duration::minutes(1)),
        );
        let text = body(&rec);
        assert!(!text.contains('"'));
        assert!(!text.contains('\''));
        assert!(text.contains("suggested: 5 min"));
    }
}

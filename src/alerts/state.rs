/// Suppression memory for the interactive notification path
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::types::Alert;
use crate::logger::{self, LogTag};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertState {
    pub seen_keys: BTreeSet<String>,
}

impl AlertState {
    pub fn has_seen(&self, key: &str) -> bool {
        self.seen_keys.contains(key)
    }
}

/// Split off alerts not shown before and mark every computed key as seen
pub fn select_unseen(alerts: &[Alert], mut state: AlertState) -> (Vec<Alert>, AlertState) {
    let fresh: Vec<Alert> = alerts
        .iter()
        .filter(|a| !state.has_seen(&a.key))
        .cloned()
        .collect();
    state
        .seen_keys
        .extend(alerts.iter().map(|a| a.key.clone()));
    (fresh, state)
}

/// One notification line per alert
pub fn format_alert_line(alert: &Alert) -> String {
    let mut line = format!(
        "- [{}] {} {}",
        alert.source.as_str().to_uppercase(),
        alert.symbol.as_deref().unwrap_or("n/a"),
        alert.title
    );
    if let Some(score) = alert.score {
        line.push_str(&format!(" (score {:.1})", score));
    }
    line
}

/// Log up to `max_lines` new alerts and return what was logged
pub fn notify(new_alerts: &[Alert], max_lines: usize) -> Vec<String> {
    if new_alerts.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<String> = new_alerts
        .iter()
        .take(max_lines)
        .map(format_alert_line)
        .collect();
    if new_alerts.len() > max_lines {
        lines.push(format!("...and {} more.", new_alerts.len() - max_lines));
    }

    logger::info(
        LogTag::Alerts,
        &format!("{} new alert(s)\n{}", new_alerts.len(), lines.join("\n")),
    );
    lines
}

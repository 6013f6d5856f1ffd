/// Token unlock schedule summary
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EnrichmentConfig;
use crate::facts::{finite, Confidence, UnlockSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockEvent {
    pub timestamp: DateTime<Utc>,
    pub amount: Option<f64>,
    /// Token price attached to the event, when the provider has one
    #[serde(default)]
    pub price: Option<f64>,
}

/// Sum the unlocks falling in `[now, now + window]`
///
/// A missing schedule is UNKNOWN. An empty schedule is also UNKNOWN: the
/// provider knows the protocol but publishes nothing about it.
pub fn summarize(
    schedule: Option<&[UnlockEvent]>,
    market_cap: Option<f64>,
    circulating: Option<f64>,
    now: DateTime<Utc>,
    cfg: &EnrichmentConfig,
) -> UnlockSummary {
    let Some(schedule) = schedule else {
        return UnlockSummary::default();
    };

    let horizon = now + Duration::days(cfg.unlock_window_days);
    let market_cap = finite(market_cap).filter(|m| *m != 0.0);
    let circulating = finite(circulating).filter(|c| *c > 0.0);

    let mut total_amount = 0.0;
    let mut total_value = 0.0;
    for event in schedule
        .iter()
        .filter(|e| e.timestamp >= now && e.timestamp <= horizon)
    {
        let amount = finite(event.amount).unwrap_or(0.0);
        total_amount += amount;

        // Value is only estimated when a market cap is known
        if let Some(mcap) = market_cap {
            if let Some(price) = finite(event.price).filter(|p| *p != 0.0) {
                total_value += amount * price;
            } else if let Some(circ) = circulating {
                total_value += amount * (mcap / circ);
            }
        }
    }

    let supply_percent = circulating.map(|c| total_amount / c * 100.0);
    let unlock_risk_flag = supply_percent.map_or(false, |p| p > cfg.unlock_supply_pct)
        || total_value > cfg.unlock_value_usd;

    UnlockSummary {
        unlock_confidence: if schedule.is_empty() {
            Confidence::Unknown
        } else {
            Confidence::Medium
        },
        unlock_next_30d: Some(total_amount).filter(|a| *a > 0.0),
        unlock_next_30d_value: Some(total_value).filter(|v| *v > 0.0),
        unlock_next_30d_percent: supply_percent,
        unlock_risk_flag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    fn event(days: i64, amount: f64, price: Option<f64>) -> UnlockEvent {
        UnlockEvent {
            timestamp: now() + Duration::days(days),
            amount: Some(amount),
            price,
        }
    }

    #[test]
    fn test_missing_schedule_is_unknown() {
        let summary = summarize(None, Some(1e9), Some(1e6), now(), &EnrichmentConfig::default());
        assert_eq!(summary.unlock_confidence, Confidence::Unknown);
        assert!(!summary.unlock_risk_flag);
    }

    #[test]
    fn test_only_window_events_count() {
        let schedule = vec![
            event(-1, 500.0, None),
            event(5, 1_000.0, None),
            event(29, 1_000.0, None),
            event(45, 9_000.0, None),
        ];
        let summary = summarize(
            Some(&schedule),
            Some(1_000_000.0),
            Some(1_000_000.0),
            now(),
            &EnrichmentConfig::default(),
        );
        assert_eq!(summary.unlock_confidence, Confidence::Medium);
        assert_eq!(summary.unlock_next_30d, Some(2_000.0));
        // mcap / circ = $1 per token
        assert_eq!(summary.unlock_next_30d_value, Some(2_000.0));
        assert!((summary.unlock_next_30d_percent.unwrap() - 0.2).abs() < 1e-9);
        assert!(!summary.unlock_risk_flag);
    }

    #[test]
    fn test_supply_share_over_one_percent_is_risky() {
        let schedule = vec![event(3, 20_000.0, None)];
        let summary = summarize(
            Some(&schedule),
            Some(1_000_000.0),
            Some(1_000_000.0),
            now(),
            &EnrichmentConfig::default(),
        );
        assert!(summary.unlock_risk_flag);
    }

    #[test]
    fn test_event_price_drives_value_threshold() {
        let schedule = vec![event(3, 100_000.0, Some(150.0))];
        let summary = summarize(
            Some(&schedule),
            Some(1e12),
            Some(1e12),
            now(),
            &EnrichmentConfig::default(),
        );
        assert_eq!(summary.unlock_next_30d_value, Some(15_000_000.0));
        assert!(summary.unlock_risk_flag);
    }

    #[test]
    fn test_empty_schedule_is_unknown() {
        let summary = summarize(Some(&[]), Some(1e9), Some(1e6), now(), &EnrichmentConfig::default());
        assert_eq!(summary.unlock_confidence, Confidence::Unknown);
        assert_eq!(summary.unlock_next_30d, None);
    }
}

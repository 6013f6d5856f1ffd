/// Traction evidence from TVL and developer activity
use serde::{Deserialize, Serialize};

use super::format_usd_compact;
use crate::config::EnrichmentConfig;
use crate::facts::{finite, TractionStatus, TractionSummary};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DevActivity {
    pub commit_count_4_weeks: Option<f64>,
    pub stars: Option<f64>,
    pub forks: Option<f64>,
}

/// Status is OK on meaningful TVL or commit activity; stars only add evidence
pub fn summarize(
    tvl_usd: Option<f64>,
    dev: Option<&DevActivity>,
    cfg: &EnrichmentConfig,
) -> TractionSummary {
    let mut summary = TractionSummary {
        tvl_current: finite(tvl_usd),
        ..TractionSummary::default()
    };

    if let Some(tvl) = summary.tvl_current.filter(|t| *t > cfg.traction_tvl_usd) {
        summary.traction_status = TractionStatus::Ok;
        summary.missing_traction = false;
        summary
            .traction_signals
            .push(format!("TVL: {}", format_usd_compact(tvl)));
    }

    if let Some(dev) = dev {
        if let Some(commits) = finite(dev.commit_count_4_weeks).filter(|c| *c > cfg.traction_commits_4w) {
            summary.traction_status = TractionStatus::Ok;
            summary.missing_traction = false;
            summary
                .traction_signals
                .push(format!("{} commits (4w)", commits));
        }
        if let Some(stars) = finite(dev.stars).filter(|s| *s > cfg.traction_stars) {
            summary.traction_signals.push(format!("{} GitHub stars", stars));
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_evidence() {
        let summary = summarize(None, None, &EnrichmentConfig::default());
        assert_eq!(summary.traction_status, TractionStatus::Unknown);
        assert!(summary.missing_traction);
        assert!(summary.traction_signals.is_empty());
    }

    #[test]
    fn test_tvl_above_floor() {
        let summary = summarize(Some(2_500_000.0), None, &EnrichmentConfig::default());
        assert_eq!(summary.traction_status, TractionStatus::Ok);
        assert_eq!(summary.traction_signals, vec!["TVL: $2.50M".to_string()]);
        assert_eq!(summary.tvl_current, Some(2_500_000.0));
    }

    #[test]
    fn test_commits_qualify_but_stars_do_not() {
        let stars_only = DevActivity {
            commit_count_4_weeks: Some(3.0),
            stars: Some(5_000.0),
            forks: None,
        };
        let summary = summarize(Some(10.0), Some(&stars_only), &EnrichmentConfig::default());
        assert_eq!(summary.traction_status, TractionStatus::Unknown);
        assert_eq!(summary.traction_signals, vec!["5000 GitHub stars".to_string()]);

        let active = DevActivity {
            commit_count_4_weeks: Some(42.0),
            ..Default::default()
        };
        let summary = summarize(None, Some(&active), &EnrichmentConfig::default());
        assert_eq!(summary.traction_status, TractionStatus::Ok);
        assert!(!summary.missing_traction);
    }
}

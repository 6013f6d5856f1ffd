/// Protocol quality scoring
///
/// Five components add up to a 0..=100 total:
/// traction 0..=40, dev 0..=20, security 0..=15, market 0..=15 and
/// token risk 0..=10.
use super::types::ProtocolInput;
use crate::alerts::{
    AuditStatus, ProtocolBucket, ProtocolCandidate, ProtocolFlags, ProtocolMarket, ProtocolScores,
    ProtocolSecurity, ProtocolTvl,
};
use crate::config::DefiConfig;
use crate::facts::finite;

/// TVL at which the size score saturates
const TVL_SIZE_CAP: f64 = 1_000_000_000.0;
/// Commit count (4w) at which the dev score saturates
const DEV_COMMITS_CAP: f64 = 50.0;

const NEUTRAL_TRACTION_PART: f64 = 10.0;
const NEUTRAL_DEV: f64 = 10.0;
const NEUTRAL_MARKET: f64 = 7.5;
const NEUTRAL_TOKEN_RISK: f64 = 5.0;

fn unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Stablecoin and CDP protocols are outside the scored universe
pub fn is_stablecoin_category(category: Option<&str>) -> bool {
    category.is_some_and(|c| {
        let c = c.to_lowercase();
        c.contains("stable") || c.contains("cdp")
    })
}

pub fn audit_status(audits: Option<f64>, audit_links: &[String]) -> AuditStatus {
    let has_links = audit_links.iter().any(|l| !l.trim().is_empty());
    match finite(audits) {
        Some(count) if count > 0.0 || has_links => AuditStatus::Yes,
        Some(_) => AuditStatus::No,
        None if has_links => AuditStatus::Yes,
        None => AuditStatus::Unknown,
    }
}

/// Size on a log scale from the inclusion floor to $1B, plus 30d momentum
///
/// A shrinking week costs 2 momentum points.
pub fn score_traction(
    focus_tvl: Option<f64>,
    change_30d: Option<f64>,
    change_7d: Option<f64>,
    cfg: &DefiConfig,
) -> f64 {
    let size = match finite(focus_tvl).filter(|t| *t > 0.0) {
        Some(tvl) => {
            let min_log = cfg.tvl_include_min.max(1.0).log10();
            let max_log = TVL_SIZE_CAP.log10();
            let span = (max_log - min_log).max(f64::EPSILON);
            unit((tvl.log10() - min_log) / span) * 20.0
        }
        None => NEUTRAL_TRACTION_PART,
    };

    let momentum = match finite(change_30d) {
        Some(ch30) => {
            let base = unit((ch30 + 20.0) / 120.0) * 20.0;
            if finite(change_7d).is_some_and(|ch7| ch7 < 0.0) {
                (base - 2.0).clamp(0.0, 20.0)
            } else {
                base
            }
        }
        None => NEUTRAL_TRACTION_PART,
    };

    (size + momentum).clamp(0.0, 40.0)
}

pub fn score_dev(commits_4w: Option<f64>) -> f64 {
    match finite(commits_4w) {
        Some(commits) => unit(commits.max(0.0).ln_1p() / DEV_COMMITS_CAP.ln_1p()) * 20.0,
        None => NEUTRAL_DEV,
    }
}

pub fn score_security(status: AuditStatus, hack_count: usize) -> f64 {
    let audit = match status {
        AuditStatus::Yes => 10.0_f64,
        AuditStatus::No => 0.0,
        AuditStatus::Unknown => 5.0,
    };
    let penalty = if hack_count > 0 { 5.0 } else { 0.0 };
    (audit - penalty).clamp(0.0, 15.0)
}

/// Turnover (60%) and absolute volume (40%) of the protocol token
pub fn score_market(market_cap: Option<f64>, volume_24h: Option<f64>) -> f64 {
    let (Some(mcap), Some(volume)) = (finite(market_cap), finite(volume_24h)) else {
        return NEUTRAL_MARKET;
    };
    let turnover = if mcap > 0.0 { volume / mcap } else { 0.0 };
    let ratio_norm = unit((turnover - 0.01) / 0.09);
    let volume_norm = unit((volume.max(1.0).log10() - 6.0) / 3.0);
    (15.0 * (0.6 * ratio_norm + 0.4 * volume_norm)).clamp(0.0, 15.0)
}

pub fn is_whale_concentrated(top10_pct: Option<f64>, top20_pct: Option<f64>) -> bool {
    finite(top10_pct).is_some_and(|p| p > 50.0) || finite(top20_pct).is_some_and(|p| p > 70.0)
}

pub fn score_token_risk(top10_pct: Option<f64>, top20_pct: Option<f64>) -> f64 {
    let top10 = finite(top10_pct);
    if top10.is_none() && finite(top20_pct).is_none() {
        return NEUTRAL_TOKEN_RISK;
    }
    if is_whale_concentrated(top10_pct, top20_pct) {
        0.0
    } else if top10.is_some_and(|p| p >= 30.0) {
        5.0
    } else {
        10.0
    }
}

/// Token too illiquid to exit: under $1M/day, or under 0.5% turnover and $5M/day
pub fn is_liquidity_trap(market_cap: Option<f64>, volume_24h: Option<f64>) -> bool {
    let (Some(mcap), Some(volume)) = (finite(market_cap), finite(volume_24h)) else {
        return false;
    };
    let thin_turnover = mcap > 0.0 && volume / mcap < 0.005 && volume < 5_000_000.0;
    volume < 1_000_000.0 || thin_turnover
}

pub fn is_tvl_collapse(change_30d: Option<f64>, change_7d: Option<f64>) -> bool {
    matches!(
        (finite(change_30d), finite(change_7d)),
        (Some(ch30), Some(ch7)) if ch30 <= -30.0 && ch7 <= -10.0
    )
}

/// AVOID wins; then CANDIDATE on size; WATCH needs mid-size TVL and strong
/// 30d growth; everything else is IGNORE
pub fn pick_bucket(
    focus_tvl: Option<f64>,
    change_30d: Option<f64>,
    avoid: bool,
    cfg: &DefiConfig,
) -> ProtocolBucket {
    if avoid {
        return ProtocolBucket::Avoid;
    }
    let Some(tvl) = finite(focus_tvl) else {
        return ProtocolBucket::Ignore;
    };
    if tvl >= cfg.tvl_include_min {
        return ProtocolBucket::Candidate;
    }
    let mid_size = tvl >= cfg.tvl_watch_min && tvl < cfg.tvl_watch_max;
    if mid_size && finite(change_30d).is_some_and(|ch| ch >= cfg.watch_growth_30d_min) {
        ProtocolBucket::Watch
    } else {
        ProtocolBucket::Ignore
    }
}

/// Score one protocol and assign its bucket
pub fn score_protocol(input: &ProtocolInput, cfg: &DefiConfig) -> ProtocolCandidate {
    let audit = audit_status(input.audits, &input.audit_links);
    let market_cap = finite(input.market_cap);
    let volume_24h = finite(input.volume_24h);

    let scores = {
        let traction = score_traction(input.focus_tvl, input.tvl_change_30d_pct, input.tvl_change_7d_pct, cfg);
        let dev = score_dev(input.commits_4w);
        let security = score_security(audit, input.hack_count);
        let market = score_market(market_cap, volume_24h);
        let token_risk = score_token_risk(input.top10_holder_pct, input.top20_holder_pct);

        let known = [
            finite(input.tvl_change_30d_pct).is_some(),
            market_cap.is_some() && volume_24h.is_some(),
            audit != AuditStatus::Unknown,
            true,
            finite(input.commits_4w).is_some(),
        ];
        let coverage = known.iter().filter(|k| **k).count() as f64 / known.len() as f64;

        ProtocolScores {
            total: Some(traction + dev + security + market + token_risk),
            traction: Some(traction),
            dev: Some(dev),
            security: Some(security),
            market: Some(market),
            token_risk: Some(token_risk),
            coverage: Some(coverage),
        }
    };

    let flags = ProtocolFlags {
        tvl_collapse: is_tvl_collapse(input.tvl_change_30d_pct, input.tvl_change_7d_pct),
        liquidity_trap: is_liquidity_trap(market_cap, volume_24h),
        dead_dev: finite(input.commits_4w) == Some(0.0),
        whale_concentration: is_whale_concentrated(input.top10_holder_pct, input.top20_holder_pct),
    };
    let avoid = flags.liquidity_trap || flags.tvl_collapse;

    ProtocolCandidate {
        name: input.name.clone(),
        slug: input.slug.clone(),
        category: input.category.clone(),
        bucket: Some(pick_bucket(input.focus_tvl, input.tvl_change_30d_pct, avoid, cfg)),
        scores,
        market: ProtocolMarket {
            token_symbol: input.token_symbol.as_deref().map(str::to_uppercase),
            gecko_id: input.gecko_id.clone(),
            market_cap,
            volume_24h,
            volume_to_mcap: market_cap
                .zip(volume_24h)
                .filter(|(mcap, _)| *mcap > 0.0)
                .map(|(mcap, volume)| volume / mcap),
        },
        links: input.links.clone(),
        tvl: ProtocolTvl {
            focus_current: finite(input.focus_tvl),
            change_30d_pct: finite(input.tvl_change_30d_pct),
            change_7d_pct: finite(input.tvl_change_7d_pct),
        },
        security: ProtocolSecurity {
            audit_status: audit,
            hack_count: input.hack_count,
        },
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{} != {}", actual, expected);
    }

    #[test]
    fn test_bucket_boundaries() {
        let cfg = DefiConfig::default();
        assert_eq!(pick_bucket(Some(10_000_000.0), None, false, &cfg), ProtocolBucket::Candidate);
        assert_eq!(pick_bucket(Some(9_999_999.0), Some(50.0), false, &cfg), ProtocolBucket::Watch);
        assert_eq!(pick_bucket(Some(9_999_999.0), Some(49.9), false, &cfg), ProtocolBucket::Ignore);
        assert_eq!(pick_bucket(Some(3_000_000.0), Some(80.0), false, &cfg), ProtocolBucket::Watch);
        assert_eq!(pick_bucket(Some(2_999_999.0), Some(80.0), false, &cfg), ProtocolBucket::Ignore);
        // WATCH needs a known 30d change
        assert_eq!(pick_bucket(Some(5_000_000.0), None, false, &cfg), ProtocolBucket::Ignore);
        assert_eq!(pick_bucket(None, Some(90.0), false, &cfg), ProtocolBucket::Ignore);
        assert_eq!(pick_bucket(Some(5e10), Some(90.0), true, &cfg), ProtocolBucket::Avoid);
    }

    #[test]
    fn test_traction_scale() {
        let cfg = DefiConfig::default();
        close(score_traction(None, None, None, &cfg), 20.0);
        close(score_traction(Some(10_000_000.0), Some(-20.0), None, &cfg), 0.0);
        close(score_traction(Some(1e9), Some(100.0), Some(3.0), &cfg), 40.0);
        close(score_traction(Some(1e12), Some(500.0), None, &cfg), 40.0);
        // 10^8 is halfway on the log scale; +40% is halfway on momentum
        close(score_traction(Some(1e8), Some(40.0), Some(1.0), &cfg), 20.0);
        close(score_traction(Some(1e8), Some(40.0), Some(-1.0), &cfg), 18.0);
        close(score_traction(Some(1e8), Some(-20.0), Some(-5.0), &cfg), 10.0);
    }

    #[test]
    fn test_component_scores() {
        close(score_dev(None), 10.0);
        close(score_dev(Some(0.0)), 0.0);
        close(score_dev(Some(50.0)), 20.0);
        close(score_dev(Some(500.0)), 20.0);

        close(score_security(AuditStatus::Yes, 0), 10.0);
        close(score_security(AuditStatus::Unknown, 2), 0.0);
        close(score_security(AuditStatus::No, 1), 0.0);

        close(score_market(None, Some(1e7)), 7.5);
        close(score_market(Some(1e8), Some(1e7)), 15.0 * (0.6 + 0.4 / 3.0));
        close(score_market(Some(0.0), Some(1.0)), 0.0);

        close(score_token_risk(None, None), 5.0);
        close(score_token_risk(Some(51.0), None), 0.0);
        close(score_token_risk(Some(20.0), Some(71.0)), 0.0);
        close(score_token_risk(Some(30.0), Some(40.0)), 5.0);
        close(score_token_risk(Some(12.0), None), 10.0);
    }

    #[test]
    fn test_audit_status() {
        let links = vec!["https://audits.example/report.pdf".to_string()];
        assert_eq!(audit_status(Some(2.0), &[]), AuditStatus::Yes);
        assert_eq!(audit_status(Some(0.0), &links), AuditStatus::Yes);
        assert_eq!(audit_status(Some(0.0), &[]), AuditStatus::No);
        assert_eq!(audit_status(None, &links), AuditStatus::Yes);
        assert_eq!(audit_status(None, &[" ".to_string()]), AuditStatus::Unknown);
    }

    #[test]
    fn test_risk_flags() {
        assert!(is_liquidity_trap(Some(1e9), Some(900_000.0)));
        assert!(is_liquidity_trap(Some(1e9), Some(4_000_000.0)));
        assert!(!is_liquidity_trap(Some(1e9), Some(6_000_000.0)));
        assert!(!is_liquidity_trap(None, Some(10.0)));

        assert!(is_tvl_collapse(Some(-30.0), Some(-10.0)));
        assert!(!is_tvl_collapse(Some(-30.0), Some(-9.0)));
        assert!(!is_tvl_collapse(Some(-50.0), None));

        assert!(is_stablecoin_category(Some("CDP")));
        assert!(is_stablecoin_category(Some("Algo-Stables")));
        assert!(!is_stablecoin_category(Some("Lending")));
        assert!(!is_stablecoin_category(None));
    }

    #[test]
    fn test_score_protocol_sums_components() {
        let input = ProtocolInput {
            name: Some("Lendy".to_string()),
            slug: Some("lendy".to_string()),
            focus_tvl: Some(1e8),
            tvl_change_30d_pct: Some(40.0),
            tvl_change_7d_pct: Some(2.0),
            token_symbol: Some("lnd".to_string()),
            market_cap: Some(1e8),
            volume_24h: Some(1e7),
            audits: Some(1.0),
            commits_4w: Some(0.0),
            ..Default::default()
        };
        let scored = score_protocol(&input, &DefiConfig::default());

        assert_eq!(scored.bucket, Some(ProtocolBucket::Candidate));
        assert_eq!(scored.market.token_symbol.as_deref(), Some("LND"));
        assert_eq!(scored.market.volume_to_mcap, Some(0.1));
        assert!(scored.flags.dead_dev);
        assert!(!scored.flags.liquidity_trap);
        close(scored.scores.coverage.unwrap(), 1.0);

        let expected = 20.0 + 0.0 + 10.0 + 15.0 * (0.6 + 0.4 / 3.0) + 5.0;
        close(scored.scores.total.unwrap(), expected);
    }

    #[test]
    fn test_collapsing_protocol_is_avoided() {
        let input = ProtocolInput {
            slug: Some("sinking".to_string()),
            focus_tvl: Some(5e8),
            tvl_change_30d_pct: Some(-45.0),
            tvl_change_7d_pct: Some(-12.0),
            ..Default::default()
        };
        let scored = score_protocol(&input, &DefiConfig::default());
        assert_eq!(scored.bucket, Some(ProtocolBucket::Avoid));
        assert!(scored.flags.tvl_collapse);
        // 30d known, market unknown, audits unknown, hacks known, dev unknown
        close(scored.scores.coverage.unwrap(), 0.4);
    }
}

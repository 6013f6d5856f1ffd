use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use super::types::{
    Alert, AlertDetails, AlertSource, AlertThresholds, AlertsReport, DiscoveryCandidate, DiscoveryFeed,
    ProtocolBucket, ProtocolCandidate, ProtocolFeed,
};
use crate::facts::{finite, normalize_coin_id};
use crate::gates::{HygieneLabel, LabeledInstrument};
use crate::logger::{self, LogTag};
use crate::snapshot::Snapshot;

const COINGECKO_COIN_URL: &str = "https://www.coingecko.com/en/coins";

/// Compute every alert for one run, ordered by score then key
///
/// Pure: the same inputs always yield the same list.
pub fn compute(
    snapshot: &Snapshot,
    protocol_feed: &ProtocolFeed,
    discovery_feed: &DiscoveryFeed,
    thresholds: &AlertThresholds,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if thresholds.alert_actionable {
        alerts.extend(snapshot.instruments.iter().filter_map(watchlist_alert));
    }
    if let Some(threshold) = thresholds.defi_score_threshold {
        alerts.extend(
            protocol_feed
                .protocols
                .iter()
                .filter_map(|p| defi_alert(p, threshold)),
        );
    }
    if let Some(threshold) = thresholds.discovery_score_threshold {
        alerts.extend(
            discovery_feed
                .candidates
                .iter()
                .filter_map(|c| discovery_alert(c, threshold)),
        );
    }

    alerts.sort_by(compare_alerts);

    logger::debug(
        LogTag::Alerts,
        &format!(
            "alerts={} watchlist={} defi={} discovery={}",
            alerts.len(),
            count_source(&alerts, AlertSource::Watchlist),
            count_source(&alerts, AlertSource::Defi),
            count_source(&alerts, AlertSource::Discovery)
        ),
    );

    alerts
}

pub fn build_report(
    generated_at: DateTime<Utc>,
    thresholds: AlertThresholds,
    alerts: Vec<Alert>,
) -> AlertsReport {
    AlertsReport {
        generated_at,
        thresholds,
        alerts,
    }
}

/// Score descending with missing scores last, then key ascending
pub fn compare_alerts(a: &Alert, b: &Alert) -> Ordering {
    let score = |alert: &Alert| finite(alert.score).unwrap_or(f64::NEG_INFINITY);
    score(b)
        .total_cmp(&score(a))
        .then_with(|| a.key.cmp(&b.key))
}

fn count_source(alerts: &[Alert], source: AlertSource) -> usize {
    alerts.iter().filter(|a| a.source == source).count()
}

fn coin_url(id: &str) -> String {
    format!("{}/{}", COINGECKO_COIN_URL, id)
}

// =============================================================================
// RULES
// =============================================================================

fn watchlist_alert(instrument: &LabeledInstrument) -> Option<Alert> {
    if instrument.hygiene_label != HygieneLabel::Keep || !instrument.facts.has_catalyst() {
        return None;
    }
    let facts = &instrument.facts;
    let id = normalize_coin_id(facts.stable_id()).unwrap_or_else(|| "unknown".to_string());
    let url = normalize_coin_id(facts.coin_id.as_deref()).map(|id| coin_url(&id));

    Some(Alert {
        key: format!("{}:{}", AlertSource::Watchlist.as_str(), id),
        source: AlertSource::Watchlist,
        watchlist_source: Some(facts.watchlist_source),
        symbol: Some(instrument.symbol().to_string()),
        title: "Actionable (KEEP + catalyst)".to_string(),
        score: None,
        url,
        details: AlertDetails::Watchlist {
            hygiene_label: instrument.hygiene_label,
            catalyst: facts.catalyst.clean_catalyst.clone(),
        },
    })
}

fn defi_alert(protocol: &ProtocolCandidate, threshold: f64) -> Option<Alert> {
    let score = finite(protocol.scores.total)?;
    if score < threshold {
        return None;
    }
    // Feeds without bucketing pass; otherwise only the candidate tier alerts
    if protocol.bucket.is_some_and(|b| b != ProtocolBucket::Candidate) {
        return None;
    }

    let id = normalize_coin_id(protocol.slug.as_deref())
        .or_else(|| normalize_coin_id(protocol.name.as_deref()))
        .unwrap_or_else(|| "unknown".to_string());
    let name = protocol.name.as_deref().unwrap_or("Protocol");

    Some(Alert {
        key: format!("{}:{}", AlertSource::Defi.as_str(), id),
        source: AlertSource::Defi,
        watchlist_source: None,
        symbol: protocol
            .market
            .token_symbol
            .clone()
            .or_else(|| protocol.market.gecko_id.clone()),
        title: format!("{} score {:.1}", name, score),
        score: Some(score),
        url: protocol
            .links
            .defillama
            .clone()
            .or_else(|| protocol.links.website.clone()),
        details: AlertDetails::Defi {
            bucket: protocol.bucket,
            token_gecko_id: protocol.market.gecko_id.clone(),
            tvl: protocol.tvl.focus_current,
            tvl_30d: protocol.tvl.change_30d_pct,
            tvl_7d: protocol.tvl.change_7d_pct,
        },
    })
}

fn discovery_alert(candidate: &DiscoveryCandidate, threshold: f64) -> Option<Alert> {
    let score = finite(candidate.discovery_score)?;
    if score < threshold {
        return None;
    }
    let status = candidate.status.unwrap_or_default();
    if !status.is_open() {
        return None;
    }
    let id = candidate.coin_id()?;
    let name = candidate.name.as_deref().unwrap_or(&id);

    Some(Alert {
        key: format!("{}:{}", AlertSource::Discovery.as_str(), id),
        source: AlertSource::Discovery,
        watchlist_source: None,
        symbol: candidate.symbol.as_deref().map(str::to_uppercase),
        title: format!("{} discovery score {:.1}", name, score),
        score: Some(score),
        url: Some(coin_url(&id)),
        details: AlertDetails::Discovery {
            status,
            market_cap: candidate.market_cap,
            volume_24h: candidate.volume_24h,
            price_change_7d: candidate.price_change_7d,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::types::{DiscoveryStatus, ProtocolScores};
    use crate::test_support::{labeled, snapshot_of};

    fn protocol(slug: &str, total: f64, bucket: Option<ProtocolBucket>) -> ProtocolCandidate {
        ProtocolCandidate {
            name: Some(slug.to_uppercase()),
            slug: Some(slug.to_string()),
            bucket,
            scores: ProtocolScores {
                total: Some(total),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn candidate(id: &str, score: f64, status: Option<DiscoveryStatus>) -> DiscoveryCandidate {
        DiscoveryCandidate {
            coin_gecko_id: Some(id.to_string()),
            symbol: Some(id[..3].to_string()),
            discovery_score: Some(score),
            status,
            ..Default::default()
        }
    }

    fn inputs() -> (Snapshot, ProtocolFeed, DiscoveryFeed) {
        let keep = labeled("AAA", HygieneLabel::Keep);
        let mut no_catalyst = labeled("BBB", HygieneLabel::Keep);
        no_catalyst.facts.catalyst.has_clean_catalyst = false;
        let watch = labeled("CCC", HygieneLabel::WatchOnly);
        let snapshot = snapshot_of("2026-04-01T00:00:00Z", vec![keep, no_catalyst, watch]);

        let protocols = ProtocolFeed {
            protocols: vec![
                protocol("aave", 82.0, Some(ProtocolBucket::Candidate)),
                protocol("curve", 90.0, Some(ProtocolBucket::Watch)),
                protocol("lido", 71.5, None),
                protocol("tiny", 40.0, Some(ProtocolBucket::Candidate)),
            ],
            ..Default::default()
        };
        let discovery = DiscoveryFeed {
            candidates: vec![
                candidate("newcoin", 82.0, None),
                candidate("stagedcoin", 95.0, Some(DiscoveryStatus::Staged)),
                candidate("promoted", 99.0, Some(DiscoveryStatus::Promoted)),
                candidate("lowscore", 60.0, Some(DiscoveryStatus::New)),
            ],
            ..Default::default()
        };
        (snapshot, protocols, discovery)
    }

    #[test]
    fn test_rules_and_ordering() {
        let (snapshot, protocols, discovery) = inputs();
        let alerts = compute(&snapshot, &protocols, &discovery, &AlertThresholds::default());
        let keys: Vec<&str> = alerts.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "discovery:stagedcoin",
                "defi:aave",
                "discovery:newcoin",
                "defi:lido",
                "watchlist:aaa",
            ]
        );

        for pair in alerts.windows(2) {
            let a = pair[0].score.unwrap_or(f64::NEG_INFINITY);
            let b = pair[1].score.unwrap_or(f64::NEG_INFINITY);
            assert!(a > b || (a == b && pair[0].key < pair[1].key));
        }

        let watch = alerts.last().unwrap();
        assert_eq!(watch.title, "Actionable (KEEP + catalyst)");
        assert_eq!(watch.url.as_deref(), Some("https://www.coingecko.com/en/coins/aaa"));
        assert_eq!(alerts[1].title, "AAVE score 82.0");
        assert_eq!(alerts[0].symbol.as_deref(), Some("STA"));
    }

    #[test]
    fn test_compute_is_idempotent() {
        let (snapshot, protocols, discovery) = inputs();
        let thresholds = AlertThresholds::default();
        let first = compute(&snapshot, &protocols, &discovery, &thresholds);
        let second = compute(&snapshot, &protocols, &discovery, &thresholds);
        assert_eq!(first, second);
    }

    #[test]
    fn test_disabled_rules_emit_nothing() {
        let (snapshot, protocols, discovery) = inputs();
        let thresholds = AlertThresholds {
            defi_score_threshold: None,
            discovery_score_threshold: None,
            alert_actionable: false,
        };
        assert!(compute(&snapshot, &protocols, &discovery, &thresholds).is_empty());
    }

    #[test]
    fn test_equal_scores_break_ties_by_key() {
        let snapshot = snapshot_of("2026-04-01T00:00:00Z", Vec::new());
        let discovery = DiscoveryFeed {
            candidates: vec![candidate("zeta", 85.0, None), candidate("alpha", 85.0, None)],
            ..Default::default()
        };
        let alerts = compute(
            &snapshot,
            &ProtocolFeed::default(),
            &discovery,
            &AlertThresholds::default(),
        );
        assert_eq!(alerts[0].key, "discovery:alpha");
        assert_eq!(alerts[1].key, "discovery:zeta");
    }

    #[test]
    fn test_feed_parsing_tolerates_unknown_values() {
        let json = r#"{"candidates":[
            {"coinGeckoId":"Foo-Bar","symbol":"foo","discovery_score":88,"status":"ARCHIVED"},
            {"coinGeckoId":"baz","symbol":"baz","discovery_score":91}
        ]}"#;
        let feed: DiscoveryFeed = serde_json::from_str(json).unwrap();
        assert_eq!(feed.candidates[0].status, Some(DiscoveryStatus::Other));

        let snapshot = snapshot_of("2026-04-01T00:00:00Z", Vec::new());
        let alerts = compute(
            &snapshot,
            &ProtocolFeed::default(),
            &feed,
            &AlertThresholds::default(),
        );
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].key, "discovery:baz");
        assert_eq!(alerts[0].symbol.as_deref(), Some("BAZ"));
    }

    #[test]
    fn test_entry_with_both_id_keys_alerts_once() {
        let json = r#"{"candidates":[
            {"id":"foo","coinGeckoId":"foo","symbol":"FOO","discovery_score":90,"status":"NEW"},
            {"id":"legacy-only","symbol":"leg","discovery_score":85},
            {"id":"stale","coinGeckoId":" Renamed ","symbol":"ren","discovery_score":86}
        ]}"#;
        let feed: DiscoveryFeed = serde_json::from_str(json).unwrap();
        assert_eq!(feed.candidates.len(), 3);

        let snapshot = snapshot_of("2026-04-01T00:00:00Z", Vec::new());
        let alerts = compute(
            &snapshot,
            &ProtocolFeed::default(),
            &feed,
            &AlertThresholds::default(),
        );
        let keys: Vec<&str> = alerts.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["discovery:foo", "discovery:renamed", "discovery:legacy-only"]);
        assert_eq!(alerts[0].url.as_deref(), Some("https://www.coingecko.com/en/coins/foo"));
    }
}

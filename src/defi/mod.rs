//! Protocol quality scoring
//!
//! Turns raw per-protocol metrics into the scored, bucketed protocol feed
//! that the alert engine consumes. Everything here is a pure function of
//! its inputs and the [`DefiConfig`](crate::config::DefiConfig) table.

pub mod scoring;
pub mod types;

pub use scoring::{pick_bucket, score_protocol};
pub use types::{ProtocolInput, ProtocolUniverse};

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::alerts::{ProtocolBucket, ProtocolFeed};
use crate::config::DefiConfig;
use crate::logger::{self, LogTag};

/// Score a protocol universe into a feed
///
/// CEX and stablecoin/CDP protocols are skipped. IGNORE protocols are dropped
/// and the rest are ordered by total score, then slug.
pub fn build_feed(inputs: &[ProtocolInput], cfg: &DefiConfig, generated_at: DateTime<Utc>) -> ProtocolFeed {
    let mut protocols: Vec<_> = inputs
        .iter()
        .filter(|p| p.category.as_deref() != Some("CEX"))
        .filter(|p| !scoring::is_stablecoin_category(p.category.as_deref()))
        .map(|p| score_protocol(p, cfg))
        .filter(|p| p.bucket != Some(ProtocolBucket::Ignore))
        .collect();

    protocols.sort_by(|a, b| {
        let total_a = a.scores.total.unwrap_or(0.0);
        let total_b = b.scores.total.unwrap_or(0.0);
        total_b
            .partial_cmp(&total_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.slug.cmp(&b.slug))
    });

    let count = |bucket: ProtocolBucket| protocols.iter().filter(|p| p.bucket == Some(bucket)).count();
    logger::info(
        LogTag::Defi,
        &format!(
            "Scored {} of {} protocols: {}={} {}={} {}={}",
            protocols.len(),
            inputs.len(),
            ProtocolBucket::Candidate.as_str(),
            count(ProtocolBucket::Candidate),
            ProtocolBucket::Watch.as_str(),
            count(ProtocolBucket::Watch),
            ProtocolBucket::Avoid.as_str(),
            count(ProtocolBucket::Avoid),
        ),
    );

    ProtocolFeed {
        generated_at: Some(generated_at),
        protocols,
    }
}

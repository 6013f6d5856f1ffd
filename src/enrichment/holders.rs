/// Holder concentration from a ranked top-holder list
use serde::{Deserialize, Serialize};

use crate::config::EnrichmentConfig;
use crate::facts::{AddressKind, Confidence, HolderEntry, HolderSummary};

/// Number of ranked entries kept on the summary for display
const TOP_HOLDER_ENTRIES: usize = 10;

/// One holder as reported by an explorer, balance already in whole tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderBalance {
    pub address: Option<String>,
    pub balance: Option<f64>,
    #[serde(default)]
    pub address_type: Option<AddressKind>,
}

/// Summarize concentration; `holders` is ordered largest first
///
/// No holder list means UNKNOWN confidence and no risk. A list without a
/// usable supply still counts as MEDIUM confidence but yields no percentages.
pub fn concentration(
    holders: Option<&[HolderBalance]>,
    supply: Option<f64>,
    cfg: &EnrichmentConfig,
) -> HolderSummary {
    let Some(holders) = holders else {
        return HolderSummary::default();
    };

    let considered = &holders[..holders.len().min(cfg.holders_considered)];
    let mut top10_total = 0.0;
    let mut top20_total = 0.0;
    for (idx, holder) in considered.iter().enumerate() {
        if let Some(balance) = usable_balance(holder.balance) {
            if idx < 10 {
                top10_total += balance;
            }
            top20_total += balance;
        }
    }

    let supply = supply.filter(|s| s.is_finite() && *s > 0.0);
    let top_10_holder_percent = supply.map(|s| top10_total / s * 100.0);
    let top_20_holder_percent = supply.map(|s| top20_total / s * 100.0);

    let high_concentration_risk = top_10_holder_percent
        .map_or(false, |p| p > cfg.concentration_top10_pct)
        || top_20_holder_percent.map_or(false, |p| p > cfg.concentration_top20_pct);

    let top_holders = holders
        .iter()
        .take(TOP_HOLDER_ENTRIES)
        .enumerate()
        .map(|(idx, holder)| HolderEntry {
            rank: idx as u32 + 1,
            address: holder.address.clone(),
            address_type: holder.address_type,
            percent_of_supply: match (supply, holder.balance) {
                (Some(s), Some(b)) if b.is_finite() && b >= 0.0 => Some(b / s * 100.0),
                _ => None,
            },
        })
        .collect();

    HolderSummary {
        top_10_holder_percent,
        top_20_holder_percent,
        high_concentration_risk,
        holder_confidence: Confidence::Medium,
        top_holders,
    }
}

fn usable_balance(balance: Option<f64>) -> Option<f64> {
    balance.filter(|b| b.is_finite() && *b > 0.0)
}

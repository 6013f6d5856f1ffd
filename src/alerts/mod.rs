//! Threshold alerts across the watchlist and the two candidate feeds
//!
//! [`compute`] is a pure function of its inputs and always returns the same
//! ordered list for the same inputs. Suppression of already-seen alerts
//! lives in [`state`] and only runs on the optional notification path.

pub mod engine;
pub mod state;
pub mod types;

pub use engine::{build_report, compute};
pub use state::{format_alert_line, notify, select_unseen, AlertState};
pub use types::{
    Alert, AlertDetails, AlertSource, AlertThresholds, AlertsReport, AuditStatus,
    DiscoveryCandidate, DiscoveryFeed, DiscoverySource, DiscoveryStatus, ProtocolBucket, ProtocolCandidate,
    ProtocolFeed, ProtocolFlags, ProtocolLinks, ProtocolMarket, ProtocolScores, ProtocolSecurity, ProtocolTvl,
};

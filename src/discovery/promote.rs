/// Queue decisions: stage, promote, ignore and their reversals
///
/// Each action runs per id against the three lists together, so the queue
/// status always matches where the coin actually lives. Ids are trimmed and
/// lowercased before use.
use chrono::{DateTime, Utc};

use super::queue::normalize_entry;
use super::types::{WatchlistEntry, WatchlistUrls};
use crate::alerts::{DiscoveryCandidate, DiscoveryFeed, DiscoveryStatus};
use crate::facts::normalize_coin_id;

const DISCOVERY_CATEGORY: &str = "discovery";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAction {
    Stage,
    Promote,
    Ignore,
    Unstage,
    Unignore,
}

impl QueueAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueAction::Stage => "stage",
            QueueAction::Promote => "promote",
            QueueAction::Ignore => "ignore",
            QueueAction::Unstage => "unstage",
            QueueAction::Unignore => "unignore",
        }
    }
}

/// What an action did to one id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Staged,
    AlreadyStaged,
    Promoted,
    AlreadyOnWatchlist,
    Ignored,
    /// Ignored even though the coin is on the main watchlist
    IgnoredWhileWatched,
    Unstaged,
    Unignored,
    NotInQueue,
    NotStaged,
    /// Skipped because the queue entry is in this status
    Blocked(DiscoveryStatus),
}

impl ActionOutcome {
    pub fn describe(&self) -> String {
        match self {
            ActionOutcome::Staged => "staged".to_string(),
            ActionOutcome::AlreadyStaged => "already staged".to_string(),
            ActionOutcome::Promoted => "promoted".to_string(),
            ActionOutcome::AlreadyOnWatchlist => "already in main watchlist".to_string(),
            ActionOutcome::Ignored => "marked IGNORED".to_string(),
            ActionOutcome::IgnoredWhileWatched => {
                "marked IGNORED; still in main watchlist, remove it manually".to_string()
            }
            ActionOutcome::Unstaged => "unstaged".to_string(),
            ActionOutcome::Unignored => "unignored (status=NEW)".to_string(),
            ActionOutcome::NotInQueue => "not in discovery queue".to_string(),
            ActionOutcome::NotStaged => "not staged".to_string(),
            ActionOutcome::Blocked(status) => format!("status={} (no change)", status.as_str()),
        }
    }
}

/// Main watchlist, staging watchlist and discovery queue
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListState {
    pub watchlist: Vec<WatchlistEntry>,
    pub staging: Vec<WatchlistEntry>,
    pub queue: DiscoveryFeed,
}

impl ListState {
    fn on_watchlist(&self, id: &str) -> bool {
        self.watchlist.iter().any(|e| e.coin_id().as_deref() == Some(id))
    }

    fn staged_entry(&self, id: &str) -> Option<&WatchlistEntry> {
        self.staging.iter().find(|e| e.coin_id().as_deref() == Some(id))
    }

    fn remove_staged(&mut self, id: &str) -> bool {
        let before = self.staging.len();
        self.staging.retain(|e| e.coin_id().as_deref() != Some(id));
        self.staging.len() != before
    }

    fn set_status(&mut self, id: &str, status: DiscoveryStatus) -> bool {
        match self.queue.get_mut(id) {
            Some(entry) if entry.status != Some(status) => {
                entry.status = Some(status);
                true
            }
            _ => false,
        }
    }
}

/// Watchlist entry for a queue candidate, keeping what `existing` already has
pub fn to_watchlist_entry(
    candidate: Option<&DiscoveryCandidate>,
    existing: Option<&WatchlistEntry>,
) -> WatchlistEntry {
    let pick = |from_candidate: Option<&String>, from_existing: Option<&String>| {
        from_candidate
            .filter(|v| !v.is_empty())
            .or(from_existing.filter(|v| !v.is_empty()))
            .cloned()
            .unwrap_or_default()
    };

    let candidate_id = candidate.and_then(|c| c.coin_gecko_id.as_ref().or(c.id.as_ref()));
    let category = existing
        .map(|e| e.category.clone())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DISCOVERY_CATEGORY.to_string());

    WatchlistEntry {
        symbol: pick(
            candidate.and_then(|c| c.symbol.as_ref()),
            existing.map(|e| &e.symbol),
        )
        .to_uppercase(),
        name: pick(candidate.and_then(|c| c.name.as_ref()), existing.map(|e| &e.name)),
        coin_gecko_id: pick(candidate_id, existing.map(|e| &e.coin_gecko_id)),
        category,
        urls: existing.map(|e| e.urls.clone()).unwrap_or_else(WatchlistUrls::default),
        notes: existing.map(|e| e.notes.clone()).unwrap_or_default(),
        extra: existing.map(|e| e.extra.clone()).unwrap_or_default(),
    }
}

fn stage(state: &mut ListState, id: &str) -> (ActionOutcome, bool) {
    if state.on_watchlist(id) {
        let changed = state.set_status(id, DiscoveryStatus::Promoted);
        return (ActionOutcome::AlreadyOnWatchlist, changed);
    }
    let Some(idx) = state.queue.position(id) else {
        return (ActionOutcome::NotInQueue, false);
    };
    if let status @ (DiscoveryStatus::Ignored | DiscoveryStatus::Promoted) =
        state.queue.candidates[idx].status.unwrap_or_default()
    {
        return (ActionOutcome::Blocked(status), false);
    }
    if state.staged_entry(id).is_some() {
        let changed = state.set_status(id, DiscoveryStatus::Staged);
        return (ActionOutcome::AlreadyStaged, changed);
    }

    let entry = &mut state.queue.candidates[idx];
    normalize_entry(entry);
    entry.status = Some(DiscoveryStatus::Staged);
    let staged = to_watchlist_entry(Some(&*entry), None);
    state.staging.push(staged);
    (ActionOutcome::Staged, true)
}

fn promote(state: &mut ListState, id: &str, now: DateTime<Utc>) -> (ActionOutcome, bool) {
    if state.on_watchlist(id) {
        let changed = state.set_status(id, DiscoveryStatus::Promoted);
        return (ActionOutcome::AlreadyOnWatchlist, changed);
    }

    let staged = state.staged_entry(id).cloned();
    let queued = state.queue.position(id);
    let entry = match (&staged, queued) {
        (Some(staged), _) => to_watchlist_entry(None, Some(staged)),
        (None, Some(idx)) => {
            let candidate = &mut state.queue.candidates[idx];
            normalize_entry(candidate);
            to_watchlist_entry(Some(&*candidate), None)
        }
        (None, None) => return (ActionOutcome::NotInQueue, false),
    };

    if staged.is_some() {
        state.remove_staged(id);
    }
    match queued {
        Some(idx) => state.queue.candidates[idx].status = Some(DiscoveryStatus::Promoted),
        None => state.queue.candidates.push(DiscoveryCandidate {
            coin_gecko_id: Some(entry.coin_gecko_id.clone()),
            symbol: Some(entry.symbol.clone()),
            name: Some(entry.name.clone()),
            status: Some(DiscoveryStatus::Promoted),
            notes: Some(String::new()),
            first_seen_at: Some(now),
            last_seen_at: Some(now),
            ..Default::default()
        }),
    }
    state.watchlist.push(entry);
    (ActionOutcome::Promoted, true)
}

fn ignore(state: &mut ListState, id: &str, now: DateTime<Utc>) -> (ActionOutcome, bool) {
    match state.queue.get_mut(id) {
        Some(entry) => entry.status = Some(DiscoveryStatus::Ignored),
        None => state.queue.candidates.push(DiscoveryCandidate {
            coin_gecko_id: Some(id.to_string()),
            symbol: Some(String::new()),
            name: Some(String::new()),
            status: Some(DiscoveryStatus::Ignored),
            notes: Some(String::new()),
            first_seen_at: Some(now),
            last_seen_at: Some(now),
            ..Default::default()
        }),
    }
    state.remove_staged(id);

    if state.on_watchlist(id) {
        (ActionOutcome::IgnoredWhileWatched, true)
    } else {
        (ActionOutcome::Ignored, true)
    }
}

fn unstage(state: &mut ListState, id: &str) -> (ActionOutcome, bool) {
    if !state.remove_staged(id) {
        return (ActionOutcome::NotStaged, false);
    }
    if let Some(entry) = state.queue.get_mut(id) {
        if entry.status == Some(DiscoveryStatus::Staged) {
            entry.status = Some(DiscoveryStatus::New);
        }
    }
    (ActionOutcome::Unstaged, true)
}

fn unignore(state: &mut ListState, id: &str) -> (ActionOutcome, bool) {
    let Some(entry) = state.queue.get_mut(id) else {
        return (ActionOutcome::NotInQueue, false);
    };
    match entry.status.unwrap_or_default() {
        DiscoveryStatus::Ignored => {
            entry.status = Some(DiscoveryStatus::New);
            (ActionOutcome::Unignored, true)
        }
        status => (ActionOutcome::Blocked(status), false),
    }
}

/// Apply one action to every id
///
/// Returns the per-id outcomes and whether any list changed; callers only
/// need to persist when it did. Blank ids are skipped.
pub fn apply(
    state: &mut ListState,
    action: QueueAction,
    ids: &[String],
    now: DateTime<Utc>,
) -> (Vec<(String, ActionOutcome)>, bool) {
    let mut outcomes = Vec::with_capacity(ids.len());
    let mut changed = false;

    for id in ids.iter().filter_map(|id| normalize_coin_id(Some(id))) {
        let (outcome, did_change) = match action {
            QueueAction::Stage => stage(state, &id),
            QueueAction::Promote => promote(state, &id, now),
            QueueAction::Ignore => ignore(state, &id, now),
            QueueAction::Unstage => unstage(state, &id),
            QueueAction::Unignore => unignore(state, &id),
        };
        changed |= did_change;
        outcomes.push((id, outcome));
    }

    (outcomes, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ts;

    fn queued(id: &str, status: DiscoveryStatus) -> DiscoveryCandidate {
        DiscoveryCandidate {
            coin_gecko_id: Some(id.to_string()),
            symbol: Some(id[..3].to_string()),
            name: Some(format!("{} Token", id)),
            discovery_score: Some(85.0),
            status: Some(status),
            ..Default::default()
        }
    }

    fn listed(id: &str) -> WatchlistEntry {
        WatchlistEntry {
            symbol: id.to_uppercase(),
            name: id.to_string(),
            coin_gecko_id: id.to_string(),
            category: "l1".to_string(),
            notes: "hand picked".to_string(),
            ..Default::default()
        }
    }

    fn state() -> ListState {
        ListState {
            watchlist: vec![listed("solana")],
            staging: vec![listed("staged-coin")],
            queue: DiscoveryFeed {
                candidates: vec![
                    queued("fresh-coin", DiscoveryStatus::New),
                    queued("staged-coin", DiscoveryStatus::New),
                    queued("solana", DiscoveryStatus::New),
                    queued("dropped", DiscoveryStatus::Ignored),
                ],
                ..Default::default()
            },
        }
    }

    fn status(state: &ListState, id: &str) -> Option<DiscoveryStatus> {
        state.queue.candidates[state.queue.position(id).unwrap()].status
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn now() -> DateTime<Utc> {
        ts("2026-04-01T00:00:00Z")
    }

    #[test]
    fn test_stage() {
        let mut state = state();
        let (outcomes, changed) = apply(
            &mut state,
            QueueAction::Stage,
            &ids(&[" Fresh-Coin ", "staged-coin", "solana", "dropped", "unknown", ""]),
            now(),
        );
        assert!(changed);
        assert_eq!(
            outcomes,
            vec![
                ("fresh-coin".to_string(), ActionOutcome::Staged),
                ("staged-coin".to_string(), ActionOutcome::AlreadyStaged),
                ("solana".to_string(), ActionOutcome::AlreadyOnWatchlist),
                ("dropped".to_string(), ActionOutcome::Blocked(DiscoveryStatus::Ignored)),
                ("unknown".to_string(), ActionOutcome::NotInQueue),
            ]
        );
        assert_eq!(status(&state, "fresh-coin"), Some(DiscoveryStatus::Staged));
        assert_eq!(status(&state, "staged-coin"), Some(DiscoveryStatus::Staged));
        assert_eq!(status(&state, "solana"), Some(DiscoveryStatus::Promoted));

        let staged = state.staging.last().unwrap();
        assert_eq!(staged.coin_gecko_id, "fresh-coin");
        assert_eq!(staged.symbol, "FRE");
        assert_eq!(staged.category, "discovery");
        assert_eq!(staged.urls, WatchlistUrls::default());
    }

    #[test]
    fn test_promote_from_staging_keeps_curated_fields() {
        let mut state = state();
        let (outcomes, changed) = apply(&mut state, QueueAction::Promote, &ids(&["staged-coin"]), now());
        assert!(changed);
        assert_eq!(outcomes[0].1, ActionOutcome::Promoted);
        assert!(state.staging.is_empty());

        let promoted = state.watchlist.last().unwrap();
        assert_eq!(promoted.category, "l1");
        assert_eq!(promoted.notes, "hand picked");
        assert_eq!(status(&state, "staged-coin"), Some(DiscoveryStatus::Promoted));
    }

    #[test]
    fn test_promote_unqueued_staged_coin_adds_queue_entry() {
        let mut state = state();
        state.staging.push(listed("manual"));
        let (outcomes, _) = apply(&mut state, QueueAction::Promote, &ids(&["manual", "nowhere"]), now());
        assert_eq!(outcomes[0].1, ActionOutcome::Promoted);
        assert_eq!(outcomes[1].1, ActionOutcome::NotInQueue);

        let entry = &state.queue.candidates[state.queue.position("manual").unwrap()];
        assert_eq!(entry.status, Some(DiscoveryStatus::Promoted));
        assert_eq!(entry.first_seen_at, Some(now()));
        assert_eq!(entry.symbol.as_deref(), Some("MANUAL"));
    }

    #[test]
    fn test_ignore_and_unignore() {
        let mut state = state();
        let (outcomes, _) = apply(
            &mut state,
            QueueAction::Ignore,
            &ids(&["staged-coin", "solana", "brand-new"]),
            now(),
        );
        assert_eq!(
            outcomes.iter().map(|o| o.1).collect::<Vec<_>>(),
            vec![
                ActionOutcome::Ignored,
                ActionOutcome::IgnoredWhileWatched,
                ActionOutcome::Ignored
            ]
        );
        assert!(state.staging.is_empty());
        assert_eq!(state.watchlist.len(), 1);
        assert_eq!(status(&state, "brand-new"), Some(DiscoveryStatus::Ignored));

        let (outcomes, changed) = apply(
            &mut state,
            QueueAction::Unignore,
            &ids(&["brand-new", "fresh-coin", "missing"]),
            now(),
        );
        assert!(changed);
        assert_eq!(
            outcomes.iter().map(|o| o.1).collect::<Vec<_>>(),
            vec![
                ActionOutcome::Unignored,
                ActionOutcome::Blocked(DiscoveryStatus::New),
                ActionOutcome::NotInQueue
            ]
        );
        assert_eq!(status(&state, "brand-new"), Some(DiscoveryStatus::New));
    }

    #[test]
    fn test_unstage_reopens_entry() {
        let mut state = state();
        apply(&mut state, QueueAction::Stage, &ids(&["fresh-coin"]), now());
        let (outcomes, changed) = apply(
            &mut state,
            QueueAction::Unstage,
            &ids(&["fresh-coin", "fresh-coin"]),
            now(),
        );
        assert!(changed);
        assert_eq!(outcomes[0].1, ActionOutcome::Unstaged);
        assert_eq!(outcomes[1].1, ActionOutcome::NotStaged);
        assert_eq!(status(&state, "fresh-coin"), Some(DiscoveryStatus::New));
    }

    #[test]
    fn test_noop_reports_unchanged() {
        let mut state = state();
        let before = state.clone();
        let (_, changed) = apply(&mut state, QueueAction::Unstage, &ids(&["fresh-coin"]), now());
        assert!(!changed);
        assert_eq!(state, before);
    }
}

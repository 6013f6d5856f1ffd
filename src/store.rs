/// Artifact persistence
///
/// Every artifact is pretty-printed JSON written atomically: a temp file in
/// the target directory is renamed over the destination, so a crash never
/// leaves a half-written report. Missing optional inputs read as empty. A
/// feed or predictions store that exists but does not parse is an error.
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::alerts::{AlertState, AlertsReport, DiscoveryFeed};
use crate::backtest::{BacktestReport, Prediction};
use crate::diff::DiffReport;
use crate::discovery::{ListState, WatchlistEntry};
use crate::errors::StoreError;
use crate::logger::{self, LogTag};
use crate::paths;
use crate::snapshot::Snapshot;

const SNAPSHOT_SUFFIX: &str = "_Snapshot.json";

// =============================================================================
// JSON HELPERS
// =============================================================================

/// Filename-safe run stamp, sortable in time order
pub fn run_stamp(generated_at: DateTime<Utc>) -> String {
    generated_at.format("%Y-%m-%dT%H-%M-%SZ").to_string()
}

pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|source| StoreError::Io {
        path: parent.to_path_buf(),
        source,
    })?;

    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
    serde_json::to_writer_pretty(&mut tmp, value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.write_all(b"\n").map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.persist(path).map_err(|source| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// `Ok(None)` when the file does not exist
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// Missing or unreadable files yield the default, with a warning for the latter
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json(path) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            logger::warning(LogTag::Store, &format!("{}; using empty value", e));
            T::default()
        }
    }
}

/// Optional input feed
///
/// No path, or a path that does not exist yet, is an empty feed. A file that
/// exists but does not parse is an error.
pub fn read_feed<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T, StoreError> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    match read_json(path)? {
        Some(feed) => Ok(feed),
        None => {
            logger::warning(
                LogTag::Store,
                &format!("Feed {} not found; using an empty feed", path.display()),
            );
            Ok(T::default())
        }
    }
}

// =============================================================================
// WATCHLISTS AND DISCOVERY QUEUE
// =============================================================================

/// Main watchlist, staging watchlist and discovery queue files
///
/// Missing files load as empty lists. A file that does not parse is an
/// error, so a hand-edited list is never overwritten with an empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListStore {
    pub watchlist_path: PathBuf,
    pub staging_path: PathBuf,
    pub queue_path: PathBuf,
}

impl Default for ListStore {
    fn default() -> Self {
        Self {
            watchlist_path: paths::get_watchlist_path(),
            staging_path: paths::get_staging_watchlist_path(),
            queue_path: paths::get_discovery_queue_path(),
        }
    }
}

impl ListStore {
    /// Same file names, inside `dir`
    pub fn at(dir: &Path) -> Self {
        Self {
            watchlist_path: dir.join("watchlist.json"),
            staging_path: dir.join("watchlist_staging.json"),
            queue_path: dir.join("discovery_queue.json"),
        }
    }

    pub fn load(&self) -> Result<ListState, StoreError> {
        let watchlist: Vec<WatchlistEntry> = read_json(&self.watchlist_path)?.unwrap_or_default();
        let staging: Vec<WatchlistEntry> = read_json(&self.staging_path)?.unwrap_or_default();
        let queue: DiscoveryFeed = read_json(&self.queue_path)?.unwrap_or_default();
        logger::debug(
            LogTag::Store,
            &format!(
                "lists loaded watchlist={} staging={} queue={}",
                watchlist.len(),
                staging.len(),
                queue.candidates.len()
            ),
        );
        Ok(ListState {
            watchlist,
            staging,
            queue,
        })
    }

    pub fn save(&self, state: &ListState) -> Result<(), StoreError> {
        write_json_atomic(&self.watchlist_path, &state.watchlist)?;
        write_json_atomic(&self.staging_path, &state.staging)?;
        write_json_atomic(&self.queue_path, &state.queue)
    }
}

// =============================================================================
// ARTIFACT STORE
// =============================================================================

/// File layout for every artifact a run reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    reports_dir: PathBuf,
    history_dir: PathBuf,
    backtest_dir: PathBuf,
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self {
            reports_dir: paths::get_reports_directory(),
            history_dir: paths::get_history_directory(),
            backtest_dir: paths::get_backtest_directory(),
        }
    }
}

impl ArtifactStore {
    /// Same layout as the default, rooted at `reports_dir`
    pub fn at(reports_dir: &Path) -> Self {
        Self {
            reports_dir: reports_dir.to_path_buf(),
            history_dir: reports_dir.join("history"),
            backtest_dir: reports_dir.join("backtest"),
        }
    }

    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.reports_dir.join("Snapshot.json")
    }

    pub fn diff_report_path(&self) -> PathBuf {
        self.reports_dir.join("DiffReport.json")
    }

    pub fn alerts_report_path(&self) -> PathBuf {
        self.reports_dir.join("Alerts.json")
    }

    pub fn alert_state_path(&self) -> PathBuf {
        self.reports_dir.join("alert_state.json")
    }

    pub fn predictions_path(&self) -> PathBuf {
        self.backtest_dir.join("predictions.json")
    }

    pub fn backtest_report_path(&self) -> PathBuf {
        self.backtest_dir.join("BacktestReport.json")
    }

    // -------------------------------------------------------------------------
    // Snapshots
    // -------------------------------------------------------------------------

    /// Write the latest snapshot and its history copy; returns the history path
    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<PathBuf, StoreError> {
        let history_path = self
            .history_dir
            .join(format!("{}{}", run_stamp(snapshot.generated_at), SNAPSHOT_SUFFIX));
        write_json_atomic(&self.snapshot_path(), snapshot)?;
        write_json_atomic(&history_path, snapshot)?;
        logger::debug(
            LogTag::Store,
            &format!("snapshot saved history={}", history_path.display()),
        );
        Ok(history_path)
    }

    pub fn load_previous_snapshot(&self) -> Option<Snapshot> {
        load_previous_snapshot(&self.history_dir)
    }

    // -------------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------------

    /// A first run has no diff, so the previous run's report is removed
    pub fn save_diff_report(&self, report: Option<&DiffReport>) -> Result<(), StoreError> {
        let path = self.diff_report_path();
        match report {
            Some(report) => {
                write_json_atomic(&path, report)?;
                let history = self.history_dir.join(format!(
                    "{}_DiffReport.json",
                    run_stamp(report.current_scan_date)
                ));
                write_json_atomic(&history, report)
            }
            None => match fs::remove_file(&path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(StoreError::Io { path, source: e }),
                _ => Ok(()),
            },
        }
    }

    pub fn save_alerts_report(&self, report: &AlertsReport) -> Result<(), StoreError> {
        write_json_atomic(&self.alerts_report_path(), report)?;
        let history = self
            .history_dir
            .join(format!("{}_Alerts.json", run_stamp(report.generated_at)));
        write_json_atomic(&history, report)
    }

    pub fn load_alert_state(&self) -> AlertState {
        read_json_or_default(&self.alert_state_path())
    }

    pub fn save_alert_state(&self, state: &AlertState) -> Result<(), StoreError> {
        write_json_atomic(&self.alert_state_path(), state)
    }

    // -------------------------------------------------------------------------
    // Backtest
    // -------------------------------------------------------------------------

    /// Missing store is empty; a corrupt store is an error and is left untouched
    pub fn load_predictions(&self) -> Result<Vec<Prediction>, StoreError> {
        Ok(read_json(&self.predictions_path())?.unwrap_or_default())
    }

    pub fn save_predictions(&self, predictions: &[Prediction]) -> Result<(), StoreError> {
        write_json_atomic(&self.predictions_path(), predictions)
    }

    pub fn save_backtest_report(&self, report: &BacktestReport) -> Result<(), StoreError> {
        write_json_atomic(&self.backtest_report_path(), report)
    }
}

/// Latest readable history snapshot, by file name
pub fn load_previous_snapshot(history_dir: &Path) -> Option<Snapshot> {
    let entries = match fs::read_dir(history_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            logger::warning(
                LogTag::Store,
                &format!("Cannot list {}: {}", history_dir.display(), e),
            );
            return None;
        }
    };

    let latest = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(SNAPSHOT_SUFFIX))
        .max()?;

    let path = history_dir.join(&latest);
    match read_json::<Snapshot>(&path) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            logger::warning(LogTag::Store, &format!("Previous snapshot unreadable: {}", e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertThresholds, DiscoveryStatus, ProtocolFeed};
    use crate::discovery::{apply, QueueAction};
    use crate::gates::HygieneLabel;
    use crate::test_support::{labeled, snapshot_of, ts};
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let mut state = AlertState::default();
        state.seen_keys.insert("defi:aave".to_string());

        write_json_atomic(&path, &state).unwrap();
        let back: AlertState = read_json(&path).unwrap().unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_read_fallbacks() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(read_json::<AlertState>(&missing).unwrap().is_none());

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{not json").unwrap();
        assert!(read_json::<AlertState>(&corrupt).is_err());
        assert_eq!(read_json_or_default::<AlertState>(&corrupt), AlertState::default());
    }

    #[test]
    fn test_feed_missing_is_empty_but_corrupt_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_feed::<DiscoveryFeed>(None).unwrap(), DiscoveryFeed::default());

        let missing = dir.path().join("queue.json");
        assert_eq!(read_feed::<DiscoveryFeed>(Some(&missing)).unwrap(), DiscoveryFeed::default());

        let corrupt = dir.path().join("protocols.json");
        fs::write(&corrupt, r#"{"protocols": [{"slug": "aave",}]}"#).unwrap();
        let err = read_feed::<ProtocolFeed>(Some(&corrupt)).unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
        assert!(err.to_string().contains("protocols.json"));

        let valid = dir.path().join("valid.json");
        fs::write(&valid, r#"{"protocols": [{"slug": "aave"}]}"#).unwrap();
        let feed: ProtocolFeed = read_feed(Some(&valid)).unwrap();
        assert_eq!(feed.protocols[0].slug.as_deref(), Some("aave"));
    }

    #[test]
    fn test_previous_snapshot_is_latest_by_name() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::at(dir.path());
        assert!(store.load_previous_snapshot().is_none());

        let older = snapshot_of("2026-04-01T00:00:00Z", vec![labeled("OLD", HygieneLabel::Keep)]);
        let newer = snapshot_of("2026-04-02T00:00:00Z", vec![labeled("NEW", HygieneLabel::Drop)]);
        store.save_snapshot(&newer).unwrap();
        store.save_snapshot(&older).unwrap();
        fs::write(store.history_dir().join("notes.txt"), "ignored").unwrap();

        let previous = store.load_previous_snapshot().unwrap();
        assert_eq!(previous.generated_at, ts("2026-04-02T00:00:00Z"));
        // the latest file is whatever was written last
        let latest: Snapshot = read_json(&store.snapshot_path()).unwrap().unwrap();
        assert_eq!(latest.generated_at, ts("2026-04-01T00:00:00Z"));
    }

    #[test]
    fn test_predictions_store_is_strict() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::at(dir.path());
        assert!(store.load_predictions().unwrap().is_empty());

        fs::create_dir_all(store.predictions_path().parent().unwrap()).unwrap();
        fs::write(store.predictions_path(), "[{").unwrap();
        assert!(store.load_predictions().is_err());
    }

    #[test]
    fn test_lists_persist_queue_decisions() {
        let dir = TempDir::new().unwrap();
        let lists = ListStore::at(dir.path());
        let mut state = lists.load().unwrap();
        assert_eq!(state, ListState::default());

        fs::write(
            &lists.queue_path,
            r#"{"schema_version":1,"candidates":[{"id":"gem","symbol":"gem","discovery_score":88,"status":"NEW"}]}"#,
        )
        .unwrap();
        state = lists.load().unwrap();
        let (_, changed) = apply(&mut state, QueueAction::Stage, &["gem".to_string()], ts("2026-04-01T00:00:00Z"));
        assert!(changed);
        lists.save(&state).unwrap();

        let back = lists.load().unwrap();
        assert_eq!(back.staging[0].coin_gecko_id, "gem");
        assert_eq!(back.queue.candidates[0].status, Some(DiscoveryStatus::Staged));
        assert_eq!(back.queue.candidates[0].coin_gecko_id.as_deref(), Some("gem"));

        fs::write(&lists.watchlist_path, "[{\"symbol\": ").unwrap();
        assert!(lists.load().is_err());
    }

    #[test]
    fn test_reports_written_with_history() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::at(dir.path());
        let report = AlertsReport {
            generated_at: ts("2026-04-02T10:15:00Z"),
            thresholds: AlertThresholds::default(),
            alerts: Vec::new(),
        };
        store.save_alerts_report(&report).unwrap();
        assert!(store.alerts_report_path().exists());
        assert!(store
            .history_dir()
            .join("2026-04-02T10-15-00Z_Alerts.json")
            .exists());

        store.save_diff_report(None).unwrap();
        assert!(!store.diff_report_path().exists());
    }
}

//! Centralized path resolution for coinscan
//!
//! Every artifact location is resolved through this module so the binary,
//! the store and the logger agree on one layout.
//!
//! ## Path Strategy
//!
//! The base directory follows platform standards:
//! - **macOS**: `~/Library/Application Support/CoinScan/`
//! - **Windows**: `%LOCALAPPDATA%\CoinScan\`
//! - **Linux**: `$XDG_DATA_HOME/CoinScan/` (fallback `~/.local/share/CoinScan/`)
//!
//! It can be replaced once at startup with [`set_base_directory`] (`--data-dir`).
//!
//! ## Directory Structure
//!
//! ```text
//! CoinScan/
//! ├── data/
//! │   └── config.toml
//! ├── logs/
//! │   └── coinscan_*.log
//! └── reports/
//!     ├── Snapshot.json
//!     ├── DiffReport.json
//!     ├── Alerts.json
//!     ├── alert_state.json
//!     ├── history/
//!     │   └── <stamp>_Snapshot.json
//!     └── backtest/
//!         ├── predictions.json
//!         └── BacktestReport.json
//! ```

use once_cell::sync::{Lazy, OnceCell};
use std::path::PathBuf;

// =============================================================================
// BASE DIRECTORY RESOLUTION
// =============================================================================

/// Explicit override, set at most once before first use
static BASE_OVERRIDE: OnceCell<PathBuf> = OnceCell::new();

/// Lazy-initialized base directory (thread-safe)
static BASE_DIRECTORY: Lazy<PathBuf> = Lazy::new(|| {
    BASE_OVERRIDE
        .get()
        .cloned()
        .unwrap_or_else(resolve_base_directory)
});

fn resolve_base_directory() -> PathBuf {
    const APP_DIR: &str = "CoinScan";

    if let Some(dir) = dirs::data_local_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(dir) = dirs::data_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(APP_DIR);
    }

    PathBuf::from(APP_DIR)
}

/// Replace the platform base directory
///
/// Must run before any other accessor in this module; afterwards the base
/// directory is frozen and the call fails.
pub fn set_base_directory(dir: PathBuf) -> Result<(), String> {
    if Lazy::get(&BASE_DIRECTORY).is_some() {
        return Err("Base directory already resolved".to_string());
    }
    BASE_OVERRIDE
        .set(dir)
        .map_err(|_| "Base directory override already set".to_string())
}

// =============================================================================
// PRIMARY DIRECTORY ACCESSORS
// =============================================================================

pub fn get_base_directory() -> PathBuf {
    BASE_DIRECTORY.clone()
}

/// Contains the configuration file
pub fn get_data_directory() -> PathBuf {
    BASE_DIRECTORY.join("data")
}

/// Contains daily log files
pub fn get_logs_directory() -> PathBuf {
    BASE_DIRECTORY.join("logs")
}

/// Contains the latest run artifacts
pub fn get_reports_directory() -> PathBuf {
    BASE_DIRECTORY.join("reports")
}

/// Contains one timestamped snapshot per run
pub fn get_history_directory() -> PathBuf {
    get_reports_directory().join("history")
}

/// Contains the predictions store and the accuracy report
pub fn get_backtest_directory() -> PathBuf {
    get_reports_directory().join("backtest")
}

// =============================================================================
// FILE PATHS
// =============================================================================

pub fn get_config_path() -> PathBuf {
    get_data_directory().join("config.toml")
}

pub fn get_snapshot_path() -> PathBuf {
    get_reports_directory().join("Snapshot.json")
}

pub fn get_diff_report_path() -> PathBuf {
    get_reports_directory().join("DiffReport.json")
}

pub fn get_alerts_report_path() -> PathBuf {
    get_reports_directory().join("Alerts.json")
}

pub fn get_alert_state_path() -> PathBuf {
    get_reports_directory().join("alert_state.json")
}

pub fn get_predictions_path() -> PathBuf {
    get_backtest_directory().join("predictions.json")
}

pub fn get_backtest_report_path() -> PathBuf {
    get_backtest_directory().join("BacktestReport.json")
}

pub fn get_watchlist_path() -> PathBuf {
    get_data_directory().join("watchlist.json")
}

pub fn get_staging_watchlist_path() -> PathBuf {
    get_data_directory().join("watchlist_staging.json")
}

pub fn get_discovery_queue_path() -> PathBuf {
    get_data_directory().join("discovery_queue.json")
}

pub fn get_protocol_feed_path() -> PathBuf {
    get_reports_directory().join("Protocols.json")
}

// =============================================================================
// DIRECTORY CREATION
// =============================================================================

/// Ensures all required directories exist
///
/// Called once at startup, before the logger opens its file.
pub fn ensure_all_directories() -> Result<(), String> {
    let dirs_to_create = vec![
        ("base", get_base_directory()),
        ("data", get_data_directory()),
        ("logs", get_logs_directory()),
        ("reports", get_reports_directory()),
        ("history", get_history_directory()),
        ("backtest", get_backtest_directory()),
    ];

    for (name, dir) in dirs_to_create {
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                format!(
                    "Failed to create {} directory at {}: {}",
                    name,
                    dir.display(),
                    e
                )
            })?;
        }
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

use super::schemas::Config;
/// Configuration utilities - loading and access helpers
///
/// - Loading configuration from disk (defaults when the file is missing)
/// - Thread-safe global access for the binary
/// - Saving the effective configuration
///
/// The engine components never read the global; callers hand them the
/// relevant sub-config by reference.
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::path::Path;

use crate::logger::{self, LogTag};

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Parse configuration text
pub fn parse_config(contents: &str) -> Result<Config, String> {
    toml::from_str::<Config>(contents).map_err(|e| format!("Failed to parse config: {}", e))
}

/// Read a configuration file, falling back to defaults when it does not exist
pub fn read_config_file(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path.display()),
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

    toml::from_str::<Config>(&contents)
        .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))
}

/// Load configuration from a file path and initialize the global CONFIG
pub fn load_config_from_path(path: &Path) -> Result<(), String> {
    let config = read_config_file(path)?;

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| "Config already initialized".to_string())?;

    logger::debug(
        LogTag::Config,
        &format!("Configuration loaded from {}", path.display()),
    );
    Ok(())
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when load_config_from_path() was never called.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get() {
        Some(lock) => f(&lock.read()),
        None => f(&Config::default()),
    }
}

/// Get a clone of the entire configuration
///
/// Useful when values must be held across await points.
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

/// Save the current configuration to disk
pub fn save_config(path: &Path) -> Result<(), String> {
    let config_str = with_config(|cfg| {
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))
    })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
    }

    std::fs::write(path, config_str)
        .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))
}

pub fn is_config_initialized() -> bool {
    CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gates.low_volume_usd, 5_000_000.0);
        assert_eq!(config.gates.drop_volume_usd, 1_000_000.0);
        assert_eq!(config.alerts.defi_score_threshold, 70.0);
        assert_eq!(config.alerts.discovery_score_threshold, 80.0);
        assert_eq!(config.ranking.top_watch_count, 3);
        assert_eq!(config.prices.chunk_size, 200);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[gates]"));
        assert!(toml_str.contains("[alerts]"));
        assert!(toml_str.contains("[prices]"));
    }

    #[test]
    fn test_partial_table_keeps_other_defaults() {
        let config = parse_config("[gates]\nlow_volume_usd = 2500000.0\n").unwrap();
        assert_eq!(config.gates.low_volume_usd, 2_500_000.0);
        assert_eq!(config.gates.chasing_7d_pct, 40.0);
        assert_eq!(config.diff, Default::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = read_config_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gates\nbroken").unwrap();
        assert!(read_config_file(&path).is_err());
    }
}

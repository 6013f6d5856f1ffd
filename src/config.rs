//! Configuration system
//!
//! Every tunable threshold lives in one TOML file with embedded defaults:
//! - `schemas` defines the tables via `config_struct!`
//! - `utils` loads, saves and exposes the global instance
//!
//! ```rust,no_run
//! use coinscan::config::{load_config_from_path, with_config};
//!
//! load_config_from_path(std::path::Path::new("data/config.toml")).unwrap();
//! let drop_floor = with_config(|cfg| cfg.gates.drop_volume_usd);
//! ```

#[macro_use]
mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{
    AlertsConfig, BacktestConfig, Config, DefiConfig, DiffConfig, DiscoveryConfig,
    EnrichmentConfig, GateConfig, PricesConfig, RankingConfig,
};
pub use utils::{
    get_config_clone, is_config_initialized, load_config_from_path, parse_config,
    read_config_file, save_config, with_config, CONFIG,
};

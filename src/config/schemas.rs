/// Configuration schemas - all config structures defined once with defaults
///
/// Each struct is defined using the config_struct! macro which provides:
/// - Single-source definition (no repetition)
/// - Embedded defaults (the reference thresholds of the hygiene model)
/// - Serde support
use crate::config_struct;

// ============================================================================
// GATE CONFIGURATION
// ============================================================================

config_struct! {
    /// Gate and label thresholds
    pub struct GateConfig {
        /// Liquidity gate: 24h volume must reach this value
        low_volume_usd: f64 = 5_000_000.0,
        /// Below this 24h volume the label is forced to DROP
        drop_volume_usd: f64 = 1_000_000.0,

        // Chasing heuristic (ignored when a catalyst is present)
        chasing_7d_pct: f64 = 40.0,
        chasing_24h_pct: f64 = 20.0,

        // Dilution
        low_float_pct: f64 = 20.0,
        min_mcap_to_fdv: f64 = 0.2,
        max_fdv_multiple: f64 = 5.0,
    }
}

// ============================================================================
// ENRICHMENT CONFIGURATION
// ============================================================================

config_struct! {
    /// Thresholds used when summarising provider data into facts
    pub struct EnrichmentConfig {
        concentration_top10_pct: f64 = 50.0,
        concentration_top20_pct: f64 = 70.0,
        holders_considered: usize = 20,

        unlock_window_days: i64 = 30,
        unlock_supply_pct: f64 = 1.0,
        unlock_value_usd: f64 = 10_000_000.0,

        traction_tvl_usd: f64 = 1_000_000.0,
        traction_commits_4w: f64 = 10.0,
        traction_stars: f64 = 100.0,

        catalyst_lookback_days: i64 = 14,
        catalyst_keywords: Vec<String> = [
            "launch",
            "release",
            "mainnet",
            "partnership",
            "integration",
            "upgrade",
            "v2",
            "v3",
            "announcement",
        ]
        .iter()
        .map(|k| k.to_string())
        .collect(),
    }
}

// ============================================================================
// RANKING / DIFF CONFIGURATION
// ============================================================================

config_struct! {
    /// Presentation ranking
    pub struct RankingConfig {
        top_watch_count: usize = 3,
        top_avoid_count: usize = 3,
    }
}

config_struct! {
    /// Run-to-run change detection
    pub struct DiffConfig {
        /// Absolute percentage move that emits PRICE_MOVE
        price_move_pct: f64 = 10.0,
    }
}

// ============================================================================
// ALERTS CONFIGURATION
// ============================================================================

config_struct! {
    /// Alert rules and the optional notification path
    pub struct AlertsConfig {
        alert_actionable: bool = true,

        defi_enabled: bool = true,
        defi_score_threshold: f64 = 70.0,

        discovery_enabled: bool = true,
        discovery_score_threshold: f64 = 80.0,

        /// Log newly seen alerts and persist the seen-key set
        notify_enabled: bool = false,
        notify_max_lines: usize = 6,
    }
}

// ============================================================================
// DISCOVERY / DEFI SCORING CONFIGURATION
// ============================================================================

config_struct! {
    /// Quality gates and queue size for discovery candidates
    pub struct DiscoveryConfig {
        min_volume_24h: f64 = 5_000_000.0,
        min_market_cap: f64 = 10_000_000.0,
        max_market_cap: f64 = 5_000_000_000.0,
        min_price_change_7d: f64 = 5.0,
        max_price_change_7d: f64 = 100.0,

        /// Criteria matches considered per run, in market-cap order
        criteria_limit: usize = 50,
        /// Scored candidates kept per run
        candidate_limit: usize = 20,
    }
}

config_struct! {
    /// TVL buckets for protocol scoring
    pub struct DefiConfig {
        tvl_include_min: f64 = 10_000_000.0,
        tvl_watch_min: f64 = 3_000_000.0,
        tvl_watch_max: f64 = 10_000_000.0,
        /// 30d TVL growth (%) a WATCH protocol needs
        watch_growth_30d_min: f64 = 50.0,
    }
}

// ============================================================================
// BACKTEST CONFIGURATION
// ============================================================================

config_struct! {
    /// Prediction tracking
    pub struct BacktestConfig {
        enabled: bool = true,
        /// Size of the best/worst 14d leaderboards
        leaderboard_size: usize = 5,
    }
}

// ============================================================================
// PRICE PROVIDER CONFIGURATION
// ============================================================================

config_struct! {
    /// Price lookup used to resolve matured predictions
    pub struct PricesConfig {
        enabled: bool = true,
        base_url: String = "https://api.coingecko.com/api/v3".to_string(),
        /// Empty means no key is sent
        api_key: String = String::new(),
        api_key_header: String = "x-cg-demo-api-key".to_string(),
        vs_currency: String = "usd".to_string(),

        chunk_size: usize = 200,
        worker_count: usize = 4,
        timeout_secs: u64 = 20,

        // Retry policy
        max_retries: u32 = 2,
        rate_limit_fallback_secs: u64 = 30,
        transient_backoff_ms: u64 = 750,
    }
}

// ============================================================================
// ROOT
// ============================================================================

config_struct! {
    /// Complete configuration, one table per subsystem
    pub struct Config {
        gates: GateConfig = GateConfig::default(),
        enrichment: EnrichmentConfig = EnrichmentConfig::default(),
        ranking: RankingConfig = RankingConfig::default(),
        diff: DiffConfig = DiffConfig::default(),
        alerts: AlertsConfig = AlertsConfig::default(),
        discovery: DiscoveryConfig = DiscoveryConfig::default(),
        defi: DefiConfig = DefiConfig::default(),
        backtest: BacktestConfig = BacktestConfig::default(),
        prices: PricesConfig = PricesConfig::default(),
    }
}

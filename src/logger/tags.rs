/// Log tags identifying the subsystem that produced a message
///
/// Each tag maps to a `--debug-<key>` command-line flag that enables
/// debug-level output for that subsystem only.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Gates,
    Ranking,
    Diff,
    Alerts,
    Backtest,
    Prices,
    Store,
    Pipeline,
    Discovery,
    Defi,
}

impl LogTag {
    pub const ALL: [LogTag; 12] = [
        LogTag::System,
        LogTag::Config,
        LogTag::Gates,
        LogTag::Ranking,
        LogTag::Diff,
        LogTag::Alerts,
        LogTag::Backtest,
        LogTag::Prices,
        LogTag::Store,
        LogTag::Pipeline,
        LogTag::Discovery,
        LogTag::Defi,
    ];

    /// Key used by `--debug-<key>` / `--verbose-<key>` flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Gates => "gates",
            LogTag::Ranking => "ranking",
            LogTag::Diff => "diff",
            LogTag::Alerts => "alerts",
            LogTag::Backtest => "backtest",
            LogTag::Prices => "prices",
            LogTag::Store => "store",
            LogTag::Pipeline => "pipeline",
            LogTag::Discovery => "discovery",
            LogTag::Defi => "defi",
        }
        .to_string()
    }

    /// Uppercase label written to console and file
    pub fn to_plain_string(&self) -> String {
        self.to_debug_key().to_uppercase()
    }

    pub fn from_debug_key(key: &str) -> Option<Self> {
        LogTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.to_debug_key() == key)
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}

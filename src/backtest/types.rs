use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::facts::ListSource;
use crate::gates::{HygieneLabel, LabeledInstrument};

/// Fixed forward windows at which a prediction is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "14d")]
    Days14,
    #[serde(rename = "30d")]
    Days30,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::Days7, Horizon::Days14, Horizon::Days30];

    pub fn days(&self) -> f64 {
        match self {
            Horizon::Days7 => 7.0,
            Horizon::Days14 => 14.0,
            Horizon::Days30 => 30.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Horizon::Days7 => "7d",
            Horizon::Days14 => "14d",
            Horizon::Days30 => "30d",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionFlag {
    HasCleanCatalyst,
    UnlockRisk,
    HighConcentrationRisk,
    Chasing,
    LowLiquidity,
    HighDilutionRisk,
}

impl PredictionFlag {
    pub const ALL: [PredictionFlag; 6] = [
        PredictionFlag::HasCleanCatalyst,
        PredictionFlag::UnlockRisk,
        PredictionFlag::HighConcentrationRisk,
        PredictionFlag::Chasing,
        PredictionFlag::LowLiquidity,
        PredictionFlag::HighDilutionRisk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionFlag::HasCleanCatalyst => "has_clean_catalyst",
            PredictionFlag::UnlockRisk => "unlock_risk",
            PredictionFlag::HighConcentrationRisk => "high_concentration_risk",
            PredictionFlag::Chasing => "chasing",
            PredictionFlag::LowLiquidity => "low_liquidity",
            PredictionFlag::HighDilutionRisk => "high_dilution_risk",
        }
    }

    pub fn read(&self, flags: &PredictionFlags) -> bool {
        match self {
            PredictionFlag::HasCleanCatalyst => flags.has_clean_catalyst,
            PredictionFlag::UnlockRisk => flags.unlock_risk,
            PredictionFlag::HighConcentrationRisk => flags.high_concentration_risk,
            PredictionFlag::Chasing => flags.chasing,
            PredictionFlag::LowLiquidity => flags.low_liquidity,
            PredictionFlag::HighDilutionRisk => flags.high_dilution_risk,
        }
    }
}

/// Boolean state frozen at evaluation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionFlags {
    pub chasing: bool,
    pub unlock_risk: bool,
    pub high_concentration_risk: bool,
    pub has_clean_catalyst: bool,
    pub low_liquidity: bool,
    pub high_dilution_risk: bool,
}

impl PredictionFlags {
    pub fn capture(row: &LabeledInstrument) -> Self {
        Self {
            chasing: row.flags.chasing,
            unlock_risk: row.facts.unlocks.unlock_risk_flag,
            high_concentration_risk: row.facts.holders.high_concentration_risk,
            has_clean_catalyst: row.facts.has_catalyst(),
            low_liquidity: row.flags.low_liquidity,
            high_dilution_risk: row.flags.high_dilution_risk,
        }
    }
}

/// Each horizon is write-once: a populated price is never overwritten
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Outcomes {
    pub price_7d: Option<f64>,
    pub price_14d: Option<f64>,
    pub price_30d: Option<f64>,
    pub return_7d_pct: Option<f64>,
    pub return_14d_pct: Option<f64>,
    pub return_30d_pct: Option<f64>,
    pub outcome_updated_at: Option<DateTime<Utc>>,
}

impl Outcomes {
    pub fn price(&self, horizon: Horizon) -> Option<f64> {
        match horizon {
            Horizon::Days7 => self.price_7d,
            Horizon::Days14 => self.price_14d,
            Horizon::Days30 => self.price_30d,
        }
    }

    pub fn return_pct(&self, horizon: Horizon) -> Option<f64> {
        match horizon {
            Horizon::Days7 => self.return_7d_pct,
            Horizon::Days14 => self.return_14d_pct,
            Horizon::Days30 => self.return_30d_pct,
        }
    }

    pub fn is_resolved(&self, horizon: Horizon) -> bool {
        self.price(horizon).is_some()
    }

    pub(crate) fn set(&mut self, horizon: Horizon, price: f64, return_pct: f64) {
        let (price_slot, return_slot) = match horizon {
            Horizon::Days7 => (&mut self.price_7d, &mut self.return_7d_pct),
            Horizon::Days14 => (&mut self.price_14d, &mut self.return_14d_pct),
            Horizon::Days30 => (&mut self.price_30d, &mut self.return_30d_pct),
        };
        *price_slot = Some(price);
        *return_slot = Some(return_pct);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction_id: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "coin_gecko_id")]
    pub coin_id: Option<String>,
    #[serde(default)]
    pub watchlist_source: ListSource,
    pub scan_date: DateTime<Utc>,
    pub price_at_scan: f64,
    pub market_cap_at_scan: Option<f64>,
    pub volume_24h_at_scan: Option<f64>,
    pub hygiene_label: HygieneLabel,
    #[serde(default)]
    pub flags: PredictionFlags,
    #[serde(default)]
    pub outcomes: Outcomes,
}

impl Prediction {
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.scan_date).num_seconds() as f64 / 86_400.0
    }

    /// Horizons whose boundary has passed but whose outcome is still empty
    pub fn due_horizons(&self, now: DateTime<Utc>) -> Vec<Horizon> {
        let age = self.age_days(now);
        Horizon::ALL
            .into_iter()
            .filter(|h| age >= h.days() && !self.outcomes.is_resolved(*h))
            .collect()
    }
}

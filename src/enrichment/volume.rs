/// Trailing volume baseline from a daily volume series
use serde::{Deserialize, Serialize};

use crate::facts::VolumeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VolumeStats {
    pub avg_7d: Option<f64>,
    pub avg_30d: Option<f64>,
}

impl VolumeStats {
    /// Means of the last 7 and last 30 finite daily values (oldest first)
    pub fn from_daily(volumes: &[f64]) -> Self {
        let finite: Vec<f64> = volumes.iter().copied().filter(|v| v.is_finite()).collect();
        Self {
            avg_7d: tail_mean(&finite, 7),
            avg_30d: tail_mean(&finite, 30),
        }
    }

    /// Preferred baseline: 7d average, else 30d
    pub fn baseline(&self) -> Option<(f64, VolumeWindow)> {
        self.avg_7d
            .map(|v| (v, VolumeWindow::SevenDay))
            .or_else(|| self.avg_30d.map(|v| (v, VolumeWindow::ThirtyDay)))
    }
}

fn tail_mean(values: &[f64], n: usize) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let tail = &values[values.len().saturating_sub(n)..];
    Some(tail.iter().sum::<f64>() / tail.len() as f64)
}

/// Current 24h volume relative to its baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    AboveBaseline,
    BelowBaseline,
}

pub fn trend(volume_24h: Option<f64>, baseline: Option<f64>) -> Option<VolumeTrend> {
    match (volume_24h, baseline) {
        (Some(vol), Some(base)) if vol >= base => Some(VolumeTrend::AboveBaseline),
        (Some(_), Some(_)) => Some(VolumeTrend::BelowBaseline),
        _ => None,
    }
}

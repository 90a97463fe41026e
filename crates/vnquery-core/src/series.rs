//! OHLCV bar model and series operations

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::query::Interval;

/// One OHLCV row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Scalar bar column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl BarField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Volume => "volume",
        }
    }

    /// Read this column from a bar. Volume is widened to `f64` so every
    /// column flows through the same numeric pipeline.
    pub fn extract(&self, bar: &Bar) -> f64 {
        match self {
            Self::Open => bar.open,
            Self::High => bar.high,
            Self::Low => bar.low,
            Self::Close => bar.close,
            // Volumes stay well below 2^53, so the cast is exact.
            Self::Volume => bar.volume as f64,
        }
    }
}

impl fmt::Display for BarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a `(date, field)` projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Closing-price statistics attached to full-series responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub close_mean: f64,
    pub close_min: f64,
    pub close_max: f64,
    /// Integer mean of the volume column, truncated
    pub volume_avg: u64,
}

/// Round to two decimal places (price display convention)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Date-ordered bars for one ticker
///
/// Invariant: `bars` ascend by date with unique dates. [`Series::new`]
/// establishes this regardless of provider ordering; code constructing the
/// struct literally is responsible for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub ticker: String,
    pub interval: Interval,
    pub bars: Vec<Bar>,
}

impl Series {
    /// Build a series, sorting bars ascending by date and dropping duplicate
    /// dates (first occurrence wins).
    pub fn new(ticker: impl Into<String>, interval: Interval, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        bars.dedup_by_key(|bar| bar.date);
        Self {
            ticker: ticker.into(),
            interval,
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Closing prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    /// One column in date order
    pub fn values(&self, field: BarField) -> Vec<f64> {
        self.bars.iter().map(|bar| field.extract(bar)).collect()
    }

    /// `(date, value)` rows for one column, preserving bar order
    pub fn project(&self, field: BarField) -> Vec<FieldPoint> {
        self.bars
            .iter()
            .map(|bar| FieldPoint {
                date: bar.date,
                value: field.extract(bar),
            })
            .collect()
    }

    /// The last `n` bars (the whole series when it is shorter)
    pub fn tail(&self, n: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    /// Close/volume statistics; `None` for an empty series
    pub fn summary(&self) -> Option<SeriesSummary> {
        if self.bars.is_empty() {
            return None;
        }
        let len = self.bars.len() as f64;
        let closes = self.closes();
        let close_sum: f64 = closes.iter().sum();
        let close_min = closes.iter().copied().fold(f64::INFINITY, f64::min);
        let close_max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let volume_sum: u64 = self.bars.iter().map(|bar| bar.volume).sum();

        Some(SeriesSummary {
            close_mean: round2(close_sum / len),
            close_min,
            close_max,
            volume_avg: (volume_sum as f64 / len) as u64,
        })
    }
}

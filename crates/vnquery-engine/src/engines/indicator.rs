//! SMA and RSI over closing prices
//!
//! Both indicators are evaluated at the last bar of a series. SMA uses a
//! minimum-periods of one: a series shorter than the window averages every
//! close it has. RSI uses Wilder's smoothing and needs `window + 1` closes
//! before its first value; below that the window counts as insufficient and
//! its key is omitted from the result map rather than failing the query.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::debug;
use vnquery_core::{round2, Interval, MarketDataProvider, QueryError, Result};

use crate::config::EngineConfig;
use crate::engines::fetch;

/// Indicator the engine knows how to compute.
///
/// Anything else named in `indicator_params` (macd included) is recognized
/// as an indicator by the upstream parser but not computable here, and is
/// skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    Sma,
    Rsi,
}

impl IndicatorKind {
    /// Parse an `indicator_params` key, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sma" => Some(Self::Sma),
            "rsi" => Some(Self::Rsi),
            _ => None,
        }
    }

    /// Result-map label for one window, e.g. `SMA9` or `RSI14`.
    pub fn label(&self, window: u32) -> String {
        match self {
            Self::Sma => format!("SMA{window}"),
            Self::Rsi => format!("RSI{window}"),
        }
    }

    /// Bars wanted when sizing the fetch for this window.
    pub fn bars_wanted(&self, window: u32) -> usize {
        match self {
            Self::Sma => window as usize,
            // Price deltas need a predecessor bar.
            Self::Rsi => window as usize + 1,
        }
    }

    /// Fewest closes that still produce a value for this window.
    pub fn min_bars(&self, window: u32) -> usize {
        match self {
            Self::Sma => 1,
            Self::Rsi => window as usize + 1,
        }
    }

    /// Value at the last bar, or `InsufficientData` when the series is
    /// shorter than this indicator's minimum.
    pub fn compute(&self, closes: &[f64], window: u32) -> Result<f64> {
        let value = match self {
            Self::Sma => sma(closes, window),
            Self::Rsi => rsi(closes, window),
        };
        value.ok_or(QueryError::InsufficientData {
            needed: self.min_bars(window),
            got: closes.len(),
        })
    }
}

/// Simple moving average of the trailing `window` closes.
///
/// Falls back to averaging the whole series when it is shorter than the
/// window. `None` only for an empty series or a zero window.
pub fn sma(closes: &[f64], window: u32) -> Option<f64> {
    if closes.is_empty() || window == 0 {
        return None;
    }
    let take = (window as usize).min(closes.len());
    let tail = &closes[closes.len() - take..];
    Some(round2(tail.iter().sum::<f64>() / take as f64))
}

/// Relative strength index at the last bar, Wilder's smoothing.
///
/// The gain and loss averages are seeded with the simple mean of the first
/// `window` deltas, then rolled forward with
/// `avg = (avg * (window - 1) + current) / window`. Needs `window + 1`
/// closes; `None` below that. A window with no losses reads 100, a flat
/// window reads 50.
pub fn rsi(closes: &[f64], window: u32) -> Option<f64> {
    let w = window as usize;
    if w == 0 || closes.len() < w + 1 {
        return None;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|pair| pair[1] - pair[0]).collect();

    let mut avg_gain = deltas[..w].iter().map(|d| d.max(0.0)).sum::<f64>() / w as f64;
    let mut avg_loss = deltas[..w].iter().map(|d| (-d).max(0.0)).sum::<f64>() / w as f64;

    for &delta in &deltas[w..] {
        avg_gain = (avg_gain * (w as f64 - 1.0) + delta.max(0.0)) / w as f64;
        avg_loss = (avg_loss * (w as f64 - 1.0) + (-delta).max(0.0)) / w as f64;
    }

    let value = if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    };
    Some(round2(value))
}

/// Evaluates indicator requests against a single fetched series.
pub struct IndicatorEngine {
    provider: Arc<dyn MarketDataProvider>,
    config: Arc<EngineConfig>,
}

impl IndicatorEngine {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: Arc<EngineConfig>) -> Self {
        Self { provider, config }
    }

    /// Recognized `(kind, windows)` pairs from the raw parser map.
    ///
    /// Keys are matched case-insensitively. A recognized key with an empty
    /// window list falls back to the configured default window. Unrecognized
    /// keys are dropped; an empty return means the query named no computable
    /// indicator.
    pub fn recognize(&self, params: &BTreeMap<String, Vec<u32>>) -> Vec<(IndicatorKind, Vec<u32>)> {
        let mut requests = Vec::new();
        for (name, windows) in params {
            let Some(kind) = IndicatorKind::parse(name) else {
                debug!("skipping unsupported indicator {}", name);
                continue;
            };
            let windows = if windows.is_empty() {
                match kind {
                    IndicatorKind::Sma => vec![self.config.default_sma_window],
                    IndicatorKind::Rsi => vec![self.config.default_rsi_window],
                }
            } else {
                windows.clone()
            };
            requests.push((kind, windows));
        }
        requests
    }

    /// Evaluate every request against one series fetch.
    ///
    /// The fetch is sized once for the largest requirement across all
    /// requested windows; every window is then computed from the same bars.
    /// Windows with too few bars are omitted from the map, so an empty map
    /// (not an error) comes back when the range held no data at all.
    pub async fn evaluate(
        &self,
        ticker: &str,
        requests: &[(IndicatorKind, Vec<u32>)],
        start: Option<NaiveDate>,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<BTreeMap<String, f64>> {
        let bars_wanted = requests
            .iter()
            .flat_map(|(kind, windows)| windows.iter().map(|&w| kind.bars_wanted(w)))
            .max()
            .unwrap_or(0);
        let start = start.unwrap_or_else(|| lookback_start(end, bars_wanted));

        debug!(
            "fetching {} from {} to {} to cover {} bars",
            ticker, start, end, bars_wanted
        );
        let series =
            fetch::fetch_one(&self.provider, &self.config, ticker, start, end, interval).await?;
        let closes = series.closes();

        let mut values = BTreeMap::new();
        for (kind, windows) in requests {
            for &window in windows {
                match kind.compute(&closes, window) {
                    Ok(value) => {
                        values.insert(kind.label(window), value);
                    }
                    Err(err) => debug!("{} omitted for {}: {}", kind.label(window), ticker, err),
                }
            }
        }
        Ok(values)
    }
}

/// Range start expected to cover `bars` trading bars ending at `end`.
///
/// The exchange trades five days in seven, and holiday runs (Tet closes HOSE
/// for about a week) can thin a window further, so the calendar span is
/// padded past the naive conversion.
fn lookback_start(end: NaiveDate, bars: usize) -> NaiveDate {
    let calendar_days = (bars as u64 * 7).div_ceil(5) + 10;
    end.checked_sub_days(Days::new(calendar_days)).unwrap_or(end)
}

//! Side-by-side evaluation of one field across tickers.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use vnquery_core::{
    Aggregate, BarField, Interval, MarketDataProvider, RequestedField, Series,
};

use crate::config::EngineConfig;
use crate::engines::{aggregate, fetch};
use crate::response::{ComparisonReport, ComparisonValue};

/// Evaluates the same field independently for several tickers.
pub struct ComparisonEngine {
    provider: Arc<dyn MarketDataProvider>,
    config: Arc<EngineConfig>,
}

impl ComparisonEngine {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: Arc<EngineConfig>) -> Self {
        Self { provider, config }
    }

    /// Compare `field` across `tickers` over one shared range.
    ///
    /// Per-ticker value policy:
    /// - `volume` always reduces to total traded volume; `agg` is not
    ///   consulted (the legacy answer for "which traded more?")
    /// - any other scalar field with `agg` set reduces to that scalar
    /// - `ohlcv` yields the trailing bars
    /// - a scalar field without `agg` yields the `(date, value)` projection
    ///
    /// A failed fetch, a timeout or an empty range maps that ticker to
    /// `null` and leaves the other entries intact; the comparison itself
    /// never fails.
    pub async fn compare(
        &self,
        tickers: &[String],
        field: RequestedField,
        agg: Option<Aggregate>,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> ComparisonReport {
        let fetched =
            fetch::fetch_each(&self.provider, &self.config, tickers, start, end, interval).await;

        let mut entries = BTreeMap::new();
        for (ticker, outcome) in fetched {
            let value = outcome
                .ok()
                .and_then(|series| self.value_for(&series, field, agg));
            entries.insert(ticker, value);
        }

        ComparisonReport {
            field,
            aggregate: agg,
            entries,
        }
    }

    fn value_for(
        &self,
        series: &Series,
        field: RequestedField,
        agg: Option<Aggregate>,
    ) -> Option<ComparisonValue> {
        if field == RequestedField::Ohlcv {
            return Some(ComparisonValue::Bars(
                series.tail(self.config.ohlcv_tail).to_vec(),
            ));
        }
        let bar_field = field.bar_field()?;
        if bar_field == BarField::Volume {
            return aggregate::aggregate(series, BarField::Volume, Aggregate::Sum)
                .ok()
                .map(ComparisonValue::Scalar);
        }
        if let Some(op) = agg {
            return aggregate::aggregate(series, bar_field, op)
                .ok()
                .map(ComparisonValue::Scalar);
        }
        Some(ComparisonValue::Points(series.project(bar_field)))
    }
}

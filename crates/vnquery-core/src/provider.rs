//! Market-data provider boundary

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::company::CompanyRecord;
use crate::error::Result;
use crate::query::Interval;
use crate::series::Series;

/// Data source for OHLCV history and static company records
///
/// Implementations must return bars sorted ascending by date, clipped to the
/// inclusive `[start, end]` range, normalized to
/// date/open/high/low/close/volume. Consumers rely on that and do not
/// re-sort or re-filter.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// OHLCV bars for one ticker over an inclusive date range
    async fn fetch_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Series>;

    /// The full company record for one ticker
    async fn fetch_company(&self, ticker: &str) -> Result<CompanyRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Bar;
    use std::sync::Arc;

    struct FixedProvider;

    #[async_trait]
    impl MarketDataProvider for FixedProvider {
        async fn fetch_series(
            &self,
            ticker: &str,
            start: NaiveDate,
            _end: NaiveDate,
            interval: Interval,
        ) -> Result<Series> {
            Ok(Series::new(
                ticker,
                interval,
                vec![Bar {
                    date: start,
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 1.0,
                    volume: 10,
                }],
            ))
        }

        async fn fetch_company(&self, ticker: &str) -> Result<CompanyRecord> {
            Ok(CompanyRecord {
                ticker: ticker.to_string(),
                ..CompanyRecord::default()
            })
        }
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let provider: Arc<dyn MarketDataProvider> = Arc::new(FixedProvider);
        let day = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        let series = provider
            .fetch_series("vcb", day, day, Interval::OneDay)
            .await
            .unwrap();
        assert_eq!(series.ticker, "vcb");
        assert_eq!(series.len(), 1);

        let company = provider.fetch_company("VCB").await.unwrap();
        assert_eq!(company.ticker, "VCB");
    }
}

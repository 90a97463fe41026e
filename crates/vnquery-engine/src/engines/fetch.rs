//! Provider fetches with timeouts and bounded fan-out.
//!
//! Comparison, ranking and multi-ticker aggregate operations evaluate each
//! ticker independently. Fetches run through an order-preserving bounded
//! stream, so results come back in input order no matter which fetch
//! finishes first; downstream tie-breaking stays deterministic. Each fetch
//! carries its own timeout, and an expired or failed fetch degrades to a
//! per-ticker failure instead of failing the whole request.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};
use vnquery_core::{Interval, MarketDataProvider, QueryError, Result, Series};

use crate::config::EngineConfig;

/// One fetch under the configured timeout.
///
/// The returned series may be empty; callers decide whether that is an
/// error for their operation.
pub(crate) async fn fetch_one(
    provider: &Arc<dyn MarketDataProvider>,
    config: &EngineConfig,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
    interval: Interval,
) -> Result<Series> {
    match tokio::time::timeout(
        config.fetch_timeout,
        provider.fetch_series(ticker, start, end, interval),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(QueryError::fetch(ticker, "timed out")),
    }
}

/// One series per ticker, in input order.
///
/// At most `max_concurrent_fetches` fetches run at once. An `Err` entry
/// records why that ticker failed (fetch error, timeout, or a range that
/// held no bars) so callers can degrade entry by entry.
pub(crate) async fn fetch_each(
    provider: &Arc<dyn MarketDataProvider>,
    config: &EngineConfig,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
    interval: Interval,
) -> Vec<(String, Result<Series>)> {
    debug!(
        "fetching {} tickers from {} to {} ({})",
        tickers.len(),
        start,
        end,
        interval
    );

    stream::iter(tickers.to_vec())
        .map(|ticker| {
            let provider = Arc::clone(provider);
            let fetch_timeout = config.fetch_timeout;
            async move {
                let fetched = match tokio::time::timeout(
                    fetch_timeout,
                    provider.fetch_series(&ticker, start, end, interval),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(QueryError::fetch(&ticker, "timed out")),
                };
                let outcome = match fetched {
                    Ok(series) if series.is_empty() => Err(QueryError::EmptySeries {
                        ticker: ticker.clone(),
                    }),
                    other => other,
                };
                if let Err(err) = &outcome {
                    warn!("degrading {} to a per-ticker failure: {}", ticker, err);
                }
                (ticker, outcome)
            }
        })
        .buffered(config.max_concurrent_fetches)
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bar, day, ScriptedProvider};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use vnquery_core::{Bar, CompanyRecord};

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    /// Serves one bar per ticker after an optional per-ticker delay.
    struct SlowProvider {
        delays: HashMap<String, Duration>,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl SlowProvider {
        fn new(delays: &[(&str, u64)]) -> Self {
            Self {
                delays: delays
                    .iter()
                    .map(|(t, ms)| (t.to_string(), Duration::from_millis(*ms)))
                    .collect(),
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for SlowProvider {
        async fn fetch_series(
            &self,
            ticker: &str,
            start: NaiveDate,
            _end: NaiveDate,
            interval: Interval,
        ) -> Result<Series> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(ticker) {
                tokio::time::sleep(*delay).await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(Series::new(
                ticker,
                interval,
                vec![Bar {
                    date: start,
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 1.0,
                    volume: 1,
                }],
            ))
        }

        async fn fetch_company(&self, ticker: &str) -> Result<CompanyRecord> {
            Err(QueryError::fetch(ticker, "not scripted"))
        }
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        // The first ticker finishes last; order must not change.
        let provider: Arc<dyn MarketDataProvider> =
            Arc::new(SlowProvider::new(&[("SLOW", 50), ("FAST", 0)]));
        let config = EngineConfig::default();

        let results = fetch_each(
            &provider,
            &config,
            &tickers(&["SLOW", "FAST"]),
            day(1),
            day(22),
            Interval::OneDay,
        )
        .await;

        assert_eq!(results[0].0, "SLOW");
        assert_eq!(results[1].0, "FAST");
        assert!(results.iter().all(|(_, outcome)| outcome.is_ok()));
    }

    #[tokio::test]
    async fn test_concurrency_stays_bounded() {
        let provider = Arc::new(SlowProvider::new(&[
            ("AAA", 10),
            ("BBB", 10),
            ("CCC", 10),
            ("DDD", 10),
            ("EEE", 10),
            ("FFF", 10),
        ]));
        let config = EngineConfig {
            max_concurrent_fetches: 2,
            ..EngineConfig::default()
        };

        let shared: Arc<dyn MarketDataProvider> = provider.clone();
        let results = fetch_each(
            &shared,
            &config,
            &tickers(&["AAA", "BBB", "CCC", "DDD", "EEE", "FFF"]),
            day(1),
            day(22),
            Interval::OneDay,
        )
        .await;

        assert_eq!(results.len(), 6);
        assert!(provider.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_failure_stays_per_ticker() {
        let provider: Arc<dyn MarketDataProvider> = Arc::new(
            ScriptedProvider::new()
                .with_series("VIC", vec![bar(20, 41.0, 42.5, 40.0, 42.0, 100)])
                .failing("XXX"),
        );
        let config = EngineConfig::default();

        let results = fetch_each(
            &provider,
            &config,
            &tickers(&["VIC", "XXX"]),
            day(1),
            day(22),
            Interval::OneDay,
        )
        .await;

        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
    }

    #[tokio::test]
    async fn test_empty_range_becomes_per_ticker_error() {
        let provider: Arc<dyn MarketDataProvider> =
            Arc::new(ScriptedProvider::new().with_series("VCB", vec![]));
        let config = EngineConfig::default();

        let results = fetch_each(
            &provider,
            &config,
            &tickers(&["VCB"]),
            day(1),
            day(22),
            Interval::OneDay,
        )
        .await;

        assert!(matches!(
            results[0].1,
            Err(QueryError::EmptySeries { .. })
        ));
    }

    #[tokio::test]
    async fn test_slow_fetch_times_out() {
        let provider: Arc<dyn MarketDataProvider> =
            Arc::new(SlowProvider::new(&[("SLOW", 500)]));
        let config = EngineConfig {
            fetch_timeout: Duration::from_millis(20),
            ..EngineConfig::default()
        };

        let results = fetch_each(
            &provider,
            &config,
            &tickers(&["SLOW"]),
            day(1),
            day(22),
            Interval::OneDay,
        )
        .await;

        let err = results[0].1.as_ref().unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_fetch_one_times_out() {
        let provider: Arc<dyn MarketDataProvider> =
            Arc::new(SlowProvider::new(&[("SLOW", 500)]));
        let config = EngineConfig {
            fetch_timeout: Duration::from_millis(20),
            ..EngineConfig::default()
        };

        let result = fetch_one(&provider, &config, "SLOW", day(1), day(22), Interval::OneDay).await;
        assert!(result.is_err());
    }
}

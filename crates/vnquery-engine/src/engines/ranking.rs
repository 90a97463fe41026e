//! Cross-ticker ranking by a shared scalar reduction.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;
use vnquery_core::{Aggregate, BarField, Interval, MarketDataProvider};

use crate::config::EngineConfig;
use crate::engines::{aggregate, fetch};
use crate::response::RankingOutcome;

/// Which end of the scale wins a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDirection {
    Lowest,
    Highest,
}

impl RankDirection {
    /// Map the query's aggregate onto a direction; `None` for sum/mean,
    /// which do not order tickers.
    pub fn from_aggregate(agg: Aggregate) -> Option<Self> {
        match agg {
            Aggregate::Min => Some(Self::Lowest),
            Aggregate::Max => Some(Self::Highest),
            Aggregate::Sum | Aggregate::Mean => None,
        }
    }

    /// The per-ticker reduction: a lowest ranking compares each ticker's
    /// minimum, a highest ranking each ticker's maximum.
    pub fn reduction(&self) -> Aggregate {
        match self {
            Self::Lowest => Aggregate::Min,
            Self::Highest => Aggregate::Max,
        }
    }

    /// Strict comparison, so the earlier-listed ticker keeps a tie.
    fn beats(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Lowest => candidate < incumbent,
            Self::Highest => candidate > incumbent,
        }
    }
}

/// Finds the extremal ticker among several by one field.
pub struct RankingEngine {
    provider: Arc<dyn MarketDataProvider>,
    config: Arc<EngineConfig>,
}

impl RankingEngine {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: Arc<EngineConfig>) -> Self {
        Self { provider, config }
    }

    /// Rank `tickers` by the extremum of `field` over the range.
    ///
    /// Tickers whose fetch or reduction fails are left out of the details
    /// and out of winner selection; ties between the rest go to the ticker
    /// listed first. `None` when every ticker failed.
    pub async fn rank(
        &self,
        tickers: &[String],
        field: BarField,
        direction: RankDirection,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Option<RankingOutcome> {
        let fetched =
            fetch::fetch_each(&self.provider, &self.config, tickers, start, end, interval).await;

        // Input order decides ties, so scan the ordered results rather than
        // the sorted details map.
        let mut scored: Vec<(String, f64)> = Vec::new();
        for (ticker, outcome) in fetched {
            match outcome.and_then(|series| aggregate::aggregate(&series, field, direction.reduction())) {
                Ok(value) => scored.push((ticker, value)),
                Err(err) => debug!("excluding {} from the ranking: {}", ticker, err),
            }
        }

        let mut winner: Option<(&String, f64)> = None;
        for (ticker, value) in &scored {
            let better = match winner {
                None => true,
                Some((_, incumbent)) => direction.beats(*value, incumbent),
            };
            if better {
                winner = Some((ticker, *value));
            }
        }

        winner.map(|(ticker, value)| RankingOutcome {
            winner: ticker.clone(),
            value,
            details: scored.iter().cloned().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bar, day, ScriptedProvider};
    use vnquery_core::Bar;

    fn flat_bars(open: f64) -> Vec<Bar> {
        vec![
            bar(20, open, open + 1.0, open - 1.0, open + 0.5, 100),
            bar(21, open + 0.2, open + 1.2, open - 0.8, open + 0.7, 100),
        ]
    }

    fn engine(provider: ScriptedProvider) -> RankingEngine {
        RankingEngine::new(Arc::new(provider), Arc::new(EngineConfig::default()))
    }

    fn names(tickers: &[&str]) -> Vec<String> {
        tickers.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_direction_from_aggregate() {
        assert_eq!(
            RankDirection::from_aggregate(Aggregate::Min),
            Some(RankDirection::Lowest)
        );
        assert_eq!(
            RankDirection::from_aggregate(Aggregate::Max),
            Some(RankDirection::Highest)
        );
        assert_eq!(RankDirection::from_aggregate(Aggregate::Sum), None);
        assert_eq!(RankDirection::from_aggregate(Aggregate::Mean), None);
    }

    #[tokio::test]
    async fn test_lowest_open_wins() {
        let provider = ScriptedProvider::new()
            .with_series("BID", flat_bars(10.0))
            .with_series("TCB", flat_bars(9.5))
            .with_series("VCB", flat_bars(11.2));
        let engine = engine(provider);

        let outcome = engine
            .rank(
                &names(&["BID", "TCB", "VCB"]),
                BarField::Open,
                RankDirection::Lowest,
                day(1),
                day(22),
                Interval::OneDay,
            )
            .await
            .unwrap();

        assert_eq!(outcome.winner, "TCB");
        assert_eq!(outcome.value, 9.5);
        assert_eq!(outcome.details.len(), 3);
        assert_eq!(outcome.details["BID"], 10.0);
        assert_eq!(outcome.details["VCB"], 11.2);
    }

    #[tokio::test]
    async fn test_highest_close_wins() {
        let provider = ScriptedProvider::new()
            .with_series("VIC", flat_bars(40.0))
            .with_series("HPG", flat_bars(27.0));
        let engine = engine(provider);

        let outcome = engine
            .rank(
                &names(&["VIC", "HPG"]),
                BarField::Close,
                RankDirection::Highest,
                day(1),
                day(22),
                Interval::OneDay,
            )
            .await
            .unwrap();

        assert_eq!(outcome.winner, "VIC");
        assert_eq!(outcome.value, 40.7);
    }

    #[tokio::test]
    async fn test_tie_goes_to_first_listed() {
        let provider = ScriptedProvider::new()
            .with_series("AAA", flat_bars(5.0))
            .with_series("BBB", flat_bars(5.0));

        let engine = engine(provider);
        let outcome = engine
            .rank(
                &names(&["AAA", "BBB"]),
                BarField::Open,
                RankDirection::Lowest,
                day(1),
                day(22),
                Interval::OneDay,
            )
            .await
            .unwrap();
        assert_eq!(outcome.winner, "AAA");

        // The same tie listed the other way round.
        let provider = ScriptedProvider::new()
            .with_series("AAA", flat_bars(5.0))
            .with_series("BBB", flat_bars(5.0));
        let engine = RankingEngine::new(Arc::new(provider), Arc::new(EngineConfig::default()));
        let outcome = engine
            .rank(
                &names(&["BBB", "AAA"]),
                BarField::Open,
                RankDirection::Lowest,
                day(1),
                day(22),
                Interval::OneDay,
            )
            .await
            .unwrap();
        assert_eq!(outcome.winner, "BBB");
    }

    #[tokio::test]
    async fn test_unique_extremum_wins_regardless_of_order() {
        for order in [["AAA", "BBB", "CCC"], ["CCC", "BBB", "AAA"]] {
            let provider = ScriptedProvider::new()
                .with_series("AAA", flat_bars(10.0))
                .with_series("BBB", flat_bars(10.0))
                .with_series("CCC", flat_bars(5.0));
            let engine = RankingEngine::new(Arc::new(provider), Arc::new(EngineConfig::default()));

            let outcome = engine
                .rank(
                    &names(&order),
                    BarField::Open,
                    RankDirection::Lowest,
                    day(1),
                    day(22),
                    Interval::OneDay,
                )
                .await
                .unwrap();
            assert_eq!(outcome.winner, "CCC");
        }
    }

    #[tokio::test]
    async fn test_failed_ticker_is_excluded() {
        let provider = ScriptedProvider::new()
            .with_series("BID", flat_bars(10.0))
            .failing("XXX");
        let engine = engine(provider);

        let outcome = engine
            .rank(
                &names(&["XXX", "BID"]),
                BarField::Open,
                RankDirection::Lowest,
                day(1),
                day(22),
                Interval::OneDay,
            )
            .await
            .unwrap();

        assert_eq!(outcome.winner, "BID");
        assert!(!outcome.details.contains_key("XXX"));
    }

    #[tokio::test]
    async fn test_all_failed_yields_none() {
        let provider = ScriptedProvider::new().failing("XXX").failing("YYY");
        let engine = engine(provider);

        let outcome = engine
            .rank(
                &names(&["XXX", "YYY"]),
                BarField::Open,
                RankDirection::Lowest,
                day(1),
                day(22),
                Interval::OneDay,
            )
            .await;
        assert!(outcome.is_none());
    }
}

//! Query classification and dispatch.

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use tracing::{debug, info, warn};
use vnquery_core::{
    BarField, MarketDataProvider, Query, QueryError, QueryType, RequestedField, Result,
};

use crate::config::EngineConfig;
use crate::engines::{aggregate, fetch, ComparisonEngine, IndicatorEngine, RankDirection, RankingEngine};
use crate::response::{
    AggregateMap, AggregateResult, CompanyReport, IndicatorReport, OhlcvSnapshot, Projection,
    QueryResponse,
};

/// Routes validated queries to the engines and folds every outcome into the
/// response envelope.
///
/// Construction wires each engine to the same provider and configuration;
/// the router owns no state beyond that and can be shared freely.
pub struct QueryRouter {
    provider: Arc<dyn MarketDataProvider>,
    config: Arc<EngineConfig>,
    indicators: IndicatorEngine,
    comparisons: ComparisonEngine,
    rankings: RankingEngine,
}

impl QueryRouter {
    /// Router over a provider with the default configuration.
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self::with_config(provider, EngineConfig::default())
    }

    pub fn with_config(provider: Arc<dyn MarketDataProvider>, config: EngineConfig) -> Self {
        let config = Arc::new(config);
        Self {
            indicators: IndicatorEngine::new(Arc::clone(&provider), Arc::clone(&config)),
            comparisons: ComparisonEngine::new(Arc::clone(&provider), Arc::clone(&config)),
            rankings: RankingEngine::new(Arc::clone(&provider), Arc::clone(&config)),
            provider,
            config,
        }
    }

    /// Dispatch one query.
    ///
    /// The single entry point, and it never fails: validation errors, fetch
    /// errors and evaluation errors all come back as the `{"error": ...}`
    /// envelope, so a caller rendering answers has exactly one shape to
    /// handle.
    pub async fn dispatch(&self, query: &Query) -> QueryResponse {
        info!("dispatching {} for {:?}", query.query_type, query.tickers);
        match self.route(query).await {
            Ok(response) => response,
            Err(err) => {
                warn!("{} failed: {}", query.query_type, err);
                QueryResponse::from(err)
            }
        }
    }

    async fn route(&self, query: &Query) -> Result<QueryResponse> {
        // Invalid type/field combinations are rejected here, before any
        // provider call.
        query.validate()?;

        match query.query_type {
            QueryType::PriceQuery => self.handle_price(query).await,
            QueryType::IndicatorQuery => self.handle_indicator(query).await,
            QueryType::CompanyQuery => self.handle_company(query).await,
            QueryType::RankingQuery => self.handle_ranking(query).await,
            QueryType::ComparisonQuery => self.handle_comparison(query).await,
            QueryType::AggregateQuery => self.handle_aggregate(query).await,
        }
    }

    async fn handle_price(&self, query: &Query) -> Result<QueryResponse> {
        let ticker = Self::required_ticker(query)?;
        let field = Self::required_field(query)?;
        let (start, end) = self.resolved_range(query);
        let interval = query.interval_or_default();

        let series =
            fetch::fetch_one(&self.provider, &self.config, ticker, start, end, interval).await?;
        if series.is_empty() {
            return Err(QueryError::EmptySeries {
                ticker: ticker.to_string(),
            });
        }

        if field == RequestedField::Ohlcv {
            let summary = series.summary().ok_or_else(|| QueryError::EmptySeries {
                ticker: ticker.to_string(),
            })?;
            return Ok(QueryResponse::Ohlcv(OhlcvSnapshot {
                ticker: ticker.to_string(),
                bars: series.tail(self.config.ohlcv_tail).to_vec(),
                summary,
            }));
        }

        let bar_field = Self::required_bar_field(query)?;
        Ok(QueryResponse::Projection(Projection {
            ticker: ticker.to_string(),
            field: bar_field,
            points: series.project(bar_field),
        }))
    }

    async fn handle_indicator(&self, query: &Query) -> Result<QueryResponse> {
        let ticker = Self::required_ticker(query)?;
        let requests = match &query.indicator_params {
            Some(params) => self.indicators.recognize(params),
            None => Vec::new(),
        };
        if requests.is_empty() {
            return Err(QueryError::NoValidIndicator);
        }

        let end = query.end.unwrap_or_else(|| Utc::now().date_naive());
        let values = self
            .indicators
            .evaluate(ticker, &requests, query.start, end, query.interval_or_default())
            .await?;
        Ok(QueryResponse::Indicators(IndicatorReport {
            ticker: ticker.to_string(),
            values,
        }))
    }

    async fn handle_company(&self, query: &Query) -> Result<QueryResponse> {
        // The one handler that tolerates a missing ticker.
        let ticker = query
            .primary_ticker()
            .unwrap_or(self.config.default_ticker.as_str());
        debug!("company lookup for {}", ticker);

        let record = match tokio::time::timeout(
            self.config.fetch_timeout,
            self.provider.fetch_company(ticker),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(QueryError::fetch(ticker, "timed out")),
        };

        let report = match query.requested_field {
            Some(RequestedField::Shareholders) => {
                CompanyReport::shareholders(ticker, record.shareholders)
            }
            Some(RequestedField::Subsidiaries) => {
                CompanyReport::subsidiaries(ticker, record.subsidiaries)
            }
            Some(RequestedField::Executives) => CompanyReport::executives(ticker, record.officers),
            // Anything else, including no field at all, means the whole record.
            _ => CompanyReport::full(record),
        };
        Ok(QueryResponse::Company(report))
    }

    async fn handle_ranking(&self, query: &Query) -> Result<QueryResponse> {
        let field = Self::required_bar_field(query)?;
        let direction = query
            .aggregate
            .and_then(RankDirection::from_aggregate)
            .ok_or_else(|| {
                QueryError::MissingAggregate("ranking requires `min` or `max`".to_string())
            })?;
        let (start, end) = self.resolved_range(query);

        let outcome = self
            .rankings
            .rank(
                &query.tickers,
                field,
                direction,
                start,
                end,
                query.interval_or_default(),
            )
            .await;
        Ok(QueryResponse::Ranking(outcome))
    }

    async fn handle_comparison(&self, query: &Query) -> Result<QueryResponse> {
        let set = query.comparison_set();
        // No field means "compare everything": each entry gets trailing bars.
        let field = query.requested_field.unwrap_or(RequestedField::Ohlcv);
        let (start, end) = self.resolved_range(query);

        let report = self
            .comparisons
            .compare(
                &set,
                field,
                query.aggregate,
                start,
                end,
                query.interval_or_default(),
            )
            .await;
        Ok(QueryResponse::Comparison(report))
    }

    async fn handle_aggregate(&self, query: &Query) -> Result<QueryResponse> {
        let field = Self::required_bar_field(query)?;
        let op = query.aggregate.ok_or_else(|| {
            QueryError::MissingAggregate("aggregate_query requires an aggregate operation".to_string())
        })?;
        let (start, end) = self.resolved_range(query);
        let interval = query.interval_or_default();

        if let [ticker] = query.tickers.as_slice() {
            let series =
                fetch::fetch_one(&self.provider, &self.config, ticker, start, end, interval)
                    .await?;
            let value = aggregate::aggregate(&series, field, op)?;
            return Ok(QueryResponse::Aggregate(AggregateResult {
                ticker: ticker.clone(),
                field,
                aggregate: op,
                value,
            }));
        }

        let fetched =
            fetch::fetch_each(&self.provider, &self.config, &query.tickers, start, end, interval)
                .await;
        let values = fetched
            .into_iter()
            .map(|(ticker, outcome)| {
                let value = outcome
                    .and_then(|series| aggregate::aggregate(&series, field, op))
                    .ok();
                (ticker, value)
            })
            .collect();
        Ok(QueryResponse::AggregateMap(AggregateMap {
            field,
            aggregate: op,
            values,
        }))
    }

    /// Effective inclusive fetch range: `end` falls back to today, `start`
    /// to `end` minus the configured lookback. Indicator queries size their
    /// own start from the largest requested window instead.
    fn resolved_range(&self, query: &Query) -> (NaiveDate, NaiveDate) {
        let end = query.end.unwrap_or_else(|| Utc::now().date_naive());
        let start = query.start.unwrap_or_else(|| {
            end.checked_sub_days(Days::new(u64::from(self.config.default_lookback_days)))
                .unwrap_or(end)
        });
        (start, end)
    }

    fn required_ticker(query: &Query) -> Result<&str> {
        query.primary_ticker().ok_or_else(|| {
            QueryError::MissingTicker(format!(
                "{} requires at least one ticker",
                query.query_type
            ))
        })
    }

    fn required_field(query: &Query) -> Result<RequestedField> {
        query.requested_field.ok_or_else(|| QueryError::InvalidField {
            field: "(none)".to_string(),
            query_type: query.query_type.as_str().to_string(),
        })
    }

    fn required_bar_field(query: &Query) -> Result<BarField> {
        let field = Self::required_field(query)?;
        field.bar_field().ok_or_else(|| QueryError::InvalidField {
            field: field.as_str().to_string(),
            query_type: query.query_type.as_str().to_string(),
        })
    }
}

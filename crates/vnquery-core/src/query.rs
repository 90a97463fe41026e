//! Canonical query schema
//!
//! The natural-language layer (an external collaborator) turns a free-text
//! question into this structure; everything in the core consumes it as-is.
//! The query is immutable once it enters dispatch. The only mutation point
//! is [`Query::resolve_relative_range`], a boundary helper for callers that
//! receive relative shorthands (`days`/`weeks`/`months`) instead of literal
//! dates.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{QueryError, Result};
use crate::series::BarField;

/// The six operation kinds a query can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Raw prices, OHLCV rows, volume
    PriceQuery,
    /// SMA, RSI, MACD
    IndicatorQuery,
    /// Shareholders, executives, subsidiaries
    CompanyQuery,
    /// "Which ticker is the lowest/highest?"
    RankingQuery,
    /// "Compare A with B, C"
    ComparisonQuery,
    /// sum / mean / min / max over a range
    AggregateQuery,
}

impl QueryType {
    /// Wire name, as produced by the parser
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceQuery => "price_query",
            Self::IndicatorQuery => "indicator_query",
            Self::CompanyQuery => "company_query",
            Self::RankingQuery => "ranking_query",
            Self::ComparisonQuery => "comparison_query",
            Self::AggregateQuery => "aggregate_query",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user asked for: a bar field, an indicator, or company data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedField {
    // Historical price fields
    Open,
    Close,
    High,
    Low,
    Volume,
    Ohlcv,

    // Technical indicators
    Sma,
    Rsi,
    Macd,

    // Company data
    Shareholders,
    Subsidiaries,
    Executives,
}

impl RequestedField {
    /// Wire name, as produced by the parser
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::High => "high",
            Self::Low => "low",
            Self::Volume => "volume",
            Self::Ohlcv => "ohlcv",
            Self::Sma => "sma",
            Self::Rsi => "rsi",
            Self::Macd => "macd",
            Self::Shareholders => "shareholders",
            Self::Subsidiaries => "subsidiaries",
            Self::Executives => "executives",
        }
    }

    /// The scalar bar column this field maps to, if any
    pub fn bar_field(&self) -> Option<BarField> {
        match self {
            Self::Open => Some(BarField::Open),
            Self::Close => Some(BarField::Close),
            Self::High => Some(BarField::High),
            Self::Low => Some(BarField::Low),
            Self::Volume => Some(BarField::Volume),
            _ => None,
        }
    }

    /// True for company-record slices (shareholders/subsidiaries/executives)
    pub fn is_company_field(&self) -> bool {
        matches!(self, Self::Shareholders | Self::Subsidiaries | Self::Executives)
    }

    /// True for technical-indicator names
    pub fn is_indicator_field(&self) -> bool {
        matches!(self, Self::Sma | Self::Rsi | Self::Macd)
    }

    /// Membership in the valid-field set for a query type
    ///
    /// `company_query` accepts anything: an unrecognized field there falls
    /// back to the full overview record rather than rejecting the query.
    pub fn valid_for(&self, query_type: QueryType) -> bool {
        match query_type {
            QueryType::PriceQuery | QueryType::ComparisonQuery => {
                self.bar_field().is_some() || *self == Self::Ohlcv
            }
            QueryType::RankingQuery | QueryType::AggregateQuery => self.bar_field().is_some(),
            QueryType::IndicatorQuery => self.is_indicator_field(),
            QueryType::CompanyQuery => true,
        }
    }
}

impl fmt::Display for RequestedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar reduction over a bar field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Sum,
    Mean,
    Min,
    Max,
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// True for the two directions ranking understands
    pub fn is_extremum(&self) -> bool {
        matches!(self, Self::Min | Self::Max)
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling granularity of a series
///
/// Lowercase aliases are accepted where unambiguous (`1d`, `1w`, `1h`
/// appear in older parser output); `1m` (minute) and `1M` (month) are
/// case-sensitive by necessity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1H", alias = "1h")]
    OneHour,
    #[default]
    #[serde(rename = "1D", alias = "1d")]
    OneDay,
    #[serde(rename = "1W", alias = "1w")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1H",
            Self::OneDay => "1D",
            Self::OneWeek => "1W",
            Self::OneMonth => "1M",
        }
    }

    /// True for sub-daily granularities
    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            Self::OneMinute | Self::FiveMinutes | Self::FifteenMinutes | Self::ThirtyMinutes | Self::OneHour
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical query consumed by the router
///
/// Produced by the external natural-language parser (usually deserialized
/// from its JSON output) and validated once at the boundary; dispatch rejects
/// invalid type/field combinations before any data is fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Governs dispatch; exactly one kind per query
    pub query_type: QueryType,
    /// What to return or reduce; optional for company and indicator queries
    #[serde(default)]
    pub requested_field: Option<RequestedField>,
    /// Ordered uppercase ticker symbols
    #[serde(default)]
    pub tickers: Vec<String>,
    /// Inclusive range start
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Inclusive range end
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// Relative shorthand: last N days (mutually exclusive with weeks/months)
    #[serde(default)]
    pub days: Option<u32>,
    /// Relative shorthand: last N weeks
    #[serde(default)]
    pub weeks: Option<u32>,
    /// Relative shorthand: last N months
    #[serde(default)]
    pub months: Option<u32>,
    /// Sampling granularity; `1D` when absent
    #[serde(default)]
    pub interval: Option<Interval>,
    /// Indicator name → ordered window sizes, e.g. `{"sma": [9, 20]}`
    #[serde(default)]
    pub indicator_params: Option<BTreeMap<String, Vec<u32>>>,
    /// Additional tickers for comparison queries
    #[serde(default)]
    pub compare_with: Option<Vec<String>>,
    /// Scalar reduction for aggregate and ranking queries
    #[serde(default)]
    pub aggregate: Option<Aggregate>,
}

impl Query {
    /// The effective interval (`1D` when the parser omitted it)
    pub fn interval_or_default(&self) -> Interval {
        self.interval.unwrap_or_default()
    }

    /// First ticker in the ordered set, if any
    pub fn primary_ticker(&self) -> Option<&str> {
        self.tickers.first().map(String::as_str)
    }

    /// Ticker set for a comparison: `[tickers[0]] + compare_with`
    pub fn comparison_set(&self) -> Vec<String> {
        let mut set: Vec<String> = Vec::new();
        if let Some(first) = self.primary_ticker() {
            set.push(first.to_string());
        }
        if let Some(extra) = &self.compare_with {
            set.extend(extra.iter().cloned());
        }
        set
    }

    /// Resolve `days`/`weeks`/`months` shorthands into literal dates
    ///
    /// No-op when `start` or `end` is already set. Days and weeks subtract
    /// literal day counts; months subtract calendar months (clamping to the
    /// shorter month-end where needed), matching the parser's arithmetic.
    pub fn resolve_relative_range(mut self, today: NaiveDate) -> Self {
        if self.start.is_some() || self.end.is_some() {
            return self;
        }
        let start = if let Some(d) = self.days {
            today.checked_sub_days(Days::new(u64::from(d)))
        } else if let Some(w) = self.weeks {
            today.checked_sub_days(Days::new(u64::from(w) * 7))
        } else if let Some(m) = self.months {
            today.checked_sub_months(Months::new(m))
        } else {
            return self;
        };
        self.start = start;
        self.end = Some(today);
        self
    }

    /// Structural validation, applied once before dispatch
    ///
    /// Checks ticker presence, the type/field table, and the aggregate
    /// requirements; anything deeper (indicator-window sufficiency,
    /// empty ranges) surfaces during evaluation.
    pub fn validate(&self) -> Result<()> {
        // Ticker presence. Company queries are exempt: they fall back to a
        // configured default symbol (the original client defaulted to VCB).
        if self.tickers.is_empty() && self.query_type != QueryType::CompanyQuery {
            return Err(QueryError::MissingTicker(format!(
                "{} requires at least one ticker",
                self.query_type
            )));
        }

        if let Some(field) = self.requested_field {
            if !field.valid_for(self.query_type) {
                return Err(QueryError::InvalidField {
                    field: field.as_str().to_string(),
                    query_type: self.query_type.as_str().to_string(),
                });
            }
        }

        match self.query_type {
            QueryType::PriceQuery | QueryType::RankingQuery | QueryType::AggregateQuery
                if self.requested_field.is_none() =>
            {
                return Err(QueryError::InvalidField {
                    field: "(none)".to_string(),
                    query_type: self.query_type.as_str().to_string(),
                });
            }
            _ => {}
        }

        if self.query_type == QueryType::RankingQuery {
            if self.tickers.len() < 2 {
                return Err(QueryError::MissingTicker(
                    "ranking requires at least two tickers".to_string(),
                ));
            }
            match self.aggregate {
                Some(agg) if agg.is_extremum() => {}
                Some(agg) => {
                    return Err(QueryError::MissingAggregate(format!(
                        "ranking requires `min` or `max`, got `{agg}`"
                    )));
                }
                None => {
                    return Err(QueryError::MissingAggregate(
                        "ranking requires `min` or `max`".to_string(),
                    ));
                }
            }
        }

        if self.query_type == QueryType::AggregateQuery && self.aggregate.is_none() {
            return Err(QueryError::MissingAggregate(
                "aggregate_query requires an aggregate operation".to_string(),
            ));
        }

        Ok(())
    }
}

//! Response envelope for query dispatch
//!
//! Every dispatch produces exactly one [`QueryResponse`]: a typed payload on
//! success, `{"error": "<message>"}` on failure. There is no other output
//! channel, and [`crate::router::QueryRouter::dispatch`] never returns `Err`.

use serde::Serialize;
use std::collections::BTreeMap;
use vnquery_core::{
    Aggregate, Bar, BarField, CompanyRecord, FieldPoint, Officer, QueryError, RequestedField,
    SeriesSummary, Shareholder, Subsidiary,
};

/// Trailing OHLCV rows plus statistics over the whole fetched range
#[derive(Debug, Clone, Serialize)]
pub struct OhlcvSnapshot {
    pub ticker: String,
    pub bars: Vec<Bar>,
    pub summary: SeriesSummary,
}

/// `(date, value)` rows for one bar column
#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    pub ticker: String,
    pub field: BarField,
    pub points: Vec<FieldPoint>,
}

/// Indicator values for one ticker, flattened to the label level:
/// `{"ticker": "VCB", "SMA9": 85.2, "RSI14": 61.4}`
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorReport {
    pub ticker: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// One scalar reduction over one ticker's series
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    pub ticker: String,
    pub field: BarField,
    pub aggregate: Aggregate,
    pub value: f64,
}

/// The same reduction across several tickers; failed tickers map to `null`
#[derive(Debug, Clone, Serialize)]
pub struct AggregateMap {
    pub field: BarField,
    pub aggregate: Aggregate,
    pub values: BTreeMap<String, Option<f64>>,
}

/// One comparison entry: a scalar, a projection, or trailing bars
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComparisonValue {
    Scalar(f64),
    Points(Vec<FieldPoint>),
    Bars(Vec<Bar>),
}

/// Side-by-side values per ticker; failed tickers map to `null`
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub field: RequestedField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
    pub entries: BTreeMap<String, Option<ComparisonValue>>,
}

/// Ranking winner with the per-ticker values that decided it
#[derive(Debug, Clone, Serialize)]
pub struct RankingOutcome {
    pub winner: String,
    pub value: f64,
    pub details: BTreeMap<String, f64>,
}

/// The slice of a company record the query asked for
#[derive(Debug, Clone, Serialize)]
pub struct CompanyReport {
    pub ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shareholders: Option<Vec<Shareholder>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsidiaries: Option<Vec<Subsidiary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executives: Option<Vec<Officer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyRecord>,
}

impl CompanyReport {
    fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            shareholders: None,
            subsidiaries: None,
            executives: None,
            company: None,
        }
    }

    pub fn shareholders(ticker: impl Into<String>, shareholders: Vec<Shareholder>) -> Self {
        Self {
            shareholders: Some(shareholders),
            ..Self::empty(ticker)
        }
    }

    pub fn subsidiaries(ticker: impl Into<String>, subsidiaries: Vec<Subsidiary>) -> Self {
        Self {
            subsidiaries: Some(subsidiaries),
            ..Self::empty(ticker)
        }
    }

    pub fn executives(ticker: impl Into<String>, executives: Vec<Officer>) -> Self {
        Self {
            executives: Some(executives),
            ..Self::empty(ticker)
        }
    }

    pub fn full(record: CompanyRecord) -> Self {
        let ticker = record.ticker.clone();
        Self {
            company: Some(record),
            ..Self::empty(ticker)
        }
    }
}

/// Error body of the envelope
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Uniform dispatch result: one of the typed payloads, or an error body
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Ohlcv(OhlcvSnapshot),
    Projection(Projection),
    Indicators(IndicatorReport),
    Aggregate(AggregateResult),
    AggregateMap(AggregateMap),
    Comparison(ComparisonReport),
    /// `null` when every ranked ticker failed
    Ranking(Option<RankingOutcome>),
    Company(CompanyReport),
    Error(ErrorBody),
}

impl QueryResponse {
    /// Build an error envelope from a message
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorBody {
            error: message.into(),
        })
    }

    /// True when this response carries an error body
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<QueryError> for QueryResponse {
    fn from(err: QueryError) -> Self {
        Self::error(err.to_string())
    }
}

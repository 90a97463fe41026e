//! Error types for query dispatch and series analytics

use thiserror::Error;

/// Result type alias for vnquery operations
pub type Result<T> = std::result::Result<T, QueryError>;

/// Failures produced while validating, dispatching or evaluating a query
///
/// Every variant renders to a human-readable message; the router converts
/// any of these into the `{"error": ...}` response envelope instead of
/// propagating them to the caller.
#[derive(Debug, Error)]
pub enum QueryError {
    /// No ticker symbol where one was required
    #[error("missing ticker: {0}")]
    MissingTicker(String),

    /// `requested_field` is not valid for the query type
    #[error("requested_field `{field}` is invalid for {query_type}")]
    InvalidField { field: String, query_type: String },

    /// Aggregate operation required but absent (or unusable for ranking)
    #[error("missing aggregate: {0}")]
    MissingAggregate(String),

    /// Indicator query carried no recognized indicator name
    #[error("no valid indicator requested")]
    NoValidIndicator,

    /// Too few bars for the requested indicator window
    #[error("insufficient data: needed {needed} bars, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The requested range yielded zero bars
    #[error("no data for {ticker} in the requested range")]
    EmptySeries { ticker: String },

    /// Provider-side failure; the collaborator's message is preserved
    #[error("fetch failed for {ticker}: {reason}")]
    Fetch { ticker: String, reason: String },

    /// Invalid engine or client configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl QueryError {
    /// Fetch failure with the provider's opaque message preserved
    pub fn fetch(ticker: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            ticker: ticker.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueryError::MissingTicker("ranking requires at least two tickers".to_string());
        assert_eq!(
            err.to_string(),
            "missing ticker: ranking requires at least two tickers"
        );

        let err = QueryError::InvalidField {
            field: "sma".to_string(),
            query_type: "price_query".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "requested_field `sma` is invalid for price_query"
        );

        let err = QueryError::EmptySeries {
            ticker: "VCB".to_string(),
        };
        assert_eq!(err.to_string(), "no data for VCB in the requested range");
    }

    #[test]
    fn test_fetch_constructor() {
        let err = QueryError::fetch("HPG", "connection reset");
        assert_eq!(err.to_string(), "fetch failed for HPG: connection reset");
    }
}

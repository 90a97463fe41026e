//! Query routing and analytics for Vietnamese equities
//!
//! This crate takes the canonical structured query produced by an upstream
//! natural-language parser, classifies it into one of six operation kinds,
//! and evaluates it against OHLCV history from a market-data provider:
//!
//! - **Prices**: OHLCV snapshots with summary statistics, or single-field
//!   `(date, value)` projections
//! - **Indicators**: SMA and RSI over one or more windows, computed from a
//!   single fetch
//! - **Aggregates**: sum/mean/min/max of one field over a range, for one
//!   ticker or a map of tickers
//! - **Comparisons**: the same field evaluated side by side across tickers
//! - **Rankings**: the extremal ticker among several by a shared reduction
//! - **Company data**: shareholders, subsidiaries, executives, or the full
//!   overview record
//!
//! Every dispatch returns the uniform [`response::QueryResponse`] envelope;
//! failures come back as `{"error": ...}` rather than propagating, and
//! multi-ticker operations degrade per ticker instead of failing whole.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vnquery_core::Query;
//! use vnquery_engine::{QueryRouter, TcbsClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let router = QueryRouter::new(Arc::new(TcbsClient::new()));
//!
//!     let query: Query = serde_json::from_str(
//!         r#"{"query_type": "aggregate_query", "requested_field": "volume",
//!             "tickers": ["VIC"], "start": "2025-08-01", "end": "2025-08-22",
//!             "aggregate": "sum"}"#,
//!     )?;
//!
//!     let answer = router.dispatch(&query).await;
//!     println!("{}", serde_json::to_string_pretty(&answer)?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod engines;
pub mod logging;
pub mod response;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

pub use api::TcbsClient;
pub use config::{EngineConfig, EngineConfigBuilder};
pub use engines::{ComparisonEngine, IndicatorEngine, IndicatorKind, RankDirection, RankingEngine};
pub use response::QueryResponse;
pub use router::QueryRouter;

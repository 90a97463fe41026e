//! Core types for vnquery
//!
//! This crate defines the canonical query schema, the OHLCV bar/series model,
//! static company records, the market-data provider boundary, and the shared
//! error type used throughout the vnquery workspace.

pub mod company;
pub mod error;
pub mod provider;
pub mod query;
pub mod series;

pub use company::{CompanyOverview, CompanyRecord, Officer, Shareholder, Subsidiary};
pub use error::{QueryError, Result};
pub use provider::MarketDataProvider;
pub use query::{Aggregate, Interval, Query, QueryType, RequestedField};
pub use series::{round2, Bar, BarField, FieldPoint, Series, SeriesSummary};

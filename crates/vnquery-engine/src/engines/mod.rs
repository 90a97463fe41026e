//! Computation engines behind the query router
//!
//! `aggregate` and the indicator math are pure; `IndicatorEngine`,
//! `ComparisonEngine` and `RankingEngine` wrap them around provider
//! fetches. Multi-ticker engines share the bounded fan-out in [`fetch`].

pub mod aggregate;
pub mod comparison;
pub(crate) mod fetch;
pub mod indicator;
pub mod ranking;

pub use aggregate::aggregate;
pub use comparison::ComparisonEngine;
pub use indicator::{rsi, sma, IndicatorEngine, IndicatorKind};
pub use ranking::{RankDirection, RankingEngine};

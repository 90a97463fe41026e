//! Shared test fixtures: a scripted in-memory provider and bar builders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use vnquery_core::{
    Bar, CompanyOverview, CompanyRecord, Interval, MarketDataProvider, Officer, QueryError, Result,
    Series, Shareholder, Subsidiary,
};

/// Provider that serves canned bars per ticker and fails on demand.
///
/// Unknown tickers fail like a real client would; a ticker scripted with an
/// empty bar list simulates a range with no trading data. `fetches()` counts
/// `fetch_series` calls so tests can assert how often the network would have
/// been hit.
pub(crate) struct ScriptedProvider {
    series: HashMap<String, Vec<Bar>>,
    companies: HashMap<String, CompanyRecord>,
    failing: Vec<String>,
    fetch_count: AtomicUsize,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self {
            series: HashMap::new(),
            companies: HashMap::new(),
            failing: Vec::new(),
            fetch_count: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_series(mut self, ticker: &str, bars: Vec<Bar>) -> Self {
        self.series.insert(ticker.to_string(), bars);
        self
    }

    pub(crate) fn with_company(mut self, record: CompanyRecord) -> Self {
        self.companies.insert(record.ticker.clone(), record);
        self
    }

    pub(crate) fn failing(mut self, ticker: &str) -> Self {
        self.failing.push(ticker.to_string());
        self
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    async fn fetch_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Series> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if self.failing.iter().any(|t| t == ticker) {
            return Err(QueryError::fetch(ticker, "scripted failure"));
        }
        let Some(bars) = self.series.get(ticker) else {
            return Err(QueryError::fetch(ticker, "unknown ticker"));
        };
        let clipped = bars
            .iter()
            .filter(|bar| bar.date >= start && bar.date <= end)
            .cloned()
            .collect();
        Ok(Series::new(ticker, interval, clipped))
    }

    async fn fetch_company(&self, ticker: &str) -> Result<CompanyRecord> {
        self.companies
            .get(ticker)
            .cloned()
            .ok_or_else(|| QueryError::fetch(ticker, "unknown ticker"))
    }
}

/// A date in August 2025, the month the fixtures live in.
pub(crate) fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
}

pub(crate) fn bar(d: u32, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Bar {
    Bar {
        date: day(d),
        open,
        high,
        low,
        close,
        volume,
    }
}

/// One bar per close on consecutive days starting August 1st.
pub(crate) fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            bar(
                u32::try_from(i).unwrap() + 1,
                close - 0.5,
                close + 1.0,
                close - 1.0,
                close,
                1_000 + i as u64 * 100,
            )
        })
        .collect()
}

pub(crate) fn company_record(ticker: &str) -> CompanyRecord {
    CompanyRecord {
        ticker: ticker.to_string(),
        overview: CompanyOverview {
            ticker: ticker.to_string(),
            short_name: Some("Vietcombank".to_string()),
            exchange: Some("HOSE".to_string()),
            industry: Some("Banking".to_string()),
            company_type: Some("NH".to_string()),
            website: Some("https://www.vietcombank.com.vn".to_string()),
            established_year: Some(1963),
            no_employees: Some(22_599),
            no_shareholders: Some(24_470),
            foreign_percent: Some(0.231),
            outstanding_share: Some(5_589.1),
            stock_rating: Some(4.2),
        },
        shareholders: vec![
            Shareholder {
                name: "State Bank of Vietnam".to_string(),
                own_percent: Some(0.7481),
            },
            Shareholder {
                name: "Mizuho Bank".to_string(),
                own_percent: Some(0.15),
            },
        ],
        subsidiaries: vec![Subsidiary {
            name: "Vietcombank Leasing".to_string(),
            own_percent: Some(1.0),
        }],
        officers: vec![Officer {
            name: "Nguyen Thanh Tung".to_string(),
            position: Some("CEO".to_string()),
            own_percent: Some(0.0001),
        }],
    }
}

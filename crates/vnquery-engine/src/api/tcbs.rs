//! Market data provider backed by the public TCBS REST API
//!
//! TCBS (Techcom Securities) exposes unauthenticated endpoints for OHLCV
//! history and company records on Vietnamese exchanges. Daily and coarser
//! bars come from `bars-long-term`, intraday bars from `bars`; a company
//! record takes four endpoint hits (overview, large shareholders, key
//! officers, sub-companies). All requests flow through one rate limiter.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveTime};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use vnquery_core::{
    Bar, CompanyOverview, CompanyRecord, Interval, MarketDataProvider, Officer, QueryError,
    Result, Series, Shareholder, Subsidiary,
};

const BASE_URL: &str = "https://apipubaws.tcbs.com.vn";

/// Unauthenticated endpoints tolerate roughly this much traffic per minute.
const DEFAULT_RATE_LIMIT: u32 = 60;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// TCBS-backed [`MarketDataProvider`].
///
/// Honors the provider guarantees: bars come back ascending by date, clipped
/// to the inclusive range, normalized to date/open/high/low/close/volume.
#[derive(Debug, Clone)]
pub struct TcbsClient {
    client: Client,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl TcbsClient {
    /// Client against the public endpoints with the default quota.
    pub fn new() -> Self {
        Self::with_rate_limit(DEFAULT_RATE_LIMIT)
    }

    /// Client with a custom requests-per-minute quota.
    pub fn with_rate_limit(per_minute: u32) -> Self {
        Self::with_base_url(BASE_URL, per_minute)
    }

    /// Client against a custom base URL (tests point this at a stub server).
    pub fn with_base_url(base_url: impl Into<String>, per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        ticker: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {} for {}", url, ticker);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|err| QueryError::fetch(ticker, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::fetch(ticker, format!("HTTP {status} from {path}")));
        }

        response
            .json()
            .await
            .map_err(|err| QueryError::fetch(ticker, err))
    }
}

impl Default for TcbsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for TcbsClient {
    async fn fetch_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Series> {
        let from = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // Exclusive upper bound at the next midnight keeps the end date's
        // bars inside the window.
        let to = end
            .checked_add_days(Days::new(1))
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let params = [
            ("ticker", ticker.to_string()),
            ("type", "stock".to_string()),
            ("resolution", resolution(interval).to_string()),
            ("from", from.to_string()),
            ("to", to.to_string()),
        ];
        let body: BarsResponse = self.get_json(ticker, bars_path(interval), &params).await?;
        debug!("TCBS returned {} bars for {}", body.data.len(), ticker);

        normalize_bars(ticker, body.data, start, end, interval)
    }

    async fn fetch_company(&self, ticker: &str) -> Result<CompanyRecord> {
        let overview: TcbsOverview = self
            .get_json(ticker, &format!("tcanalysis/v1/ticker/{ticker}/overview"), &[])
            .await?;
        let holders: ShareholdersResponse = self
            .get_json(
                ticker,
                &format!("tcanalysis/v1/ticker/{ticker}/large-share-holders"),
                &[],
            )
            .await?;
        let officers: OfficersResponse = self
            .get_json(
                ticker,
                &format!("tcanalysis/v1/ticker/{ticker}/key-officers"),
                &[],
            )
            .await?;
        let subsidiaries: SubCompaniesResponse = self
            .get_json(
                ticker,
                &format!("tcanalysis/v1/ticker/{ticker}/sub-companies"),
                &[("page", "0".to_string()), ("size", "100".to_string())],
            )
            .await?;

        Ok(assemble_company(ticker, overview, holders, officers, subsidiaries))
    }
}

/// TCBS resolution code for an interval.
fn resolution(interval: Interval) -> &'static str {
    match interval {
        Interval::OneMinute => "1",
        Interval::FiveMinutes => "5",
        Interval::FifteenMinutes => "15",
        Interval::ThirtyMinutes => "30",
        Interval::OneHour => "60",
        Interval::OneDay => "D",
        Interval::OneWeek => "W",
        Interval::OneMonth => "M",
    }
}

/// Daily and coarser bars live on a different endpoint than intraday ones.
fn bars_path(interval: Interval) -> &'static str {
    if interval.is_intraday() {
        "stock-insight/v2/stock/bars"
    } else {
        "stock-insight/v2/stock/bars-long-term"
    }
}

/// Parse, clip and order the raw rows into a [`Series`].
///
/// TCBS timestamps vary by endpoint (`2025-08-21T00:00:00.000Z` long-term,
/// `2025-08-21 09:15:00` intraday); the leading ten characters are the date
/// either way. Rows outside `[start, end]` are dropped here because the
/// long-term endpoint rounds the requested window outward.
fn normalize_bars(
    ticker: &str,
    rows: Vec<TcbsBar>,
    start: NaiveDate,
    end: NaiveDate,
    interval: Interval,
) -> Result<Series> {
    let mut bars = Vec::with_capacity(rows.len());
    for row in rows {
        let date_part = row.trading_date.get(..10).unwrap_or(&row.trading_date);
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| {
            QueryError::fetch(
                ticker,
                format!("unparseable trading date `{}`", row.trading_date),
            )
        })?;
        if date < start || date > end {
            continue;
        }
        bars.push(Bar {
            date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume as u64,
        });
    }
    Ok(Series::new(ticker, interval, bars))
}

fn assemble_company(
    ticker: &str,
    overview: TcbsOverview,
    holders: ShareholdersResponse,
    officers: OfficersResponse,
    subsidiaries: SubCompaniesResponse,
) -> CompanyRecord {
    CompanyRecord {
        ticker: ticker.to_string(),
        overview: overview.into_domain(ticker),
        shareholders: holders
            .list_share_holder
            .into_iter()
            .filter_map(|row| {
                row.name.map(|name| Shareholder {
                    name,
                    own_percent: row.own_percent,
                })
            })
            .collect(),
        subsidiaries: subsidiaries
            .list_sub_company
            .into_iter()
            .filter_map(|row| {
                row.company_name.map(|name| Subsidiary {
                    name,
                    own_percent: row.own_percent,
                })
            })
            .collect(),
        officers: officers
            .list_key_officer
            .into_iter()
            .filter_map(|row| {
                row.name.map(|name| Officer {
                    name,
                    position: row.position,
                    own_percent: row.own_percent,
                })
            })
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
struct BarsResponse {
    #[serde(default)]
    data: Vec<TcbsBar>,
}

/// One raw OHLCV row. Volume arrives as a JSON number that is sometimes a
/// float, so it is widened here and truncated on conversion.
#[derive(Debug, Deserialize)]
struct TcbsBar {
    #[serde(rename = "tradingDate")]
    trading_date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Overview payload. `establishedYear` arrives as a string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TcbsOverview {
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    company_type: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    established_year: Option<String>,
    #[serde(default)]
    no_employees: Option<u32>,
    #[serde(default)]
    no_shareholders: Option<u64>,
    #[serde(default)]
    foreign_percent: Option<f64>,
    #[serde(default)]
    outstanding_share: Option<f64>,
    #[serde(default)]
    stock_rating: Option<f64>,
}

impl TcbsOverview {
    fn into_domain(self, ticker: &str) -> CompanyOverview {
        CompanyOverview {
            ticker: ticker.to_string(),
            short_name: self.short_name,
            exchange: self.exchange,
            industry: self.industry,
            company_type: self.company_type,
            website: self.website,
            established_year: self.established_year.and_then(|year| year.parse().ok()),
            no_employees: self.no_employees,
            no_shareholders: self.no_shareholders,
            foreign_percent: self.foreign_percent,
            outstanding_share: self.outstanding_share,
            stock_rating: self.stock_rating,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ShareholdersResponse {
    #[serde(default, rename = "listShareHolder")]
    list_share_holder: Vec<TcbsShareholder>,
}

#[derive(Debug, Deserialize)]
struct TcbsShareholder {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "ownPercent")]
    own_percent: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OfficersResponse {
    #[serde(default, rename = "listKeyOfficer")]
    list_key_officer: Vec<TcbsOfficer>,
}

#[derive(Debug, Deserialize)]
struct TcbsOfficer {
    #[serde(default, rename = "officerName")]
    name: Option<String>,
    #[serde(default, rename = "officerPosition")]
    position: Option<String>,
    #[serde(default, rename = "officerOwnPercent")]
    own_percent: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct SubCompaniesResponse {
    #[serde(default, rename = "listSubCompany")]
    list_sub_company: Vec<TcbsSubCompany>,
}

#[derive(Debug, Deserialize)]
struct TcbsSubCompany {
    #[serde(default, rename = "companyName")]
    company_name: Option<String>,
    #[serde(default, rename = "ownPercent")]
    own_percent: Option<f64>,
}

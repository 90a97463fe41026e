//! Static company data model
//!
//! Domain-shaped records; vendor wire formats are decoded and mapped by the
//! provider implementation, not here.

use serde::{Deserialize, Serialize};

/// Company profile fields surfaced by provider overview endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverview {
    pub ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub established_year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_employees: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_shareholders: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outstanding_share: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_rating: Option<f64>,
}

/// One large shareholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shareholder {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_percent: Option<f64>,
}

/// One key officer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Officer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_percent: Option<f64>,
}

/// One subsidiary or affiliated company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subsidiary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_percent: Option<f64>,
}

/// Everything the provider knows about one company, fetched in one call;
/// the router projects the slice the query asked for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub ticker: String,
    pub overview: CompanyOverview,
    pub shareholders: Vec<Shareholder>,
    pub subsidiaries: Vec<Subsidiary>,
    pub officers: Vec<Officer>,
}

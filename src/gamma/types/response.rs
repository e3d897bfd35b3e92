#![allow(
    clippy::module_name_repetitions,
    reason = "Response suffix is intentional for clarity"
)]

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::json::JsonString;
use serde_with::serde_as;

use crate::types::Decimal;

/// A prediction market, as Gamma lists it.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Market {
    pub id: String,
    pub question: Option<String>,
    pub condition_id: Option<String>,
    pub slug: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub liquidity: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub active: Option<bool>,
    pub closed: Option<bool>,
    pub enable_order_book: Option<bool>,
    #[serde_as(as = "Option<JsonString>")]
    pub outcomes: Option<Vec<String>>,
    #[serde_as(as = "Option<JsonString>")]
    pub outcome_prices: Option<Vec<Decimal>>,
    /// JSON-encoded on the wire, e.g. `"[\"123\", \"456\"]"`
    #[serde_as(as = "Option<JsonString>")]
    pub clob_token_ids: Option<Vec<String>>,
}

impl Market {
    /// The asset IDs of this market's outcome tokens, i.e. what the market channel subscribes to.
    #[must_use]
    pub fn asset_ids(&self) -> Vec<String> {
        self.clob_token_ids.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Pagination {
    pub has_more: Option<bool>,
    pub total_results: Option<i32>,
}

/// Search results. The sections are kept as raw JSON, since their shapes vary by result type
/// and change often.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[non_exhaustive]
pub struct SearchResults {
    #[serde(default)]
    #[builder(default)]
    pub events: Vec<serde_json::Value>,
    #[serde(default)]
    #[builder(default)]
    pub tags: Vec<serde_json::Value>,
    #[serde(default)]
    #[builder(default)]
    pub profiles: Vec<serde_json::Value>,
    pub pagination: Option<Pagination>,
}

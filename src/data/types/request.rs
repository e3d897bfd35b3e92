#![allow(
    clippy::module_name_repetitions,
    reason = "Request suffix is intentional for clarity"
)]

use bon::Builder;
use serde::Serialize;
use serde_with::formats::CommaSeparator;
use serde_with::{StringWithSeparator, serde_as, skip_serializing_none};

use super::{ActivitySortBy, ActivityType, ClosedPositionSortBy, PositionSortBy, Side, SortDirection};
use crate::types::{Address, Decimal};

/// Open positions of `user`. The API caps `limit` at 500 and `offset` at 10000.
#[non_exhaustive]
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsRequest {
    pub user: Address,
    /// Condition IDs to restrict the listing to
    #[serde_as(as = "StringWithSeparator::<CommaSeparator, String>")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub market: Vec<String>,
    /// Smallest position size to include (the API defaults to 1)
    pub size_threshold: Option<Decimal>,
    pub redeemable: Option<bool>,
    pub mergeable: Option<bool>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
    pub sort_by: Option<PositionSortBy>,
    pub sort_direction: Option<SortDirection>,
    #[builder(into)]
    pub title: Option<String>,
}

#[non_exhaustive]
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedPositionsRequest {
    pub user: Address,
    #[serde_as(as = "StringWithSeparator::<CommaSeparator, String>")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub market: Vec<String>,
    #[builder(into)]
    pub title: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
    pub sort_by: Option<ClosedPositionSortBy>,
    pub sort_direction: Option<SortDirection>,
}

/// Trades, of one user or across markets.
#[non_exhaustive]
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Builder, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesRequest {
    pub user: Option<Address>,
    #[serde_as(as = "StringWithSeparator::<CommaSeparator, String>")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub market: Vec<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
    /// The API defaults to `true`
    pub taker_only: Option<bool>,
    pub side: Option<Side>,
}

#[non_exhaustive]
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    pub user: Address,
    #[serde_as(as = "StringWithSeparator::<CommaSeparator, String>")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub market: Vec<String>,
    #[serde_as(as = "StringWithSeparator::<CommaSeparator, ActivityType>")]
    #[serde(rename = "type", skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub activity_types: Vec<ActivityType>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
    /// Unix seconds, inclusive
    pub start: Option<i64>,
    /// Unix seconds, inclusive
    pub end: Option<i64>,
    pub sort_by: Option<ActivitySortBy>,
    pub sort_direction: Option<SortDirection>,
    /// Only meaningful for trades
    pub side: Option<Side>,
}

#[non_exhaustive]
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Serialize)]
pub struct ValueRequest {
    pub user: Address,
    #[serde_as(as = "StringWithSeparator::<CommaSeparator, String>")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub market: Vec<String>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Builder, Serialize)]
pub struct TradedRequest {
    pub user: Address,
}

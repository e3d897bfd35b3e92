#![allow(
    clippy::module_name_repetitions,
    reason = "Request suffix is intentional for clarity"
)]

use bon::Builder;
use serde::Serialize;
use serde_with::skip_serializing_none;

use super::{Side, TimeRange};
use crate::types::Address;

/// Filters for the authenticated trade history. Every filter is optional; the cursor is supplied
/// separately by the caller or by the paginating stream.
#[non_exhaustive]
#[skip_serializing_none]
#[derive(Debug, Default, Clone, Builder, Serialize)]
#[builder(on(String, into))]
pub struct TradesRequest {
    pub id: Option<String>,
    #[serde(rename = "taker")]
    pub taker_address: Option<Address>,
    #[serde(rename = "maker")]
    pub maker_address: Option<Address>,
    pub market: Option<String>,
    pub asset_id: Option<String>,
    /// Unix seconds, exclusive upper bound
    pub before: Option<i64>,
    /// Unix seconds, exclusive lower bound
    pub after: Option<i64>,
}

/// Names one outcome token, for the single-token market-data endpoints and their batch forms.
#[non_exhaustive]
#[derive(Debug, Clone, Builder, Serialize, PartialEq, Eq)]
#[builder(on(String, into))]
pub struct TokenRequest {
    pub token_id: String,
}

impl From<&str> for TokenRequest {
    fn from(token_id: &str) -> Self {
        Self {
            token_id: token_id.to_owned(),
        }
    }
}

/// Best price on one side of a token's book.
#[non_exhaustive]
#[derive(Debug, Clone, Builder, Serialize, PartialEq, Eq)]
#[builder(on(String, into))]
pub struct PriceRequest {
    pub token_id: String,
    pub side: Side,
}

/// Order book for one token. `side` narrows the batch endpoint to one side of the book.
#[non_exhaustive]
#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Serialize, PartialEq, Eq)]
#[builder(on(String, into))]
pub struct OrderBookRequest {
    pub token_id: String,
    pub side: Option<Side>,
}

/// Price history of one token, over an interval or an explicit window.
#[non_exhaustive]
#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Serialize)]
#[builder(on(String, into))]
pub struct PriceHistoryRequest {
    /// The token ID (the API calls it `market`).
    pub market: String,
    #[serde(flatten)]
    pub time_range: TimeRange,
    /// Resolution of the returned points, in minutes
    pub fidelity: Option<u32>,
}

#![allow(
    clippy::module_name_repetitions,
    reason = "Response suffix is intentional for clarity"
)]

use std::collections::HashMap;

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_with::{DefaultOnError, DefaultOnNull, TimestampMilliSeconds, TimestampSeconds, serde_as};

use crate::auth::ApiKey;
use crate::clob::types::{Side, TradeStatus, TraderSide};
use crate::types::{Address, Decimal};

/// One page of a cursor-paginated listing.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Builder, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    /// The continuation token to supply to the API to trigger for the next [`Page<T>`].
    pub next_cursor: String,
    /// The maximum length of `data`.
    #[serde(default)]
    pub limit: u64,
    /// The length of `data`
    #[serde(default)]
    pub count: u64,
}

/// A CLOB market. The token IDs in [`Market::tokens`] are the asset IDs of the market channel.
#[expect(
    clippy::struct_excessive_bools,
    reason = "The current API has these fields"
)]
#[non_exhaustive]
#[derive(Debug, Deserialize, Clone, Builder, PartialEq)]
#[builder(on(String, into))]
pub struct Market {
    pub condition_id: String,
    #[serde(default)]
    pub question_id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub market_slug: String,
    #[serde(default)]
    pub enable_order_book: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub accepting_orders: bool,
    pub minimum_order_size: Option<Decimal>,
    pub minimum_tick_size: Option<Decimal>,
    pub end_date_iso: Option<DateTime<Utc>>,
    #[serde(default)]
    pub neg_risk: bool,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

impl Market {
    /// Asset IDs of this market's outcome tokens, in API order.
    #[must_use]
    pub fn asset_ids(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.token_id.clone()).collect()
    }
}

#[non_exhaustive]
#[derive(Debug, Deserialize, Clone, Builder, PartialEq)]
#[builder(on(String, into))]
pub struct Token {
    pub token_id: String,
    pub outcome: String,
    pub price: Decimal,
    #[serde(default)]
    pub winner: bool,
}

#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, Deserialize, Builder, PartialEq)]
#[builder(on(String, into))]
pub struct Trade {
    pub id: String,
    pub taker_order_id: String,
    /// The market condition ID.
    pub market: String,
    pub asset_id: String,
    pub side: Side,
    pub size: Decimal,
    pub fee_rate_bps: Decimal,
    pub price: Decimal,
    pub status: TradeStatus,
    #[serde_as(as = "TimestampSeconds<String>")]
    pub match_time: DateTime<Utc>,
    #[serde_as(as = "TimestampSeconds<String>")]
    pub last_update: DateTime<Utc>,
    pub outcome: String,
    #[serde(default)]
    pub bucket_index: u32,
    pub owner: ApiKey,
    pub maker_address: Address,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub maker_orders: Vec<MakerOrder>,
    pub transaction_hash: String,
    pub trader_side: TraderSide,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Builder, PartialEq)]
#[builder(on(String, into))]
pub struct MakerOrder {
    pub order_id: String,
    pub owner: ApiKey,
    pub maker_address: Address,
    pub matched_amount: Decimal,
    pub price: Decimal,
    pub fee_rate_bps: Decimal,
    pub asset_id: String,
    pub outcome: String,
    pub side: Side,
}

/// Aggregated REST order book for one token.
#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, Deserialize, Builder, PartialEq)]
#[builder(on(String, into))]
pub struct OrderBook {
    /// The market condition ID.
    pub market: String,
    pub asset_id: String,
    #[serde_as(as = "TimestampMilliSeconds<String>")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub hash: Option<String>,
    #[builder(default)]
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub bids: Vec<OrderSummary>,
    #[builder(default)]
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub asks: Vec<OrderSummary>,
    pub min_order_size: Decimal,
    #[serde(default)]
    pub neg_risk: bool,
    pub tick_size: Decimal,
    /// Absent, empty or unparsable on books that never traded.
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub last_trade_price: Option<Decimal>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Builder, PartialEq, Eq)]
pub struct OrderSummary {
    pub price: Decimal,
    pub size: Decimal,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MidpointResponse {
    pub mid: Decimal,
}

/// Midpoints keyed by token ID.
#[non_exhaustive]
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct MidpointsResponse {
    pub midpoints: HashMap<String, Decimal>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PriceResponse {
    pub price: Decimal,
}

/// Best prices keyed by token ID, then by side.
#[non_exhaustive]
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PricesResponse {
    pub prices: HashMap<String, HashMap<Side, Decimal>>,
}

impl PricesResponse {
    /// The best price on `side` of `token_id`'s book, if it was requested and quoted.
    #[must_use]
    pub fn get(&self, token_id: &str, side: Side) -> Option<Decimal> {
        self.prices.get(token_id)?.get(&side).copied()
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LastTradePriceResponse {
    pub price: Decimal,
    pub side: Side,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LastTradesPricesResponse {
    pub token_id: String,
    pub price: Decimal,
    pub side: Side,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TickSizeResponse {
    pub minimum_tick_size: Decimal,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NegRiskResponse {
    pub neg_risk: bool,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeeRateResponse {
    /// Base fee in basis points
    pub base_fee: u32,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PriceHistoryResponse {
    #[serde(default)]
    pub history: Vec<PricePoint>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PricePoint {
    /// Unix seconds
    pub t: i64,
    pub p: Decimal,
}

/// API keys issued to the authenticated address.
#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ApiKeysResponse {
    #[serde(rename = "apiKeys", default)]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub keys: Vec<ApiKey>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BanStatusResponse {
    pub closed_only: bool,
}

#![allow(
    clippy::module_name_repetitions,
    reason = "Response types are named after their endpoints"
)]

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_with::{DefaultOnError, NoneAsEmptyString, serde_as};

use super::{ActivityType, Side};
use crate::types::{Address, Decimal};

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Health {
    /// `"OK"` while the API is up
    pub data: String,
}

/// An open position. `asset` is the token ID the market channel subscribes to.
#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub proxy_wallet: Address,
    pub asset: String,
    pub condition_id: String,
    pub size: Decimal,
    pub avg_price: Decimal,
    pub initial_value: Decimal,
    pub current_value: Decimal,
    pub cash_pnl: Decimal,
    pub percent_pnl: Decimal,
    pub total_bought: Decimal,
    pub realized_pnl: Decimal,
    pub percent_realized_pnl: Decimal,
    pub cur_price: Decimal,
    pub redeemable: bool,
    pub mergeable: bool,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub event_slug: String,
    pub outcome: String,
    pub outcome_index: i32,
    pub opposite_outcome: String,
    pub opposite_asset: String,
    /// Absent or unparsable for markets without a scheduled end
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub negative_risk: bool,
}

#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClosedPosition {
    pub proxy_wallet: Address,
    pub asset: String,
    pub condition_id: String,
    pub avg_price: Decimal,
    pub total_bought: Decimal,
    pub realized_pnl: Decimal,
    /// Final price of the outcome
    pub cur_price: Decimal,
    /// Unix seconds at which the position was closed
    pub timestamp: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub event_slug: String,
    pub outcome: String,
    pub outcome_index: i32,
    pub opposite_outcome: String,
    pub opposite_asset: String,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub end_date: Option<DateTime<Utc>>,
}

#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub proxy_wallet: Address,
    pub side: Side,
    pub asset: String,
    pub condition_id: String,
    pub size: Decimal,
    pub price: Decimal,
    /// Unix seconds
    pub timestamp: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub event_slug: String,
    pub outcome: String,
    pub outcome_index: i32,
    /// Public display name, when the trader set one
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub name: Option<String>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub pseudonym: Option<String>,
    pub transaction_hash: String,
}

/// One on-chain event of a user. Market fields are empty for rewards and conversions.
#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub proxy_wallet: Address,
    /// Unix seconds
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub condition_id: Option<String>,
    pub size: Decimal,
    pub usdc_size: Decimal,
    pub transaction_hash: String,
    pub price: Option<Decimal>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub asset: Option<String>,
    /// Set on trades only
    #[serde(default, deserialize_with = "side_if_known")]
    pub side: Option<Side>,
    pub outcome_index: Option<i32>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub title: Option<String>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub outcome: Option<String>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Value {
    pub user: Address,
    /// In USDC
    pub value: Decimal,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Traded {
    pub user: Address,
    /// Distinct markets traded
    pub traded: u32,
}

/// Non-trade activity carries `"side": ""`.
fn side_if_known<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Side>, D::Error> {
    Ok(Option::<Side>::deserialize(deserializer)?.filter(|side| *side != Side::Unknown))
}

//! Types for the Polymarket Data API.
//!
//! The API spells its query parameters in camelCase; the request types take care of that.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

pub mod request;
pub mod response;

pub use crate::types::Side;

/// Kind of on-chain activity.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Trade,
    /// Collateral split into a full outcome set
    Split,
    /// A full outcome set merged back into collateral
    Merge,
    Redeem,
    Reward,
    Conversion,
    MakerRebate,
    #[serde(other)]
    Unknown,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum PositionSortBy {
    Current,
    Initial,
    #[default]
    Tokens,
    CashPnl,
    PercentPnl,
    Title,
    Resolving,
    Price,
    AvgPrice,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ClosedPositionSortBy {
    #[default]
    RealizedPnl,
    Title,
    Price,
    AvgPrice,
    Timestamp,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ActivitySortBy {
    #[default]
    Timestamp,
    Tokens,
    Cash,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

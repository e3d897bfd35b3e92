//! Request and response types for the CLOB REST API.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

pub mod request;
pub mod response;

pub use crate::types::Side;

/// Which side of the match the authenticated user was on.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TraderSide {
    Taker,
    Maker,
    #[serde(other)]
    Unknown,
}

/// Settlement status of a trade.
#[non_exhaustive]
#[derive(Clone, Debug, Display, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TradeStatus {
    Matched,
    Mined,
    Confirmed,
    Retrying,
    Failed,
    /// Status not known to this crate (captures the raw value for debugging).
    #[serde(untagged)]
    Unknown(String),
}

/// Window presets for [`request::PriceHistoryRequest`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    #[strum(serialize = "1m")]
    OneMinute,
    #[serde(rename = "1h")]
    #[strum(serialize = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    #[strum(serialize = "6h")]
    SixHours,
    #[serde(rename = "1d")]
    #[strum(serialize = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    #[strum(serialize = "1w")]
    OneWeek,
    /// All available history
    #[serde(rename = "max")]
    #[strum(serialize = "max")]
    Max,
}

/// The price-history window: a preset [`Interval`] ending now, or explicit Unix-second bounds.
/// The API accepts one or the other, never both.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TimeRange {
    Interval {
        interval: Interval,
    },
    #[serde(rename_all = "camelCase")]
    Range {
        start_ts: i64,
        end_ts: i64,
    },
}

impl TimeRange {
    #[must_use]
    pub const fn from_interval(interval: Interval) -> Self {
        Self::Interval { interval }
    }

    #[must_use]
    pub const fn from_range(start_ts: i64, end_ts: i64) -> Self {
        Self::Range { start_ts, end_ts }
    }
}

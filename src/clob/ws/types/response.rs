use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer as _};
use serde_json::Deserializer;
use serde_with::{DisplayFromStr, serde_as};
use strum_macros::Display;

use crate::types::{Decimal, Side};
use crate::ws::{ParseError, WsError};

/// Discriminator of a feed event, carried in its `event_type` field.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    Book,
    PriceChange,
    TickSizeChange,
    LastTradePrice,
}

impl EventType {
    #[must_use]
    pub fn from_wire(event_type: &str) -> Option<Self> {
        match event_type {
            "book" => Some(Self::Book),
            "price_change" => Some(Self::PriceChange),
            "tick_size_change" => Some(Self::TickSizeChange),
            "last_trade_price" => Some(Self::LastTradePrice),
            _ => None,
        }
    }
}

/// A decoded feed event.
///
/// Built per inbound message and handed to the callbacks; the client keeps no copy.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum WsMessage {
    /// Full order book for one asset
    Book(BookSnapshot),
    /// Batch of level updates
    PriceChange(PriceChange),
    /// Minimum tick size changed
    TickSizeChange(TickSizeChange),
    /// A trade printed
    LastTradePrice(LastTradePrice),
}

impl WsMessage {
    /// Decodes one raw JSON object.
    ///
    /// The `event_type` field is read first so that unknown kinds fail fast with a precise
    /// error instead of a generic schema mismatch.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        Self::decode(raw).map_err(|source| {
            WsError::MessageParse {
                payload: raw.to_owned(),
                source,
            }
            .into()
        })
    }

    fn decode(raw: &str) -> Result<Self, ParseError> {
        let event_type = peek_event_type(raw)?.ok_or(ParseError::MissingEventType)?;
        let event_type =
            EventType::from_wire(&event_type).ok_or(ParseError::UnknownEventType(event_type))?;

        Ok(match event_type {
            EventType::Book => Self::Book(serde_json::from_str(raw)?),
            EventType::PriceChange => Self::PriceChange(serde_json::from_str(raw)?),
            EventType::TickSizeChange => Self::TickSizeChange(serde_json::from_str(raw)?),
            EventType::LastTradePrice => Self::LastTradePrice(serde_json::from_str(raw)?),
        })
    }

    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::Book(_) => EventType::Book,
            Self::PriceChange(_) => EventType::PriceChange,
            Self::TickSizeChange(_) => EventType::TickSizeChange,
            Self::LastTradePrice(_) => EventType::LastTradePrice,
        }
    }

    /// Market identifier the event belongs to.
    #[must_use]
    pub fn market(&self) -> &str {
        match self {
            Self::Book(book) => &book.market,
            Self::PriceChange(change) => &change.market,
            Self::TickSizeChange(change) => &change.market,
            Self::LastTradePrice(trade) => &trade.market,
        }
    }

    #[must_use]
    pub const fn as_book(&self) -> Option<&BookSnapshot> {
        match self {
            Self::Book(book) => Some(book),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_price_change(&self) -> Option<&PriceChange> {
        match self {
            Self::PriceChange(change) => Some(change),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_tick_size_change(&self) -> Option<&TickSizeChange> {
        match self {
            Self::TickSizeChange(change) => Some(change),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_last_trade_price(&self) -> Option<&LastTradePrice> {
        match self {
            Self::LastTradePrice(trade) => Some(trade),
            _ => None,
        }
    }
}

/// Order book snapshot for one asset.
#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BookSnapshot {
    /// Market condition ID
    pub market: String,
    /// Asset/token identifier
    pub asset_id: String,
    /// Bid levels, best first
    #[serde(default)]
    pub bids: Vec<OrderBookLevel>,
    /// Ask levels, best first
    #[serde(default)]
    pub asks: Vec<OrderBookLevel>,
    /// Hash of the book contents
    #[serde(default)]
    pub hash: Option<String>,
    /// Unix timestamp in milliseconds
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub timestamp: Option<i64>,
}

impl BookSnapshot {
    #[must_use]
    pub fn best_bid(&self) -> Option<&OrderBookLevel> {
        self.bids.iter().max_by_key(|level| level.price)
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<&OrderBookLevel> {
        self.asks.iter().min_by_key(|level| level.price)
    }
}

/// Individual price level in an order book.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderBookLevel {
    pub price: Decimal,
    /// Total size resting at this price
    pub size: Decimal,
}

/// A batch of level updates for one market.
#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceChange {
    /// Market condition ID
    pub market: String,
    #[serde(default)]
    pub price_changes: Vec<PriceChangeEntry>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub timestamp: Option<i64>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceChangeEntry {
    #[serde(default)]
    pub asset_id: Option<String>,
    pub side: Side,
    pub price: Decimal,
    /// New total size at `price`. Zero removes the level.
    pub size: Decimal,
    /// Best bid after this change
    #[serde(default)]
    pub best_bid: Option<Decimal>,
    /// Best ask after this change
    #[serde(default)]
    pub best_ask: Option<Decimal>,
    #[serde(default)]
    pub hash: Option<String>,
}

/// Tick size change, sent when the price crosses a threshold.
#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TickSizeChange {
    /// Market condition ID
    pub market: String,
    #[serde(default)]
    pub asset_id: Option<String>,
    pub old_tick_size: Decimal,
    pub new_tick_size: Decimal,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub timestamp: Option<i64>,
}

#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LastTradePrice {
    /// Market condition ID
    pub market: String,
    #[serde(default)]
    pub asset_id: Option<String>,
    /// Side of the aggressor
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    /// Fee rate in basis points
    #[serde(default)]
    pub fee_rate_bps: Option<Decimal>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub timestamp: Option<i64>,
}

/// Reads `event_type` from a JSON object without decoding the rest of it.
///
/// Returns `Ok(None)` for objects without the field, and an error for anything that is not an
/// object.
fn peek_event_type(raw: &str) -> Result<Option<String>, ParseError> {
    struct EventTypePeeker;

    impl<'de> Visitor<'de> for EventTypePeeker {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a JSON object")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut event_type = None;
            while let Some(key) = map.next_key::<std::borrow::Cow<'de, str>>()? {
                if key == "event_type" {
                    event_type = Some(map.next_value::<String>()?);
                } else {
                    map.next_value::<IgnoredAny>()?;
                }
            }
            Ok(event_type)
        }
    }

    let mut de = Deserializer::from_str(raw);
    let event_type = de.deserialize_map(EventTypePeeker)?;
    de.end()?;

    Ok(event_type)
}

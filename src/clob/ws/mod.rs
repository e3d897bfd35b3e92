//! Polymarket market and user channels on top of the [`crate::ws`] engine.
//!
//! [`Client::market`] streams public order-book events for a set of asset IDs.
//! [`Client::user`] streams authenticated events for a set of market IDs and asks its
//! [`CredentialProvider`](crate::auth::CredentialProvider) for credentials before every dial.

#![expect(
    clippy::module_name_repetitions,
    reason = "Re-exported names intentionally match their modules for API clarity"
)]

pub mod callbacks;
pub mod client;
pub mod types;

pub use callbacks::Callbacks;
pub use client::{ChannelType, Client, ClobChannel, DEFAULT_ENDPOINT};
pub use types::request::SubscriptionRequest;
pub use types::response::{
    BookSnapshot, EventType, LastTradePrice, OrderBookLevel, PriceChange, PriceChangeEntry,
    TickSizeChange, WsMessage,
};

pub use crate::ws::WsError;

//! Shared value types, plus re-exports from external crates for convenience.
//!
//! The re-exports are here so users don't need to add these dependencies to their `Cargo.toml`.

/// Ethereum address type and the [`address!`] macro for compile-time address literals.
/// [`ChainId`] is a type alias for `u64` representing EVM chain IDs.
pub use alloy::primitives::{Address, ChainId, address};
/// Date and time types for timestamps in API responses.
pub use chrono::{DateTime, Utc};
/// Arbitrary precision decimal type for prices and sizes.
pub use rust_decimal::Decimal;
/// Macro for creating [`Decimal`] literals at compile time.
///
/// # Example
/// ```
/// use polymarket_feed::types::dec;
/// let price = dec!(0.42);
/// ```
pub use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Side of a trade or book level.
///
/// The feed and the REST API send `BUY`/`SELL`, but lowercase spellings show up in older
/// payloads. Anything else decodes as [`Side::Unknown`] instead of failing the whole message.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Side {
    #[serde(alias = "buy")]
    Buy,
    #[serde(alias = "sell")]
    Sell,
    #[serde(other)]
    Unknown,
}

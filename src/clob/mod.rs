//! Polymarket CLOB (Central Limit Order Book) clients.
//!
//! **Feature flags:** `clob` for the REST client, `ws` for the real-time feed in [`ws`].
//!
//! # REST endpoints used
//!
//! | Endpoint | Description | Auth |
//! |----------|-------------|------|
//! | `/time` | Current server timestamp | none |
//! | `/markets` | All markets (paginated) | none |
//! | `/auth/api-key` | Create API credentials | L1 |
//! | `/auth/derive-api-key` | Derive existing API credentials | L1 |
//! | `/data/trades` | User's trade history (paginated) | L2 |
//!
//! # Feeding the user channel
//!
//! ```rust,no_run
//! use std::str::FromStr as _;
//!
//! use alloy::signers::Signer as _;
//! use alloy::signers::local::LocalSigner;
//! use polymarket_feed::POLYGON;
//! use polymarket_feed::clob::ws::{Callbacks, Client as FeedClient};
//! use polymarket_feed::clob::{Client, Config, SignerCredentials};
//! use polymarket_feed::ws::config::Config as FeedConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let signer = LocalSigner::from_str("0x...")?.with_chain_id(Some(POLYGON));
//! let rest = Client::new("https://clob.polymarket.com", Config::default())?;
//!
//! let feed = FeedClient::user(
//!     vec!["<condition id>".to_owned()],
//!     Callbacks::new().on_message(|event| println!("{event:?}")),
//!     SignerCredentials::new(rest, signer),
//!     FeedConfig::default(),
//! )?;
//! feed.connect().await?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "clob")]
pub mod client;
#[cfg(feature = "clob")]
pub mod types;
#[cfg(feature = "ws")]
pub mod ws;

#[cfg(feature = "clob")]
pub use client::{
    AuthenticationBuilder, Client, Config, DEFAULT_HOST, PaginationPolicy, SignerCredentials,
};

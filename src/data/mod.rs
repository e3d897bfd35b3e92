//! Polymarket Data API client: positions, trade history and on-chain activity of a wallet.
//!
//! **Feature flag:** `data`
//!
//! | Endpoint | Description |
//! |----------|-------------|
//! | `/` | Health check |
//! | `/positions` | Open positions of a user |
//! | `/closed-positions` | Closed positions of a user |
//! | `/trades` | Trades of a user or across markets |
//! | `/activity` | On-chain activity of a user |
//! | `/value` | Total value of a user's positions |
//! | `/traded` | Number of markets a user has traded |
//!
//! # Example
//!
//! ```no_run
//! use polymarket_feed::data::types::request::PositionsRequest;
//! use polymarket_feed::data::{Client, DEFAULT_HOST};
//! use polymarket_feed::types::address;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(DEFAULT_HOST)?;
//!
//! let request = PositionsRequest::builder()
//!     .user(address!("56687bf447db6ffa42ffe2204a05edaa20f55839"))
//!     .build();
//!
//! // Asset IDs of every open position, ready for the market channel
//! let asset_ids: Vec<String> = client
//!     .positions(&request)
//!     .await?
//!     .into_iter()
//!     .map(|position| position.asset)
//!     .collect();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod types;

pub use client::{Client, DEFAULT_HOST};

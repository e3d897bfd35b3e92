//! Polymarket Gamma API client, used to discover the asset IDs the feed subscribes to.
//!
//! **Feature flag:** `gamma`
//!
//! | Endpoint | Description |
//! |----------|-------------|
//! | `/markets` | List markets |
//! | `/public-search` | Search markets, events, and profiles |
//!
//! # Example
//!
//! ```no_run
//! use polymarket_feed::gamma::{Client, DEFAULT_HOST};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(DEFAULT_HOST)?;
//!
//! let asset_ids: Vec<String> = client
//!     .list_active_markets()
//!     .await?
//!     .iter()
//!     .flat_map(|market| market.asset_ids())
//!     .collect();
//! println!("{} active assets", asset_ids.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod types;

pub use client::{Client, DEFAULT_HOST};

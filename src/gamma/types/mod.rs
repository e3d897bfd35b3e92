//! Types for the Polymarket Gamma API.
//!
//! Request types use the builder pattern via the [`bon`](https://docs.rs/bon) crate:
//!
//! ```
//! use polymarket_feed::gamma::types::request::MarketsRequest;
//!
//! let markets = MarketsRequest::builder()
//!     .limit(10)
//!     .closed(false)
//!     .build();
//! ```

pub mod request;
pub mod response;

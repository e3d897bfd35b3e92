//! Generic WebSocket feed engine.
//!
//! The engine keeps a single feed session alive and knows nothing about the messages flowing
//! through it. A concrete channel plugs in through two traits: [`MessageParser`] decodes raw
//! messages and [`FrameBuilder`] renders subscribe frames. A [`Handler`] receives decoded
//! messages, errors and lifecycle notifications.
//!
//! # Architecture
//!
//! - [`ConnectionManager`]: dial, subscribe handshake, read loop, heartbeat, and the reconnection
//!   state machine ([`ConnectionState`])
//! - [`SubscriptionSet`]: the identifiers replayed in full on every (re)connect
//! - [`config::Config`]: heartbeat, reconnect policy, proxy and debug logging
//!
//! See [`crate::clob::ws`] for the Polymarket market and user channels built on top.

pub mod config;
pub mod connection;
pub mod error;
mod reconnect;
pub mod subscription;
pub mod traits;
mod transport;

pub use connection::{ConnectionManager, ConnectionState};
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use error::ParseError;
pub use subscription::SubscriptionSet;
pub use traits::*;

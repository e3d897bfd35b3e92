//! Seams between the generic engine and a concrete feed channel.

use crate::Result;
use crate::auth::Credentials;
use crate::error::Error;

/// Decodes one raw message into a typed event.
///
/// Batched frames are split by the engine before they reach the parser, so `raw` is always a
/// single JSON value. A failed decode is reported through [`Handler::on_error`] and the read
/// loop moves on to the next message.
pub trait MessageParser<M>: Send + Sync + 'static {
    fn parse(&self, raw: &str) -> Result<M>;
}

/// Builds the subscribe frame of a channel.
pub trait FrameBuilder: Send + Sync + 'static {
    /// Renders the subscribe frame for the complete identifier set.
    ///
    /// `credentials` is `Some` whenever [`FrameBuilder::requires_credentials`] returns `true`.
    fn subscribe_frame(&self, ids: &[String], credentials: Option<&Credentials>) -> Result<String>;

    /// Whether a [`crate::auth::CredentialProvider`] must be consulted before each dial.
    fn requires_credentials(&self) -> bool {
        false
    }
}

/// Receives everything a session produces.
///
/// Every method runs on the engine's own tasks: messages on the read loop, in wire order, and
/// lifecycle notifications where the transition happens. A slow handler delays the next frame.
pub trait Handler<M>: Send + Sync + 'static {
    fn on_message(&self, message: M);

    fn on_error(&self, error: &Error);

    fn on_connect(&self) {}

    fn on_disconnect(&self, _code: u16, _reason: &str) {}

    /// Fired when a redial is scheduled, before its delay starts.
    fn on_reconnect(&self, _attempt: u32) {}
}

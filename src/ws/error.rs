#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;

/// WebSocket error variants.
#[non_exhaustive]
#[derive(Debug)]
pub enum WsError {
    /// Error connecting to or communicating with the WebSocket server
    Connection(tokio_tungstenite::tungstenite::Error),
    /// A frame could not be decoded. The raw payload is kept for diagnostics.
    MessageParse { payload: String, source: ParseError },
    /// The configured proxy URL cannot be used
    InvalidProxy(String),
    /// The TLS client configuration could not be built
    Tls(rustls::Error),
    /// The SOCKS5 proxy refused or failed the handshake
    Socks(tokio_socks::Error),
    /// An operation needed a live connection and there was none
    NotConnected,
    /// A connect was aborted because the session was disconnected meanwhile
    Disconnected,
    /// A frame could not be handed to the writer
    Send(String),
}

/// Why a frame failed to decode.
#[non_exhaustive]
#[derive(Debug)]
pub enum ParseError {
    /// The discriminator field is absent
    MissingEventType,
    /// The discriminator names an event this client does not know
    UnknownEventType(String),
    /// The payload is not valid JSON or does not match the event schema
    Malformed(serde_json::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEventType => write!(f, "missing event_type"),
            Self::UnknownEventType(kind) => write!(f, "unknown event_type {kind:?}"),
            Self::Malformed(e) => write!(f, "malformed payload: {e}"),
        }
    }
}

impl StdError for ParseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e)
    }
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "WebSocket connection error: {e}"),
            Self::MessageParse { payload, source } => {
                write!(f, "Failed to parse WebSocket message ({source}): {payload}")
            }
            Self::InvalidProxy(reason) => write!(f, "Invalid proxy: {reason}"),
            Self::Tls(e) => write!(f, "TLS configuration error: {e}"),
            Self::Socks(e) => write!(f, "SOCKS5 proxy error: {e}"),
            Self::NotConnected => write!(f, "WebSocket is not connected"),
            Self::Disconnected => write!(f, "WebSocket was disconnected while connecting"),
            Self::Send(reason) => write!(f, "Failed to send WebSocket frame: {reason}"),
        }
    }
}

impl StdError for WsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Connection(e) => Some(e),
            Self::MessageParse { source, .. } => Some(source),
            Self::Tls(e) => Some(e),
            Self::Socks(e) => Some(e),
            _ => None,
        }
    }
}

// Integration with main Error type
impl From<WsError> for crate::error::Error {
    fn from(e: WsError) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, e)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for crate::error::Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, WsError::Connection(e))
    }
}

impl From<rustls::Error> for crate::error::Error {
    fn from(e: rustls::Error) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, WsError::Tls(e))
    }
}

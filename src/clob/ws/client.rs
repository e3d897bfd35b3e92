use std::sync::Arc;

use tokio::sync::watch;
use url::Url;

use super::callbacks::Callbacks;
use super::types::request::SubscriptionRequest;
use super::types::response::WsMessage;
use crate::Result;
use crate::auth::{CredentialProvider, Credentials};
use crate::error::Error;
use crate::ws::config::Config;
use crate::ws::{ConnectionManager, ConnectionState, FrameBuilder, MessageParser};

/// Production feed host. Channel paths are appended to it.
pub const DEFAULT_ENDPOINT: &str = "wss://ws-subscriptions-clob.polymarket.com";

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    /// Public market data, keyed by asset ID
    Market,
    /// Authenticated order and trade data, keyed by market ID
    User,
}

impl ChannelType {
    const fn path(self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::User => "user",
        }
    }
}

/// Decoding and subscribe frames for one Polymarket channel.
#[derive(Debug, Clone, Copy)]
pub struct ClobChannel {
    channel: ChannelType,
}

impl MessageParser<WsMessage> for ClobChannel {
    fn parse(&self, raw: &str) -> Result<WsMessage> {
        WsMessage::parse(raw)
    }
}

impl FrameBuilder for ClobChannel {
    fn subscribe_frame(&self, ids: &[String], credentials: Option<&Credentials>) -> Result<String> {
        let request = match (self.channel, credentials) {
            (ChannelType::Market, _) => SubscriptionRequest::market(ids),
            (ChannelType::User, Some(credentials)) => SubscriptionRequest::user(ids, credentials),
            (ChannelType::User, None) => {
                return Err(Error::validation(
                    "the user channel cannot subscribe without credentials",
                ));
            }
        };

        Ok(serde_json::to_string(&request)?)
    }

    fn requires_credentials(&self) -> bool {
        self.channel == ChannelType::User
    }
}

/// Real-time Polymarket feed for one channel.
///
/// Events go to the [`Callbacks`] given at construction. The connection is not opened until
/// [`Client::connect`]; after that it is kept alive until [`Client::disconnect`], redialing and
/// re-subscribing according to the [`Config`] reconnect policy.
///
/// # Examples
///
/// ```rust, no_run
/// use polymarket_feed::clob::ws::{Callbacks, Client};
/// use polymarket_feed::ws::config::Config;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let callbacks = Callbacks::new().on_book(|book| {
///         println!("{}: {} bids, {} asks", book.asset_id, book.bids.len(), book.asks.len());
///     });
///
///     let client = Client::market(vec!["<asset id>".to_owned()], callbacks, Config::default())?;
///     client.connect().await?;
///     client.wait().await;
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    channel: ChannelType,
    connection: ConnectionManager<WsMessage, ClobChannel>,
}

impl Client {
    /// Market channel on the production host.
    pub fn market(asset_ids: Vec<String>, callbacks: Callbacks, config: Config) -> Result<Self> {
        Self::market_with_endpoint(DEFAULT_ENDPOINT, asset_ids, callbacks, config)
    }

    /// Market channel on `endpoint`, given as a base URL (e.g. `wss://...polymarket.com`).
    pub fn market_with_endpoint(
        endpoint: &str,
        asset_ids: Vec<String>,
        callbacks: Callbacks,
        config: Config,
    ) -> Result<Self> {
        Self::new(
            endpoint,
            ChannelType::Market,
            asset_ids,
            callbacks,
            None,
            config,
        )
    }

    /// User channel on the production host. `credentials` is asked for a fresh triple before
    /// every dial.
    pub fn user<C>(
        markets: Vec<String>,
        callbacks: Callbacks,
        credentials: C,
        config: Config,
    ) -> Result<Self>
    where
        C: CredentialProvider + 'static,
    {
        Self::user_with_endpoint(DEFAULT_ENDPOINT, markets, callbacks, credentials, config)
    }

    pub fn user_with_endpoint<C>(
        endpoint: &str,
        markets: Vec<String>,
        callbacks: Callbacks,
        credentials: C,
        config: Config,
    ) -> Result<Self>
    where
        C: CredentialProvider + 'static,
    {
        let credentials: Arc<dyn CredentialProvider> = Arc::new(credentials);

        Self::new(
            endpoint,
            ChannelType::User,
            markets,
            callbacks,
            Some(credentials),
            config,
        )
    }

    fn new(
        endpoint: &str,
        channel: ChannelType,
        ids: Vec<String>,
        callbacks: Callbacks,
        credentials: Option<Arc<dyn CredentialProvider>>,
        config: Config,
    ) -> Result<Self> {
        let endpoint = Url::parse(&channel_endpoint(
            &normalize_base_endpoint(endpoint),
            channel,
        ))?;

        let connection = ConnectionManager::new(
            endpoint,
            config,
            ClobChannel { channel },
            Arc::new(callbacks),
            credentials,
            ids,
        );

        Ok(Self {
            channel,
            connection,
        })
    }

    #[must_use]
    pub const fn channel(&self) -> ChannelType {
        self.channel
    }

    /// See [`ConnectionManager::connect`].
    pub async fn connect(&self) -> Result<()> {
        self.connection.connect().await
    }

    pub fn disconnect(&self) {
        self.connection.disconnect();
    }

    /// Adds asset IDs (market channel) or market IDs (user channel) and re-sends the full set
    /// when connected.
    pub fn subscribe<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connection.subscribe(ids);
    }

    /// Forgets IDs locally. Takes effect on the server at the next reconnect.
    pub fn unsubscribe<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.connection.unsubscribe(ids);
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.connection.state_receiver()
    }

    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.connection.reconnect_attempts()
    }

    #[must_use]
    pub fn subscriptions(&self) -> Vec<String> {
        self.connection.subscriptions()
    }

    /// Resolves when the session is idle or has given up reconnecting.
    pub async fn wait(&self) {
        self.connection.wait().await;
    }
}

fn normalize_base_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim_end_matches('/');
    ["/ws/market", "/ws/user", "/ws"]
        .iter()
        .find_map(|suffix| trimmed.strip_suffix(suffix))
        .unwrap_or(trimmed)
        .to_owned()
}

fn channel_endpoint(base: &str, channel: ChannelType) -> String {
    format!("{}/ws/{}", base.trim_end_matches('/'), channel.path())
}

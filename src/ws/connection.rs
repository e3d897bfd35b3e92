#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt as _, StreamExt as _};
use serde_json::value::RawValue;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::config::Config;
use super::error::WsError;
use super::reconnect::ReconnectState;
use super::subscription::SubscriptionSet;
use super::traits::{FrameBuilder, Handler, MessageParser};
use super::transport::{self, WsStream};
use crate::auth::{CredentialProvider, Credentials};
use crate::{Result, error::Error};

/// Heartbeat payloads of the feed protocol.
const PING: &str = "PING";
const PONG: &str = "PONG";

/// How long the writer may spend on the closing handshake before the socket is dropped.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

const CLOSE_NO_STATUS: u16 = 1005;
const CLOSE_ABNORMAL: u16 = 1006;
const CLOSE_NORMAL: u16 = 1000;

const WRITER_STOPPED: &str = "writer task has stopped";

/// Lifecycle logs, only emitted when [`Config::debug`] is set.
macro_rules! lifecycle {
    ($config:expr, $($arg:tt)+) => {
        #[cfg(feature = "tracing")]
        if $config.debug {
            tracing::debug!($($arg)+);
        }
    };
}

/// Where a session is in its lifecycle.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected, and nothing scheduled
    Idle,
    /// Credential derivation, dial or subscribe handshake in progress
    Connecting,
    /// Subscribed and reading
    Connected {
        /// When the connection was established
        since: Instant,
    },
    /// Waiting out the delay before a redial
    ReconnectPending {
        /// The attempt that will be made when the delay elapses
        attempt: u32,
    },
    /// The attempt cap was reached. Only an explicit connect leaves this state.
    Terminated,
}

impl ConnectionState {
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

/// A text frame queued for the writer task. `ack` receives the send outcome; without one, a
/// failure goes to [`Handler::on_error`].
struct Outgoing {
    text: String,
    ack: Option<oneshot::Sender<std::result::Result<(), WsError>>>,
}

/// One live transport session.
struct Connection {
    sender: mpsc::UnboundedSender<Outgoing>,
    /// Stops the reader, writer and heartbeat tasks of this session
    token: CancellationToken,
    generation: u64,
    credentials: Option<Credentials>,
    /// Set once the initial subscribe frame is on the wire
    live: bool,
}

/// A redial claimed under the session lock, waiting for its timer to be armed.
struct Redial {
    attempt: u32,
    delay: Duration,
    timer: CancellationToken,
}

struct Session {
    subscriptions: SubscriptionSet,
    connection: Option<Connection>,
    reconnect: ReconnectState,
    should_reconnect: bool,
    connecting: bool,
    /// Cancelled by `disconnect()`. Every task and timer of the session hangs off it.
    shutdown: CancellationToken,
    reconnect_timer: Option<CancellationToken>,
    generation: u64,
}

struct Inner<M, P> {
    endpoint: Url,
    config: Config,
    parser: P,
    handler: Arc<dyn Handler<M>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    session: RwLock<Session>,
    state_tx: watch::Sender<ConnectionState>,
}

/// Keeps one feed session alive: dial, subscribe, read, heartbeat, and redial on failure.
///
/// Cloning is cheap and every clone drives the same session. All shared state sits behind a
/// single lock that is never held across an `.await`.
///
/// # Type Parameters
///
/// - `M`: the decoded message type handed to the [`Handler`]
/// - `P`: the channel, which decodes raw messages and renders subscribe frames
///
/// # Example
///
/// ```ignore
/// let connection = ConnectionManager::new(endpoint, config, channel, handler, None, assets);
/// connection.connect().await?;
/// connection.subscribe(["another-asset"]);
/// connection.wait().await;
/// ```
pub struct ConnectionManager<M, P> {
    inner: Arc<Inner<M, P>>,
}

impl<M, P> Clone for ConnectionManager<M, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M, P> ConnectionManager<M, P>
where
    M: Send + 'static,
    P: MessageParser<M> + FrameBuilder,
{
    /// Creates an idle session. Nothing is dialed until [`ConnectionManager::connect`].
    #[must_use]
    pub fn new(
        endpoint: Url,
        config: Config,
        parser: P,
        handler: Arc<dyn Handler<M>>,
        credentials: Option<Arc<dyn CredentialProvider>>,
        ids: Vec<String>,
    ) -> Self {
        let session = Session {
            subscriptions: SubscriptionSet::new(ids),
            connection: None,
            reconnect: ReconnectState::new(&config.reconnect),
            should_reconnect: false,
            connecting: false,
            shutdown: CancellationToken::new(),
            reconnect_timer: None,
            generation: 0,
        };
        let (state_tx, _) = watch::channel(ConnectionState::Idle);

        Self {
            inner: Arc::new(Inner {
                endpoint,
                config,
                parser,
                handler,
                credentials,
                session: RwLock::new(session),
                state_tx,
            }),
        }
    }

    /// Connects and sends the full subscription set.
    ///
    /// Returns immediately when a connection is already live or being established. A pending
    /// redial is cancelled and replaced by this attempt. Failures are returned here and never
    /// start the reconnect cycle.
    pub async fn connect(&self) -> Result<()> {
        let shutdown = {
            let mut session = self.inner.write();
            if session.connecting || session.connection.is_some() {
                return Ok(());
            }
            if let Some(timer) = session.reconnect_timer.take() {
                timer.cancel();
            }
            if session.shutdown.is_cancelled() {
                session.shutdown = CancellationToken::new();
            }
            session.reconnect.reset();
            session.should_reconnect = true;
            session.connecting = true;
            self.inner.set_state(ConnectionState::Connecting);
            session.shutdown.clone()
        };

        let result = self.inner.establish(&shutdown).await;
        if result.is_err() {
            let mut session = self.inner.write();
            if !shutdown.is_cancelled() {
                session.connecting = false;
                session.should_reconnect = false;
                self.inner.set_state(ConnectionState::Idle);
            }
        }

        result
    }

    /// Closes the session for good. Safe to call at any time, from anywhere, any number of
    /// times.
    ///
    /// Cancels a pending redial and stops the reader, writer and heartbeat tasks. A live
    /// connection reports `on_disconnect(1000, "client disconnect")`.
    pub fn disconnect(&self) {
        let connection = {
            let mut session = self.inner.write();
            session.should_reconnect = false;
            session.connecting = false;
            session.shutdown.cancel();
            session.reconnect_timer = None;
            self.inner.set_state(ConnectionState::Idle);
            session.connection.take()
        };

        let was_live = connection.as_ref().is_some_and(|c| c.live);
        if let Some(connection) = connection {
            connection.token.cancel();
        }

        if was_live {
            lifecycle!(self.inner.config, endpoint = %self.inner.endpoint, "disconnected by client");
            self.inner
                .handler
                .on_disconnect(CLOSE_NORMAL, "client disconnect");
        }
    }

    /// Adds identifiers. A connected session immediately re-sends the whole set; a failed send
    /// is reported through [`Handler::on_error`].
    pub fn subscribe<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let failure = {
            let mut session = self.inner.write();
            session.subscriptions.extend(ids);

            let session = &*session;
            session.connection.as_ref().and_then(|connection| {
                self.inner
                    .parser
                    .subscribe_frame(
                        session.subscriptions.as_slice(),
                        connection.credentials.as_ref(),
                    )
                    .and_then(|text| {
                        connection
                            .sender
                            .send(Outgoing { text, ack: None })
                            .map_err(|_e| WsError::Send(WRITER_STOPPED.to_owned()).into())
                    })
                    .err()
            })
        };

        if let Some(error) = failure {
            self.inner.handler.on_error(&error);
        }
    }

    /// Removes identifiers locally. The server keeps sending their events until the next
    /// reconnect, because the protocol has no unsubscribe.
    pub fn unsubscribe<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.inner.write().subscriptions.remove(ids);
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner
            .read()
            .connection
            .as_ref()
            .is_some_and(|c| c.live)
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Receiver that observes every state transition.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Redials claimed since the last successful connect.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.read().reconnect.attempts()
    }

    #[must_use]
    pub fn subscriptions(&self) -> Vec<String> {
        self.inner.read().subscriptions.snapshot()
    }

    /// Resolves once the session is [`ConnectionState::Idle`] or
    /// [`ConnectionState::Terminated`].
    pub async fn wait(&self) {
        let mut state_rx = self.inner.state_tx.subscribe();
        _ = state_rx
            .wait_for(|state| {
                matches!(state, ConnectionState::Idle | ConnectionState::Terminated)
            })
            .await;
    }
}

impl<M, P> Inner<M, P>
where
    M: Send + 'static,
    P: MessageParser<M> + FrameBuilder,
{
    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }

    /// Derives credentials, dials, and completes the subscribe handshake. On success the session
    /// is live and its tasks are running.
    async fn establish(self: &Arc<Self>, shutdown: &CancellationToken) -> Result<()> {
        let credentials = if self.parser.requires_credentials() {
            let provider = self.credentials.as_ref().ok_or_else(|| {
                Error::validation("this channel needs a credential provider to connect")
            })?;

            let credentials = tokio::select! {
                biased;
                () = shutdown.cancelled() => return Err(WsError::Disconnected.into()),
                credentials = provider.credentials() => credentials?,
            };
            Some(credentials)
        } else {
            None
        };

        lifecycle!(self.config, endpoint = %self.endpoint, proxy = ?self.config.proxy, "dialing");

        let stream = tokio::select! {
            biased;
            () = shutdown.cancelled() => return Err(WsError::Disconnected.into()),
            stream = transport::dial(&self.endpoint, self.config.proxy.as_ref()) => stream?,
        };

        let (write, read) = stream.split();
        let (sender, outgoing) = mpsc::unbounded_channel();
        let token = shutdown.child_token();

        tokio::spawn(write_loop(
            write,
            outgoing,
            token.clone(),
            Arc::clone(&self.handler),
        ));

        let (ack, acked) = oneshot::channel();
        let generation = {
            let mut session = self.write();
            if shutdown.is_cancelled() {
                token.cancel();
                return Err(WsError::Disconnected.into());
            }

            let text = match self
                .parser
                .subscribe_frame(session.subscriptions.as_slice(), credentials.as_ref())
            {
                Ok(text) => text,
                Err(e) => {
                    token.cancel();
                    return Err(e);
                }
            };
            if sender
                .send(Outgoing {
                    text,
                    ack: Some(ack),
                })
                .is_err()
            {
                token.cancel();
                return Err(WsError::NotConnected.into());
            }

            session.generation = session.generation.wrapping_add(1);
            session.connection = Some(Connection {
                sender: sender.clone(),
                token: token.clone(),
                generation: session.generation,
                credentials,
                live: false,
            });
            session.generation
        };

        let sent = tokio::select! {
            biased;
            () = shutdown.cancelled() => Err(WsError::Disconnected),
            sent = acked => sent.unwrap_or(Err(WsError::NotConnected)),
        };
        if let Err(e) = sent {
            self.drop_connection(generation);
            return Err(e.into());
        }

        {
            let mut session = self.write();
            match session.connection.as_mut() {
                Some(connection) if connection.generation == generation => {
                    connection.live = true;
                }
                _ => {
                    token.cancel();
                    return Err(WsError::Disconnected.into());
                }
            }
            session.connecting = false;
            session.reconnect.reset();
            // Published under the lock so a concurrent `disconnect()` always lands after it
            self.set_state(ConnectionState::Connected {
                since: Instant::now(),
            });
        }

        lifecycle!(self.config, endpoint = %self.endpoint, generation, "connected and subscribed");

        // Only `disconnect()` can retire the session before the read loop runs
        if !self.is_current(generation) {
            return Ok(());
        }
        self.handler.on_connect();

        tokio::spawn(read_loop(
            Arc::clone(self),
            read,
            token.clone(),
            generation,
        ));
        tokio::spawn(heartbeat_loop(Arc::clone(self), sender, token));

        Ok(())
    }

    fn is_current(&self, generation: u64) -> bool {
        self.read()
            .connection
            .as_ref()
            .is_some_and(|c| c.generation == generation)
    }

    fn drop_connection(&self, generation: u64) {
        let mut session = self.write();
        if session
            .connection
            .as_ref()
            .is_some_and(|c| c.generation == generation)
            && let Some(connection) = session.connection.take()
        {
            connection.token.cancel();
        }
    }

    /// Called by the read loop when the transport ends on its own.
    ///
    /// The next state is published before `on_disconnect` runs, so callbacks never observe a
    /// stale `Connected`.
    fn handle_disconnect(self: &Arc<Self>, generation: u64, code: u16, reason: &str) {
        let redial = {
            let mut session = self.write();
            match session.connection.take() {
                Some(connection) if connection.generation == generation => {
                    connection.token.cancel();
                }
                // Already replaced or torn down by `disconnect()`
                other => {
                    session.connection = other;
                    return;
                }
            }

            if session.should_reconnect && self.config.reconnect.auto_reconnect {
                self.claim_redial(&mut session)
            } else {
                self.set_state(ConnectionState::Idle);
                None
            }
        };

        lifecycle!(self.config, code, reason, reconnect = redial.is_some(), "connection lost");
        self.handler.on_disconnect(code, reason);

        if let Some(redial) = redial {
            self.arm(redial);
        }
    }

    /// Claims the next attempt and publishes `ReconnectPending`, or `Terminated` once the cap is
    /// reached. Runs under the session lock; the timer is armed separately by [`Self::arm`].
    fn claim_redial(&self, session: &mut Session) -> Option<Redial> {
        if !session.should_reconnect || session.shutdown.is_cancelled() {
            return None;
        }

        let Some((attempt, delay)) = session.reconnect.next() else {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                endpoint = %self.endpoint,
                max_attempts = self.config.reconnect.max_attempts,
                "reconnect attempts exhausted, giving up"
            );
            self.set_state(ConnectionState::Terminated);
            return None;
        };

        let timer = session.shutdown.child_token();
        if let Some(previous) = session.reconnect_timer.replace(timer.clone()) {
            previous.cancel();
        }
        self.set_state(ConnectionState::ReconnectPending { attempt });

        Some(Redial {
            attempt,
            delay,
            timer,
        })
    }

    /// Reports a claimed attempt and starts its delay.
    fn arm(self: &Arc<Self>, redial: Redial) {
        let Redial {
            attempt,
            delay,
            timer,
        } = redial;

        lifecycle!(self.config, attempt, ?delay, "reconnect scheduled");
        self.handler.on_reconnect(attempt);

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = timer.cancelled() => {}
                () = sleep(delay) => inner.redial(&timer).await,
            }
        });
    }

    async fn redial(self: &Arc<Self>, timer: &CancellationToken) {
        let shutdown = {
            let mut session = self.write();
            // Superseded by an explicit connect() or disconnect()
            if timer.is_cancelled() || session.connecting || session.connection.is_some() {
                return;
            }
            session.reconnect_timer = None;
            session.connecting = true;
            self.set_state(ConnectionState::Connecting);
            session.shutdown.clone()
        };

        if let Err(error) = self.establish(&shutdown).await {
            let redial = {
                let mut session = self.write();
                if shutdown.is_cancelled() {
                    return;
                }
                session.connecting = false;
                self.claim_redial(&mut session)
            };

            self.handler.on_error(&error);
            if let Some(redial) = redial {
                self.arm(redial);
            }
        }
    }

    fn on_text(&self, text: &str) {
        if text == PONG {
            lifecycle!(self.config, "PONG");
            return;
        }

        for raw in split_batch(text) {
            match self.parser.parse(raw) {
                Ok(message) => self.handler.on_message(message),
                Err(error) => self.handler.on_error(&error),
            }
        }
    }
}

/// A JSON array frame carries several messages; anything else is one message.
fn split_batch(text: &str) -> Vec<&str> {
    match serde_json::from_str::<Vec<&RawValue>>(text) {
        Ok(items) => items.into_iter().map(RawValue::get).collect(),
        Err(_) => vec![text],
    }
}

async fn read_loop<M, P>(
    inner: Arc<Inner<M, P>>,
    mut read: SplitStream<WsStream>,
    token: CancellationToken,
    generation: u64,
) where
    M: Send + 'static,
    P: MessageParser<M> + FrameBuilder,
{
    let (code, reason) = loop {
        let frame = tokio::select! {
            biased;
            () = token.cancelled() => return,
            frame = read.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => inner.on_text(text.as_str()),
            Some(Ok(Message::Close(frame))) => {
                break frame.map_or_else(
                    || (CLOSE_NO_STATUS, String::new()),
                    |frame| (u16::from(frame.code), frame.reason.as_str().to_owned()),
                );
            }
            // Pings are answered by tungstenite; binary frames are not part of the protocol
            Some(Ok(_)) => {}
            Some(Err(e)) => break (CLOSE_ABNORMAL, e.to_string()),
            None => break (CLOSE_ABNORMAL, "connection reset without closing handshake".to_owned()),
        }
    };

    inner.handle_disconnect(generation, code, &reason);
}

async fn write_loop<M: 'static>(
    mut write: SplitSink<WsStream, Message>,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    token: CancellationToken,
    handler: Arc<dyn Handler<M>>,
) {
    loop {
        let next = tokio::select! {
            biased;
            () = token.cancelled() => break,
            next = outgoing.recv() => next,
        };
        let Some(Outgoing { text, ack }) = next else {
            break;
        };

        let result = write
            .send(Message::Text(text.into()))
            .await
            .map_err(WsError::Connection);

        match ack {
            Some(ack) => {
                _ = ack.send(result);
            }
            None => {
                if let Err(e) = result {
                    handler.on_error(&e.into());
                }
            }
        }
    }

    _ = timeout(CLOSE_TIMEOUT, write.close()).await;
}

async fn heartbeat_loop<M, P>(
    inner: Arc<Inner<M, P>>,
    sender: mpsc::UnboundedSender<Outgoing>,
    token: CancellationToken,
) where
    M: Send + 'static,
    P: MessageParser<M> + FrameBuilder,
{
    let period = inner.config.heartbeat_interval;
    let mut ticker = interval_at(tokio::time::Instant::now() + period, period);

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let (ack, acked) = oneshot::channel();
        let queued = sender.send(Outgoing {
            text: PING.to_owned(),
            ack: Some(ack),
        });
        if queued.is_err() {
            return;
        }

        let sent = tokio::select! {
            biased;
            () = token.cancelled() => return,
            sent = acked => sent.unwrap_or_else(|_| Err(WsError::Send(WRITER_STOPPED.to_owned()))),
        };

        if let Err(e) = sent {
            inner.handler.on_error(&e.into());
            return;
        }

        lifecycle!(inner.config, "PING");
    }
}

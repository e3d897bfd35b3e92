#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests, and https://github.com/rust-lang/rust-clippy/issues/13981"
)]
#![allow(
    unused,
    reason = "Each test binary only uses a subset of the shared fixtures"
)]

use std::str::FromStr as _;
use std::sync::Once;

use alloy::signers::Signer as _;
use alloy::signers::k256::ecdsa::SigningKey;
use alloy::signers::local::LocalSigner;
use polymarket_feed::POLYGON;
use polymarket_feed::auth::Credentials;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// publicly known private key
pub const PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const PASSPHRASE: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const SECRET: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

/// L1 signature of [`PRIVATE_KEY`] on Polygon at [`TIMESTAMP`] with nonce 0.
pub const SIGNATURE: &str = "0xfdfb5abf512e439ea61c8595c18e527e718bf16010acf57cef51d09e15893098275d3c6f73038f36ec0cd0ce55436fca14dc64b11611f4dce896e354207508cc1b";
pub const TIMESTAMP: &str = "100000";

pub const POLY_ADDRESS: &str = "POLY_ADDRESS";
pub const POLY_API_KEY: &str = "POLY_API_KEY";
pub const POLY_NONCE: &str = "POLY_NONCE";
pub const POLY_PASSPHRASE: &str = "POLY_PASSPHRASE";
pub const POLY_SIGNATURE: &str = "POLY_SIGNATURE";
pub const POLY_TIMESTAMP: &str = "POLY_TIMESTAMP";

pub const API_KEY: Uuid = Uuid::nil();

static TRACING: Once = Once::new();

/// Routes library logs to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[must_use]
pub fn signer() -> LocalSigner<SigningKey> {
    LocalSigner::from_str(PRIVATE_KEY)
        .unwrap()
        .with_chain_id(Some(POLYGON))
}

#[must_use]
pub fn credentials() -> Credentials {
    Credentials::new(API_KEY, SECRET.to_owned(), PASSPHRASE.to_owned())
}

#[cfg(feature = "clob")]
pub mod rest {
    use httpmock::MockServer;
    use polymarket_feed::auth::state::Authenticated;
    use polymarket_feed::clob::{Client, Config};
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;

    pub type TestClient = Client<Authenticated>;

    /// Mocks `GET /auth/derive-api-key` for [`signer`], signed at [`TIMESTAMP`].
    pub fn mock_derive<'server>(server: &'server MockServer) -> httpmock::Mock<'server> {
        let address = signer().address().to_string().to_lowercase();

        server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/auth/derive-api-key")
                .header(POLY_ADDRESS, address)
                .header(POLY_NONCE, "0")
                .header(POLY_SIGNATURE, SIGNATURE)
                .header(POLY_TIMESTAMP, TIMESTAMP);
            then.status(StatusCode::OK).json_body(json!({
                "apiKey": API_KEY.to_string(),
                "passphrase": PASSPHRASE,
                "secret": SECRET
            }));
        })
    }

    pub fn mock_time(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/time");
            then.status(StatusCode::OK)
                .json_body(TIMESTAMP.parse::<i64>().unwrap());
        })
    }

    /// A client on `server` that stamps its headers with the mocked server time.
    pub fn unauthenticated(server: &MockServer) -> anyhow::Result<Client> {
        let config = Config::builder().use_server_time(true).build();
        Ok(Client::new(&server.base_url(), config)?)
    }

    pub async fn create_authenticated(server: &MockServer) -> anyhow::Result<TestClient> {
        let derive = mock_derive(server);
        let time = mock_time(server);

        let client = unauthenticated(server)?
            .authentication_builder(&signer())
            .authenticate()
            .await?;

        derive.assert();
        // Once for the failed create, once for the derive
        time.assert_calls(2);

        Ok(client)
    }
}

#[cfg(feature = "ws")]
pub mod feed {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures_util::{SinkExt as _, StreamExt as _};
    use tokio::net::TcpListener;
    use tokio::sync::{broadcast, mpsc};
    use tokio::task::JoinHandle;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    /// What the mock server does to every open connection.
    #[derive(Clone, Debug)]
    enum Command {
        Send(String),
        Close(u16, String),
        Drop,
    }

    /// In-process WebSocket feed. Records every text frame clients send, counts and answers
    /// `PING` with `PONG`, and can push, close or drop connections on demand.
    pub struct MockFeedServer {
        addr: SocketAddr,
        pings: Arc<AtomicUsize>,
        commands: broadcast::Sender<Command>,
        frames: mpsc::UnboundedReceiver<String>,
        accepted: mpsc::UnboundedReceiver<String>,
        acceptor: JoinHandle<()>,
    }

    impl MockFeedServer {
        pub async fn start() -> Self {
            Self::bind("127.0.0.1:0".parse().unwrap()).await
        }

        /// Starts on a fixed address, e.g. to come back after [`Self::stop`].
        pub async fn bind(addr: SocketAddr) -> Self {
            let listener = TcpListener::bind(addr).await.unwrap();
            let addr = listener.local_addr().unwrap();

            let (commands, _) = broadcast::channel::<Command>(100);
            let (frame_tx, frames) = mpsc::unbounded_channel();
            let (accepted_tx, accepted) = mpsc::unbounded_channel();
            let pings = Arc::new(AtomicUsize::new(0));

            let connection_commands = commands.clone();
            let ping_counter = Arc::clone(&pings);
            let acceptor = tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        break;
                    };

                    let mut path = String::new();
                    let Ok(ws) = tokio_tungstenite::accept_hdr_async(
                        stream,
                        |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                            request.uri().path().clone_into(&mut path);
                            Ok(response)
                        },
                    )
                    .await
                    else {
                        continue;
                    };
                    drop(accepted_tx.send(path));

                    let (mut write, mut read) = ws.split();
                    let frame_tx = frame_tx.clone();
                    let mut commands = connection_commands.subscribe();
                    let ping_counter = Arc::clone(&ping_counter);

                    tokio::spawn(async move {
                        loop {
                            tokio::select! {
                                msg = read.next() => match msg {
                                    Some(Ok(Message::Text(text))) if text.as_str() == "PING" => {
                                        ping_counter.fetch_add(1, Ordering::SeqCst);
                                        if write.send(Message::Text("PONG".into())).await.is_err() {
                                            break;
                                        }
                                    }
                                    Some(Ok(Message::Text(text))) => {
                                        drop(frame_tx.send(text.to_string()));
                                    }
                                    Some(Ok(_)) => {}
                                    _ => break,
                                },
                                command = commands.recv() => match command {
                                    Ok(Command::Send(text)) => {
                                        if write.send(Message::Text(text.into())).await.is_err() {
                                            break;
                                        }
                                    }
                                    Ok(Command::Close(code, reason)) => {
                                        let frame = CloseFrame {
                                            code: CloseCode::from(code),
                                            reason: reason.into(),
                                        };
                                        drop(write.send(Message::Close(Some(frame))).await);
                                        break;
                                    }
                                    Ok(Command::Drop) | Err(_) => break,
                                },
                            }
                        }
                    });
                }
            });

            Self {
                addr,
                pings,
                commands,
                frames,
                accepted,
                acceptor,
            }
        }

        #[must_use]
        pub fn addr(&self) -> SocketAddr {
            self.addr
        }

        /// `PING` frames received so far, over every connection.
        #[must_use]
        pub fn pings(&self) -> usize {
            self.pings.load(Ordering::SeqCst)
        }

        /// Base URL, without a channel path.
        #[must_use]
        pub fn base_url(&self) -> String {
            format!("ws://{}", self.addr)
        }

        /// Sends a text frame to every open connection.
        pub fn send(&self, text: &str) {
            drop(self.commands.send(Command::Send(text.to_owned())));
        }

        /// Ends every open connection with a closing handshake.
        pub fn close_all(&self, code: u16, reason: &str) {
            drop(self.commands.send(Command::Close(code, reason.to_owned())));
        }

        /// Drops every open connection without a closing handshake.
        pub fn drop_all(&self) {
            drop(self.commands.send(Command::Drop));
        }

        /// Stops accepting and drops every open connection. Redials are refused afterwards.
        pub fn stop(&self) {
            self.acceptor.abort();
            self.drop_all();
        }

        /// The next frame a client sent, other than `PING`.
        pub async fn next_frame(&mut self) -> Option<String> {
            timeout(Duration::from_secs(5), self.frames.recv())
                .await
                .ok()
                .flatten()
        }

        /// The next frame, decoded as JSON.
        pub async fn next_json(&mut self) -> serde_json::Value {
            let frame = self.next_frame().await.expect("a frame within 5 seconds");
            serde_json::from_str(&frame).unwrap()
        }

        /// The request path of the next accepted connection.
        pub async fn next_connection(&mut self) -> Option<String> {
            timeout(Duration::from_secs(5), self.accepted.recv())
                .await
                .ok()
                .flatten()
        }
    }

    impl Drop for MockFeedServer {
        fn drop(&mut self) {
            self.acceptor.abort();
        }
    }
}

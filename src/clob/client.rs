use std::mem;
use std::sync::Arc;

use alloy::signers::Signer;
use async_stream::{stream, try_stream};
use async_trait::async_trait;
use bon::Builder;
use chrono::Utc;
use futures::Stream;
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::state::{Authenticated, State, Unauthenticated};
use crate::auth::{CredentialProvider, Credentials};

use crate::clob::types::request::{
    OrderBookRequest, PriceHistoryRequest, PriceRequest, TokenRequest, TradesRequest,
};
use crate::clob::types::response::{
    ApiKeysResponse, BanStatusResponse, FeeRateResponse, LastTradePriceResponse,
    LastTradesPricesResponse, Market, MidpointResponse, MidpointsResponse, NegRiskResponse,
    OrderBook, Page, PriceHistoryResponse, PriceResponse, PricesResponse, TickSizeResponse, Trade,
};
use crate::error::{Error, Kind as ErrorKind};
use crate::types::Address;
use crate::{Result, Timestamp, ToQueryParams as _, auth};

/// The production CLOB REST host.
pub const DEFAULT_HOST: &str = "https://clob.polymarket.com";

const INITIAL_CURSOR: &str = "MA=="; // base64("0")
const TERMINAL_CURSOR: &str = "LTE="; // base64("-1")

/// What [`Client::trades_stream`] does when a page request fails.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaginationPolicy {
    /// Yield the error and end the stream.
    FailFast,
    /// End the stream without an error once at least one page was delivered. A failure on the
    /// first page is still yielded.
    BestEffort,
}

/// Upgrades a [`Client<Unauthenticated>`] to a [`Client<Authenticated>`].
pub struct AuthenticationBuilder<'signer, S: Signer> {
    client: Client<Unauthenticated>,
    /// Signs the L1 attestation and owns the resulting address
    signer: &'signer S,
    /// Skips key issuance entirely when set
    credentials: Option<Credentials>,
    /// Key slot to create or derive. Cannot be combined with `credentials`.
    nonce: Option<u32>,
}

impl<S: Signer> AuthenticationBuilder<'_, S> {
    #[must_use]
    pub fn nonce(mut self, nonce: u32) -> Self {
        self.nonce = Some(nonce);
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Elevates the inner `client` to [`Client<Authenticated>`], creating or deriving
    /// [`Credentials`] unless they were supplied.
    pub async fn authenticate(self) -> Result<Client<Authenticated>> {
        let credentials = match self.credentials {
            Some(_) if self.nonce.is_some() => {
                return Err(Error::validation(
                    "Credentials and nonce are both set. If nonce is set, then you must not supply credentials",
                ));
            }
            Some(credentials) => credentials,
            None => {
                self.client
                    .inner
                    .create_or_derive_api_key(self.signer, self.nonce)
                    .await?
            }
        };

        let inner = &self.client.inner;
        Ok(Client {
            inner: Arc::new(ClientInner {
                state: Authenticated {
                    address: self.signer.address(),
                    credentials,
                },
                config: inner.config.clone(),
                host: inner.host.clone(),
                client: inner.client.clone(),
            }),
        })
    }
}

/// Polymarket CLOB REST client for the read side of the exchange: server health and time,
/// API-key management, markets, books and prices, and the authenticated trade history.
/// Order placement is out of scope.
///
/// A [`Client`] is either [`Unauthenticated`] or [`Authenticated`]; only the methods of the
/// current state are available.
///
/// ```rust,no_run
/// use std::str::FromStr as _;
///
/// use alloy::signers::Signer as _;
/// use alloy::signers::local::LocalSigner;
/// use futures::StreamExt as _;
/// use polymarket_feed::POLYGON;
/// use polymarket_feed::clob::types::request::TradesRequest;
/// use polymarket_feed::clob::{Client, Config, PaginationPolicy};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let signer = LocalSigner::from_str("0x...")?.with_chain_id(Some(POLYGON));
///     let client = Client::new("https://clob.polymarket.com", Config::default())?
///         .authentication_builder(&signer)
///         .authenticate()
///         .await?;
///
///     let request = TradesRequest::default();
///     let mut trades = Box::pin(client.trades_stream(&request, PaginationPolicy::FailFast));
///     while let Some(trade) = trades.next().await {
///         println!("{:?}", trade?);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Client<S: State = Unauthenticated> {
    inner: Arc<ClientInner<S>>,
}

/// Configuration for [`Client`]
#[derive(Clone, Debug, Default, Builder)]
pub struct Config {
    /// Stamp signed headers with `GET /time` instead of the local clock. Costs one extra request
    /// per signed call, but tolerates clock skew.
    #[builder(default)]
    use_server_time: bool,
    /// HTTP proxy for every REST call.
    proxy: Option<Url>,
}

#[derive(Debug)]
struct ClientInner<S: State> {
    config: Config,
    /// The current [`State`] of this client
    state: S,
    /// The [`Url`] against which `client` is making requests.
    host: Url,
    /// The inner [`ReqwestClient`] used to make requests to `host`.
    client: ReqwestClient,
}

impl<S: State> ClientInner<S> {
    async fn server_time(&self) -> Result<Timestamp> {
        let request = self
            .client
            .request(Method::GET, format!("{}time", self.host))
            .build()?;

        crate::request(&self.client, request, None).await
    }

    async fn timestamp(&self) -> Result<Timestamp> {
        if self.config.use_server_time {
            self.server_time().await
        } else {
            Ok(Utc::now().timestamp())
        }
    }
}

impl ClientInner<Unauthenticated> {
    async fn create_api_key<S: Signer>(&self, signer: &S, nonce: Option<u32>) -> Result<Credentials> {
        let request = self
            .client
            .request(Method::POST, format!("{}auth/api-key", self.host))
            .build()?;
        let headers = self.create_headers(signer, nonce).await?;

        crate::request(&self.client, request, Some(headers)).await
    }

    async fn derive_api_key<S: Signer>(&self, signer: &S, nonce: Option<u32>) -> Result<Credentials> {
        let request = self
            .client
            .request(Method::GET, format!("{}auth/derive-api-key", self.host))
            .build()?;
        let headers = self.create_headers(signer, nonce).await?;

        crate::request(&self.client, request, Some(headers)).await
    }

    async fn create_or_derive_api_key<S: Signer>(
        &self,
        signer: &S,
        nonce: Option<u32>,
    ) -> Result<Credentials> {
        match self.create_api_key(signer, nonce).await {
            Ok(creds) => Ok(creds),
            // The server answered (e.g. the key already exists); network and internal errors
            // are not retried through derive.
            Err(err) if err.kind() == ErrorKind::Status => self.derive_api_key(signer, nonce).await,
            Err(err) => Err(err),
        }
    }

    async fn create_headers<S: Signer>(&self, signer: &S, nonce: Option<u32>) -> Result<HeaderMap> {
        let chain_id = signer.chain_id().ok_or(Error::validation(
            "Chain id not set, be sure to provide one on the signer",
        ))?;

        auth::l1::create_headers(signer, chain_id, self.timestamp().await?, nonce).await
    }
}

impl<S: State> Client<S> {
    /// Returns the CLOB API host URL.
    #[must_use]
    pub fn host(&self) -> &Url {
        &self.inner.host
    }

    /// `GET /`. Returns `"OK"` while the server is healthy.
    pub async fn ok(&self) -> Result<String> {
        let request = self
            .client()
            .request(Method::GET, self.host().as_str())
            .build()?;

        crate::request(&self.inner.client, request, None).await
    }

    /// Current server time, in Unix seconds.
    pub async fn server_time(&self) -> Result<Timestamp> {
        self.inner.server_time().await
    }

    /// One market by condition ID.
    pub async fn market(&self, condition_id: &str) -> Result<Market> {
        let request = self
            .client()
            .request(Method::GET, format!("{}markets/{condition_id}", self.host()))
            .build()?;

        crate::request(&self.inner.client, request, None).await
    }

    /// The aggregated book of one token.
    pub async fn order_book(&self, request: &OrderBookRequest) -> Result<OrderBook> {
        self.get("book", request).await
    }

    /// Books for several tokens in one call.
    pub async fn order_books(&self, requests: &[OrderBookRequest]) -> Result<Vec<OrderBook>> {
        self.post("books", requests).await
    }

    /// Minimum price increment of a token's book.
    pub async fn tick_size(&self, token_id: &str) -> Result<TickSizeResponse> {
        self.get("tick-size", &TokenRequest::from(token_id)).await
    }

    /// Whether the token belongs to a negative-risk market.
    pub async fn neg_risk(&self, token_id: &str) -> Result<NegRiskResponse> {
        self.get("neg-risk", &TokenRequest::from(token_id)).await
    }

    /// The base fee charged on the token, in basis points.
    pub async fn fee_rate_bps(&self, token_id: &str) -> Result<FeeRateResponse> {
        self.get("fee-rate", &TokenRequest::from(token_id)).await
    }

    /// Midpoint between the best bid and the best ask.
    pub async fn midpoint(&self, request: &TokenRequest) -> Result<MidpointResponse> {
        self.get("midpoint", request).await
    }

    pub async fn midpoints(&self, requests: &[TokenRequest]) -> Result<MidpointsResponse> {
        self.post("midpoints", requests).await
    }

    /// Best executable price on one side of the book.
    pub async fn price(&self, request: &PriceRequest) -> Result<PriceResponse> {
        self.get("price", request).await
    }

    /// Best prices for several tokens, each on its own side.
    pub async fn prices(&self, requests: &[PriceRequest]) -> Result<PricesResponse> {
        self.post("prices", requests).await
    }

    /// Price and side of the token's most recent trade.
    pub async fn last_trade_price(&self, request: &TokenRequest) -> Result<LastTradePriceResponse> {
        self.get("last-trade-price", request).await
    }

    pub async fn last_trades_prices(
        &self,
        requests: &[TokenRequest],
    ) -> Result<Vec<LastTradesPricesResponse>> {
        self.post("last-trades-prices", requests).await
    }

    /// Historical prices of one token.
    pub async fn price_history(&self, request: &PriceHistoryRequest) -> Result<PriceHistoryResponse> {
        self.get("prices-history", request).await
    }

    /// One page of all CLOB markets. Pass the previous page's `next_cursor` to continue.
    pub async fn markets(&self, next_cursor: Option<String>) -> Result<Page<Market>> {
        let cursor = next_cursor.map_or(String::new(), |c| format!("?next_cursor={c}"));
        let request = self
            .client()
            .request(Method::GET, format!("{}markets{cursor}", self.host()))
            .build()?;

        crate::request(&self.inner.client, request, None).await
    }

    /// Flattens a cursor-paginated endpoint into a lazy stream of items.
    ///
    /// `call` gets the cursor of the page to fetch, `None` for the first one. The stream ends at
    /// the terminal cursor and stops at the first error.
    pub fn stream_data<'client, Call, Fut, Data>(
        &'client self,
        call: Call,
    ) -> impl Stream<Item = Result<Data>> + 'client
    where
        Call: Fn(&'client Client<S>, Option<String>) -> Fut + 'client,
        Fut: Future<Output = Result<Page<Data>>> + 'client,
        Data: 'client,
    {
        try_stream! {
            let mut cursor: Option<String> = None;

            loop {
                let page = call(self, mem::take(&mut cursor)).await?;

                for item in page.data {
                    yield item
                }

                if is_terminal(&page.next_cursor) {
                    break;
                }

                cursor = Some(page.next_cursor);
            }
        }
    }

    fn client(&self) -> &ReqwestClient {
        &self.inner.client
    }

    async fn get<Req, Res>(&self, path: &str, query: &Req) -> Result<Res>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let params = query.query_params(None);
        let request = self
            .client()
            .request(Method::GET, format!("{}{path}{params}", self.host()))
            .build()?;

        crate::request(&self.inner.client, request, None).await
    }

    async fn post<Body, Res>(&self, path: &str, body: &Body) -> Result<Res>
    where
        Body: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let request = self
            .client()
            .request(Method::POST, format!("{}{path}", self.host()))
            .json(body)
            .build()?;

        crate::request(&self.inner.client, request, None).await
    }
}

impl Client<Unauthenticated> {
    /// Creates a new unauthenticated CLOB client for `host` (e.g. <https://clob.polymarket.com>).
    ///
    /// # Errors
    ///
    /// Returns an error if the host or proxy URL is invalid or the HTTP client cannot be
    /// initialized.
    pub fn new(host: &str, config: Config) -> Result<Client<Unauthenticated>> {
        let client = crate::http_client(config.proxy.as_ref())?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                host: Url::parse(host)?,
                config,
                client,
                state: Unauthenticated,
            }),
        })
    }

    /// Starts the upgrade to an authenticated client. Call
    /// [`AuthenticationBuilder::authenticate`] to complete it.
    pub fn authentication_builder<S: Signer>(self, signer: &S) -> AuthenticationBuilder<'_, S> {
        AuthenticationBuilder {
            signer,
            credentials: None,
            nonce: None,
            client: self,
        }
    }

    /// `POST /auth/api-key`. Fails when a key already exists for this address and nonce.
    pub async fn create_api_key<S: Signer>(
        &self,
        signer: &S,
        nonce: Option<u32>,
    ) -> Result<Credentials> {
        self.inner.create_api_key(signer, nonce).await
    }

    /// `GET /auth/derive-api-key`. Fails when no key exists for this address and nonce.
    pub async fn derive_api_key<S: Signer>(
        &self,
        signer: &S,
        nonce: Option<u32>,
    ) -> Result<Credentials> {
        self.inner.derive_api_key(signer, nonce).await
    }

    /// Creates the key for this signer and nonce, or derives it when the server refuses because
    /// it already exists.
    pub async fn create_or_derive_api_key<S: Signer>(
        &self,
        signer: &S,
        nonce: Option<u32>,
    ) -> Result<Credentials> {
        self.inner.create_or_derive_api_key(signer, nonce).await
    }
}

impl Client<Authenticated> {
    #[must_use]
    pub fn state(&self) -> &Authenticated {
        &self.inner.state
    }

    /// The wallet address the credentials belong to.
    #[must_use]
    pub fn address(&self) -> Address {
        self.state().address
    }

    /// The credentials this client signs with, for handing to the user channel.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.state().credentials
    }

    /// Every API key issued to this address.
    pub async fn api_keys(&self) -> Result<ApiKeysResponse> {
        self.signed(Method::GET, "auth/api-keys").await
    }

    /// Revokes the key this client signs with. Signed calls fail afterwards until a new key is
    /// created or derived.
    pub async fn delete_api_key(&self) -> Result<serde_json::Value> {
        self.signed(Method::DELETE, "auth/api-key").await
    }

    /// Whether the account may only close existing positions.
    pub async fn closed_only_mode(&self) -> Result<BanStatusResponse> {
        self.signed(Method::GET, "auth/ban-status/closed-only").await
    }

    /// One page of the user's trade history.
    pub async fn trades(
        &self,
        request: &TradesRequest,
        next_cursor: Option<String>,
    ) -> Result<Page<Trade>> {
        let params = request.query_params(next_cursor.as_deref());
        let request = self
            .client()
            .request(Method::GET, format!("{}data/trades{params}", self.host()))
            .build()?;
        let headers = self.create_headers(&request).await?;

        crate::request(&self.inner.client, request, Some(headers)).await
    }

    /// The full trade history matching `request`, fetched lazily page by page. Dropping the
    /// stream stops the pagination.
    pub fn trades_stream<'client>(
        &'client self,
        request: &'client TradesRequest,
        policy: PaginationPolicy,
    ) -> impl Stream<Item = Result<Trade>> + 'client {
        stream! {
            let mut cursor = INITIAL_CURSOR.to_owned();
            let mut delivered_page = false;

            loop {
                let page = match self.trades(request, Some(mem::take(&mut cursor))).await {
                    Ok(page) => page,
                    Err(error) if policy == PaginationPolicy::BestEffort && delivered_page => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(%error, "stopping trade pagination after failed page");
                        #[cfg(not(feature = "tracing"))]
                        let _: Error = error;
                        break;
                    }
                    Err(error) => {
                        yield Err(error);
                        break;
                    }
                };
                delivered_page = true;

                for trade in page.data {
                    yield Ok(trade);
                }

                if is_terminal(&page.next_cursor) {
                    break;
                }

                cursor = page.next_cursor;
            }
        }
    }

    async fn signed<Res: DeserializeOwned>(&self, method: Method, path: &str) -> Result<Res> {
        let request = self
            .client()
            .request(method, format!("{}{path}", self.host()))
            .build()?;
        let headers = self.create_headers(&request).await?;

        crate::request(&self.inner.client, request, Some(headers)).await
    }

    async fn create_headers(&self, request: &Request) -> Result<HeaderMap> {
        let timestamp = self.inner.timestamp().await?;

        auth::l2::create_headers(self.state(), request, timestamp)
    }
}

/// Derives the user-channel [`Credentials`] from a wallet signer on every call, through
/// `GET /auth/derive-api-key`.
///
/// Handing this to [`crate::clob::ws::Client::user`] makes every dial, including each
/// reconnect, authenticate with freshly derived credentials.
pub struct SignerCredentials<S: Signer> {
    client: Client<Unauthenticated>,
    signer: S,
    nonce: Option<u32>,
}

impl<S: Signer> SignerCredentials<S> {
    #[must_use]
    pub fn new(client: Client<Unauthenticated>, signer: S) -> Self {
        Self {
            client,
            signer,
            nonce: None,
        }
    }

    #[must_use]
    pub fn nonce(mut self, nonce: u32) -> Self {
        self.nonce = Some(nonce);
        self
    }
}

#[async_trait]
impl<S: Signer + Send + Sync> CredentialProvider for SignerCredentials<S> {
    async fn credentials(&self) -> Result<Credentials> {
        self.client.derive_api_key(&self.signer, self.nonce).await
    }
}

fn is_terminal(cursor: &str) -> bool {
    cursor.is_empty() || cursor == TERMINAL_CURSOR
}

use std::future::Future;

use async_stream::try_stream;
use futures::{Stream, TryStreamExt as _};
use reqwest::{Client as ReqwestClient, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
#[cfg(feature = "tracing")]
use tracing::warn;
use url::Url;

use super::types::request::{MarketsRequest, SearchRequest};
use super::types::response::{Market, SearchResults};
use crate::{Result, ToQueryParams as _};

/// The production Gamma host.
pub const DEFAULT_HOST: &str = "https://gamma-api.polymarket.com";

const MAX_LIMIT: i32 = 500;
const ACTIVE_MARKETS_PAGE: i32 = 100;

/// HTTP client for the Polymarket Gamma API.
///
/// ```no_run
/// use polymarket_feed::gamma::{Client, DEFAULT_HOST};
///
/// let client = Client::new(DEFAULT_HOST).unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    host: Url,
    client: ReqwestClient,
}

impl Client {
    /// Creates a new Gamma API client for `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be created.
    pub fn new(host: &str) -> Result<Client> {
        Ok(Self {
            host: Url::parse(host)?,
            client: crate::http_client(None)?,
        })
    }

    /// Returns the base URL of the API.
    #[must_use]
    pub fn host(&self) -> &Url {
        &self.host
    }

    async fn get<Req: Serialize, Res: DeserializeOwned>(&self, path: &str, req: &Req) -> Result<Res> {
        let query = req.query_params(None);
        let request = self
            .client
            .request(Method::GET, format!("{}{path}{query}", self.host))
            .build()?;
        crate::request(&self.client, request, None).await
    }

    /// One page of markets matching `request`.
    pub async fn markets(&self, request: &MarketsRequest) -> Result<Vec<Market>> {
        self.get("markets", request).await
    }

    /// Every active, open market, walking the offset pages until a short page comes back.
    pub async fn list_active_markets(&self) -> Result<Vec<Market>> {
        self.stream_data(
            |client, limit, offset| async move {
                let request = MarketsRequest::builder()
                    .active(true)
                    .closed(false)
                    .limit(limit)
                    .offset(offset)
                    .build();
                client.markets(&request).await
            },
            ACTIVE_MARKETS_PAGE,
        )
        .try_collect()
        .await
    }

    /// Searches markets, events and profiles.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        self.get("public-search", request).await
    }

    /// Returns a stream of results using offset-based pagination.
    ///
    /// `call` receives the client, the page size and the offset, and returns one page. The
    /// stream ends after an empty page or a page shorter than `limit`. `limit` is clamped to the
    /// API maximum of 500.
    pub fn stream_data<'client, Call, Fut, Data>(
        &'client self,
        call: Call,
        limit: i32,
    ) -> impl Stream<Item = Result<Data>> + 'client
    where
        Call: Fn(&'client Client, i32, i32) -> Fut + 'client,
        Fut: Future<Output = Result<Vec<Data>>> + 'client,
        Data: 'client,
    {
        let limit = if limit > MAX_LIMIT {
            #[cfg(feature = "tracing")]
            warn!(
                "Supplied {limit} limit, Gamma only allows for maximum {MAX_LIMIT} responses per call, defaulting to {MAX_LIMIT}"
            );

            MAX_LIMIT
        } else {
            limit
        };

        try_stream! {
            let mut offset = 0;

            loop {
                let data = call(self, limit, offset).await?;

                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::cast_possible_wrap,
                    reason = "A page never holds more than MAX_LIMIT records"
                )]
                let count = data.len() as i32;

                for item in data {
                    yield item;
                }

                if count < limit {
                    break;
                }

                offset += count;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_hosts_are_rejected() {
        Client::new("gamma-api").unwrap_err();
        assert_eq!(
            Client::new(DEFAULT_HOST).unwrap().host().as_str(),
            "https://gamma-api.polymarket.com/"
        );
    }
}

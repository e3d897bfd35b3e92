use reqwest::{Client as ReqwestClient, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::types::request::{
    ActivityRequest, ClosedPositionsRequest, PositionsRequest, TradedRequest, TradesRequest,
    ValueRequest,
};
use super::types::response::{Activity, ClosedPosition, Health, Position, Trade, Traded, Value};
use crate::{Result, ToQueryParams as _};

/// The production Data API host.
pub const DEFAULT_HOST: &str = "https://data-api.polymarket.com";

/// HTTP client for the Polymarket Data API. Every endpoint is public and read-only.
#[derive(Clone, Debug)]
pub struct Client {
    host: Url,
    client: ReqwestClient,
}

impl Client {
    /// Creates a new Data API client for `host`.
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

    /// `GET /`.
    pub async fn health(&self) -> Result<Health> {
        let request = self.client.request(Method::GET, self.host.as_str()).build()?;
        crate::request(&self.client, request, None).await
    }

    pub async fn positions(&self, request: &PositionsRequest) -> Result<Vec<Position>> {
        self.get("positions", request).await
    }

    pub async fn closed_positions(
        &self,
        request: &ClosedPositionsRequest,
    ) -> Result<Vec<ClosedPosition>> {
        self.get("closed-positions", request).await
    }

    pub async fn trades(&self, request: &TradesRequest) -> Result<Vec<Trade>> {
        self.get("trades", request).await
    }

    pub async fn activity(&self, request: &ActivityRequest) -> Result<Vec<Activity>> {
        self.get("activity", request).await
    }

    /// Current value of the user's positions, one entry per requested scope.
    pub async fn value(&self, request: &ValueRequest) -> Result<Vec<Value>> {
        self.get("value", request).await
    }

    pub async fn traded(&self, request: &TradedRequest) -> Result<Traded> {
        self.get("traded", request).await
    }
}

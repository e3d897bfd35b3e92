#![cfg(feature = "clob")]
#![allow(
    clippy::unwrap_used,
    reason = "Do not need additional syntax for setting up tests"
)]

mod common;

use futures_util::{StreamExt as _, TryStreamExt as _};
use httpmock::MockServer;
use polymarket_feed::clob::types::request::{
    OrderBookRequest, PriceHistoryRequest, PriceRequest, TokenRequest, TradesRequest,
};
use polymarket_feed::clob::types::response::{Page, Trade};
use polymarket_feed::clob::types::{Interval, Side, TimeRange, TradeStatus};
use polymarket_feed::clob::{Client, Config, PaginationPolicy};
use polymarket_feed::error::{Kind, Status};
use reqwest::StatusCode;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

use crate::common::rest::create_authenticated;
use crate::common::{API_KEY, PASSPHRASE, POLY_API_KEY, POLY_PASSPHRASE};

fn trade(id: &str) -> Value {
    json!({
        "id": id,
        "taker_order_id": "0x06bc63e3",
        "market": "0xbd31dc8a",
        "asset_id": "111",
        "side": "BUY",
        "size": "40",
        "fee_rate_bps": "0",
        "price": "0.57",
        "status": "MATCHED",
        "match_time": "1672290701",
        "last_update": "1672290701",
        "outcome": "YES",
        "bucket_index": 0,
        "owner": API_KEY.to_string(),
        "maker_address": "0x0000000000000000000000000000000000000001",
        "maker_orders": [],
        "transaction_hash": "0xff354cd7",
        "trader_side": "TAKER"
    })
}

fn trades_page(ids: &[&str], next_cursor: &str) -> Value {
    json!({
        "data": ids.iter().map(|id| trade(id)).collect::<Vec<_>>(),
        "next_cursor": next_cursor,
        "limit": 100,
        "count": ids.len()
    })
}

#[tokio::test]
async fn server_time_should_succeed() -> anyhow::Result<()> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/time");
        then.status(StatusCode::OK).json_body(1_764_612_000);
    });

    let client = Client::new(&server.base_url(), Config::default())?;

    assert_eq!(client.server_time().await?, 1_764_612_000);
    mock.assert();

    Ok(())
}

#[tokio::test]
async fn markets_list_their_asset_ids() -> anyhow::Result<()> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/markets")
            .query_param("next_cursor", "MTAw");
        then.status(StatusCode::OK).json_body(json!({
            "data": [{
                "condition_id": "0xabc",
                "question": "Will it rain?",
                "active": true,
                "closed": false,
                "minimum_tick_size": "0.01",
                "tokens": [
                    { "token_id": "111", "outcome": "Yes", "price": 0.4 },
                    { "token_id": "222", "outcome": "No", "price": 0.6, "winner": false }
                ]
            }],
            "next_cursor": "LTE=",
            "limit": 1,
            "count": 1
        }));
    });

    let client = Client::new(&server.base_url(), Config::default())?;
    let page = client.markets(Some("MTAw".to_owned())).await?;

    mock.assert();
    assert_eq!(page.next_cursor, "LTE=");
    let market = &page.data[0];
    assert_eq!(market.asset_ids(), vec!["111", "222"]);
    assert_eq!(market.minimum_tick_size, Some(dec!(0.01)));
    assert_eq!(market.tokens[0].price, dec!(0.4));

    Ok(())
}

#[tokio::test]
async fn market_pages_are_streamed_until_the_terminal_cursor() -> anyhow::Result<()> {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/markets")
            .query_param_missing("next_cursor");
        then.status(StatusCode::OK).json_body(json!({
            "data": [{ "condition_id": "0x1" }],
            "next_cursor": "MQ=="
        }));
    });
    let second = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/markets")
            .query_param("next_cursor", "MQ==");
        then.status(StatusCode::OK).json_body(json!({
            "data": [{ "condition_id": "0x2" }],
            "next_cursor": "LTE="
        }));
    });

    let client = Client::new(&server.base_url(), Config::default())?;
    let markets: Vec<_> = client
        .stream_data(|client, cursor| client.markets(cursor))
        .try_collect()
        .await?;

    first.assert();
    second.assert();
    let ids: Vec<_> = markets.iter().map(|m| m.condition_id.as_str()).collect();
    assert_eq!(ids, ["0x1", "0x2"]);

    Ok(())
}

#[tokio::test]
async fn trades_are_signed_with_l2_headers() -> anyhow::Result<()> {
    let server = MockServer::start();
    let client = create_authenticated(&server).await?;

    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/data/trades")
            .query_param("market", "0xbd31dc8a")
            .query_param("next_cursor", "MA==")
            .header(POLY_API_KEY, API_KEY.to_string())
            .header(POLY_PASSPHRASE, PASSPHRASE)
            .header_exists("POLY_SIGNATURE");
        then.status(StatusCode::OK)
            .json_body(trades_page(&["t1"], "LTE="));
    });

    let request = TradesRequest::builder().market("0xbd31dc8a").build();
    let page: Page<Trade> = client.trades(&request, Some("MA==".to_owned())).await?;

    mock.assert();
    let trade = &page.data[0];
    assert_eq!(trade.id, "t1");
    assert_eq!(trade.side, Side::Buy);
    assert_eq!(trade.status, TradeStatus::Matched);
    assert_eq!(trade.owner, API_KEY);

    Ok(())
}

#[tokio::test]
async fn trades_stream_walks_every_page() -> anyhow::Result<()> {
    let server = MockServer::start();
    let client = create_authenticated(&server).await?;

    let first = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/data/trades")
            .query_param("next_cursor", "MA==");
        then.status(StatusCode::OK)
            .json_body(trades_page(&["t1", "t2"], "Mg=="));
    });
    let second = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/data/trades")
            .query_param("next_cursor", "Mg==");
        then.status(StatusCode::OK)
            .json_body(trades_page(&["t3"], "LTE="));
    });

    let request = TradesRequest::default();
    let trades: Vec<Trade> = client
        .trades_stream(&request, PaginationPolicy::FailFast)
        .try_collect()
        .await?;

    first.assert();
    second.assert();
    let ids: Vec<_> = trades.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["t1", "t2", "t3"]);

    Ok(())
}

#[tokio::test]
async fn fail_fast_yields_the_page_error() -> anyhow::Result<()> {
    let server = MockServer::start();
    let client = create_authenticated(&server).await?;

    server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/data/trades")
            .query_param("next_cursor", "MA==");
        then.status(StatusCode::OK)
            .json_body(trades_page(&["t1"], "MQ=="));
    });
    let failing = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/data/trades")
            .query_param("next_cursor", "MQ==");
        then.status(StatusCode::INTERNAL_SERVER_ERROR)
            .body("upstream timeout");
    });

    let request = TradesRequest::default();
    let results: Vec<_> = client
        .trades_stream(&request, PaginationPolicy::FailFast)
        .collect()
        .await;

    failing.assert();
    assert_eq!(results.len(), 2, "one trade, then the error");
    assert_eq!(results[0].as_ref().unwrap().id, "t1");
    let error = results[1].as_ref().unwrap_err();
    assert_eq!(error.kind(), Kind::Status);
    assert_eq!(
        error.downcast_ref::<Status>().unwrap().status_code,
        StatusCode::INTERNAL_SERVER_ERROR
    );

    Ok(())
}

#[tokio::test]
async fn best_effort_keeps_delivered_pages() -> anyhow::Result<()> {
    let server = MockServer::start();
    let client = create_authenticated(&server).await?;

    server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/data/trades")
            .query_param("next_cursor", "MA==");
        then.status(StatusCode::OK)
            .json_body(trades_page(&["t1", "t2"], "MQ=="));
    });
    let failing = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/data/trades")
            .query_param("next_cursor", "MQ==");
        then.status(StatusCode::BAD_GATEWAY);
    });

    let request = TradesRequest::default();
    let trades: Vec<Trade> = client
        .trades_stream(&request, PaginationPolicy::BestEffort)
        .try_collect()
        .await?;

    failing.assert();
    let ids: Vec<_> = trades.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["t1", "t2"]);

    Ok(())
}

#[tokio::test]
async fn best_effort_still_fails_on_the_first_page() -> anyhow::Result<()> {
    let server = MockServer::start();
    let client = create_authenticated(&server).await?;

    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/data/trades");
        then.status(StatusCode::UNAUTHORIZED).body("invalid api key");
    });

    let request = TradesRequest::default();
    let results: Vec<_> = client
        .trades_stream(&request, PaginationPolicy::BestEffort)
        .collect()
        .await;

    assert_eq!(results.len(), 1, "nothing was delivered, so the error is kept");
    assert_eq!(results[0].as_ref().unwrap_err().kind(), Kind::Status);

    Ok(())
}

#[tokio::test]
async fn client_errors_carry_the_response_body() -> anyhow::Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/markets");
        then.status(StatusCode::TOO_MANY_REQUESTS).body("slow down");
    });

    let client = Client::new(&server.base_url(), Config::default())?;
    let error = client.markets(None).await.unwrap_err();

    let status = error.downcast_ref::<Status>().unwrap();
    assert_eq!(status.status_code, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(status.path, "/markets");
    assert_eq!(status.message, "slow down");

    Ok(())
}

#[tokio::test]
async fn ok_reports_health() -> anyhow::Result<()> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/");
        then.status(StatusCode::OK).json_body("OK");
    });

    let client = Client::new(&server.base_url(), Config::default())?;

    assert_eq!(client.ok().await?, "OK");
    mock.assert();

    Ok(())
}

#[tokio::test]
async fn market_is_fetched_by_condition_id() -> anyhow::Result<()> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/markets/0xabc");
        then.status(StatusCode::OK).json_body(json!({
            "condition_id": "0xabc",
            "tokens": [{ "token_id": "111", "outcome": "Yes", "price": "0.4" }]
        }));
    });

    let client = Client::new(&server.base_url(), Config::default())?;
    let market = client.market("0xabc").await?;

    mock.assert();
    assert_eq!(market.asset_ids(), vec!["111"]);

    Ok(())
}

fn book(asset_id: &str) -> Value {
    json!({
        "market": "0xabc",
        "asset_id": asset_id,
        "timestamp": "1700000000123",
        "hash": "0xfeed",
        "bids": [{ "price": "0.48", "size": "30" }, { "price": "0.49", "size": "20" }],
        "asks": null,
        "min_order_size": "5",
        "neg_risk": false,
        "tick_size": "0.01",
        "last_trade_price": ""
    })
}

#[tokio::test]
async fn order_book_decodes_levels_and_metadata() -> anyhow::Result<()> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/book")
            .query_param("token_id", "111");
        then.status(StatusCode::OK).json_body(book("111"));
    });

    let client = Client::new(&server.base_url(), Config::default())?;
    let request = OrderBookRequest::builder().token_id("111").build();
    let book = client.order_book(&request).await?;

    mock.assert();
    assert_eq!(book.asset_id, "111");
    assert_eq!(book.timestamp.timestamp_millis(), 1_700_000_000_123);
    assert_eq!(book.bids.len(), 2);
    assert_eq!(book.bids[1].price, dec!(0.49));
    assert!(book.asks.is_empty(), "null levels decode as empty");
    assert_eq!(book.tick_size, dec!(0.01));
    assert_eq!(book.last_trade_price, None);

    Ok(())
}

#[tokio::test]
async fn order_books_post_every_request() -> anyhow::Result<()> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path("/books")
            .json_body(json!([{ "token_id": "111" }, { "token_id": "222", "side": "SELL" }]));
        then.status(StatusCode::OK)
            .json_body(json!([book("111"), book("222")]));
    });

    let client = Client::new(&server.base_url(), Config::default())?;
    let requests = [
        OrderBookRequest::builder().token_id("111").build(),
        OrderBookRequest::builder()
            .token_id("222")
            .side(Side::Sell)
            .build(),
    ];
    let books = client.order_books(&requests).await?;

    mock.assert();
    let assets: Vec<_> = books.iter().map(|b| b.asset_id.as_str()).collect();
    assert_eq!(assets, ["111", "222"]);

    Ok(())
}

#[tokio::test]
async fn market_parameters_are_queried_per_token() -> anyhow::Result<()> {
    let server = MockServer::start();
    let tick = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/tick-size")
            .query_param("token_id", "111");
        then.status(StatusCode::OK)
            .json_body(json!({ "minimum_tick_size": 0.001 }));
    });
    let neg_risk = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/neg-risk")
            .query_param("token_id", "111");
        then.status(StatusCode::OK).json_body(json!({ "neg_risk": true }));
    });
    let fee = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/fee-rate")
            .query_param("token_id", "111");
        then.status(StatusCode::OK).json_body(json!({ "base_fee": 20 }));
    });

    let client = Client::new(&server.base_url(), Config::default())?;

    assert_eq!(client.tick_size("111").await?.minimum_tick_size, dec!(0.001));
    assert!(client.neg_risk("111").await?.neg_risk);
    assert_eq!(client.fee_rate_bps("111").await?.base_fee, 20);
    tick.assert();
    neg_risk.assert();
    fee.assert();

    Ok(())
}

#[tokio::test]
async fn midpoints_single_and_batched() -> anyhow::Result<()> {
    let server = MockServer::start();
    let single = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/midpoint")
            .query_param("token_id", "111");
        then.status(StatusCode::OK).json_body(json!({ "mid": "0.455" }));
    });
    let batch = server.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path("/midpoints")
            .json_body(json!([{ "token_id": "111" }, { "token_id": "222" }]));
        then.status(StatusCode::OK)
            .json_body(json!({ "111": "0.455", "222": "0.545" }));
    });

    let client = Client::new(&server.base_url(), Config::default())?;

    let mid = client.midpoint(&TokenRequest::from("111")).await?;
    let mids = client
        .midpoints(&[TokenRequest::from("111"), TokenRequest::from("222")])
        .await?;

    single.assert();
    batch.assert();
    assert_eq!(mid.mid, dec!(0.455));
    assert_eq!(mids.midpoints["222"], dec!(0.545));

    Ok(())
}

#[tokio::test]
async fn prices_are_keyed_by_token_and_side() -> anyhow::Result<()> {
    let server = MockServer::start();
    let single = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/price")
            .query_param("token_id", "111")
            .query_param("side", "BUY");
        then.status(StatusCode::OK).json_body(json!({ "price": "0.45" }));
    });
    let batch = server.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path("/prices")
            .json_body(json!([
                { "token_id": "111", "side": "BUY" },
                { "token_id": "222", "side": "SELL" }
            ]));
        then.status(StatusCode::OK).json_body(json!({
            "111": { "BUY": "0.45" },
            "222": { "SELL": "0.56" }
        }));
    });

    let client = Client::new(&server.base_url(), Config::default())?;
    let buy = PriceRequest::builder().token_id("111").side(Side::Buy).build();
    let sell = PriceRequest::builder().token_id("222").side(Side::Sell).build();

    let price = client.price(&buy).await?;
    let prices = client.prices(&[buy, sell]).await?;

    single.assert();
    batch.assert();
    assert_eq!(price.price, dec!(0.45));
    assert_eq!(prices.get("222", Side::Sell), Some(dec!(0.56)));
    assert_eq!(prices.get("222", Side::Buy), None);

    Ok(())
}

#[tokio::test]
async fn last_trade_prices_single_and_batched() -> anyhow::Result<()> {
    let server = MockServer::start();
    let single = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/last-trade-price")
            .query_param("token_id", "111");
        then.status(StatusCode::OK)
            .json_body(json!({ "price": "0.51", "side": "SELL" }));
    });
    let batch = server.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path("/last-trades-prices")
            .json_body(json!([{ "token_id": "111" }]));
        then.status(StatusCode::OK)
            .json_body(json!([{ "token_id": "111", "price": "0.51", "side": "SELL" }]));
    });

    let client = Client::new(&server.base_url(), Config::default())?;

    let last = client.last_trade_price(&TokenRequest::from("111")).await?;
    let batched = client.last_trades_prices(&[TokenRequest::from("111")]).await?;

    single.assert();
    batch.assert();
    assert_eq!(last.side, Side::Sell);
    assert_eq!(batched[0].token_id, "111");
    assert_eq!(batched[0].price, dec!(0.51));

    Ok(())
}

#[tokio::test]
async fn price_history_sends_the_window() -> anyhow::Result<()> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/prices-history")
            .query_param("market", "111")
            .query_param("interval", "1w")
            .query_param("fidelity", "60");
        then.status(StatusCode::OK).json_body(json!({
            "history": [{ "t": 1_700_000_000, "p": 0.41 }, { "t": 1_700_003_600, "p": 0.43 }]
        }));
    });

    let client = Client::new(&server.base_url(), Config::default())?;
    let request = PriceHistoryRequest::builder()
        .market("111")
        .time_range(TimeRange::from_interval(Interval::OneWeek))
        .fidelity(60)
        .build();
    let history = client.price_history(&request).await?;

    mock.assert();
    assert_eq!(history.history.len(), 2);
    assert_eq!(history.history[1].t, 1_700_003_600);
    assert_eq!(history.history[1].p, dec!(0.43));

    Ok(())
}

#[tokio::test]
async fn key_management_is_signed() -> anyhow::Result<()> {
    let server = MockServer::start();
    let client = create_authenticated(&server).await?;

    let list = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/auth/api-keys")
            .header(POLY_API_KEY, API_KEY.to_string())
            .header_exists("POLY_SIGNATURE");
        then.status(StatusCode::OK)
            .json_body(json!({ "apiKeys": [API_KEY.to_string()] }));
    });
    let ban = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/auth/ban-status/closed-only")
            .header(POLY_API_KEY, API_KEY.to_string());
        then.status(StatusCode::OK).json_body(json!({ "closed_only": false }));
    });
    let delete = server.mock(|when, then| {
        when.method(httpmock::Method::DELETE)
            .path("/auth/api-key")
            .header(POLY_PASSPHRASE, PASSPHRASE)
            .header_exists("POLY_SIGNATURE");
        then.status(StatusCode::OK).json_body("OK");
    });

    assert_eq!(client.api_keys().await?.keys, vec![API_KEY]);
    assert!(!client.closed_only_mode().await?.closed_only);
    assert_eq!(client.delete_api_key().await?, json!("OK"));
    list.assert();
    ban.assert();
    delete.assert();

    Ok(())
}

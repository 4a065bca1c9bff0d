#![cfg(feature = "integration")]
/// Integration tests against the Gemini sandbox.
///
/// These tests require network access. Private tests also need
/// GEMINI_API_KEY and GEMINI_API_SECRET for a sandbox account and are
/// skipped without them.
/// Run with: cargo test --features integration --test integration_tests -- --test-threads=1
use futures_util::StreamExt;
use rust_decimal::Decimal;
use serial_test::serial;
use std::time::Duration;

use gemini_sdk::*;

fn sandbox_credentials() -> Option<Credentials> {
    let key = std::env::var("GEMINI_API_KEY").ok()?;
    let secret = std::env::var("GEMINI_API_SECRET").ok()?;
    Some(Credentials::new(key, secret))
}

#[tokio::test]
#[serial]
async fn test_symbols_include_btcusd() {
    let client = GeminiClient::new(Network::Sandbox);
    let symbols = client.api.symbols().await.unwrap();
    assert!(symbols.iter().any(|s| s == "btcusd"));
}

#[tokio::test]
#[serial]
async fn test_book_snapshot_is_ordered() {
    let client = GeminiClient::new(Network::Sandbox);
    let book = client.fetch_order_book("btcusd", Some(20)).await.unwrap();
    if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
        assert!(bid.price < ask.price);
    }
}

#[tokio::test]
#[serial]
async fn test_unknown_symbol_is_api_error() {
    let client = GeminiClient::new(Network::Sandbox);
    let err = client.api.ticker("notasymbol").await.unwrap_err();
    assert!(err.is_api_error());
}

#[tokio::test]
#[serial]
async fn test_market_data_stream_delivers_initial_book() {
    let client = GeminiClient::new(Network::Sandbox);
    let (mut ws, mut stream) = client
        .stream_market_data("btcusd", &MarketDataOptions::default())
        .await
        .unwrap();

    let mut book = OrderBook::new();
    let first = tokio::time::timeout(Duration::from_secs(15), async {
        loop {
            match stream.next().await {
                Some(update) if !update.is_heartbeat() => return Some(update),
                Some(_) => continue,
                None => return None,
            }
        }
    })
    .await
    .unwrap()
    .unwrap();
    book.apply_market_data(&first);
    assert!(!book.is_empty());

    ws.disconnect().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_private_order_round_trip() {
    let Some(credentials) = sandbox_credentials() else {
        return;
    };
    let client = GeminiClient::with_credentials(Network::Sandbox, credentials);

    let placed = client
        .place_limit_order(
            "btcusd",
            Side::Buy,
            Decimal::new(1, 4),
            Decimal::new(1, 0),
            &[OrderOption::MakerOrCancel],
        )
        .await
        .unwrap();

    let status = client.api.order_status(&placed.order_id).await.unwrap();
    assert_eq!(status.order_id, placed.order_id);

    let open = client.open_orders(Some("btcusd")).await.unwrap();
    assert!(open.iter().all(|o| o.symbol == "btcusd"));

    let result = client.api.cancel_session().await.unwrap();
    assert_eq!(result.result.as_deref(), Some("ok"));
}

#[tokio::test]
#[serial]
async fn test_private_balances_and_heartbeat() {
    let Some(credentials) = sandbox_credentials() else {
        return;
    };
    let client = GeminiClient::with_credentials(Network::Sandbox, credentials);
    let balances = client.get_balances().await.unwrap();
    assert!(balances.values().all(|b| b.available <= b.amount));

    let heartbeat = client.api.heartbeat().await.unwrap();
    assert!(!heartbeat.is_error());
}

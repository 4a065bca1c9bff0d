/// Tests for the WebSocket streams using an in-process mock server.
///
/// The mock records each handshake (path and headers), sends a scripted list
/// of frames, then either keeps the connection open or closes it.
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message as WsMsg;

use gemini_sdk::crypto::hmac_sha384_hex;
use gemini_sdk::*;

#[derive(Debug, Clone)]
struct Handshake {
    uri: String,
    headers: Vec<(String, String)>,
}

impl Handshake {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// One scripted connection: frames to send, then whether to hang up.
struct Script {
    frames: Vec<String>,
    close_after: bool,
}

impl Script {
    fn keep_open(frames: Vec<serde_json::Value>) -> Self {
        Self {
            frames: frames.iter().map(|f| f.to_string()).collect(),
            close_after: false,
        }
    }

    fn then_close(frames: Vec<serde_json::Value>) -> Self {
        Self {
            frames: frames.iter().map(|f| f.to_string()).collect(),
            close_after: true,
        }
    }

    fn raw(frames: Vec<&str>) -> Self {
        Self {
            frames: frames.into_iter().map(String::from).collect(),
            close_after: false,
        }
    }
}

/// Serve one connection per script, in order. The listener is dropped after
/// the last script, so further connects are refused.
async fn mock_ws(scripts: Vec<Script>) -> (String, mpsc::UnboundedReceiver<Handshake>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (hs_tx, hs_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for script in scripts {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let hs_tx = hs_tx.clone();
            let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                let headers = req
                    .headers()
                    .iter()
                    .map(|(n, v)| (n.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
                    .collect();
                let _ = hs_tx.send(Handshake {
                    uri: req.uri().to_string(),
                    headers,
                });
                Ok(resp)
            };
            let Ok(ws_stream) = accept_hdr_async(stream, callback).await else {
                continue;
            };
            let (mut sender, mut receiver) = ws_stream.split();

            for frame in script.frames {
                let _ = sender.send(WsMsg::Text(frame)).await;
            }

            if script.close_after {
                let _ = sender.send(WsMsg::Close(None)).await;
                continue;
            }

            tokio::spawn(async move {
                while let Some(Ok(msg)) = receiver.next().await {
                    match msg {
                        WsMsg::Ping(data) => {
                            let _ = sender.send(WsMsg::Pong(data)).await;
                        }
                        WsMsg::Close(_) => break,
                        _ => {}
                    }
                }
            });
        }
    });

    (format!("ws://{addr}"), hs_rx)
}

fn fast_reconnect() -> WsConfig {
    WsConfig {
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        max_attempts: 3,
        ..WsConfig::default()
    }
}

async fn next_within<S: futures_util::Stream + Unpin>(stream: &mut S) -> Option<S::Item> {
    tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("timed out waiting for stream item")
}

fn decode_payload(handshake: &Handshake) -> serde_json::Value {
    let payload = handshake.header("x-gemini-payload").unwrap();
    serde_json::from_slice(&STANDARD.decode(payload).unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_market_data_feeds_local_book() {
    let (base, mut handshakes) = mock_ws(vec![Script::keep_open(vec![
        json!({
            "type": "update",
            "eventId": 5375461993u64,
            "socket_sequence": 0,
            "events": [
                {"type": "change", "reason": "initial", "price": "100", "delta": "2", "remaining": "2", "side": "bid"},
                {"type": "change", "reason": "initial", "price": "105", "delta": "1", "remaining": "1", "side": "ask"}
            ]
        }),
        json!({"type": "heartbeat", "socket_sequence": 1}),
        json!({
            "type": "update",
            "eventId": "5375461994",
            "socket_sequence": 2,
            "events": [
                {"type": "change", "reason": "cancel", "price": "100", "delta": "-2", "remaining": "0", "side": "bid"},
                {"type": "change", "reason": "place", "price": "101", "delta": "3", "remaining": "3", "side": "bid"}
            ]
        }),
    ])])
    .await;

    let (_ws, mut stream) = GeminiWebSocket::market_data(
        &base,
        "btcusd",
        &MarketDataOptions::default(),
        WsConfig::default(),
    )
    .await
    .unwrap();

    let handshake = handshakes.recv().await.unwrap();
    assert!(handshake.uri.starts_with("/v1/marketdata/btcusd?"));
    assert!(handshake.uri.contains("heartbeat=true"));
    assert!(handshake.header("x-gemini-apikey").is_none());

    let mut book = OrderBook::new();
    let first = next_within(&mut stream).await.unwrap();
    assert_eq!(book.apply_market_data(&first), 2);
    assert_eq!(book.best_bid().unwrap().price.to_string(), "100");
    assert_eq!(book.best_ask().unwrap().price.to_string(), "105");

    let second = next_within(&mut stream).await.unwrap();
    assert!(second.is_heartbeat());

    let third = next_within(&mut stream).await.unwrap();
    assert_eq!(third.socket_sequence, Some(2));
    book.apply_market_data(&third);
    assert_eq!(book.bids.len(), 1);
    assert_eq!(book.best_bid().unwrap().price.to_string(), "101");
}

#[tokio::test]
async fn test_undecodable_frames_are_skipped() {
    let (base, _handshakes) = mock_ws(vec![Script::raw(vec![
        "not json",
        r#"{"no_type_field": true}"#,
        r#"{"type":"heartbeat","socket_sequence":7}"#,
    ])])
    .await;

    let (_ws, mut stream) = GeminiWebSocket::market_data(
        &base,
        "ethusd",
        &MarketDataOptions::default(),
        WsConfig::default(),
    )
    .await
    .unwrap();

    let item = next_within(&mut stream).await.unwrap();
    assert!(item.is_heartbeat());
    assert_eq!(item.socket_sequence, Some(7));
}

#[tokio::test]
async fn test_connect_failure_is_websocket_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = GeminiWebSocket::market_data(
        &format!("ws://{addr}"),
        "btcusd",
        &MarketDataOptions::default(),
        WsConfig::default(),
    )
    .await;
    assert!(matches!(result, Err(GeminiError::WebSocketError(_))));
}

#[tokio::test]
async fn test_stream_ends_after_reconnect_attempts_exhausted() {
    let (base, _handshakes) = mock_ws(vec![Script::then_close(vec![json!({
        "type": "heartbeat",
        "socket_sequence": 0
    })])])
    .await;

    let (ws, mut stream) = GeminiWebSocket::market_data(
        &base,
        "btcusd",
        &MarketDataOptions::default(),
        fast_reconnect(),
    )
    .await
    .unwrap();

    assert!(next_within(&mut stream).await.is_some());
    assert!(next_within(&mut stream).await.is_none());
    assert!(!ws.is_connected());
}

// ---------------------------------------------------------------------------
// Order events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_order_events_handshake_is_signed() {
    let (base, mut handshakes) = mock_ws(vec![Script::keep_open(vec![
        json!({
            "type": "subscription_ack",
            "accountId": 5365,
            "subscriptionId": "ws-order-events-5365-b8bk32clqeb13g9tk8p0",
            "symbolFilter": ["btcusd"],
            "apiSessionFilter": [],
            "eventTypeFilter": []
        }),
        json!([{
            "type": "accepted",
            "order_id": "109535951",
            "event_id": "109535952",
            "api_session": "UI",
            "symbol": "btcusd",
            "side": "buy",
            "order_type": "exchange limit",
            "timestamp": "1547742904",
            "timestampms": 1547742904989u64,
            "is_live": true,
            "is_cancelled": false,
            "is_hidden": false,
            "original_amount": "1",
            "price": "3592.00",
            "socket_sequence": 1
        }]),
        json!({
            "type": "heartbeat",
            "timestampms": 1547742998508u64,
            "sequence": 31,
            "trace_id": "b8biknoqppr32kc7gfgg",
            "socket_sequence": 2
        }),
    ])])
    .await;

    let api = GeminiApi::with_credentials(
        NetworkConfig::custom("http://127.0.0.1:1", &base),
        Credentials::new("account-key", "secret"),
    );
    let options = OrderEventsOptions {
        symbol_filter: vec!["btcusd".into()],
        ..OrderEventsOptions::default()
    };
    let (_ws, mut stream) = GeminiWebSocket::order_events(&api, &options, WsConfig::default())
        .await
        .unwrap();

    let handshake = handshakes.recv().await.unwrap();
    assert_eq!(handshake.uri, "/v1/order/events?symbolFilter=btcusd");
    assert_eq!(handshake.header("x-gemini-apikey"), Some("account-key"));
    let payload = handshake.header("x-gemini-payload").unwrap();
    assert_eq!(
        handshake.header("x-gemini-signature").unwrap(),
        hmac_sha384_hex(b"secret", payload.as_bytes()).unwrap()
    );
    assert_eq!(decode_payload(&handshake)["request"], "/v1/order/events");

    let ack = next_within(&mut stream).await.unwrap();
    assert_eq!(ack.event_type, "subscription_ack");
    assert_eq!(ack.account_id, Some(Id::from(5365u64)));
    assert_eq!(ack.symbol_filter, vec!["btcusd"]);

    // Batched events are delivered one by one
    let accepted = next_within(&mut stream).await.unwrap();
    assert_eq!(accepted.event_type, "accepted");
    assert_eq!(accepted.order_id, Some(Id::from("109535951")));
    assert_eq!(accepted.side, Some(Side::Buy));

    let heartbeat = next_within(&mut stream).await.unwrap();
    assert!(heartbeat.is_heartbeat());
    assert_eq!(heartbeat.sequence, Some(31));
}

#[tokio::test]
async fn test_order_events_reconnect_uses_fresh_nonce() {
    let (base, mut handshakes) = mock_ws(vec![
        Script::then_close(vec![json!({"type": "heartbeat", "sequence": 0})]),
        Script::keep_open(vec![json!({"type": "heartbeat", "sequence": 1})]),
    ])
    .await;

    let api = GeminiApi::with_credentials(
        NetworkConfig::custom("http://127.0.0.1:1", &base),
        Credentials::new("account-key", "secret"),
    );
    let (_ws, mut stream) =
        GeminiWebSocket::order_events(&api, &OrderEventsOptions::default(), fast_reconnect())
            .await
            .unwrap();

    let first = next_within(&mut stream).await.unwrap();
    assert_eq!(first.sequence, Some(0));
    let second = next_within(&mut stream).await.unwrap();
    assert_eq!(second.sequence, Some(1));

    let first_hs = handshakes.recv().await.unwrap();
    let second_hs = handshakes.recv().await.unwrap();
    let first_nonce = decode_payload(&first_hs)["nonce"].as_u64().unwrap();
    let second_nonce = decode_payload(&second_hs)["nonce"].as_u64().unwrap();
    assert!(second_nonce > first_nonce);
    assert_ne!(
        first_hs.header("x-gemini-signature"),
        second_hs.header("x-gemini-signature")
    );
}

#[tokio::test]
async fn test_order_events_require_credentials() {
    let api = GeminiApi::new(NetworkConfig::custom("http://127.0.0.1:1", "ws://127.0.0.1:1"));
    let result =
        GeminiWebSocket::order_events(&api, &OrderEventsOptions::default(), WsConfig::default())
            .await;
    assert!(matches!(result, Err(GeminiError::MissingCredentials)));
}

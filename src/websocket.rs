/// WebSocket client for Gemini real-time data.
///
/// Features:
/// - One connection per stream (market data per symbol, or private order events)
/// - Auto-reconnect with exponential backoff; order-event handshakes are re-signed
///   with a fresh nonce on every attempt
/// - Heartbeat ping/pong with configurable intervals
/// - Graceful shutdown signaling
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_stream::Stream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message as WsMsg;
use url::Url;

use crate::api::GeminiApi;
use crate::config::WsConfig;
use crate::crypto::sign;
use crate::encoding::RequestParams;
use crate::errors::GeminiError;
use crate::models::{MarketData, OrderEvent};
use crate::routes::Route;

type WsSink = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    WsMsg,
>;

type WsStream = futures_util::stream::SplitStream<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
>;

/// Builds the handshake request for each (re)connect attempt.
type RequestFactory = Arc<dyn Fn() -> Result<Request, GeminiError> + Send + Sync>;

/// A typed stream of WebSocket messages. Ends when the connection is given up.
pub struct TypedStream<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Stream for TypedStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Query options for the public market data stream.
#[derive(Debug, Clone)]
pub struct MarketDataOptions {
    pub heartbeat: bool,
    pub top_of_book: bool,
    pub bids: bool,
    pub offers: bool,
    pub trades: bool,
    pub auctions: bool,
}

impl Default for MarketDataOptions {
    fn default() -> Self {
        Self {
            heartbeat: true,
            top_of_book: false,
            bids: true,
            offers: true,
            trades: true,
            auctions: true,
        }
    }
}

/// Filters for the private order events stream. Empty means no filter.
#[derive(Debug, Clone, Default)]
pub struct OrderEventsOptions {
    pub symbol_filter: Vec<String>,
    pub api_session_filter: Vec<String>,
    pub event_type_filter: Vec<String>,
}

/// URL of the market data stream for `symbol`.
pub fn market_data_url(
    ws_base: &str,
    symbol: &str,
    options: &MarketDataOptions,
) -> Result<Url, GeminiError> {
    let mut url = Url::parse(&format!(
        "{}{}",
        ws_base,
        Route::MarketData(symbol.to_string()).path()
    ))?;
    url.query_pairs_mut()
        .append_pair("heartbeat", &options.heartbeat.to_string())
        .append_pair("top_of_book", &options.top_of_book.to_string())
        .append_pair("bids", &options.bids.to_string())
        .append_pair("offers", &options.offers.to_string())
        .append_pair("trades", &options.trades.to_string())
        .append_pair("auctions", &options.auctions.to_string());
    Ok(url)
}

/// URL of the order events stream with repeated filter parameters.
pub fn order_events_url(ws_base: &str, options: &OrderEventsOptions) -> Result<Url, GeminiError> {
    let mut url = Url::parse(&format!("{}{}", ws_base, Route::OrderEvents.path()))?;
    {
        let mut pairs = url.query_pairs_mut();
        for symbol in &options.symbol_filter {
            pairs.append_pair("symbolFilter", symbol);
        }
        for session in &options.api_session_filter {
            pairs.append_pair("apiSessionFilter", session);
        }
        for event_type in &options.event_type_filter {
            pairs.append_pair("eventTypeFilter", event_type);
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url)
}

/// Handshake request carrying the three signing headers.
pub fn signed_handshake(api: &GeminiApi, url: &Url) -> Result<Request, GeminiError> {
    let credentials = api.credentials().ok_or(GeminiError::MissingCredentials)?;
    let params = api.stamp(&Route::OrderEvents, RequestParams::new())?;
    let signed = sign(&params, credentials)?;

    let mut request = url.as_str().into_client_request()?;
    for (name, value) in signed.headers() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| GeminiError::WebSocketError(format!("Invalid header name: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| GeminiError::WebSocketError(format!("Invalid header value: {e}")))?;
        request.headers_mut().insert(name, value);
    }
    Ok(request)
}

/// Decode one text frame. Order events may arrive batched in a JSON array.
fn decode_frame<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, serde_json::Error> {
    if text.trim_start().starts_with('[') {
        serde_json::from_str(text)
    } else {
        serde_json::from_str(text).map(|item| vec![item])
    }
}

/// Connection state shared by the handle, the reader task and the ping task.
struct Shared {
    sink: Mutex<Option<WsSink>>,
    connected: AtomicBool,
    should_run: AtomicBool,
    last_pong: Mutex<Instant>,
}

impl Shared {
    fn new() -> Self {
        Self {
            sink: Mutex::new(None),
            connected: AtomicBool::new(false),
            should_run: AtomicBool::new(true),
            last_pong: Mutex::new(Instant::now()),
        }
    }
}

/// A live WebSocket connection feeding one [`TypedStream`].
///
/// Dropping the handle stops the background tasks and ends the stream.
pub struct GeminiWebSocket {
    shared: Arc<Shared>,
    reader_handle: Option<tokio::task::JoinHandle<()>>,
    ping_handle: Option<tokio::task::JoinHandle<()>>,
}

impl GeminiWebSocket {
    /// Connect to the public market data stream of one symbol.
    pub async fn market_data(
        ws_base: &str,
        symbol: &str,
        options: &MarketDataOptions,
        config: WsConfig,
    ) -> Result<(Self, TypedStream<MarketData>), GeminiError> {
        let url = market_data_url(ws_base, symbol, options)?;
        debug!("ws.market_data url={}", url);
        let factory: RequestFactory = Arc::new(move || -> Result<Request, GeminiError> {
            Ok(url.as_str().into_client_request()?)
        });
        Self::connect_typed(factory, config).await
    }

    /// Connect to the private order events stream.
    pub async fn order_events(
        api: &GeminiApi,
        options: &OrderEventsOptions,
        config: WsConfig,
    ) -> Result<(Self, TypedStream<OrderEvent>), GeminiError> {
        if api.credentials().is_none() {
            return Err(GeminiError::MissingCredentials);
        }
        let url = order_events_url(&api.config().ws_base, options)?;
        debug!("ws.order_events url={}", url);
        let api = api.clone();
        let factory: RequestFactory = Arc::new(move || signed_handshake(&api, &url));
        Self::connect_typed(factory, config).await
    }

    async fn connect_typed<T>(
        factory: RequestFactory,
        config: WsConfig,
    ) -> Result<(Self, TypedStream<T>), GeminiError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let shared = Arc::new(Shared::new());
        let stream = Self::open(&factory, &shared).await?;
        let (tx, rx) = mpsc::unbounded_channel();

        let reader_handle = tokio::spawn(Self::run(
            stream,
            factory,
            config.clone(),
            shared.clone(),
            tx,
        ));
        let ping_handle = tokio::spawn(Self::ping_loop(
            shared.clone(),
            config.ping_interval,
            config.pong_timeout,
        ));

        Ok((
            Self {
                shared,
                reader_handle: Some(reader_handle),
                ping_handle: Some(ping_handle),
            },
            TypedStream { rx },
        ))
    }

    async fn open(factory: &RequestFactory, shared: &Shared) -> Result<WsStream, GeminiError> {
        let request = factory()?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;
        let (sink, stream) = ws_stream.split();

        *shared.sink.lock().await = Some(sink);
        shared.connected.store(true, Ordering::SeqCst);
        *shared.last_pong.lock().await = Instant::now();
        Ok(stream)
    }

    async fn run<T>(
        stream: WsStream,
        factory: RequestFactory,
        config: WsConfig,
        shared: Arc<Shared>,
        tx: mpsc::UnboundedSender<T>,
    ) where
        T: DeserializeOwned + Send + 'static,
    {
        let mut stream = stream;
        loop {
            Self::read_loop(stream, &shared, &tx).await;
            shared.connected.store(false, Ordering::SeqCst);

            if !shared.should_run.load(Ordering::SeqCst) || tx.is_closed() {
                break;
            }
            match Self::reconnect_loop(&factory, &config, &shared).await {
                Some(next) => stream = next,
                None => break,
            }
        }
        debug!("ws.run stopped");
        // Dropping tx here ends the TypedStream
    }

    async fn read_loop<T>(mut stream: WsStream, shared: &Shared, tx: &mpsc::UnboundedSender<T>)
    where
        T: DeserializeOwned,
    {
        while shared.should_run.load(Ordering::SeqCst) {
            let msg = match stream.next().await {
                Some(Ok(m)) => m,
                Some(Err(e)) => {
                    debug!("ws.read_loop error={}", e);
                    break;
                }
                None => break,
            };

            match msg {
                WsMsg::Text(text) => {
                    let items = match decode_frame::<T>(&text) {
                        Ok(items) => items,
                        Err(e) => {
                            debug!("ws.read_loop skipped_frame error={}", e);
                            continue;
                        }
                    };
                    if items.into_iter().any(|item| tx.send(item).is_err()) {
                        // Receiver dropped; nobody is listening anymore
                        shared.should_run.store(false, Ordering::SeqCst);
                        break;
                    }
                }
                WsMsg::Pong(_) => {
                    *shared.last_pong.lock().await = Instant::now();
                }
                WsMsg::Close(_) => {
                    shared.connected.store(false, Ordering::SeqCst);
                    break;
                }
                WsMsg::Ping(data) => {
                    let mut guard = shared.sink.lock().await;
                    if let Some(ref mut sink) = *guard {
                        let _ = sink.send(WsMsg::Pong(data)).await;
                    }
                }
                _ => {}
            }
        }
    }

    async fn ping_loop(shared: Arc<Shared>, ping_interval: Duration, pong_timeout: Duration) {
        let mut interval = tokio::time::interval(ping_interval);
        interval.tick().await; // skip first immediate tick

        while shared.should_run.load(Ordering::SeqCst) {
            interval.tick().await;

            if !shared.connected.load(Ordering::SeqCst) {
                continue;
            }

            let last = *shared.last_pong.lock().await;
            if last.elapsed() > pong_timeout {
                // Closing the sink makes the read loop end and reconnect
                warn!("ws.ping_loop pong_timeout elapsed={:?}", last.elapsed());
                let mut guard = shared.sink.lock().await;
                if let Some(ref mut sink) = *guard {
                    let _ = sink.close().await;
                }
                shared.connected.store(false, Ordering::SeqCst);
                continue;
            }

            let mut guard = shared.sink.lock().await;
            if let Some(ref mut sink) = *guard {
                let _ = sink.send(WsMsg::Ping(Vec::new())).await;
            }
        }
    }

    async fn reconnect_loop(
        factory: &RequestFactory,
        config: &WsConfig,
        shared: &Shared,
    ) -> Option<WsStream> {
        let mut delay = config.base_delay;
        let mut attempts = 0;

        while shared.should_run.load(Ordering::SeqCst) {
            if config.max_attempts > 0 && attempts >= config.max_attempts {
                warn!("ws.reconnect giving_up attempts={}", attempts);
                return None;
            }

            tokio::time::sleep(delay).await;
            attempts += 1;

            match Self::open(factory, shared).await {
                Ok(stream) => {
                    debug!("ws.reconnect connected attempts={}", attempts);
                    return Some(stream);
                }
                Err(e) => {
                    warn!("ws.reconnect attempt={} error={}", attempts, e);
                    delay = (delay * 2).min(config.max_delay);
                }
            }
        }
        None
    }

    /// Check if the WebSocket is currently connected.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Close the connection and stop all tasks.
    pub async fn disconnect(&mut self) -> Result<(), GeminiError> {
        self.shared.should_run.store(false, Ordering::SeqCst);
        self.shared.connected.store(false, Ordering::SeqCst);

        {
            let mut guard = self.shared.sink.lock().await;
            if let Some(ref mut sink) = *guard {
                let _ = sink.send(WsMsg::Close(None)).await;
            }
        }

        if let Some(handle) = self.ping_handle.take() {
            handle.abort();
        }
        Ok(())
    }
}

impl Drop for GeminiWebSocket {
    fn drop(&mut self) {
        self.shared.should_run.store(false, Ordering::SeqCst);
        if let Some(handle) = self.ping_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.reader_handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_data_url_carries_options() {
        let options = MarketDataOptions {
            trades: false,
            ..MarketDataOptions::default()
        };
        let url = market_data_url("wss://api.gemini.com", "btcusd", &options).unwrap();
        assert_eq!(url.path(), "/v1/marketdata/btcusd");
        let query = url.query().unwrap();
        assert!(query.contains("heartbeat=true"));
        assert!(query.contains("trades=false"));
        assert!(query.contains("bids=true"));
    }

    #[test]
    fn test_decode_frame_accepts_batches() {
        let single: Vec<OrderEvent> = decode_frame(r#"{"type":"heartbeat"}"#).unwrap();
        assert_eq!(single.len(), 1);
        let batch: Vec<OrderEvent> =
            decode_frame(r#"[{"type":"accepted","order_id":1},{"type":"booked","order_id":"1"}]"#)
                .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].order_id, batch[1].order_id);
        assert!(decode_frame::<OrderEvent>("not json").is_err());
    }

    #[test]
    fn test_order_events_url_repeats_filters() {
        let options = OrderEventsOptions {
            symbol_filter: vec!["btcusd".into(), "ethusd".into()],
            event_type_filter: vec!["fill".into()],
            ..OrderEventsOptions::default()
        };
        let url = order_events_url("wss://api.gemini.com", &options).unwrap();
        assert_eq!(
            url.query(),
            Some("symbolFilter=btcusd&symbolFilter=ethusd&eventTypeFilter=fill")
        );

        let bare = order_events_url("wss://api.gemini.com", &OrderEventsOptions::default()).unwrap();
        assert_eq!(bare.as_str(), "wss://api.gemini.com/v1/order/events");
    }
}

/// REST API client for the Gemini exchange.
///
/// Typed wrappers for the public and private REST endpoints on top of a
/// single dispatcher, [`GeminiApi::execute`].
use std::any::type_name;
use std::sync::Arc;

use log::debug;
use reqwest::Client;

use crate::config::NetworkConfig;
use crate::crypto::{sign, Credentials, NonceSource};
use crate::encoding::RequestParams;
use crate::errors::GeminiError;
use crate::models::*;
use crate::routes::Route;

/// How a call is sent: public GET with query pairs, or signed POST.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Query values must already be formatted as exchange-compatible strings.
    Get(Vec<(String, String)>),
    /// `request` and `nonce` are stamped by the dispatcher.
    SignedPost(RequestParams),
}

impl Dispatch {
    pub fn get() -> Self {
        Dispatch::Get(Vec::new())
    }

    pub fn signed() -> Self {
        Dispatch::SignedPost(RequestParams::new())
    }
}

/// Low-level REST API client for Gemini.
///
/// Cheap to clone; clones share credentials and the nonce source.
#[derive(Debug, Clone)]
pub struct GeminiApi {
    client: Client,
    config: NetworkConfig,
    credentials: Option<Arc<Credentials>>,
    nonce: Arc<NonceSource>,
}

impl GeminiApi {
    /// Create a client for public endpoints only.
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            credentials: None,
            nonce: Arc::new(NonceSource::new()),
        }
    }

    /// Create a client that can also call private endpoints.
    pub fn with_credentials(config: NetworkConfig, credentials: Credentials) -> Self {
        Self {
            credentials: Some(Arc::new(credentials)),
            ..Self::new(config)
        }
    }

    /// Replace the nonce source, e.g. to continue above a persisted value.
    pub fn with_nonce_source(mut self, nonce: NonceSource) -> Self {
        self.nonce = Arc::new(nonce);
        self
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_deref()
    }

    /// Next nonce from the shared source.
    pub fn next_nonce(&self) -> Result<u64, GeminiError> {
        self.nonce.next()
    }

    /// Stamp `request` and `nonce` into private call parameters.
    pub fn stamp(&self, route: &Route, mut params: RequestParams) -> Result<RequestParams, GeminiError> {
        let nonce = self.next_nonce()?;
        params.insert("request", route.path());
        params.insert("nonce", nonce);
        Ok(params)
    }

    /// Issue one request and return the raw body.
    ///
    /// The body is first checked against the generic envelope: an
    /// exchange-reported error becomes [`GeminiError::Api`] whatever the HTTP
    /// status. Otherwise a 2xx body is returned unmodified, while a non-2xx
    /// status without an error envelope becomes [`GeminiError::HttpError`]
    /// instead of handing back the body (a proxy error page is not a
    /// response).
    ///
    /// Stream routes, and dispatch kinds that do not match the route's
    /// privacy, fail with [`GeminiError::Other`] before any I/O.
    pub async fn execute(&self, route: &Route, dispatch: Dispatch) -> Result<Vec<u8>, GeminiError> {
        Self::check_dispatch(route, &dispatch)?;
        let url = format!("{}{}", self.config.api_base, route.path());
        let request = match dispatch {
            Dispatch::Get(query) => {
                debug!("api.execute GET {} query_len={}", route.path(), query.len());
                self.client.get(&url).query(&query)
            }
            Dispatch::SignedPost(params) => {
                let credentials = self
                    .credentials
                    .as_deref()
                    .ok_or(GeminiError::MissingCredentials)?;
                let params = self.stamp(route, params)?;
                let signed = sign(&params, credentials)?;
                debug!(
                    "api.execute POST {} params={}",
                    route.path(),
                    params.len()
                );
                let mut builder = self
                    .client
                    .post(&url)
                    .header("Content-Type", "text/plain")
                    .header("Cache-Control", "no-cache");
                for (name, value) in signed.headers() {
                    builder = builder.header(name, value);
                }
                builder
            }
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        debug!(
            "api.execute status={} path={} body_len={}",
            status,
            route.path(),
            body.len()
        );

        Self::parse_envelope(&body)?;

        if !status.is_success() {
            return Err(GeminiError::HttpError(format!(
                "HTTP {}: {}",
                status,
                String::from_utf8_lossy(&body[..body.len().min(500)])
            )));
        }
        Ok(body)
    }

    fn check_dispatch(route: &Route, dispatch: &Dispatch) -> Result<(), GeminiError> {
        if route.is_stream() {
            return Err(GeminiError::Other(format!(
                "{} is a WebSocket route",
                route.path()
            )));
        }
        let signed = matches!(dispatch, Dispatch::SignedPost(_));
        if signed != route.is_private() {
            return Err(GeminiError::Other(format!(
                "{} must be sent as {}",
                route.path(),
                if route.is_private() { "a signed POST" } else { "a GET" }
            )));
        }
        Ok(())
    }

    /// Detect an exchange-reported error in a response body.
    ///
    /// Bodies that are not JSON objects (arrays, plain text) carry no envelope
    /// and pass through.
    pub fn parse_envelope(body: &[u8]) -> Result<(), GeminiError> {
        match serde_json::from_slice::<GenericResponse>(body) {
            Ok(envelope) if envelope.is_error() => {
                debug!(
                    "api.parse_envelope error reason={:?}",
                    envelope.reason.as_deref()
                );
                Err(GeminiError::from_envelope(envelope.reason, envelope.message))
            }
            _ => Ok(()),
        }
    }

    /// Decode a raw body into its endpoint-specific shape.
    pub fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, GeminiError> {
        let target_type = type_name::<T>();
        serde_json::from_slice(body).map_err(|e| {
            debug!(
                "api.decode decode_failed target_type={} error={}",
                target_type, e
            );
            GeminiError::DecodeError(format!(
                "Failed to parse {target_type}: {e}\nBody: {}",
                String::from_utf8_lossy(&body[..body.len().min(500)])
            ))
        })
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        route: Route,
        dispatch: Dispatch,
    ) -> Result<T, GeminiError> {
        let body = self.execute(&route, dispatch).await?;
        Self::decode(&body)
    }

    // -----------------------------------------------------------------------
    // Public market data
    // -----------------------------------------------------------------------

    /// GET /v1/symbols - All tradable symbols.
    pub async fn symbols(&self) -> Result<Vec<String>, GeminiError> {
        debug!("api.symbols");
        self.call(Route::Symbols, Dispatch::get()).await
    }

    /// GET /v1/pubticker/:symbol - Best bid/ask, last price and volume.
    pub async fn ticker(&self, symbol: &str) -> Result<Ticker, GeminiError> {
        debug!("api.ticker symbol={}", symbol);
        self.call(Route::Ticker(symbol.to_string()), Dispatch::get())
            .await
    }

    /// GET /v1/book/:symbol - Order book snapshot.
    pub async fn order_book(
        &self,
        symbol: &str,
        limit_bids: Option<u32>,
        limit_asks: Option<u32>,
    ) -> Result<BookSnapshot, GeminiError> {
        debug!(
            "api.order_book symbol={} limit_bids={:?} limit_asks={:?}",
            symbol, limit_bids, limit_asks
        );
        let mut query = Vec::new();
        if let Some(n) = limit_bids {
            query.push(("limit_bids".to_string(), n.to_string()));
        }
        if let Some(n) = limit_asks {
            query.push(("limit_asks".to_string(), n.to_string()));
        }
        self.call(Route::Book(symbol.to_string()), Dispatch::Get(query))
            .await
    }

    /// GET /v1/trades/:symbol - Public trade history.
    ///
    /// `since` filters by timestamp. The exchange has been observed to return
    /// no trades when it is set, so prefer `None` unless you need it.
    pub async fn trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit_trades: Option<u32>,
        include_breaks: bool,
    ) -> Result<Vec<Trade>, GeminiError> {
        debug!(
            "api.trades symbol={} since={:?} limit_trades={:?} include_breaks={}",
            symbol, since, limit_trades, include_breaks
        );
        let mut query = Vec::new();
        if let Some(ts) = since {
            query.push(("since".to_string(), ts.to_string()));
        }
        if let Some(n) = limit_trades {
            query.push(("limit_trades".to_string(), n.to_string()));
        }
        query.push(("include_breaks".to_string(), include_breaks.to_string()));
        self.call(Route::Trades(symbol.to_string()), Dispatch::Get(query))
            .await
    }

    /// GET /v1/auction/:symbol - Current auction state.
    pub async fn current_auction(&self, symbol: &str) -> Result<CurrentAuction, GeminiError> {
        debug!("api.current_auction symbol={}", symbol);
        self.call(Route::CurrentAuction(symbol.to_string()), Dispatch::get())
            .await
    }

    /// GET /v1/auction/:symbol/history - Past auction events.
    pub async fn auction_history(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit_auction_results: Option<u32>,
        include_indicative: bool,
    ) -> Result<Vec<Auction>, GeminiError> {
        debug!(
            "api.auction_history symbol={} since={:?} limit={:?} include_indicative={}",
            symbol, since, limit_auction_results, include_indicative
        );
        let mut query = Vec::new();
        if let Some(ts) = since {
            query.push(("since".to_string(), ts.to_string()));
        }
        if let Some(n) = limit_auction_results {
            query.push(("limit_auction_results".to_string(), n.to_string()));
        }
        query.push((
            "include_indicative".to_string(),
            include_indicative.to_string(),
        ));
        self.call(Route::AuctionHistory(symbol.to_string()), Dispatch::Get(query))
            .await
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    /// POST /v1/order/new - Place an exchange limit order.
    pub async fn new_order(&self, order: &NewOrder) -> Result<Order, GeminiError> {
        debug!(
            "api.new_order symbol={} side={} amount={} price={} options={}",
            order.symbol,
            order.side.as_str(),
            order.amount,
            order.price,
            order.options.len()
        );
        let mut params = RequestParams::new()
            .with("symbol", order.symbol.as_str())
            .with("amount", order.amount)
            .with("price", order.price)
            .with("side", order.side.as_str())
            .with("type", "exchange limit")
            .with_opt("client_order_id", order.client_order_id.clone());
        if !order.options.is_empty() {
            let options: Vec<String> = order
                .options
                .iter()
                .map(|o| o.as_str().to_string())
                .collect();
            params.insert("options", options);
        }
        self.call(Route::NewOrder, Dispatch::SignedPost(params))
            .await
    }

    /// POST /v1/order/status - Status of one order.
    pub async fn order_status(&self, order_id: &Id) -> Result<Order, GeminiError> {
        debug!("api.order_status order_id={}", order_id);
        let params = RequestParams::new().with("order_id", order_id);
        self.call(Route::OrderStatus, Dispatch::SignedPost(params))
            .await
    }

    /// POST /v1/order/cancel - Cancel one order.
    pub async fn cancel_order(&self, order_id: &Id) -> Result<Order, GeminiError> {
        debug!("api.cancel_order order_id={}", order_id);
        let params = RequestParams::new().with("order_id", order_id);
        self.call(Route::CancelOrder, Dispatch::SignedPost(params))
            .await
    }

    /// POST /v1/order/cancel/all - Cancel every order on the account.
    pub async fn cancel_all(&self) -> Result<CancelResult, GeminiError> {
        debug!("api.cancel_all");
        self.call(Route::CancelAll, Dispatch::signed()).await
    }

    /// POST /v1/order/cancel/session - Cancel orders placed by this API session.
    pub async fn cancel_session(&self) -> Result<CancelResult, GeminiError> {
        debug!("api.cancel_session");
        self.call(Route::CancelSession, Dispatch::signed()).await
    }

    /// POST /v1/orders - Active orders.
    pub async fn active_orders(&self) -> Result<Vec<Order>, GeminiError> {
        debug!("api.active_orders");
        self.call(Route::ActiveOrders, Dispatch::signed()).await
    }

    /// POST /v1/mytrades - Account trade history for a symbol.
    pub async fn past_trades(
        &self,
        symbol: &str,
        limit_trades: Option<u32>,
        timestamp: Option<i64>,
    ) -> Result<Vec<Trade>, GeminiError> {
        debug!(
            "api.past_trades symbol={} limit_trades={:?} timestamp={:?}",
            symbol, limit_trades, timestamp
        );
        let params = RequestParams::new()
            .with("symbol", symbol)
            .with_opt("limit_trades", limit_trades)
            .with_opt("timestamp", timestamp);
        self.call(Route::PastTrades, Dispatch::SignedPost(params))
            .await
    }

    /// POST /v1/tradevolume - Trading volume per symbol.
    pub async fn trade_volume(&self) -> Result<Vec<TradeVolume>, GeminiError> {
        debug!("api.trade_volume");
        // Grouped as an array of arrays on the wire
        let grouped: Vec<Vec<TradeVolume>> =
            self.call(Route::TradeVolume, Dispatch::signed()).await?;
        Ok(grouped.into_iter().flatten().collect())
    }

    /// POST /v1/heartbeat - Keep an API session with a heartbeat requirement alive.
    pub async fn heartbeat(&self) -> Result<GenericResponse, GeminiError> {
        debug!("api.heartbeat");
        self.call(Route::Heartbeat, Dispatch::signed()).await
    }

    // -----------------------------------------------------------------------
    // Fund management
    // -----------------------------------------------------------------------

    /// POST /v1/balances - Balances per currency.
    pub async fn balances(&self) -> Result<Vec<FundBalance>, GeminiError> {
        debug!("api.balances");
        self.call(Route::Balances, Dispatch::signed()).await
    }

    /// POST /v1/deposit/:currency/newAddress - Create a deposit address.
    pub async fn new_deposit_address(
        &self,
        currency: &str,
        label: Option<&str>,
    ) -> Result<DepositAddress, GeminiError> {
        debug!(
            "api.new_deposit_address currency={} label={:?}",
            currency, label
        );
        let params = RequestParams::new().with_opt("label", label);
        self.call(
            Route::NewDepositAddress(currency.to_string()),
            Dispatch::SignedPost(params),
        )
        .await
    }

    /// POST /v1/withdraw/:currency - Withdraw to a whitelisted address.
    pub async fn withdraw_funds(
        &self,
        currency: &str,
        address: &str,
        amount: rust_decimal::Decimal,
    ) -> Result<WithdrawFundsResult, GeminiError> {
        debug!(
            "api.withdraw_funds currency={} address={} amount={}",
            currency, address, amount
        );
        let params = RequestParams::new()
            .with("address", address)
            .with("amount", amount);
        self.call(
            Route::WithdrawFunds(currency.to_string()),
            Dispatch::SignedPost(params),
        )
        .await
    }
}

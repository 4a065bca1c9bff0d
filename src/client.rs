/// High-level GeminiClient that ties REST calls, local books and streams together.
///
/// This is the primary entry point for SDK users. Lower-level access to every
/// endpoint is available through the public `api` field.
use std::collections::HashMap;

use log::debug;
use rust_decimal::Decimal;

use crate::api::GeminiApi;
use crate::config::{Network, NetworkConfig, WsConfig};
use crate::crypto::Credentials;
use crate::errors::GeminiError;
use crate::models::*;
use crate::orderbook::OrderBook;
use crate::websocket::{
    GeminiWebSocket, MarketDataOptions, OrderEventsOptions, TypedStream,
};

/// The high-level Gemini client.
pub struct GeminiClient {
    pub api: GeminiApi,
    pub config: NetworkConfig,
    ws_config: WsConfig,
}

impl GeminiClient {
    /// Create a client for public endpoints on the given network.
    pub fn new(network: Network) -> Self {
        Self::with_config(NetworkConfig::from_network(network), None)
    }

    /// Create a client that can also call private endpoints.
    pub fn with_credentials(network: Network, credentials: Credentials) -> Self {
        Self::with_config(NetworkConfig::from_network(network), Some(credentials))
    }

    /// Create a client with a custom configuration.
    pub fn with_config(config: NetworkConfig, credentials: Option<Credentials>) -> Self {
        let api = match credentials {
            Some(c) => GeminiApi::with_credentials(config.clone(), c),
            None => GeminiApi::new(config.clone()),
        };
        Self {
            api,
            config,
            ws_config: WsConfig::default(),
        }
    }

    /// Reconnect and heartbeat settings for streams opened afterwards.
    pub fn set_ws_config(&mut self, ws_config: WsConfig) {
        self.ws_config = ws_config;
    }

    // -----------------------------------------------------------------------
    // Books
    // -----------------------------------------------------------------------

    /// Fetch a REST snapshot and build a local book from it.
    ///
    /// `depth` limits both sides; `None` uses the exchange default.
    pub async fn fetch_order_book(
        &self,
        symbol: &str,
        depth: Option<u32>,
    ) -> Result<OrderBook, GeminiError> {
        let snapshot = self.api.order_book(symbol, depth, depth).await?;
        debug!(
            "client.fetch_order_book symbol={} bids={} asks={}",
            symbol,
            snapshot.bids.len(),
            snapshot.asks.len()
        );
        Ok(OrderBook::from_snapshot(&snapshot))
    }

    // -----------------------------------------------------------------------
    // Trading
    // -----------------------------------------------------------------------

    /// Place an exchange limit order.
    pub async fn place_limit_order(
        &self,
        symbol: &str,
        side: Side,
        amount: Decimal,
        price: Decimal,
        options: &[OrderOption],
    ) -> Result<Order, GeminiError> {
        let mut order = NewOrder::limit(symbol, side, amount, price);
        for option in options {
            order = order.option(*option);
        }
        self.api.new_order(&order).await
    }

    /// Active orders, optionally restricted to one symbol.
    pub async fn open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, GeminiError> {
        let orders = self.api.active_orders().await?;
        Ok(match symbol {
            Some(s) => orders.into_iter().filter(|o| o.symbol == s).collect(),
            None => orders,
        })
    }

    /// Balances keyed by upper-case currency code.
    pub async fn get_balances(&self) -> Result<HashMap<String, FundBalance>, GeminiError> {
        let balances = self.api.balances().await?;
        Ok(balances
            .into_iter()
            .map(|b| (b.currency.to_uppercase(), b))
            .collect())
    }

    // -----------------------------------------------------------------------
    // Streams
    // -----------------------------------------------------------------------

    /// Stream market data for one symbol.
    ///
    /// Keep the returned handle alive for as long as the stream is read.
    pub async fn stream_market_data(
        &self,
        symbol: &str,
        options: &MarketDataOptions,
    ) -> Result<(GeminiWebSocket, TypedStream<MarketData>), GeminiError> {
        GeminiWebSocket::market_data(&self.config.ws_base, symbol, options, self.ws_config.clone())
            .await
    }

    /// Stream private order events. Requires credentials.
    pub async fn stream_order_events(
        &self,
        options: &OrderEventsOptions,
    ) -> Result<(GeminiWebSocket, TypedStream<OrderEvent>), GeminiError> {
        GeminiWebSocket::order_events(&self.api, options, self.ws_config.clone()).await
    }
}

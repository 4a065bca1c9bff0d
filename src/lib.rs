//! Gemini exchange SDK for Rust.
//!
//! A client for the Gemini REST and WebSocket APIs: signed private calls,
//! typed responses and a locally maintained order book.
//!
//! # What This SDK Provides
//!
//! - High-level client: [`GeminiClient`]
//! - Typed REST API access over a single dispatcher: [`api::GeminiApi`]
//! - HMAC-SHA384 request signing with a monotonic nonce source: [`crypto`]
//! - Local order books maintained from incremental updates: [`OrderBook`]
//! - Typed WebSocket streams: [`TypedStream`]
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gemini_sdk::{GeminiClient, Network};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gemini_sdk::GeminiError> {
//!     let client = GeminiClient::new(Network::Sandbox);
//!
//!     let symbols = client.api.symbols().await?;
//!     println!("{} symbols", symbols.len());
//!
//!     let book = client.fetch_order_book("btcusd", Some(50)).await?;
//!     if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
//!         println!("bid {} / ask {}", bid.price, ask.price);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Private Calls
//!
//! ```rust,no_run
//! use gemini_sdk::{Credentials, GeminiClient, Network, Side};
//! use rust_decimal::Decimal;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gemini_sdk::GeminiError> {
//!     let credentials = Credentials::new("account-key", "secret");
//!     let client = GeminiClient::with_credentials(Network::Sandbox, credentials);
//!
//!     let order = client
//!         .place_limit_order("btcusd", Side::Buy, Decimal::new(1, 2), Decimal::new(1000, 0), &[])
//!         .await?;
//!     let _ = client.api.cancel_order(&order.order_id).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! This crate emits debug-level logs through the [`log`](https://docs.rs/log/) facade.
//! Credentials, payloads and signatures are never logged.
//!
//! # Errors
//!
//! All fallible operations return [`GeminiError`]:
//!
//! - `Api { reason, message }`: the exchange rejected the request
//! - `HttpError` / `WebSocketError`: transport failures
//! - `DecodeError`: a response did not match its expected shape
pub mod api;
pub mod client;
pub mod config;
pub mod crypto;
pub mod decimal;
pub mod encoding;
pub mod errors;
pub mod models;
pub mod orderbook;
pub mod routes;
pub mod websocket;

// Re-export primary types for convenience.
pub use api::{Dispatch, GeminiApi};
pub use client::GeminiClient;
pub use config::{Network, NetworkConfig, WsConfig};
pub use crypto::{Credentials, NonceSource, SignedPayload};
pub use decimal::UnsignedDecimal;
pub use encoding::{ParamValue, RequestParams};
pub use errors::{ApiReason, GeminiError};
pub use models::*;
pub use orderbook::{BookSide, BookSideKind, OrderBook, PriceLevel};
pub use routes::Route;
pub use websocket::{GeminiWebSocket, MarketDataOptions, OrderEventsOptions, TypedStream};

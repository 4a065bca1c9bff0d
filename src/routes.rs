//! Route table for the Gemini REST and WebSocket APIs.
//!
//! Each logical operation maps to one path template. Private routes are
//! signed; the path itself is embedded in the signed payload as `request`.

/// A REST or WebSocket route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    // Public
    Symbols,
    Ticker(String),
    Book(String),
    Trades(String),
    CurrentAuction(String),
    AuctionHistory(String),

    // Authenticated
    PastTrades,
    TradeVolume,
    ActiveOrders,
    OrderStatus,
    NewOrder,
    CancelOrder,
    CancelAll,
    CancelSession,
    Heartbeat,

    // Fund management
    Balances,
    NewDepositAddress(String),
    WithdrawFunds(String),

    // WebSocket
    OrderEvents,
    MarketData(String),
}

impl Route {
    /// The request path, e.g. `/v1/book/btcusd`.
    pub fn path(&self) -> String {
        match self {
            Route::Symbols => "/v1/symbols".into(),
            Route::Ticker(symbol) => format!("/v1/pubticker/{symbol}"),
            Route::Book(symbol) => format!("/v1/book/{symbol}"),
            Route::Trades(symbol) => format!("/v1/trades/{symbol}"),
            Route::CurrentAuction(symbol) => format!("/v1/auction/{symbol}"),
            Route::AuctionHistory(symbol) => format!("/v1/auction/{symbol}/history"),
            Route::PastTrades => "/v1/mytrades".into(),
            Route::TradeVolume => "/v1/tradevolume".into(),
            Route::ActiveOrders => "/v1/orders".into(),
            Route::OrderStatus => "/v1/order/status".into(),
            Route::NewOrder => "/v1/order/new".into(),
            Route::CancelOrder => "/v1/order/cancel".into(),
            Route::CancelAll => "/v1/order/cancel/all".into(),
            Route::CancelSession => "/v1/order/cancel/session".into(),
            Route::Heartbeat => "/v1/heartbeat".into(),
            Route::Balances => "/v1/balances".into(),
            Route::NewDepositAddress(currency) => format!("/v1/deposit/{currency}/newAddress"),
            Route::WithdrawFunds(currency) => format!("/v1/withdraw/{currency}"),
            Route::OrderEvents => "/v1/order/events".into(),
            Route::MarketData(symbol) => format!("/v1/marketdata/{symbol}"),
        }
    }

    /// Whether the route requires a signed payload.
    pub fn is_private(&self) -> bool {
        !matches!(
            self,
            Route::Symbols
                | Route::Ticker(_)
                | Route::Book(_)
                | Route::Trades(_)
                | Route::CurrentAuction(_)
                | Route::AuctionHistory(_)
                | Route::MarketData(_)
        )
    }

    /// Whether the route is served over WebSocket rather than REST.
    pub fn is_stream(&self) -> bool {
        matches!(self, Route::OrderEvents | Route::MarketData(_))
    }
}

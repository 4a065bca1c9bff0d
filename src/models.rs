/// Data models for Gemini API types.
///
/// All models use serde for JSON deserialization. Amounts the exchange sends
/// as strings decode to [`Decimal`]; identifiers decode through [`Id`].
use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::decimal::UnsignedDecimal;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// An order, trade, auction or event identifier.
///
/// The exchange sends ids either as JSON strings (`"123"`) or bare integers
/// (`123`). Both decode to the same `Id`. Integer tokens are kept as their
/// literal digits, so there is no range limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(String);

impl Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode a single raw JSON token.
    pub fn from_json_token(token: &str) -> Result<Self, serde_json::Error> {
        let token = token.trim();
        if token.starts_with('"') {
            return serde_json::from_str::<String>(token).map(Id);
        }
        match serde_json::from_str::<serde_json::Value>(token)? {
            serde_json::Value::Number(_) => Ok(Id(token.to_string())),
            other => Err(de::Error::custom(format!(
                "expected a string or integer identifier, found {other}"
            ))),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(v: &str) -> Self {
        Id(v.to_string())
    }
}

impl From<String> for Id {
    fn from(v: String) -> Self {
        Id(v)
    }
}

impl From<u64> for Id {
    fn from(v: u64) -> Self {
        Id(v.to_string())
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Id::from_json_token(raw.get()).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The generic wrapper every response is first decoded into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenericResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl GenericResponse {
    /// A missing `result` counts as success.
    pub fn is_error(&self) -> bool {
        self.result.as_deref() == Some("error")
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// Execution options for limit orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOption {
    MakerOrCancel,
    ImmediateOrCancel,
    FillOrKill,
    AuctionOnly,
    IndicationOfInterest,
}

impl OrderOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderOption::MakerOrCancel => "maker-or-cancel",
            OrderOption::ImmediateOrCancel => "immediate-or-cancel",
            OrderOption::FillOrKill => "fill-or-kill",
            OrderOption::AuctionOnly => "auction-only",
            OrderOption::IndicationOfInterest => "indication-of-interest",
        }
    }
}

/// Parameters for a new exchange limit order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub symbol: String,
    pub client_order_id: Option<String>,
    pub amount: Decimal,
    pub price: Decimal,
    pub side: Side,
    pub options: Vec<OrderOption>,
}

impl NewOrder {
    pub fn limit(symbol: &str, side: Side, amount: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            client_order_id: None,
            amount,
            price,
            side,
            options: Vec::new(),
        }
    }

    pub fn client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    pub fn option(mut self, option: OrderOption) -> Self {
        self.options.push(option);
        self
    }
}

/// An order as returned by order placement, status and cancel calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Id,
    #[serde(default)]
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(rename = "timestampms", default)]
    pub timestamp_ms: i64,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub was_forced: bool,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub executed_amount: Decimal,
    #[serde(default)]
    pub remaining_amount: Decimal,
    #[serde(default)]
    pub original_amount: Decimal,
    #[serde(default)]
    pub avg_execution_price: Option<Decimal>,
}

/// Response from cancel-all and cancel-session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelResult {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub details: CancelResultDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelResultDetails {
    #[serde(rename = "cancelledOrders", default)]
    pub cancelled_orders: Vec<Id>,
    #[serde(rename = "cancelRejects", default)]
    pub cancel_rejects: Vec<Id>,
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// A trade. Public trade history and private past-trades share this shape;
/// fields that only one of them carries are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    #[serde(rename = "tid")]
    pub trade_id: Id,
    #[serde(default)]
    pub order_id: Option<Id>,
    #[serde(rename = "timestampms", default)]
    pub timestamp_ms: i64,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(rename = "type")]
    pub trade_type: String,
    pub price: Decimal,
    pub amount: Decimal,
    #[serde(default)]
    pub fee_currency: Option<String>,
    #[serde(default)]
    pub fee_amount: Option<Decimal>,
    #[serde(default)]
    pub is_auction_fill: bool,
    #[serde(default)]
    pub aggressor: bool,
    #[serde(default)]
    pub broken: bool,
    #[serde(rename = "break", default)]
    pub break_type: Option<String>,
}

/// Trading volume for one symbol from /v1/tradevolume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeVolume {
    #[serde(default)]
    pub account_id: Option<Id>,
    pub symbol: String,
    pub base_currency: String,
    pub notional_currency: String,
    pub data_date: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_volume_base: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub maker_buy_sell_ratio: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub buy_maker_base: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub buy_maker_notional: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub buy_maker_count: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sell_maker_base: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sell_maker_notional: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sell_maker_count: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub buy_taker_base: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub buy_taker_notional: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub buy_taker_count: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sell_taker_base: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sell_taker_notional: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sell_taker_count: Decimal,
}

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

/// Ticker from /v1/pubticker/:symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    pub volume: TickerVolume,
}

/// 24h volume keyed by currency code, plus the sample timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerVolume {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(flatten)]
    pub amounts: HashMap<String, Decimal>,
}

impl TickerVolume {
    /// Volume in the given currency, e.g. "BTC" or "USD".
    pub fn amount(&self, currency: &str) -> Option<Decimal> {
        self.amounts.get(currency).copied()
    }
}

/// A price level of a REST book snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookEntry {
    pub price: UnsignedDecimal,
    pub amount: UnsignedDecimal,
}

/// Book snapshot from /v1/book/:symbol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookSnapshot {
    #[serde(default)]
    pub bids: Vec<BookEntry>,
    #[serde(default)]
    pub asks: Vec<BookEntry>,
}

/// State of the current auction from /v1/auction/:symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAuction {
    #[serde(default)]
    pub closed_until_ms: Option<i64>,
    #[serde(default)]
    pub last_auction_eid: Option<Id>,
    #[serde(default)]
    pub last_auction_price: Option<Decimal>,
    #[serde(default)]
    pub last_auction_quantity: Option<Decimal>,
    #[serde(default)]
    pub last_highest_bid_price: Option<Decimal>,
    #[serde(default)]
    pub last_lowest_ask_price: Option<Decimal>,
    #[serde(default)]
    pub most_recent_indicative_price: Option<Decimal>,
    #[serde(default)]
    pub most_recent_indicative_quantity: Option<Decimal>,
    #[serde(default)]
    pub most_recent_highest_bid_price: Option<Decimal>,
    #[serde(default)]
    pub most_recent_lowest_ask_price: Option<Decimal>,
    #[serde(default)]
    pub next_update_ms: Option<i64>,
    #[serde(default)]
    pub next_auction_ms: Option<i64>,
}

/// A historical auction event from /v1/auction/:symbol/history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    #[serde(rename = "timestampms", default)]
    pub timestamp_ms: i64,
    pub auction_id: Id,
    pub eid: Id,
    pub event_type: String,
    pub auction_result: String,
    #[serde(default)]
    pub auction_price: Option<Decimal>,
    #[serde(default)]
    pub auction_quantity: Option<Decimal>,
    #[serde(default)]
    pub highest_bid_price: Option<Decimal>,
    #[serde(default)]
    pub lowest_ask_price: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Funds
// ---------------------------------------------------------------------------

/// Balance entry from /v1/balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundBalance {
    #[serde(rename = "type")]
    pub account_type: String,
    pub currency: String,
    pub amount: Decimal,
    pub available: Decimal,
    #[serde(rename = "availableForWithdrawal")]
    pub available_for_withdrawal: Decimal,
}

/// Response from /v1/deposit/:currency/newAddress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositAddress {
    pub currency: String,
    pub address: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Response from /v1/withdraw/:currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawFundsResult {
    pub destination: String,
    #[serde(rename = "txHash", default)]
    pub tx_hash: Option<String>,
    pub amount: Decimal,
}

// ---------------------------------------------------------------------------
// WebSocket messages
// ---------------------------------------------------------------------------

/// One market data frame: an `update` carrying events, or a `heartbeat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(rename = "eventId", default)]
    pub event_id: Option<Id>,
    #[serde(default)]
    pub socket_sequence: Option<u64>,
    #[serde(rename = "timestampms", default)]
    pub timestamp_ms: Option<i64>,
    #[serde(default)]
    pub events: Vec<MarketEvent>,
}

impl MarketData {
    pub fn is_heartbeat(&self) -> bool {
        self.message_type == "heartbeat"
    }
}

/// An event inside a market data update. Which fields are set depends on
/// `event_type`: `change`, `trade`, `auction_open`, `auction_indicative`,
/// `auction_result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub price: Option<UnsignedDecimal>,

    // change
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub remaining: Option<UnsignedDecimal>,
    #[serde(default)]
    pub delta: Option<Decimal>,
    #[serde(default)]
    pub reason: Option<String>,

    // trade
    #[serde(default)]
    pub tid: Option<Id>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(rename = "makerSide", default)]
    pub maker_side: Option<String>,

    // auction open
    #[serde(default)]
    pub auction_open_ms: Option<i64>,
    #[serde(default)]
    pub auction_time_ms: Option<i64>,
    #[serde(default)]
    pub first_indicative_ms: Option<i64>,
    #[serde(default)]
    pub last_cancel_time_ms: Option<i64>,

    // auction indicative / outcome
    #[serde(default)]
    pub eid: Option<Id>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub time_ms: Option<i64>,
    #[serde(default)]
    pub highest_bid_price: Option<Decimal>,
    #[serde(default)]
    pub lowest_ask_price: Option<Decimal>,
    #[serde(default)]
    pub collar_price: Option<Decimal>,
    #[serde(default)]
    pub indicative_price: Option<Decimal>,
    #[serde(default)]
    pub indicative_quantity: Option<Decimal>,
}

impl MarketEvent {
    pub fn is_change(&self) -> bool {
        self.event_type == "change"
    }

    pub fn is_trade(&self) -> bool {
        self.event_type == "trade"
    }
}

/// A fill attached to an order event of type `fill`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFill {
    pub trade_id: Id,
    pub liquidity: String,
    pub price: Decimal,
    pub amount: Decimal,
    pub fee: Decimal,
    pub fee_currency: String,
}

/// A private order lifecycle event, a subscription ack or a heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub order_id: Option<Id>,
    #[serde(default)]
    pub event_id: Option<Id>,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub api_session: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default)]
    pub behavior: Option<String>,
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(rename = "timestampms", default)]
    pub timestamp_ms: Option<i64>,
    #[serde(default)]
    pub is_live: Option<bool>,
    #[serde(default)]
    pub is_cancelled: Option<bool>,
    #[serde(default)]
    pub is_hidden: Option<bool>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub executed_amount: Option<Decimal>,
    #[serde(default)]
    pub remaining_amount: Option<Decimal>,
    #[serde(default)]
    pub original_amount: Option<Decimal>,
    #[serde(default)]
    pub avg_execution_price: Option<Decimal>,
    #[serde(default)]
    pub total_spend: Option<Decimal>,

    // subscription_ack
    #[serde(rename = "accountId", default)]
    pub account_id: Option<Id>,
    #[serde(rename = "symbolFilter", default)]
    pub symbol_filter: Vec<String>,
    #[serde(rename = "apiSessionFilter", default)]
    pub api_session_filter: Vec<String>,
    #[serde(rename = "eventTypeFilter", default)]
    pub event_type_filter: Vec<String>,

    // heartbeat
    #[serde(default)]
    pub sequence: Option<u64>,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(rename = "socket_sequence", default)]
    pub socket_sequence: Option<u64>,

    // fill
    #[serde(default)]
    pub fill: Option<OrderFill>,

    // rejected / cancelled
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub cancel_command_id: Option<String>,
}

impl OrderEvent {
    pub fn is_heartbeat(&self) -> bool {
        self.event_type == "heartbeat"
    }
}

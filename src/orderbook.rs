//! Local order book state maintained from incremental updates.
//!
//! The wire protocol does not say whether a level update is an insert, an
//! update or a delete. [`BookSide::apply`] infers it from the current state
//! and the incoming quantity: zero removes, anything else sets.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::UnsignedDecimal;
use crate::models::{BookSnapshot, MarketData};

/// A (price, quantity) pair. `PriceLevel::default()` is the zero sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: UnsignedDecimal,
    pub quantity: UnsignedDecimal,
}

impl PriceLevel {
    pub fn new(price: UnsignedDecimal, quantity: UnsignedDecimal) -> Self {
        Self { price, quantity }
    }
}

/// Which side of the book a level belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSideKind {
    Bid,
    Ask,
}

impl BookSideKind {
    /// Parse the `side` field of a market data change event.
    pub fn from_wire(side: &str) -> Option<Self> {
        match side {
            "bid" => Some(BookSideKind::Bid),
            "ask" => Some(BookSideKind::Ask),
            _ => None,
        }
    }
}

/// One side of a book: at most one level per price, never a zero quantity.
#[derive(Debug, Clone, Default)]
pub struct BookSide {
    levels: BTreeMap<UnsignedDecimal, UnsignedDecimal>,
}

impl BookSide {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert or delete the level at `price`.
    ///
    /// A zero `quantity` removes the level; removing an absent level is a no-op.
    pub fn apply(&mut self, price: UnsignedDecimal, quantity: UnsignedDecimal) {
        if quantity.is_zero() {
            self.levels.remove(&price);
        } else {
            self.levels.insert(price, quantity);
        }
    }

    /// The level with the lowest price, if any.
    pub fn lowest(&self) -> Option<PriceLevel> {
        self.levels
            .first_key_value()
            .map(|(p, q)| PriceLevel::new(*p, *q))
    }

    /// The level with the highest price, if any.
    pub fn highest(&self) -> Option<PriceLevel> {
        self.levels
            .last_key_value()
            .map(|(p, q)| PriceLevel::new(*p, *q))
    }

    pub fn get(&self, price: UnsignedDecimal) -> Option<UnsignedDecimal> {
        self.levels.get(&price).copied()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }

    /// Levels in ascending price order.
    pub fn levels(&self) -> impl DoubleEndedIterator<Item = PriceLevel> + '_ {
        self.levels.iter().map(|(p, q)| PriceLevel::new(*p, *q))
    }

    /// Sum of quantities across all levels.
    pub fn total_quantity(&self) -> UnsignedDecimal {
        self.levels.values().copied().sum()
    }
}

/// A two-sided book for one symbol.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    pub bids: BookSide,
    pub asks: BookSide,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from a REST snapshot. Zero-amount entries are skipped.
    pub fn from_snapshot(snapshot: &BookSnapshot) -> Self {
        let mut book = Self::new();
        for entry in &snapshot.bids {
            book.bids.apply(entry.price, entry.amount);
        }
        for entry in &snapshot.asks {
            book.asks.apply(entry.price, entry.amount);
        }
        book
    }

    pub fn side_mut(&mut self, side: BookSideKind) -> &mut BookSide {
        match side {
            BookSideKind::Bid => &mut self.bids,
            BookSideKind::Ask => &mut self.asks,
        }
    }

    pub fn apply(&mut self, side: BookSideKind, price: UnsignedDecimal, quantity: UnsignedDecimal) {
        self.side_mut(side).apply(price, quantity);
    }

    /// Apply every `change` event of a market data update.
    ///
    /// An update whose change events carry reason `initial` is a full
    /// snapshot, so the book is cleared before it is applied. Returns the
    /// number of levels touched.
    pub fn apply_market_data(&mut self, update: &MarketData) -> usize {
        let is_snapshot = update
            .events
            .iter()
            .any(|e| e.is_change() && e.reason.as_deref() == Some("initial"));
        if is_snapshot {
            self.clear();
        }

        let mut applied = 0;
        for event in update.events.iter().filter(|e| e.is_change()) {
            let side = event.side.as_deref().and_then(BookSideKind::from_wire);
            if let (Some(side), Some(price), Some(remaining)) = (side, event.price, event.remaining)
            {
                self.apply(side, price, remaining);
                applied += 1;
            }
        }
        applied
    }

    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.highest()
    }

    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.lowest()
    }

    /// Best ask minus best bid. `None` if either side is empty.
    pub fn spread(&self) -> Option<Decimal> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Some(ask.price.into_inner() - bid.price.into_inner())
    }

    pub fn mid_price(&self) -> Option<Decimal> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Some((ask.price.into_inner() + bid.price.into_inner()) / Decimal::TWO)
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Quickstart example: public market data plus a signed order round trip.
///
/// Demonstrates: list symbols, read the ticker and book, then (when
/// GEMINI_API_KEY and GEMINI_API_SECRET are set) check balances, place a
/// maker-or-cancel order far from the market, query it and cancel it.
use rust_decimal::Decimal;

use gemini_sdk::{Credentials, GeminiClient, Network, OrderOption, Side};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let symbol = "btcusd";
    let credentials = match (
        std::env::var("GEMINI_API_KEY"),
        std::env::var("GEMINI_API_SECRET"),
    ) {
        (Ok(key), Ok(secret)) => Some(Credentials::new(key, secret)),
        _ => None,
    };
    let has_credentials = credentials.is_some();
    let client = match credentials {
        Some(c) => GeminiClient::with_credentials(Network::Sandbox, c),
        None => GeminiClient::new(Network::Sandbox),
    };

    // 1. Public market data
    let symbols = client.api.symbols().await?;
    println!("{} symbols, first few: {:?}", symbols.len(), &symbols[..symbols.len().min(5)]);

    let ticker = client.api.ticker(symbol).await?;
    println!("{symbol}: bid {} ask {} last {}", ticker.bid, ticker.ask, ticker.last);

    let book = client.fetch_order_book(symbol, Some(25)).await?;
    let bid = book.best_bid().unwrap_or_default();
    let ask = book.best_ask().unwrap_or_default();
    println!(
        "book: {} bids / {} asks, best {} x {} / {} x {}",
        book.bids.len(),
        book.asks.len(),
        bid.price,
        bid.quantity,
        ask.price,
        ask.quantity
    );

    if !has_credentials {
        println!("\nSet GEMINI_API_KEY and GEMINI_API_SECRET to run the private steps.");
        return Ok(());
    }

    // 2. Balances
    let balances = client.get_balances().await?;
    for (currency, balance) in &balances {
        println!("{currency}: {} available", balance.available);
    }

    // 3. Place a passive order at half the best bid
    let price = (bid.price.into_inner() / Decimal::TWO).round_dp(2);
    let order = client
        .place_limit_order(
            symbol,
            Side::Buy,
            Decimal::new(1, 4),
            price,
            &[OrderOption::MakerOrCancel],
        )
        .await?;
    println!("\nPlaced order {} at {price} (live: {})", order.order_id, order.is_live);

    // 4. Status and cancel
    let status = client.api.order_status(&order.order_id).await?;
    println!("Remaining: {}", status.remaining_amount);

    let cancelled = client.api.cancel_order(&order.order_id).await?;
    println!("Cancelled: {}", cancelled.is_cancelled);

    Ok(())
}

/// Book watcher example: keep a local order book in sync with the
/// market data stream and print the top of book as it changes.
///
/// Usage: cargo run --example book_watcher -- [symbol] [updates]
use futures_util::StreamExt;

use gemini_sdk::{GeminiClient, MarketDataOptions, Network, OrderBook};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let symbol = args.next().unwrap_or_else(|| "btcusd".to_string());
    let max_updates: usize = args.next().and_then(|n| n.parse().ok()).unwrap_or(50);

    let client = GeminiClient::new(Network::Sandbox);
    let options = MarketDataOptions {
        trades: false,
        auctions: false,
        ..MarketDataOptions::default()
    };
    let (mut ws, mut stream) = client.stream_market_data(&symbol, &options).await?;
    println!("Watching {symbol} for {max_updates} updates...");

    let mut book = OrderBook::new();
    let mut updates = 0;
    while let Some(message) = stream.next().await {
        if message.is_heartbeat() {
            continue;
        }
        let changed = book.apply_market_data(&message);
        updates += 1;

        let bid = book.best_bid().unwrap_or_default();
        let ask = book.best_ask().unwrap_or_default();
        println!(
            "#{:<4} seq={:<6} changed={:<4} bid {} x {} | ask {} x {} | spread {}",
            updates,
            message.socket_sequence.unwrap_or_default(),
            changed,
            bid.price,
            bid.quantity,
            ask.price,
            ask.quantity,
            book.spread().map(|s| s.to_string()).unwrap_or_else(|| "-".into())
        );

        if updates >= max_updates {
            break;
        }
    }

    ws.disconnect().await?;
    println!("Done: {} bid levels, {} ask levels", book.bids.len(), book.asks.len());
    Ok(())
}

//! Scan the local network for LD382 controllers and print every reply.
//!
//! Run with: cargo run --example scan

use ld382::{DEFAULT_BROADCAST_INTERVAL, DEFAULT_SCAN_WINDOW, scan};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("ld382=debug"))
        .init();

    let replies = scan(DEFAULT_SCAN_WINDOW, DEFAULT_BROADCAST_INTERVAL).await?;
    println!("{}", replies.join("\n"));
    Ok(())
}

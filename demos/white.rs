//! Step a controller's white channel from dark to full brightness, over and
//! over.
//!
//! Run with: cargo run --example white -- 192.168.12.69

use std::time::Duration;

use ld382::{ConnectionEvent, Controller, Endpoint, White};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("ld382=debug"))
        .init();

    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "192.168.12.69".to_string());
    let (controller, mut events) = Controller::open(Endpoint::host(host));

    while let Some(event) = events.recv().await {
        if !event.is_connected() {
            continue;
        }
        controller.power_on();

        let mut level: u8 = 0;
        let mut ticker = tokio::time::interval(Duration::from_millis(1500));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    controller.white(White::new(level));
                    level = if level == u8::MAX { 0 } else { level + 17 };
                }
                event = events.recv() => match event {
                    Some(ConnectionEvent::Closed { .. }) | None => break,
                    Some(_) => {}
                }
            }
        }
    }
}

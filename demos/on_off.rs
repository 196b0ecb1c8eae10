//! Toggle a controller's power every 2.5 seconds.
//!
//! Run with: cargo run --example on_off -- 192.168.12.69

use std::time::Duration;

use ld382::{ConnectionEvent, Controller, Endpoint};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("ld382=debug"))
        .init();

    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "192.168.12.69".to_string());
    let (controller, mut events) = Controller::open(Endpoint::host(host));

    // Errors are logged by the controller; it keeps retrying on its own.
    while let Some(event) = events.recv().await {
        if !event.is_connected() {
            continue;
        }
        controller.power_on();

        let mut on = true;
        let mut ticker = tokio::time::interval(Duration::from_millis(2500));
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    on = !on;
                    if on {
                        controller.power_on();
                    } else {
                        controller.power_off();
                    }
                }
                event = events.recv() => match event {
                    Some(ConnectionEvent::Closed { .. }) | None => break,
                    Some(_) => {}
                }
            }
        }
    }
}

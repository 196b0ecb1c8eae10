//! # ld382
//!
//! An async Rust client for LD382-family ("UFO") WiFi RGB/white LED controllers.
//!
//! This crate provides a **runtime-agnostic** async API that keeps a TCP
//! connection to a controller alive, encodes its fixed-format binary commands,
//! and finds controllers on the local network over UDP broadcast.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ld382::{Color, Controller, Endpoint, ConnectionEvent};
//!
//! async fn control() -> Result<(), Box<dyn std::error::Error>> {
//!     let (controller, mut events) = Controller::open(Endpoint::host("192.168.1.50"));
//!
//!     while let Some(event) = events.recv().await {
//!         if let ConnectionEvent::Connected = event {
//!             controller.power_on().await;
//!             controller.rgb(Color::rgb(0, 0, 255)).await;
//!             controller.disconnect();
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Runtime Agnostic**: Works with tokio, async-std, or smol async runtimes
//! - **Persistent Connection**: [`Controller`] reconnects on its own until
//!   told to [`disconnect`](Controller::disconnect)
//! - **Lifecycle Events**: connected / closed / error notifications through
//!   an [`EventStream`]
//! - **Commands**: power, [`Color`], [`White`] level and built-in
//!   [`ProgramMode`]s, encoded by [`Command`]
//! - **Discovery**: find controllers with [`scan`] or [`discover_controllers`]
//!
//! ## Communication
//!
//! Commands go over TCP port 5577 as raw frames: a few operation bytes plus a
//! checksum byte (low byte of their sum). Controllers do not acknowledge
//! commands, so a flushed [`Transmission`] only means the frame reached the
//! socket. Discovery broadcasts `HF-A11ASSISTHREAD` to UDP port 48899 and
//! collects the `ip,mac,model` replies.
//!
//! ## Feature Flags
//!
//! - `runtime-tokio` (default): Use the tokio async runtime
//! - `runtime-async-std`: Use the async-std runtime
//! - `runtime-smol`: Use the smol runtime

mod command;
mod config;
mod controller;
mod discovery;
mod errors;
mod events;
mod history;
pub mod runtime;
mod types;

// Re-export public API
pub use command::{Command, checksum};
pub use config::{
    DEFAULT_BROADCAST_INTERVAL, DEFAULT_PORT, DEFAULT_RETRY_INTERVAL, DEFAULT_SCAN_WINDOW,
    DISCOVERY_PORT, Endpoint, Options, ScanOptions,
};
pub use controller::{ConnectionState, Controller, Delivery, Transmission};
pub use discovery::{
    DiscoveredController, PROBE, broadcast_addresses, discover_controllers, scan, scan_with,
    subnet_broadcast,
};
pub use errors::Error;
pub use events::{ConnectionEvent, EventStream};
pub use history::{EntryKind, FrameHistory, HistoryEntry, HistorySummary};
pub use types::{Color, PowerMode, ProgramMode, Speed, White};

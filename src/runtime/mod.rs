//! The async runtime seam.
//!
//! Controllers need a TCP stream, discovery needs a broadcast-capable UDP
//! socket, and both need timers and detached tasks. Each runtime backend
//! supplies those behind the traits below; exactly one backend is compiled in,
//! chosen by cargo feature:
//!
//! | Feature | Backend |
//! |---|---|
//! | `runtime-tokio` (default) | `tokio` |
//! | `runtime-async-std` | `async-std` |
//! | `runtime-smol` | `smol` + `async-io` |
//!
//! ```toml
//! [dependencies]
//! ld382 = { version = "0.1", default-features = false, features = ["runtime-smol"] }
//! ```

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

#[cfg(feature = "runtime-tokio")]
mod tokio_impl;
#[cfg(feature = "runtime-tokio")]
pub use tokio_impl::*;

#[cfg(feature = "runtime-async-std")]
mod async_std_impl;
#[cfg(feature = "runtime-async-std")]
pub use async_std_impl::*;

#[cfg(feature = "runtime-smol")]
mod smol_impl;
#[cfg(feature = "runtime-smol")]
pub use smol_impl::*;

/// Datagram socket used by discovery.
pub trait AsyncUdpSocket: Send + Sync + Sized {
    fn bind(addr: &str) -> impl Future<Output = io::Result<Self>> + Send;

    /// Send one datagram to `addr` (`ip:port`).
    fn send_to(&self, buf: &[u8], addr: &str) -> impl Future<Output = io::Result<usize>> + Send;

    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;

    /// Allow sending to broadcast addresses.
    fn set_broadcast(&self, broadcast: bool) -> io::Result<()>;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

/// Command stream to one controller.
///
/// The stream is owned by exactly one task, so every operation takes
/// `&mut self`.
pub trait AsyncTcpStream: Send + Sized {
    /// Resolve `addr` (`host:port`) and connect to it.
    fn connect(addr: &str) -> impl Future<Output = io::Result<Self>> + Send;

    /// Read into `buf`, returning `Ok(0)` once the peer has closed its side.
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Write the whole buffer and flush it to the transport.
    fn write_all(&mut self, buf: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Shut down the write half, leaving the read half open.
    fn shutdown_write(&mut self) -> impl Future<Output = io::Result<()>> + Send;
}

/// Trait for starting background tasks.
///
/// Connection sessions and retry timers report back through shared state,
/// so tasks are detached and never joined.
pub trait Spawner {
    /// Run `future` to completion in the background.
    fn spawn_detached<F>(future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

pub async fn sleep(duration: Duration) {
    sleep_impl(duration).await
}

/// Await `future` for at most `duration`.
pub async fn timeout<F, T>(duration: Duration, future: F) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    timeout_impl(duration, future).await
}

/// The deadline passed before the future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation timed out")]
pub struct TimedOut;

/// Monotonic clock reading on the active runtime's clock.
#[derive(Debug, Clone, Copy)]
pub struct Instant(InstantInner);

impl Instant {
    pub fn now() -> Self {
        Instant(InstantInner::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

#[cfg(not(any(
    feature = "runtime-tokio",
    feature = "runtime-async-std",
    feature = "runtime-smol"
)))]
compile_error!(
    "enable one runtime feature: \"runtime-tokio\", \"runtime-async-std\" or \"runtime-smol\""
);

#[cfg(any(
    all(feature = "runtime-tokio", feature = "runtime-async-std"),
    all(feature = "runtime-tokio", feature = "runtime-smol"),
    all(feature = "runtime-async-std", feature = "runtime-smol"),
))]
compile_error!("runtime features are mutually exclusive; enable only one");

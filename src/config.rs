//! Connection and discovery settings.

use std::net::Ipv4Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

/// TCP port controllers accept commands on.
pub const DEFAULT_PORT: u16 = 5577;

/// UDP port used for discovery probes and replies.
pub const DISCOVERY_PORT: u16 = 48899;

/// Delay between reconnect attempts unless configured otherwise.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(2000);

/// How long a scan collects replies.
pub const DEFAULT_SCAN_WINDOW: Duration = Duration::from_millis(3000);

/// How often a scan re-sends its probe.
pub const DEFAULT_BROADCAST_INTERVAL: Duration = Duration::from_millis(300);

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_retry_interval() -> Duration {
    DEFAULT_RETRY_INTERVAL
}

/// Per-connection options.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Delay before a reconnect attempt. Zero disables reconnecting.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "retry_interval_ms", default = "default_retry_interval")]
    pub retry_interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl Options {
    /// Options that never reconnect after a close.
    pub fn no_retry() -> Self {
        Options {
            retry_interval: Duration::ZERO,
        }
    }

    pub fn with_retry_interval(retry_interval: Duration) -> Self {
        Options { retry_interval }
    }
}

/// Where a controller lives and how to treat lost connections.
///
/// An endpoint is immutable once built.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ld382::{Endpoint, Options};
///
/// let endpoint = Endpoint::new("192.168.1.50", 5577, Options::default());
/// assert_eq!(endpoint.address(), "192.168.1.50:5577");
/// assert_eq!(endpoint.retry_interval(), Duration::from_millis(2000));
/// ```
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "retry_interval_ms", default = "default_retry_interval")]
    retry_interval: Duration,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16, options: Options) -> Self {
        Endpoint {
            host: host.into(),
            port,
            retry_interval: options.retry_interval,
        }
    }

    /// Endpoint on the default port with default options.
    pub fn host(host: impl Into<String>) -> Self {
        Self::new(host, DEFAULT_PORT, Options::default())
    }

    pub fn hostname(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub fn retries(&self) -> bool {
        !self.retry_interval.is_zero()
    }

    /// `host:port`, with IPv6 literals bracketed.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Settings for a discovery scan.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ld382::ScanOptions;
///
/// let options = ScanOptions::default().window(Duration::from_secs(5));
/// assert_eq!(options.port, 48899);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Total collection window.
    pub window: Duration,
    /// Delay between probe rounds.
    pub broadcast_interval: Duration,
    /// Port probes go to, replies must come from, and the socket binds to.
    pub port: u16,
    /// Local address to bind.
    pub bind_addr: Ipv4Addr,
    /// Probe these addresses instead of every interface's broadcast address.
    pub targets: Option<Vec<Ipv4Addr>>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            window: DEFAULT_SCAN_WINDOW,
            broadcast_interval: DEFAULT_BROADCAST_INTERVAL,
            port: DISCOVERY_PORT,
            bind_addr: Ipv4Addr::UNSPECIFIED,
            targets: None,
        }
    }
}

impl ScanOptions {
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn broadcast_interval(mut self, interval: Duration) -> Self {
        self.broadcast_interval = interval;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn bind_addr(mut self, addr: Ipv4Addr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn targets(mut self, targets: Vec<Ipv4Addr>) -> Self {
        self.targets = Some(targets);
        self
    }
}

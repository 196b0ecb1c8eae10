//! Controller discovery via UDP broadcast.

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use if_addrs::IfAddr;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_PORT, Endpoint, Options, ScanOptions};
use crate::controller::Controller;
use crate::errors::Error;
use crate::runtime::{self, AsyncUdpSocket, Instant, UdpSocket};

type Result<T> = std::result::Result<T, Error>;

/// Payload broadcast to ask controllers to identify themselves.
pub const PROBE: &[u8] = b"HF-A11ASSISTHREAD";

/// A controller that answered a scan.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredController {
    /// IP address the controller reported
    pub ip: Ipv4Addr,
    /// MAC address as sent by the firmware, usually bare hex
    pub mac: String,
    /// Module name, e.g. `HF-LPB100-ZJ200`
    pub model: Option<String>,
}

impl DiscoveredController {
    /// Parse an `ip,mac,model` reply.
    ///
    /// # Examples
    ///
    /// ```
    /// use ld382::DiscoveredController;
    ///
    /// let found = DiscoveredController::parse("192.168.1.23,ACCF2344B0C2,HF-LPB100-ZJ200").unwrap();
    /// assert_eq!(found.ip.to_string(), "192.168.1.23");
    /// assert_eq!(found.model.as_deref(), Some("HF-LPB100-ZJ200"));
    /// ```
    pub fn parse(reply: &str) -> Result<Self> {
        let invalid = || Error::InvalidReply(reply.to_string());
        let mut fields = reply.trim().splitn(3, ',');

        let ip: Ipv4Addr = fields
            .next()
            .and_then(|ip| ip.trim().parse().ok())
            .ok_or_else(invalid)?;
        let mac = fields
            .next()
            .map(str::trim)
            .filter(|mac| !mac.is_empty())
            .ok_or_else(invalid)?
            .to_string();
        let model = fields
            .next()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .map(String::from);

        Ok(DiscoveredController { ip, mac, model })
    }

    /// Build a [`Controller`] for this device on the default command port.
    pub fn into_controller(self, options: Options) -> Controller {
        Controller::new(Endpoint::new(self.ip.to_string(), DEFAULT_PORT, options))
    }
}

/// Broadcast address of the subnet `ip` lives in.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use ld382::subnet_broadcast;
///
/// let broadcast = subnet_broadcast(Ipv4Addr::new(192, 168, 1, 37), Ipv4Addr::new(255, 255, 255, 0));
/// assert_eq!(broadcast, Ipv4Addr::new(192, 168, 1, 255));
/// ```
pub fn subnet_broadcast(ip: Ipv4Addr, netmask: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(ip) | !u32::from(netmask))
}

/// Broadcast addresses of every non-loopback IPv4 interface, without
/// duplicates. Empty if interfaces cannot be listed.
pub fn broadcast_addresses() -> Vec<Ipv4Addr> {
    let interfaces = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            warn!("Could not list network interfaces: {e}");
            return Vec::new();
        }
    };

    let mut addresses = Vec::new();
    for iface in interfaces {
        if iface.is_loopback() {
            continue;
        }
        if let IfAddr::V4(v4) = &iface.addr {
            let broadcast = subnet_broadcast(v4.ip, v4.netmask);
            if !addresses.contains(&broadcast) {
                addresses.push(broadcast);
            }
        }
    }
    addresses
}

/// Reply collector for one scan: first-seen order, no duplicates.
struct Replies {
    port: u16,
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl Replies {
    fn new(port: u16) -> Self {
        Replies {
            port,
            seen: HashSet::new(),
            ordered: Vec::new(),
        }
    }

    /// Returns whether the datagram was a new reply.
    fn accept(&mut self, datagram: &[u8], from: SocketAddr) -> bool {
        // our own probe echoes back on some platforms
        if from.port() != self.port || datagram == PROBE {
            return false;
        }

        let message = String::from_utf8_lossy(datagram).into_owned();
        debug!("Broadcast reply from {}: {message}", from.ip());
        if !self.seen.insert(message.clone()) {
            return false;
        }
        self.ordered.push(message);
        true
    }

    fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

/// Scan the local subnets for controllers with the default port and bind
/// address.
///
/// Probes every interface's broadcast address each `broadcast_interval` and
/// returns the distinct replies seen within `window`, in arrival order.
/// Replies are typically `ip,mac,model`.
///
/// # Examples
///
/// ```ignore
/// use std::time::Duration;
/// use ld382::scan;
///
/// let replies = scan(Duration::from_secs(3), Duration::from_millis(300)).await?;
/// for reply in replies {
///     println!("{}", reply.replace(',', "\t"));
/// }
/// ```
pub async fn scan(window: Duration, broadcast_interval: Duration) -> Result<Vec<String>> {
    let options = ScanOptions::default()
        .window(window)
        .broadcast_interval(broadcast_interval);
    scan_with(&options).await
}

/// Run a scan with explicit [`ScanOptions`].
///
/// Fails only if the discovery socket cannot be bound or switched to
/// broadcast. Probe send failures are logged and the scan carries on; no
/// reply at all is an empty, successful result.
pub async fn scan_with(options: &ScanOptions) -> Result<Vec<String>> {
    let targets = match &options.targets {
        Some(targets) => targets.clone(),
        None => broadcast_addresses(),
    };
    debug!("Broadcast addresses: {targets:?}");

    let socket = UdpSocket::bind(&format!("{}:{}", options.bind_addr, options.port))
        .await
        .map_err(|e| Error::socket("bind", e))?;
    socket
        .set_broadcast(true)
        .map_err(|e| Error::socket("set_broadcast", e))?;
    if let Ok(local) = socket.local_addr() {
        debug!("Listening on {local}");
    }

    let interval = options.broadcast_interval.max(Duration::from_millis(1));
    let mut replies = Replies::new(options.port);
    let mut buffer = [0u8; 1024];
    let start = Instant::now();
    let mut next_probe = interval;

    loop {
        let elapsed = start.elapsed();
        if elapsed >= options.window {
            break;
        }
        if elapsed >= next_probe {
            broadcast(&socket, &targets, options.port).await;
            next_probe += interval;
            continue;
        }

        let wait = next_probe.min(options.window) - elapsed;
        match runtime::timeout(wait, socket.recv_from(&mut buffer)).await {
            Ok(Ok((size, from))) => {
                replies.accept(&buffer[..size], from);
            }
            Ok(Err(e)) => debug!("Receive error during scan: {e}"),
            // Timeout elapsed - time to probe again or stop
            Err(_) => {}
        }
    }

    debug!("End scanning");
    Ok(replies.into_vec())
}

/// Scan and parse every reply, skipping ones that are not `ip,mac,model`.
pub async fn discover_controllers(options: &ScanOptions) -> Result<Vec<DiscoveredController>> {
    let replies = scan_with(options).await?;
    Ok(replies
        .iter()
        .filter_map(|reply| match DiscoveredController::parse(reply) {
            Ok(found) => Some(found),
            Err(e) => {
                debug!("Skipping reply: {e}");
                None
            }
        })
        .collect())
}

async fn broadcast(socket: &UdpSocket, targets: &[Ipv4Addr], port: u16) {
    for ip in targets {
        debug!("Broadcasting {} to {ip}", String::from_utf8_lossy(PROBE));
        if let Err(e) = socket.send_to(PROBE, &format!("{ip}:{port}")).await {
            warn!("Failed to send discovery probe to {ip}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from(ip: [u8; 4], port: u16) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::from(ip), port))
    }

    fn free_udp_port() -> u16 {
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.local_addr().unwrap().port()
    }

    // 127.0.0.2 and up are only routable on Linux
    #[cfg(target_os = "linux")]
    async fn fake_device(addr: String, reply: &'static str) -> tokio::task::JoinHandle<()> {
        let socket = tokio::net::UdpSocket::bind(&addr).await.unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            while let Ok((n, peer)) = socket.recv_from(&mut buf).await {
                if &buf[..n] == PROBE {
                    for _ in 0..3 {
                        let _ = socket.send_to(reply.as_bytes(), peer).await;
                    }
                }
            }
        })
    }

    #[test]
    fn test_subnet_broadcast() {
        assert_eq!(
            subnet_broadcast(Ipv4Addr::new(10, 1, 2, 3), Ipv4Addr::new(255, 0, 0, 0)),
            Ipv4Addr::new(10, 255, 255, 255)
        );
        assert_eq!(
            subnet_broadcast(Ipv4Addr::new(172, 16, 5, 9), Ipv4Addr::new(255, 255, 252, 0)),
            Ipv4Addr::new(172, 16, 7, 255)
        );
    }

    #[test]
    fn test_broadcast_addresses_skip_loopback() {
        assert!(!broadcast_addresses().iter().any(|addr| addr.is_loopback()));
    }

    #[test]
    fn test_replies_dedupe_in_first_seen_order() {
        let mut replies = Replies::new(48899);
        assert!(replies.accept(b"10.0.0.2,AA,M1", from([10, 0, 0, 2], 48899)));
        assert!(replies.accept(b"10.0.0.3,BB,M2", from([10, 0, 0, 3], 48899)));
        assert!(!replies.accept(b"10.0.0.2,AA,M1", from([10, 0, 0, 2], 48899)));
        assert!(!replies.accept(b"10.0.0.3,BB,M2", from([10, 0, 0, 9], 48899)));
        assert_eq!(replies.into_vec(), vec!["10.0.0.2,AA,M1", "10.0.0.3,BB,M2"]);
    }

    #[test]
    fn test_replies_filter_probe_and_foreign_ports() {
        let mut replies = Replies::new(48899);
        assert!(!replies.accept(PROBE, from([10, 0, 0, 1], 48899)));
        assert!(!replies.accept(b"10.0.0.2,AA,M1", from([10, 0, 0, 2], 5000)));
        assert!(replies.into_vec().is_empty());
    }

    #[test]
    fn test_parse_reply() {
        let found = DiscoveredController::parse("10.0.0.2,ACCF23000001,HF-LPB100\r\n").unwrap();
        assert_eq!(found.ip, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(found.mac, "ACCF23000001");
        assert_eq!(found.model.as_deref(), Some("HF-LPB100"));

        let bare = DiscoveredController::parse("10.0.0.2,ACCF23000001").unwrap();
        assert_eq!(bare.model, None);
        assert!(DiscoveredController::parse("+ok").is_err());
        assert!(DiscoveredController::parse("10.0.0.2,").is_err());
    }

    #[test]
    fn test_discovered_json_skips_missing_model() {
        let found = DiscoveredController::parse("10.0.0.2,ACCF23000001").unwrap();
        let json = serde_json::to_value(&found).unwrap();
        assert!(json.get("model").is_none());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_scan_collects_each_reply_once() {
        let port = free_udp_port();
        let a = fake_device(format!("127.0.0.2:{port}"), "127.0.0.2,AABBCCDDEEFF,HF-LPB100").await;
        let b = fake_device(format!("127.0.0.3:{port}"), "127.0.0.3,112233445566,HF-LPB100-ZJ200").await;

        let options = ScanOptions::default()
            .port(port)
            .bind_addr(Ipv4Addr::LOCALHOST)
            // probing ourselves checks the echo filter
            .targets(vec![
                Ipv4Addr::new(127, 0, 0, 2),
                Ipv4Addr::new(127, 0, 0, 3),
                Ipv4Addr::LOCALHOST,
            ])
            .window(Duration::from_millis(800))
            .broadcast_interval(Duration::from_millis(100));

        let mut replies = scan_with(&options).await.unwrap();
        a.abort();
        b.abort();

        replies.sort();
        assert_eq!(
            replies,
            vec![
                "127.0.0.2,AABBCCDDEEFF,HF-LPB100".to_string(),
                "127.0.0.3,112233445566,HF-LPB100-ZJ200".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_without_replies_is_empty() {
        let options = ScanOptions::default()
            .port(free_udp_port())
            .bind_addr(Ipv4Addr::LOCALHOST)
            .targets(vec![Ipv4Addr::LOCALHOST])
            .window(Duration::from_millis(250))
            .broadcast_interval(Duration::from_millis(50));

        let started = std::time::Instant::now();
        let replies = scan_with(&options).await.unwrap();
        assert!(replies.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_scan_fails_when_port_is_taken() {
        let holder = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = holder.local_addr().unwrap().port();
        let options = ScanOptions::default()
            .port(port)
            .bind_addr(Ipv4Addr::LOCALHOST)
            .targets(Vec::new())
            .window(Duration::from_millis(100));

        match scan_with(&options).await {
            Err(Error::Socket { action, .. }) => assert_eq!(action, "bind"),
            other => panic!("expected bind error, got {other:?}"),
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_discover_controllers_parses_replies() {
        let port = free_udp_port();
        let device = fake_device(format!("127.0.0.4:{port}"), "127.0.0.4,DEADBEEF0001,HF-A11").await;

        let options = ScanOptions::default()
            .port(port)
            .bind_addr(Ipv4Addr::LOCALHOST)
            .targets(vec![Ipv4Addr::new(127, 0, 0, 4)])
            .window(Duration::from_millis(400))
            .broadcast_interval(Duration::from_millis(100));

        let found = discover_controllers(&options).await.unwrap();
        device.abort();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].mac, "DEADBEEF0001");
        let controller = found[0].clone().into_controller(Options::no_retry());
        assert_eq!(controller.endpoint().address(), "127.0.0.4:5577");
    }
}

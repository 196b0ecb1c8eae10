//! Connection management for a single controller.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::StreamExt;
use futures::channel::{mpsc, oneshot};
use futures::future::{self, Either};
use log::{debug, info};
use serde::Serialize;
use serde_json::{Value, json};

use crate::command::{Command, hex_bytes};
use crate::config::Endpoint;
use crate::errors::Error;
use crate::events::{ConnectionEvent, EventStream, Subscribers};
use crate::history::FrameHistory;
use crate::runtime::{self, AsyncTcpStream, TcpStream};
use crate::types::{Color, PowerMode, ProgramMode, Speed, White};

/// Lifecycle state of a [`Controller`]'s socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// [`Controller::disconnect`] was called and the socket is shutting down.
    Closing,
}

/// Outcome of a [`Transmission`].
///
/// `Flushed` means the frame was written to the transport. The protocol has
/// no acknowledgement, so it says nothing about whether the device acted on
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Written and flushed to the socket.
    Flushed,
    /// Not sent because the controller was not connected.
    NotConnected,
    /// Queued, but the connection failed or closed before the write finished.
    /// The cause is reported as a [`ConnectionEvent::Error`].
    Dropped,
}

impl Delivery {
    pub fn is_flushed(&self) -> bool {
        matches!(self, Delivery::Flushed)
    }
}

/// Completion of one queued frame.
///
/// The frame is queued when the operation is called, whether or not this is
/// awaited; awaiting only observes the outcome.
#[derive(Debug)]
pub struct Transmission {
    rx: Option<oneshot::Receiver<()>>,
}

impl Transmission {
    fn not_connected() -> Self {
        Transmission { rx: None }
    }
}

impl Future for Transmission {
    type Output = Delivery;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Delivery> {
        match self.rx.as_mut() {
            None => Poll::Ready(Delivery::NotConnected),
            Some(rx) => Pin::new(rx).poll(cx).map(|result| match result {
                Ok(()) => Delivery::Flushed,
                Err(_) => Delivery::Dropped,
            }),
        }
    }
}

enum Request {
    Frame {
        frame: Vec<u8>,
        done: oneshot::Sender<()>,
    },
    /// Flush what is queued, then half-close.
    Close,
}

/// Dropping the sender cancels the timer task.
struct RetryTimer {
    id: u64,
    _cancel: oneshot::Sender<()>,
}

struct Inner {
    state: ConnectionState,
    /// Set by an explicit disconnect; suppresses retries.
    closed: bool,
    retrying: bool,
    session: u64,
    writer: Option<mpsc::UnboundedSender<Request>>,
    retry: Option<RetryTimer>,
    next_timer_id: u64,
    subscribers: Subscribers,
    history: FrameHistory,
}

impl Inner {
    fn emit(&mut self, event: ConnectionEvent) {
        match &event {
            ConnectionEvent::Connected => self.history.record_event("connected"),
            ConnectionEvent::Closed { had_error } => self
                .history
                .record_event(if *had_error { "closed after error" } else { "closed" }),
            ConnectionEvent::Error(err) => {
                self.history.record_event("error");
                self.history.record_error(&err.to_string());
            }
        }
        self.subscribers.emit(event);
    }

    fn error(&mut self, err: Error) {
        self.emit(ConnectionEvent::Error(Arc::new(err)));
    }
}

struct Shared {
    endpoint: Endpoint,
    inner: Mutex<Inner>,
}

enum Step {
    Read(std::io::Result<usize>),
    Request(Option<Request>),
}

impl Shared {
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    /// How long a closing socket waits for the peer to close its side.
    const LINGER: Duration = Duration::from_secs(2);

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a connection attempt unless a socket already exists.
    ///
    /// Retry attempts (`explicit == false`) give up if the caller has
    /// disconnected in the meantime.
    fn start(self: &Arc<Self>, explicit: bool) {
        let session = {
            let mut inner = self.lock();
            if inner.state != ConnectionState::Disconnected {
                return;
            }
            if explicit {
                inner.closed = false;
            } else if inner.closed {
                return;
            }
            inner.retry = None;
            inner.state = ConnectionState::Connecting;
            inner.session += 1;
            inner.session
        };

        debug!("Connecting to {}", self.endpoint.address());
        let shared = Arc::clone(self);
        runtime::spawn(async move { shared.run(session).await });
    }

    async fn run(self: Arc<Self>, session: u64) {
        let address = self.endpoint.address();
        let connected = runtime::timeout(Self::CONNECT_TIMEOUT, TcpStream::connect(&address))
            .await
            .unwrap_or_else(|_| {
                Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "connect timed out",
                ))
            });

        let had_error = match connected {
            Ok(stream) => self.serve(stream).await,
            Err(err) => {
                debug!("Connection error {address}: {err}");
                self.lock().error(Error::connect(
                    self.endpoint.hostname(),
                    self.endpoint.port(),
                    err,
                ));
                true
            }
        };

        self.finish(session, had_error);
    }

    /// Pump queued frames into the socket until it closes. Returns whether
    /// the close followed an error.
    async fn serve(&self, mut stream: TcpStream) -> bool {
        let address = self.endpoint.address();
        let (tx, mut requests) = mpsc::unbounded();
        {
            let mut inner = self.lock();
            inner.state = ConnectionState::Connected;
            inner.retrying = false;
            debug!("Connection to {address} established");
            inner.emit(ConnectionEvent::Connected);

            if inner.closed {
                // disconnect() raced the connect
                inner.state = ConnectionState::Closing;
                let _ = tx.unbounded_send(Request::Close);
            } else {
                inner.writer = Some(tx);
            }
        }

        let mut buf = [0u8; 256];
        let mut requests_open = true;
        let mut closing = false;

        loop {
            let step = if closing {
                match runtime::timeout(Self::LINGER, stream.read(&mut buf)).await {
                    Ok(result) => Step::Read(result),
                    Err(_) => {
                        debug!("Connection to {address} not closed by peer, dropping it");
                        return false;
                    }
                }
            } else if requests_open {
                let read = stream.read(&mut buf);
                let next = requests.next();
                futures::pin_mut!(read, next);
                match future::select(read, next).await {
                    Either::Left((result, _)) => Step::Read(result),
                    Either::Right((request, _)) => Step::Request(request),
                }
            } else {
                Step::Read(stream.read(&mut buf).await)
            };

            match step {
                Step::Read(Ok(0)) => {
                    debug!("Connection to {address} ended");
                    return false;
                }
                Step::Read(Ok(n)) => {
                    debug!("Ignoring {n} unsolicited bytes from {address}");
                }
                Step::Read(Err(err)) => {
                    self.lock().error(Error::socket("read", err));
                    return true;
                }
                Step::Request(Some(Request::Frame { frame, done })) => {
                    if let Err(err) = stream.write_all(&frame).await {
                        self.lock().error(Error::socket("write", err));
                        return true;
                    }
                    debug!("Wrote: {}", hex_bytes(&frame));
                    self.lock().history.record_frame(&frame);
                    let _ = done.send(());
                }
                Step::Request(Some(Request::Close)) => {
                    debug!("Closing connection to {address}");
                    if let Err(err) = stream.shutdown_write().await {
                        self.lock().error(Error::socket("shutdown", err));
                        return true;
                    }
                    closing = true;
                }
                Step::Request(None) => requests_open = false,
            }
        }
    }

    fn finish(self: &Arc<Self>, session: u64, had_error: bool) {
        let mut inner = self.lock();
        if inner.session != session {
            return;
        }

        if had_error {
            debug!("Connection to {} closed due to errors", self.endpoint.address());
        } else {
            debug!("Connection to {} closed", self.endpoint.address());
        }

        inner.state = ConnectionState::Disconnected;
        inner.writer = None;
        inner.emit(ConnectionEvent::Closed { had_error });

        if self.endpoint.retries() && !inner.closed {
            self.schedule_retry(&mut inner);
        }
    }

    /// Arm the retry timer, replacing (and so cancelling) any pending one.
    fn schedule_retry(self: &Arc<Self>, inner: &mut Inner) {
        let delay = self.endpoint.retry_interval();
        if !inner.retrying {
            info!(
                "Retrying connection to {} every {}ms",
                self.endpoint.address(),
                delay.as_millis()
            );
        }
        inner.retrying = true;

        inner.next_timer_id += 1;
        let id = inner.next_timer_id;
        let (cancel, cancelled) = oneshot::channel::<()>();
        inner.retry = Some(RetryTimer {
            id,
            _cancel: cancel,
        });

        let shared = Arc::clone(self);
        runtime::spawn(async move {
            let sleep = runtime::sleep(delay);
            futures::pin_mut!(sleep);
            if let Either::Right(_) = future::select(cancelled, sleep).await {
                shared.retry_fired(id);
            }
        });
    }

    fn retry_fired(self: &Arc<Self>, id: u64) {
        {
            let mut inner = self.lock();
            // superseded or cancelled
            if inner.retry.as_ref().map(|timer| timer.id) != Some(id) {
                return;
            }
            inner.retry = None;
        }
        self.start(false);
    }
}

/// A persistent connection to one LD382 controller.
///
/// The controller connects in the background and reports progress as
/// [`ConnectionEvent`]s. Commands issued while not connected are dropped, not
/// queued: wait for [`ConnectionEvent::Connected`] before sending, and await
/// each [`Transmission`] if ordering across commands matters.
///
/// Lost connections are retried every [`Endpoint::retry_interval`] until
/// [`disconnect`](Controller::disconnect) is called. A zero interval disables
/// retrying.
///
/// # Example
///
/// ```no_run
/// use ld382::{Color, Controller, Endpoint};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let (controller, mut events) = Controller::open(Endpoint::host("192.168.1.50"));
/// if let Some(Ok(())) = events.connected().await {
///     controller.power_on().await;
///     controller.rgb(Color::rgb(255, 0, 0)).await;
/// }
/// controller.disconnect();
/// # Ok(())
/// # }
/// ```
pub struct Controller {
    shared: Arc<Shared>,
}

impl Controller {
    /// Create a disconnected controller. Nothing happens until
    /// [`connect`](Controller::connect).
    pub fn new(endpoint: Endpoint) -> Self {
        Controller {
            shared: Arc::new(Shared {
                endpoint,
                inner: Mutex::new(Inner {
                    state: ConnectionState::Disconnected,
                    closed: false,
                    retrying: false,
                    session: 0,
                    writer: None,
                    retry: None,
                    next_timer_id: 0,
                    subscribers: Subscribers::default(),
                    history: FrameHistory::new(),
                }),
            }),
        }
    }

    /// Create a controller, subscribe to its events and start connecting.
    ///
    /// Must be called from within the async runtime.
    pub fn open(endpoint: Endpoint) -> (Self, EventStream) {
        let controller = Self::new(endpoint);
        let events = controller.events();
        controller.connect();
        (controller, events)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.shared.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Whether a reconnect attempt is scheduled.
    pub fn is_retry_pending(&self) -> bool {
        self.shared.lock().retry.is_some()
    }

    /// Subscribe to lifecycle events. Only events emitted after this call are
    /// delivered.
    pub fn events(&self) -> EventStream {
        self.shared.lock().subscribers.subscribe()
    }

    /// Start connecting. A no-op while a socket is connecting, connected or
    /// closing. Clears a previous [`disconnect`](Controller::disconnect), so
    /// retries apply again.
    ///
    /// Must be called from within the async runtime.
    pub fn connect(&self) {
        self.shared.start(true);
    }

    /// Close the connection and stop retrying.
    ///
    /// Queued frames are flushed before the socket is half-closed. Calling
    /// this more than once is harmless.
    pub fn disconnect(&self) {
        let mut inner = self.shared.lock();
        if !inner.closed {
            debug!("Disconnecting from {}", self.shared.endpoint.address());
        }
        inner.closed = true;
        inner.retry = None;
        inner.retrying = false;

        match inner.state {
            ConnectionState::Connected => {
                inner.state = ConnectionState::Closing;
                if let Some(writer) = inner.writer.take() {
                    let _ = writer.unbounded_send(Request::Close);
                }
            }
            ConnectionState::Connecting => inner.state = ConnectionState::Closing,
            ConnectionState::Disconnected | ConnectionState::Closing => {}
        }
    }

    /// Send raw operation bytes; the checksum is appended.
    pub fn send(&self, bytes: &[u8]) -> Transmission {
        self.send_command(&Command::raw(bytes))
    }

    /// Queue `command`'s frame for writing.
    ///
    /// When not connected this does nothing and the returned transmission
    /// resolves to [`Delivery::NotConnected`].
    pub fn send_command(&self, command: &Command) -> Transmission {
        let inner = self.shared.lock();
        let writer = match (&inner.state, &inner.writer) {
            (ConnectionState::Connected, Some(writer)) => writer,
            _ => {
                debug!("Socket not connected, aborting send");
                return Transmission::not_connected();
            }
        };

        let (done, rx) = oneshot::channel();
        // a closed queue drops `done`, which resolves as Delivery::Dropped
        let _ = writer.unbounded_send(Request::Frame {
            frame: command.frame(),
            done,
        });
        Transmission { rx: Some(rx) }
    }

    pub fn power_on(&self) -> Transmission {
        debug!("Power on");
        self.send_command(&Command::power_on())
    }

    pub fn power_off(&self) -> Transmission {
        debug!("Power off");
        self.send_command(&Command::power_off())
    }

    pub fn set_power(&self, mode: PowerMode) -> Transmission {
        match mode {
            PowerMode::On => self.power_on(),
            PowerMode::Off => self.power_off(),
        }
    }

    pub fn white(&self, level: White) -> Transmission {
        debug!("Set white to {}", level.value());
        self.send_command(&Command::white(level))
    }

    pub fn rgb(&self, color: Color) -> Transmission {
        debug!(
            "Set Red:{}, Green:{}, Blue:{}",
            color.red(),
            color.green(),
            color.blue()
        );
        self.send_command(&Command::rgb(color))
    }

    /// Run firmware program `code` at `speed`.
    pub fn program(&self, code: u8, speed: Speed) -> Transmission {
        debug!("Run program {code:#04x} at speed {}", speed.value());
        self.send_command(&Command::program(code, speed))
    }

    pub fn builtin_program(&self, program: ProgramMode, speed: Speed) -> Transmission {
        debug!("Run program {program} at speed {}", speed.value());
        self.send_command(&Command::builtin_program(program, speed))
    }

    pub fn history(&self) -> FrameHistory {
        self.shared.lock().history.clone()
    }

    pub fn clear_history(&self) {
        self.shared.lock().history.clear();
    }

    /// Returns diagnostics including endpoint, state and history.
    pub fn diagnostics(&self) -> Value {
        let inner = self.shared.lock();
        let endpoint = &self.shared.endpoint;
        json!({
            "host": endpoint.hostname(),
            "port": endpoint.port(),
            "retry_interval_ms": endpoint.retry_interval().as_millis() as u64,
            "state": inner.state,
            "retry_pending": inner.retry.is_some(),
            "history": serde_json::to_value(inner.history.summary()).unwrap_or(Value::Null),
        })
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.disconnect();
        self.shared.lock().subscribers.close();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    use super::*;
    use crate::config::Options;

    const WAIT: Duration = Duration::from_secs(3);

    async fn next_event(events: &mut EventStream) -> ConnectionEvent {
        timeout(WAIT, events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event stream ended")
    }

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn endpoint(port: u16, retry_ms: u64) -> Endpoint {
        Endpoint::new(
            "127.0.0.1",
            port,
            Options::with_retry_interval(Duration::from_millis(retry_ms)),
        )
    }

    #[tokio::test]
    async fn test_send_while_disconnected_is_noop() {
        let controller = Controller::new(endpoint(closed_port(), 0));
        assert_eq!(controller.state(), ConnectionState::Disconnected);
        assert_eq!(controller.power_on().await, Delivery::NotConnected);
        assert_eq!(controller.send(&[0x71]).await, Delivery::NotConnected);
        assert!(controller.history().is_empty());
    }

    #[tokio::test]
    async fn test_frames_are_written_with_checksum() {
        let (listener, port) = listener().await;
        let (controller, mut events) = Controller::open(endpoint(port, 0));
        let (mut peer, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();

        assert!(next_event(&mut events).await.is_connected());
        assert!(controller.is_connected());

        assert_eq!(controller.power_on().await, Delivery::Flushed);
        assert_eq!(controller.rgb(Color::rgb(255, 0, 0)).await, Delivery::Flushed);
        assert_eq!(controller.white(White::full()).await, Delivery::Flushed);

        let mut received = [0u8; 4 + 9 + 8];
        timeout(WAIT, peer.read_exact(&mut received))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&received[..4], &[0x71, 0x23, 0x0f, 0xa3]);
        assert_eq!(
            &received[4..13],
            &[0x31, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x30, 0x60]
        );
        assert_eq!(
            &received[13..],
            &[0x31, 0xff, 0xff, 0xff, 0xff, 0x00, 0x0f, 0x3c]
        );
        assert_eq!(controller.history().summary().frames_sent, 3);
    }

    #[tokio::test]
    async fn test_disconnect_half_closes_and_suppresses_retry() {
        let (listener, port) = listener().await;
        let (controller, mut events) = Controller::open(endpoint(port, 100));
        let (mut peer, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        assert!(next_event(&mut events).await.is_connected());

        let pending = controller.power_off();
        controller.disconnect();
        controller.disconnect();
        assert_eq!(controller.state(), ConnectionState::Closing);
        assert_eq!(controller.power_on().await, Delivery::NotConnected);
        assert_eq!(pending.await, Delivery::Flushed);

        // queued frame arrives, then EOF from the half-close
        let mut received = Vec::new();
        timeout(WAIT, peer.read_to_end(&mut received))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, vec![0x71, 0x24, 0x0f, 0xa4]);
        drop(peer);

        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Closed { had_error: false }
        ));
        assert_eq!(controller.state(), ConnectionState::Disconnected);
        assert!(!controller.is_retry_pending());

        assert!(
            timeout(Duration::from_millis(400), listener.accept())
                .await
                .is_err(),
            "no reconnect after disconnect"
        );
    }

    #[tokio::test]
    async fn test_refused_connection_emits_error_then_close() {
        let (controller, mut events) = Controller::open(endpoint(closed_port(), 0));

        match next_event(&mut events).await {
            ConnectionEvent::Error(err) => assert!(matches!(*err, Error::Connect { .. })),
            other => panic!("expected error, got {other:?}"),
        }
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Closed { had_error: true }
        ));
        assert_eq!(controller.state(), ConnectionState::Disconnected);
        assert!(!controller.is_retry_pending());
        assert!(controller.history().last_error().is_some());
    }

    #[tokio::test]
    async fn test_reconnects_after_peer_close() {
        let (listener, port) = listener().await;
        let (controller, mut events) = Controller::open(endpoint(port, 500));

        let (peer, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        assert!(next_event(&mut events).await.is_connected());

        let closed_at = Instant::now();
        drop(peer);
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Closed { had_error: false }
        ));
        assert!(controller.is_retry_pending());

        let (_peer, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        let elapsed = closed_at.elapsed();
        assert!(elapsed >= Duration::from_millis(500), "retried after {elapsed:?}");
        assert!(elapsed < Duration::from_millis(1000), "retried after {elapsed:?}");

        assert!(next_event(&mut events).await.is_connected());
        assert!(!controller.is_retry_pending());
    }

    #[tokio::test]
    async fn test_reset_mid_session_reports_error_and_retries() {
        let (listener, port) = listener().await;
        let (controller, mut events) = Controller::open(endpoint(port, 100));

        let (peer, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        assert!(next_event(&mut events).await.is_connected());

        // zero linger turns the close into a RST
        peer.set_linger(Some(Duration::ZERO)).unwrap();
        drop(peer);

        match next_event(&mut events).await {
            ConnectionEvent::Error(err) => match &*err {
                Error::Socket { action, .. } => assert_eq!(action, "read"),
                other => panic!("expected read error, got {other:?}"),
            },
            other => panic!("expected error, got {other:?}"),
        }
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Closed { had_error: true }
        ));
        assert!(controller.is_retry_pending());

        let (_peer, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        assert!(next_event(&mut events).await.is_connected());
        assert!(controller.history().last_error().is_some());
    }

    #[tokio::test]
    async fn test_rearming_keeps_a_single_retry_timer() {
        let (listener, port) = listener().await;
        let controller = Controller::new(endpoint(port, 200));
        let mut events = controller.events();

        {
            let shared = &controller.shared;
            let mut inner = shared.lock();
            for _ in 0..3 {
                shared.schedule_retry(&mut inner);
            }
        }
        assert!(controller.is_retry_pending());

        let (_peer, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        assert!(next_event(&mut events).await.is_connected());
        assert!(
            timeout(Duration::from_millis(500), listener.accept())
                .await
                .is_err(),
            "superseded timers must not connect"
        );
        assert!(timeout(Duration::from_millis(100), events.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_flapping_peer_never_stacks_retries() {
        let (listener, port) = listener().await;
        let (_controller, _events) = Controller::open(endpoint(port, 100));

        let started = Instant::now();
        let mut accepted = 0;
        while started.elapsed() < Duration::from_millis(1050) {
            let remaining = Duration::from_millis(1050).saturating_sub(started.elapsed());
            match timeout(remaining, listener.accept()).await {
                Ok(Ok((peer, _))) => {
                    accepted += 1;
                    drop(peer);
                }
                _ => break,
            }
        }

        // one attempt at start, then at most one per interval
        assert!(accepted >= 3, "only {accepted} attempts");
        assert!(accepted <= 11, "{accepted} attempts in ~1s");
    }

    #[tokio::test]
    async fn test_disconnect_cancels_pending_retry() {
        let (controller, mut events) = Controller::open(endpoint(closed_port(), 100));
        assert!(matches!(next_event(&mut events).await, ConnectionEvent::Error(_)));
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Closed { had_error: true }
        ));
        assert!(controller.is_retry_pending());

        controller.disconnect();
        assert!(!controller.is_retry_pending());
        assert!(
            timeout(Duration::from_millis(300), events.recv())
                .await
                .is_err()
        );
        assert_eq!(controller.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_is_noop_while_connected() {
        let (listener, port) = listener().await;
        let (controller, mut events) = Controller::open(endpoint(port, 0));
        let (_peer, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        assert!(next_event(&mut events).await.is_connected());

        controller.connect();
        assert!(
            timeout(Duration::from_millis(200), listener.accept())
                .await
                .is_err(),
            "a second socket was opened"
        );
    }

    #[tokio::test]
    async fn test_diagnostics() {
        let controller = Controller::new(endpoint(5577, 250));
        let diag = controller.diagnostics();
        assert_eq!(diag["host"], "127.0.0.1");
        assert_eq!(diag["port"], 5577);
        assert_eq!(diag["retry_interval_ms"], 250);
        assert_eq!(diag["state"], "Disconnected");
        assert_eq!(diag["retry_pending"], false);
    }
}

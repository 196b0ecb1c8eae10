//! Connection lifecycle notifications.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::mpsc;
use futures::{Stream, StreamExt};

use crate::errors::Error;

/// A lifecycle notification from a [`Controller`](crate::Controller).
///
/// For an established connection `Connected` always precedes its `Closed`.
/// A failed attempt yields `Error` followed by `Closed { had_error: true }`
/// with no `Connected`.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// The socket is established and commands will be written.
    Connected,
    /// The socket is gone; `had_error` tells whether an error preceded it.
    Closed { had_error: bool },
    /// Lookup, connect or I/O failure. Never fatal to the controller.
    Error(Arc<Error>),
}

impl ConnectionEvent {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionEvent::Connected)
    }
}

/// Stream of [`ConnectionEvent`]s for one subscriber.
///
/// Ends once the controller it was obtained from is dropped.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<ConnectionEvent>,
}

impl EventStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<ConnectionEvent>) -> Self {
        Self { rx }
    }

    /// Receive the next event, or `None` when the controller is gone.
    pub async fn recv(&mut self) -> Option<ConnectionEvent> {
        self.rx.next().await
    }

    /// Wait until the controller reports `Connected`.
    ///
    /// Returns the first error seen instead if the attempt fails, or `None` if
    /// the stream ends first.
    pub async fn connected(&mut self) -> Option<Result<(), Arc<Error>>> {
        while let Some(event) = self.recv().await {
            match event {
                ConnectionEvent::Connected => return Some(Ok(())),
                ConnectionEvent::Error(err) => return Some(Err(err)),
                ConnectionEvent::Closed { .. } => {}
            }
        }
        None
    }

    /// Wait until the current connection closes.
    ///
    /// Returns the error that brought it down, if any. Ends with `Ok` when the
    /// stream ends first.
    pub async fn closed(&mut self) -> Result<(), Arc<Error>> {
        let mut last_error = None;
        while let Some(event) = self.recv().await {
            match event {
                ConnectionEvent::Error(err) => last_error = Some(err),
                ConnectionEvent::Closed { had_error: false } => return Ok(()),
                ConnectionEvent::Closed { had_error: true } => {
                    return Err(last_error.unwrap_or_else(|| {
                        Arc::new(Error::socket(
                            "close",
                            std::io::Error::other("connection closed after an error"),
                        ))
                    }));
                }
                ConnectionEvent::Connected => {}
            }
        }
        Ok(())
    }
}

impl Stream for EventStream {
    type Item = ConnectionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

/// Fan-out of events to every live subscriber.
#[derive(Default)]
pub(crate) struct Subscribers {
    senders: Vec<mpsc::UnboundedSender<ConnectionEvent>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self) -> EventStream {
        let (tx, rx) = mpsc::unbounded();
        self.senders.push(tx);
        EventStream::new(rx)
    }

    pub(crate) fn emit(&mut self, event: ConnectionEvent) {
        self.senders
            .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }

    pub(crate) fn close(&mut self) {
        self.senders.clear();
    }
}

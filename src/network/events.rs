//! Side-channel events
//!
//! Things the loops report that no single caller is waiting for. The queue
//! is bounded and never blocks a loop: when full, the oldest event is
//! dropped to make room.

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};

/// Something the engine observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A request went out on the wire
    CommandSent { tag: String, command: String },

    /// A reply in the server-error band arrived
    ServerError { raw: String },

    /// A datagram was discarded (malformed, untagged or unknown tag)
    ClientError { message: String },

    /// The server answered a keep-alive ping
    KeepAliveAcknowledged { tag: String },

    /// Repeated timeouts made the engine pause sending
    Throttled,

    /// The server or the client ended the session
    SessionEnded,
}

/// Bounded multi-consumer event queue
#[derive(Debug)]
pub struct EventBus {
    tx: Sender<EngineEvent>,
    rx: Receiver<EngineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// Queue an event, evicting the oldest one if the queue is full
    pub fn emit(&self, event: EngineEvent) {
        let mut pending = event;
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => return,
                Err(TrySendError::Full(back)) => {
                    if let Ok(dropped) = self.rx.try_recv() {
                        tracing::trace!("Event queue full, dropping {:?}", dropped);
                    }
                    pending = back;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// A receiver for queued events; each event is delivered to one receiver
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        self.rx.clone()
    }
}

//! Engine Module
//!
//! The shared state both loops and every caller work against.
//!
//! ## Responsibilities
//! - Own Session, the tag registry and the two correlation maps
//! - Hand each submitted request a reply slot keyed by its tag
//! - Track consecutive timeouts and the throttle they trigger
//! - Remember the tag of the outstanding keep-alive ping

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::config::Config;
use crate::network::{EngineEvent, EventBus};
use crate::protocol::{CommandResult, CorrelationTag, ResultKind, ReturnCode, TagRegistry};
use crate::session::Session;

/// Reply slot for one submitted request
#[derive(Debug)]
struct Slot {
    kind: ResultKind,
    reply: Sender<CommandResult>,
}

/// Shared engine state
///
/// ## Concurrency Model
///
/// Every field is an independent lock or atomic. No method holds two of
/// them at once, so there is no lock ordering to respect:
/// - `slots`: registered at submit, consumed by whoever resolves the tag
/// - `awaiting`: written by the writer on send, consumed by the reader
/// - `tags`: reserved by callers and the writer, released by waiters
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Connection-scoped identity
    session: Mutex<Session>,

    /// Tags held by live requests
    tags: TagRegistry,

    /// Callers waiting on a result, by tag
    slots: Mutex<HashMap<String, Slot>>,

    /// Requests on the wire, by tag
    awaiting: Mutex<HashMap<String, ResultKind>>,

    /// Tag of the keep-alive ping nobody waits on
    keepalive_tag: Mutex<Option<CorrelationTag>>,

    /// Timeouts since the last answered request
    consecutive_timeouts: AtomicU32,

    /// Set while the server is assumed to be rate-limiting us
    throttled_since: Mutex<Option<Instant>>,

    /// When the last datagram went out, from any path
    last_send: Mutex<Option<Instant>>,

    /// Side-channel notifications
    events: EventBus,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            config,
            session: Mutex::new(Session::new()),
            tags: TagRegistry::new(),
            slots: Mutex::new(HashMap::new()),
            awaiting: Mutex::new(HashMap::new()),
            keepalive_tag: Mutex::new(None),
            consecutive_timeouts: AtomicU32::new(0),
            throttled_since: Mutex::new(None),
            last_send: Mutex::new(None),
            events,
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.session.lock().clone()
    }

    pub(crate) fn update_session<T>(&self, f: impl FnOnce(&mut Session) -> T) -> T {
        f(&mut self.session.lock())
    }

    /// End the session and announce it
    pub(crate) fn end_session(&self) {
        let was_logged_in = self.update_session(|session| {
            let was = session.is_logged_in();
            session.end();
            was
        });
        if was_logged_in {
            self.events.emit(EngineEvent::SessionEnded);
        }
    }

    // =========================================================================
    // Correlation
    // =========================================================================

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    /// Open a reply slot for `tag`
    pub fn register(&self, tag: &CorrelationTag, kind: ResultKind) -> Receiver<CommandResult> {
        let (reply, rx) = bounded(1);
        self.slots
            .lock()
            .insert(tag.as_str().to_string(), Slot { kind, reply });
        rx
    }

    /// Whether a caller still waits on `tag`
    pub fn is_pending(&self, tag: &str) -> bool {
        self.slots.lock().contains_key(tag)
    }

    /// Record that `tag` went out and expects a reply of `kind`
    pub(crate) fn mark_awaiting(&self, tag: &CorrelationTag, kind: ResultKind) {
        self.awaiting.lock().insert(tag.as_str().to_string(), kind);
    }

    /// Mark `tag` awaiting if its caller still holds the slot
    ///
    /// Returns false, leaving nothing behind, if the caller gave up. Pairs
    /// with [`forget`](Self::forget), which drops the slot before the
    /// awaiting entry: whichever side runs second cleans up.
    pub fn claim_for_send(&self, tag: &CorrelationTag, kind: ResultKind) -> bool {
        self.mark_awaiting(tag, kind);
        if self.is_pending(tag.as_str()) {
            return true;
        }
        self.take_awaiting(tag.as_str());
        false
    }

    /// Remove `tag` from the awaiting-reply set
    pub(crate) fn take_awaiting(&self, tag: &str) -> Option<ResultKind> {
        self.awaiting.lock().remove(tag)
    }

    /// Number of requests sent and not yet answered
    pub fn awaiting_count(&self) -> usize {
        self.awaiting.lock().len()
    }

    /// Deliver `result` to the caller holding `tag`
    ///
    /// Returns false if nobody is waiting any more.
    pub(crate) fn publish(&self, tag: &str, result: CommandResult) -> bool {
        self.take_awaiting(tag);
        let slot = self.slots.lock().remove(tag);
        match slot {
            Some(slot) => slot.reply.send(result).is_ok(),
            None => false,
        }
    }

    /// Deliver a locally built result with `code` to the caller holding `tag`
    pub(crate) fn resolve_locally(&self, tag: &str, code: ReturnCode) -> bool {
        self.take_awaiting(tag);
        let slot = self.slots.lock().remove(tag);
        match slot {
            Some(slot) => slot
                .reply
                .send(CommandResult::build(slot.kind, code, None))
                .is_ok(),
            None => false,
        }
    }

    /// Drop every trace of `tag` without resolving it
    pub fn forget(&self, tag: &str) {
        self.slots.lock().remove(tag);
        self.take_awaiting(tag);
    }

    /// Resolve every open slot with `ConnectionClosed`
    ///
    /// Returns how many callers were woken.
    pub(crate) fn drain(&self) -> usize {
        let slots: Vec<(String, Slot)> = self.slots.lock().drain().collect();
        self.awaiting.lock().clear();
        let keepalive = self.keepalive_tag.lock().take();
        if let Some(tag) = keepalive {
            self.tags.release(&tag);
        }

        let mut woken = 0;
        for (tag, slot) in slots {
            let result = CommandResult::build(slot.kind, ReturnCode::ConnectionClosed, None);
            if slot.reply.send(result).is_ok() {
                woken += 1;
            }
            tracing::debug!("Resolved {} with connection closed", tag);
        }
        woken
    }

    // =========================================================================
    // Keep-alive
    // =========================================================================

    /// Replace the outstanding keep-alive tag, returning the previous one
    pub(crate) fn replace_keepalive(&self, tag: CorrelationTag) -> Option<CorrelationTag> {
        self.keepalive_tag.lock().replace(tag)
    }

    /// Clear the keep-alive tag if it equals `tag`
    pub(crate) fn take_keepalive(&self, tag: &str) -> Option<CorrelationTag> {
        let mut guard = self.keepalive_tag.lock();
        if guard.as_ref().is_some_and(|held| held.as_str() == tag) {
            guard.take()
        } else {
            None
        }
    }

    // =========================================================================
    // Send clock
    // =========================================================================

    /// Record that a datagram just went out
    pub(crate) fn note_send(&self) {
        *self.last_send.lock() = Some(Instant::now());
    }

    /// Time left before another datagram may go out
    pub fn send_cooldown(&self) -> Duration {
        match *self.last_send.lock() {
            Some(at) => self.config.send_interval.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    // =========================================================================
    // Throttle
    // =========================================================================

    /// Count a waiter timeout; engages the throttle at the threshold
    pub(crate) fn record_timeout(&self) {
        let count = self.consecutive_timeouts.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Request timed out ({} in a row)", count);
        if count >= self.config.throttle_threshold {
            let mut since = self.throttled_since.lock();
            if since.is_none() {
                *since = Some(Instant::now());
                drop(since);
                tracing::warn!("{} consecutive timeouts, assuming rate limiting", count);
                self.events.emit(EngineEvent::Throttled);
            }
        }
    }

    /// Count an answered request
    pub(crate) fn record_success(&self) {
        self.consecutive_timeouts.store(0, Ordering::SeqCst);
    }

    /// Lift the throttle (any datagram proves the server talks to us)
    pub(crate) fn clear_throttle(&self) {
        if self.throttled_since.lock().take().is_some() {
            tracing::info!("Traffic from server, lifting throttle");
        }
    }

    /// Whether sending is paused; expires after `throttle_hold`
    pub fn is_throttled(&self) -> bool {
        let mut since = self.throttled_since.lock();
        let Some(at) = *since else {
            return false;
        };
        if at.elapsed() < self.config.throttle_hold {
            return true;
        }
        *since = None;
        drop(since);
        self.consecutive_timeouts.store(0, Ordering::SeqCst);
        tracing::info!("Throttle hold expired, resuming");
        false
    }

    pub fn consecutive_timeouts(&self) -> u32 {
        self.consecutive_timeouts.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn emit(&self, event: EngineEvent) {
        self.events.emit(event);
    }

    pub fn events(&self) -> Receiver<EngineEvent> {
        self.events.subscribe()
    }
}

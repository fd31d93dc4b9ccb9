//! Writer Loop
//!
//! Single thread that owns the send side of the socket.
//!
//! ## Each Iteration
//! 1. Throttled? Sleep in `throttle_backoff` steps until it lifts
//! 2. Request queued? Apply the dispatch policy, send, mark it awaiting
//! 3. Idle past `keepalive_idle`? Send a keep-alive PING
//! 4. After any send, sleep `send_interval`: the only rate limiter, and it
//!    covers keep-alives too

use std::fmt;
use std::net::UdpSocket;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{select, Receiver, RecvTimeoutError};

use crate::engine::Engine;
use crate::network::EngineEvent;
use crate::protocol::{commands, encode_request, Request, ResultKind, ReturnCode};
use crate::session::Session;

/// Why the dispatch policy refused a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineReason {
    AlreadyLoggedIn,
    AlreadyEncrypted,
    NoApiKey,
    EncryptAfterLogin,
    NotLoggedIn,
}

impl fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DeclineReason::AlreadyLoggedIn => "already logged in",
            DeclineReason::AlreadyEncrypted => "encryption already enabled",
            DeclineReason::NoApiKey => "no API key configured",
            DeclineReason::EncryptAfterLogin => "encryption must precede login",
            DeclineReason::NotLoggedIn => "not logged in",
        };
        f.write_str(text)
    }
}

/// Refuse AUTH, ENCRYPT and LOGOUT when they would be out of sequence
pub fn dispatch_policy(kind: ResultKind, session: &Session) -> Option<DeclineReason> {
    match kind {
        ResultKind::Auth if session.is_logged_in() => Some(DeclineReason::AlreadyLoggedIn),
        ResultKind::Encrypt if session.is_encrypted() => Some(DeclineReason::AlreadyEncrypted),
        ResultKind::Encrypt if session.api_key().is_none() => Some(DeclineReason::NoApiKey),
        ResultKind::Encrypt if session.is_logged_in() => Some(DeclineReason::EncryptAfterLogin),
        ResultKind::Logout if !session.is_logged_in() => Some(DeclineReason::NotLoggedIn),
        _ => None,
    }
}

enum Step {
    Dispatch(Request),
    Idle,
    Stop,
}

/// Send side of a connection
pub(crate) struct Writer {
    engine: Arc<Engine>,
    socket: Arc<UdpSocket>,
    outbound: Receiver<Request>,
    shutdown: Receiver<()>,
    last_send: Instant,
}

impl Writer {
    pub(crate) fn new(
        engine: Arc<Engine>,
        socket: Arc<UdpSocket>,
        outbound: Receiver<Request>,
        shutdown: Receiver<()>,
    ) -> Self {
        Self {
            engine,
            socket,
            outbound,
            shutdown,
            last_send: Instant::now(),
        }
    }

    /// Run until the shutdown channel closes
    pub(crate) fn run(mut self) {
        tracing::debug!("Writer loop started");
        // A previous connection's last datagram still counts
        if !self.pause(self.engine.send_cooldown()) {
            tracing::debug!("Writer loop stopped");
            return;
        }
        loop {
            if !self.hold_while_throttled() {
                break;
            }

            let idle_wait = self.idle_wait();
            let step = select! {
                recv(self.outbound) -> msg => msg.map(Step::Dispatch).unwrap_or(Step::Stop),
                recv(self.shutdown) -> _ => Step::Stop,
                default(idle_wait) => Step::Idle,
            };

            let sent = match step {
                // The throttle may have engaged while we sat in select
                Step::Dispatch(request) => {
                    if !self.hold_while_throttled() {
                        break;
                    }
                    self.dispatch(request)
                }
                Step::Idle if self.keepalive_due() => self.send_keepalive(),
                Step::Idle => false,
                Step::Stop => break,
            };

            if sent && !self.pause(self.engine.config().send_interval) {
                break;
            }
        }
        tracing::debug!("Writer loop stopped");
    }

    /// Send one queued request; returns whether a datagram went out
    fn dispatch(&mut self, request: Request) -> bool {
        let tag = request.tag().clone();
        if !self.engine.is_pending(tag.as_str()) {
            tracing::debug!("Skipping {} {}: caller gave up", request.command_base(), tag);
            return false;
        }

        let session = self.engine.session();

        if let Some(reason) = dispatch_policy(request.result_kind(), &session) {
            tracing::debug!("Declined {} {}: {}", request.command_base(), tag, reason);
            self.engine.resolve_locally(tag.as_str(), ReturnCode::RequestDeclined);
            return false;
        }

        let bytes = match encode_request(&request, session.session_key()) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("Declined {} {}: {}", request.command_base(), tag, e);
                self.engine.resolve_locally(tag.as_str(), ReturnCode::RequestDeclined);
                return false;
            }
        };

        // Mark before sending so a fast reply always finds the entry
        if !self.engine.claim_for_send(&tag, request.result_kind()) {
            tracing::debug!("Skipping {} {}: caller gave up", request.command_base(), tag);
            return false;
        }

        match self.socket.send(&bytes) {
            Ok(_) => {
                tracing::debug!("Sent {} {}", request.command_base(), tag);
                self.last_send = Instant::now();
                self.engine.note_send();
                self.engine.emit(EngineEvent::CommandSent {
                    tag: tag.to_string(),
                    command: request.command_base().to_string(),
                });
            }
            Err(e) => {
                tracing::warn!("Failed to send {} {}: {}", request.command_base(), tag, e);
                self.engine.resolve_locally(tag.as_str(), ReturnCode::ConnectionClosed);
            }
        }
        true
    }

    /// Send a PING nobody waits on, to keep the NAT mapping open
    fn send_keepalive(&mut self) -> bool {
        let tag = self.engine.tags().reserve();
        let request = commands::ping().param("nat", "1").into_request(tag.clone());

        let bytes = match encode_request(&request, None) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to encode keep-alive: {}", e);
                self.engine.tags().release(&tag);
                return false;
            }
        };

        if let Some(stale) = self.engine.replace_keepalive(tag.clone()) {
            tracing::debug!("Keep-alive {} never answered", stale);
            self.engine.take_awaiting(stale.as_str());
            self.engine.tags().release(&stale);
        }
        self.engine.mark_awaiting(&tag, ResultKind::Generic);

        // Reset the idle clock even on failure so a dead socket isn't hammered
        self.last_send = Instant::now();
        match self.socket.send(&bytes) {
            Ok(_) => {
                self.engine.note_send();
                tracing::debug!("Sent keep-alive {}", tag);
            }
            Err(e) => tracing::warn!("Failed to send keep-alive {}: {}", tag, e),
        }
        true
    }

    fn keepalive_due(&self) -> bool {
        self.last_send.elapsed() >= self.engine.config().keepalive_idle
    }

    // Bounded by poll_interval so a throttle set meanwhile is seen promptly
    fn idle_wait(&self) -> Duration {
        let config = self.engine.config();
        config
            .keepalive_idle
            .saturating_sub(self.last_send.elapsed())
            .min(config.poll_interval)
            .max(Duration::from_millis(1))
    }

    /// Sleep in `throttle_backoff` steps until the throttle lifts; false on shutdown
    fn hold_while_throttled(&self) -> bool {
        while self.engine.is_throttled() {
            if !self.pause(self.engine.config().throttle_backoff) {
                return false;
            }
        }
        true
    }

    /// Sleep for `duration`; false if shutdown arrived meanwhile
    fn pause(&self, duration: Duration) -> bool {
        matches!(
            self.shutdown.recv_timeout(duration),
            Err(RecvTimeoutError::Timeout)
        )
    }
}

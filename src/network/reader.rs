//! Reader / Dispatcher Loop
//!
//! Single thread that owns the receive side of the socket. Each datagram is
//! parsed, matched to the request that caused it, folded into Session when
//! its code is session-relevant, and published to the waiting caller.

use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::Arc;

use bytes::BytesMut;
use crossbeam::channel::{Receiver, TryRecvError};

use crate::engine::Engine;
use crate::error::AnidbError;
use crate::network::EngineEvent;
use crate::protocol::{parse_response, ApiResponse, CommandResult, ResultKind, ReturnCode};
use crate::session::derive_encryption_key;

/// Receive side of a connection
pub(crate) struct Reader {
    engine: Arc<Engine>,
    socket: Arc<UdpSocket>,
    shutdown: Receiver<()>,
}

impl Reader {
    pub(crate) fn new(engine: Arc<Engine>, socket: Arc<UdpSocket>, shutdown: Receiver<()>) -> Self {
        Self {
            engine,
            socket,
            shutdown,
        }
    }

    /// Run until the shutdown channel closes
    ///
    /// The socket's read timeout bounds how long shutdown goes unnoticed.
    pub(crate) fn run(self) {
        tracing::debug!("Reader loop started");
        let mut buf = BytesMut::zeroed(self.engine.config().max_datagram_size);

        while !self.stopping() {
            match self.socket.recv(&mut buf[..]) {
                Ok(len) => self.handle_datagram(&buf[..len]),
                Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(e) => {
                    // ICMP port-unreachable surfaces here as ConnectionRefused
                    if !self.stopping() {
                        tracing::warn!("Receive failed: {}", e);
                        let _ = self.shutdown.recv_timeout(self.engine.config().poll_interval);
                    }
                }
            }
        }
        tracing::debug!("Reader loop stopped");
    }

    fn stopping(&self) -> bool {
        matches!(self.shutdown.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Parse, correlate and publish one datagram
    pub(crate) fn handle_datagram(&self, data: &[u8]) {
        tracing::trace!("Received {:?}", String::from_utf8_lossy(data));
        self.engine.clear_throttle();

        let response = match parse_response(data) {
            Ok(response) => response,
            Err(e) => {
                self.report(e);
                return;
            }
        };

        if response.is_server_error() {
            tracing::warn!("Server error: {}", response.raw.trim_end());
            self.engine.emit(EngineEvent::ServerError {
                raw: response.raw.clone(),
            });
        }

        let Some(tag) = response.tag.clone() else {
            self.report(AnidbError::ProtocolAnomaly(format!(
                "untagged reply: {}",
                response.raw.trim_end()
            )));
            return;
        };

        let Some(kind) = self.engine.take_awaiting(tag.as_str()) else {
            self.report(AnidbError::UnknownCorrelation(tag.to_string()));
            return;
        };

        if let Some(keepalive) = self.engine.take_keepalive(tag.as_str()) {
            tracing::debug!("Keep-alive {} acknowledged ({})", keepalive, response.return_code);
            self.engine.tags().release(&keepalive);
            self.engine.emit(EngineEvent::KeepAliveAcknowledged {
                tag: keepalive.to_string(),
            });
            return;
        }

        let result = self.classify(kind, &response);
        tracing::debug!("Reply for {}: {}", tag, response.return_code);
        if !self.engine.publish(tag.as_str(), result) {
            tracing::debug!("Reply for {} arrived after its caller gave up", tag);
        }
    }

    /// Apply session side effects and build the caller's result
    fn classify(&self, kind: ResultKind, response: &ApiResponse) -> CommandResult {
        let code = response.return_code;
        let first = response.first_field();

        match code {
            ReturnCode::LoginAccepted | ReturnCode::LoginAcceptedNewVersion => {
                match first {
                    Some(session_key) => {
                        self.engine.update_session(|s| s.start(session_key));
                        tracing::info!("Logged in");
                    }
                    None => tracing::warn!("Login accepted without a session key"),
                }
                CommandResult::build(ResultKind::Auth, code, first)
            }
            ReturnCode::EncryptionEnabled => {
                self.enable_encryption(first);
                CommandResult::build(ResultKind::Encrypt, code, first)
            }
            ReturnCode::ServerBusy | ReturnCode::OutOfService => {
                // TODO: pause the writer for a busy-specific interval instead of only surfacing the code
                tracing::warn!("Server unavailable: {}", code);
                CommandResult::build(ResultKind::Generic, code, first)
            }
            ReturnCode::Timeout => CommandResult::build(ResultKind::Generic, code, first),
            _ if code.ends_session() => {
                tracing::info!("Session ended by server: {}", code);
                self.engine.end_session();
                CommandResult::build(kind, code, first)
            }
            _ => CommandResult::build(kind, code, first),
        }
    }

    fn enable_encryption(&self, salt: Option<&str>) {
        let Some(salt) = salt else {
            tracing::warn!("Encryption enabled without a salt");
            return;
        };
        let enabled = self.engine.update_session(|session| {
            let key = session.api_key().map(|api_key| derive_encryption_key(api_key, salt));
            match key {
                Some(key) => {
                    session.enable_encryption(key);
                    true
                }
                None => false,
            }
        });
        if enabled {
            tracing::info!("Encryption enabled");
        } else {
            tracing::warn!("Encryption enabled but no API key is configured");
        }
    }

    fn report(&self, error: AnidbError) {
        tracing::warn!("Discarding datagram: {}", error);
        self.engine.emit(EngineEvent::ClientError {
            message: error.to_string(),
        });
    }
}

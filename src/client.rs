//! Client
//!
//! Connection manager and the caller-facing entry points.
//!
//! ```no_run
//! use anidb_udp::{Client, Config};
//! use anidb_udp::protocol::commands;
//!
//! let client = Client::new(Config::default());
//! client.connect("api.anidb.net", 9000)?;
//! let pong = client.send(commands::ping().with_optional("nat", "1")?)?;
//! println!("{}", pong.return_code());
//! client.disconnect();
//! # Ok::<(), anidb_udp::AnidbError>(())
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use crossbeam::channel::Receiver;
use parking_lot::Mutex;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{AnidbError, Result};
use crate::network::{Connection, EngineEvent, ResponseWaiter};
use crate::protocol::{commands, encode_request, CommandResult, RequestBuilder};
use crate::session::Session;

/// Handle to the engine and its (optional) live connection
pub struct Client {
    engine: Arc<Engine>,
    connection: Mutex<Option<Connection>>,
}

impl Client {
    pub fn new(config: Config) -> Self {
        Self {
            engine: Arc::new(Engine::new(config)),
            connection: Mutex::new(None),
        }
    }

    // =========================================================================
    // Connection lifecycle
    // =========================================================================

    /// Connect and start both loops
    ///
    /// Returns `Ok(false)` without doing anything if already connected.
    pub fn connect(&self, host: &str, port: u16) -> Result<bool> {
        let mut connection = self.connection.lock();
        if connection.is_some() {
            return Ok(false);
        }
        *connection = Some(Connection::open(Arc::clone(&self.engine), host, port)?);
        Ok(true)
    }

    /// Connect to the host and port from the config
    pub fn connect_default(&self) -> Result<bool> {
        let config = self.engine.config();
        self.connect(&config.server_host, config.server_port)
    }

    /// Tear the connection down
    ///
    /// Stops both loops, sends a best-effort LOGOUT if logged in, clears
    /// Session and resolves every outstanding waiter with `ConnectionClosed`.
    /// The LOGOUT respects the send interval, so this may block for up to
    /// `send_interval`. Returns false if there was nothing to disconnect.
    pub fn disconnect(&self) -> bool {
        let Some(mut connection) = self.connection.lock().take() else {
            return false;
        };

        connection.stop_loops();
        self.send_farewell(&connection);
        self.engine.end_session();
        connection.close();

        let woken = self.engine.drain();
        if woken > 0 {
            tracing::debug!("Woke {} waiters on disconnect", woken);
        }
        true
    }

    pub fn is_connected(&self) -> bool {
        self.connection.lock().is_some()
    }

    /// Local socket address, if connected
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.connection
            .lock()
            .as_ref()
            .and_then(|c| c.local_addr().ok())
    }

    fn send_farewell(&self, connection: &Connection) {
        let session = self.engine.session();
        if !session.is_logged_in() {
            return;
        }

        let tag = self.engine.tags().reserve();
        let request = commands::logout().into_request(tag.clone());
        let sent = encode_request(&request, session.session_key()).and_then(|bytes| {
            thread::sleep(self.engine.send_cooldown());
            connection.send_now(&bytes)
        });
        match sent {
            Ok(()) => self.engine.note_send(),
            Err(e) => tracing::warn!("Farewell logout failed: {}", e),
        }
        self.engine.tags().release(&tag);
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Queue a request and return the waiter for its result
    pub fn submit(&self, request: RequestBuilder) -> Result<ResponseWaiter> {
        let connection = self.connection.lock();
        let connection = connection.as_ref().ok_or(AnidbError::NotConnected)?;

        let kind = request.result_kind();
        let tag = self.engine.tags().reserve();
        let reply = self.engine.register(&tag, kind);
        let waiter = ResponseWaiter::new(Arc::clone(&self.engine), tag.clone(), kind, reply);

        connection.enqueue(request.into_request(tag))?;
        Ok(waiter)
    }

    /// Queue a request and block until it resolves
    pub fn send(&self, request: RequestBuilder) -> Result<CommandResult> {
        Ok(self.submit(request)?.wait())
    }

    // =========================================================================
    // Session & state
    // =========================================================================

    /// Configure the API key used by ENCRYPT; allowed once
    pub fn set_api_key(&self, api_key: impl Into<String>) -> Result<()> {
        self.engine.update_session(|s| s.set_api_key(api_key))
    }

    /// Snapshot of the session
    pub fn session(&self) -> Session {
        self.engine.session()
    }

    pub fn is_throttled(&self) -> bool {
        self.engine.is_throttled()
    }

    pub fn consecutive_timeouts(&self) -> u32 {
        self.engine.consecutive_timeouts()
    }

    /// Side-channel event stream
    pub fn events(&self) -> Receiver<EngineEvent> {
        self.engine.events()
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        self.engine.config()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.disconnect();
    }
}

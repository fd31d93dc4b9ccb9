//! Connection
//!
//! Owns the UDP socket and the two loop threads for one connect/disconnect
//! cycle.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, unbounded, Sender};

use crate::engine::Engine;
use crate::error::{AnidbError, Result};
use crate::protocol::Request;

use super::reader::Reader;
use super::writer::Writer;

/// A live datagram connection and its loops
pub struct Connection {
    /// Shared socket (writer sends, reader receives)
    socket: Arc<UdpSocket>,

    /// Queue feeding the writer loop
    outbound: Sender<Request>,

    /// Dropping this sender stops both loops
    shutdown: Option<Sender<()>>,

    writer: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,

    /// Remote address for logging
    peer_addr: SocketAddr,
}

impl Connection {
    /// Bind the local port, connect to `host:port` and start both loops
    pub fn open(engine: Arc<Engine>, host: &str, port: u16) -> Result<Self> {
        let peer_addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| AnidbError::Network(format!("Could not resolve {}:{}", host, port)))?;

        let config = engine.config();
        let unspecified = match peer_addr {
            SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        let socket = UdpSocket::bind(SocketAddr::new(unspecified, config.local_port))?;
        socket.connect(peer_addr)?;
        socket.set_read_timeout(Some(config.poll_interval))?;
        let socket = Arc::new(socket);

        let (outbound_tx, outbound_rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let writer = Writer::new(
            Arc::clone(&engine),
            Arc::clone(&socket),
            outbound_rx,
            shutdown_rx.clone(),
        );
        let writer = thread::Builder::new()
            .name("anidb-writer".to_string())
            .spawn(move || writer.run())?;

        let reader = Reader::new(Arc::clone(&engine), Arc::clone(&socket), shutdown_rx);
        let reader = match thread::Builder::new()
            .name("anidb-reader".to_string())
            .spawn(move || reader.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                drop(shutdown_tx);
                let _ = writer.join();
                return Err(e.into());
            }
        };

        tracing::info!(
            "Connected to {} from {}",
            peer_addr,
            socket
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown".to_string())
        );

        Ok(Self {
            socket,
            outbound: outbound_tx,
            shutdown: Some(shutdown_tx),
            writer: Some(writer),
            reader: Some(reader),
            peer_addr,
        })
    }

    /// Hand a request to the writer loop
    pub fn enqueue(&self, request: Request) -> Result<()> {
        self.outbound
            .send(request)
            .map_err(|_| AnidbError::NotConnected)
    }

    /// Send a datagram directly, bypassing the queue
    ///
    /// Only for the farewell LOGOUT once the loops are stopped; the caller
    /// waits out the send interval first.
    pub fn send_now(&self, bytes: &[u8]) -> Result<()> {
        self.socket.send(bytes)?;
        Ok(())
    }

    /// Local address the socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Stop both loops and close the socket
    pub fn close(mut self) {
        self.stop_loops();
        tracing::info!("Disconnected from {}", self.peer_addr);
    }

    /// Stop both loops and wait for them to exit; the socket stays open
    pub fn stop_loops(&mut self) {
        // Closing the shutdown channel wakes the writer; the reader sees it
        // within one poll interval
        if self.shutdown.take().is_none() {
            return;
        }
        for handle in [self.writer.take(), self.reader.take()].into_iter().flatten() {
            if handle.join().is_err() {
                tracing::error!("Loop thread panicked");
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.stop_loops();
    }
}

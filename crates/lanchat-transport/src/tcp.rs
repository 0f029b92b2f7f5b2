//! TCP transport implementation using `tokio::net`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Size of the buffer handed to each read call.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;

/// A TCP-based [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    /// `None` once [`shutdown`](Transport::shutdown) has released the port.
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    read_buffer_size: usize,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        let local_addr = listener
            .local_addr()
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(%local_addr, "TCP transport listening");
        Ok(Self {
            listener: Some(listener),
            local_addr,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        })
    }

    /// Sets the read buffer size for connections accepted from now on.
    ///
    /// A frame larger than this is split across reads and will not decode.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// The address the listener was bound to. Still reported after
    /// shutdown, for logging.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let listener = self.listener.as_ref().ok_or(TransportError::Shutdown)?;
        let (stream, peer_addr) = listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        // Chat frames are tiny; flush each one as soon as it is written.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer_addr, error = %e, "failed to set TCP_NODELAY");
        }

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %peer_addr, "accepted TCP connection");

        let (reader, writer) = stream.into_split();
        let (closed, _) = watch::channel(false);
        Ok(TcpConnection {
            id,
            peer_addr,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            connected: AtomicBool::new(true),
            closed,
            read_buffer_size: self.read_buffer_size,
        })
    }

    async fn shutdown(&mut self) -> Result<(), Self::Error> {
        if self.listener.take().is_some() {
            tracing::info!(local_addr = %self.local_addr, "TCP transport stopped listening");
        }
        Ok(())
    }
}

/// A single TCP connection.
///
/// The read and write halves are locked independently so that a task
/// blocked in [`recv`](Connection::recv) never stalls a concurrent
/// [`send`](Connection::send).
///
/// Once the connection is marked dead, for any reason, a parked `recv`
/// wakes up and returns `Ok(None)`, so the task reading it can finish
/// without waiting for the peer.
pub struct TcpConnection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    connected: AtomicBool,
    closed: watch::Sender<bool>,
    read_buffer_size: usize,
}

impl TcpConnection {
    /// The remote peer's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
        self.closed.send_replace(true);
    }
}

async fn wait_closed(mut closed: watch::Receiver<bool>) {
    let _ = closed.wait_for(|closed| *closed).await;
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        if !self.is_connected() {
            return Err(TransportError::ConnectionClosed(self.id.to_string()));
        }
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.write_all(data).await {
            self.mark_disconnected();
            return Err(TransportError::SendFailed(e));
        }
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let closed = self.closed.subscribe();
        if *closed.borrow() {
            return Ok(None);
        }
        let mut buf = vec![0u8; self.read_buffer_size];
        let mut reader = self.reader.lock().await;
        let read = tokio::select! {
            biased;
            _ = wait_closed(closed) => return Ok(None),
            read = reader.read(&mut buf) => read,
        };
        drop(reader);
        match read {
            Ok(0) => {
                self.mark_disconnected();
                Ok(None)
            }
            Ok(n) => {
                buf.truncate(n);
                Ok(Some(buf))
            }
            Err(e) => {
                self.mark_disconnected();
                Err(TransportError::ReceiveFailed(e))
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.mark_disconnected();
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

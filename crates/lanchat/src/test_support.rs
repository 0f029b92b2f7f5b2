//! In-memory [`Connection`] used by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use lanchat_protocol::Message;
use lanchat_transport::{Connection, ConnectionId, TransportError};
use tokio::sync::watch;

static NEXT_ID: AtomicU64 = AtomicU64::new(1_000_000);

/// Scripted reads in, recorded writes out.
pub(crate) struct MemoryConnection {
    id: ConnectionId,
    connected: AtomicBool,
    closed: AtomicBool,
    fail_sends: AtomicBool,
    hold_open: AtomicBool,
    dead: watch::Sender<bool>,
    incoming: Mutex<VecDeque<Vec<u8>>>,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl MemoryConnection {
    pub(crate) fn new() -> Arc<Self> {
        Self::with_frames(Vec::new())
    }

    /// Each entry is returned by one `recv` call; afterwards the peer
    /// "closes" unless [`hold_open`](Self::hold_open) was called.
    pub(crate) fn with_frames(frames: Vec<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::new(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            connected: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
            hold_open: AtomicBool::new(false),
            dead: watch::channel(false).0,
            incoming: Mutex::new(frames.into()),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Once the scripted frames run out, `recv` blocks until the connection
    /// is severed or closed.
    pub(crate) fn hold_open(&self) {
        self.hold_open.store(true, Ordering::SeqCst);
    }

    /// Simulates the peer vanishing without any I/O.
    pub(crate) fn sever(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.dead.send_replace(true);
    }

    /// Every following `send` fails like a broken pipe.
    pub(crate) fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub(crate) fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn sent_messages(&self) -> Vec<Message> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|bytes| serde_json::from_slice(bytes).unwrap())
            .collect()
    }
}

impl Connection for MemoryConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            self.sever();
            return Err(TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted failure",
            )));
        }
        if !self.is_connected() {
            return Err(TransportError::ConnectionClosed(self.id.to_string()));
        }
        self.sent.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let next = self.incoming.lock().unwrap().pop_front();
        match next {
            Some(frame) => Ok(Some(frame)),
            None if self.hold_open.load(Ordering::SeqCst) => {
                let mut dead = self.dead.subscribe();
                let _ = dead.wait_for(|dead| *dead).await;
                Ok(None)
            }
            None => {
                self.sever();
                Ok(None)
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sever();
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

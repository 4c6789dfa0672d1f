//! In memory transport driven by tests

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use tokio::{sync::mpsc, time::Instant};
use url::Url;

use crate::ws::transport::{redacted, ConnectError, Connector, Frame, Socket, TransportError};

/// Server side of one accepted mock connection
pub(crate) struct MockPeer {
    pub url: Url,
    pub to_client: mpsc::UnboundedSender<Result<Frame, TransportError>>,
    pub from_client: mpsc::UnboundedReceiver<Frame>,
}

impl MockPeer {
    pub fn send_text(&self, text: &str) {
        self.to_client.send(Ok(Frame::Text(text.to_string()))).unwrap();
    }

    pub fn send(&self, frame: Frame) {
        self.to_client.send(Ok(frame)).unwrap();
    }
}

/// Test side controls of a [`MockConnector`]
pub(crate) struct MockServer {
    peers: mpsc::UnboundedReceiver<MockPeer>,
    attempts: Arc<Mutex<Vec<Instant>>>,
    failures: Arc<AtomicUsize>,
    hang: Arc<AtomicBool>,
    stall_sends: Arc<AtomicBool>,
}

impl MockServer {
    pub async fn accept(&mut self) -> MockPeer {
        self.peers.recv().await.unwrap()
    }

    /// instants of every connect attempt so far
    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }

    /// the next `n` connect attempts fail
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// connect attempts never finish
    pub fn hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    /// data frames sent by the client never finish writing, close frames still go through
    pub fn stall_sends(&self, stall: bool) {
        self.stall_sends.store(stall, Ordering::SeqCst);
    }
}

pub(crate) struct MockConnector {
    peers: mpsc::UnboundedSender<MockPeer>,
    attempts: Arc<Mutex<Vec<Instant>>>,
    failures: Arc<AtomicUsize>,
    hang: Arc<AtomicBool>,
    stall_sends: Arc<AtomicBool>,
}

impl MockConnector {
    pub fn new() -> (Self, MockServer) {
        let (tx, rx) = mpsc::unbounded_channel();
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let failures = Arc::new(AtomicUsize::new(0));
        let hang = Arc::new(AtomicBool::new(false));
        let stall_sends = Arc::new(AtomicBool::new(false));

        let connector = Self {
            peers: tx,
            attempts: attempts.clone(),
            failures: failures.clone(),
            hang: hang.clone(),
            stall_sends: stall_sends.clone(),
        };
        let server = MockServer {
            peers: rx,
            attempts,
            failures,
            hang,
            stall_sends,
        };

        (connector, server)
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    type Socket = MockSocket;

    async fn connect(&self, url: &Url) -> Result<MockSocket, ConnectError> {
        self.attempts.lock().unwrap().push(Instant::now());

        if self.hang.load(Ordering::SeqCst) {
            futures_util::future::pending::<()>().await;
        }

        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ConnectError {
                url: redacted(url),
                source: TransportError::PeerGone,
            });
        }

        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();

        let _ = self.peers.send(MockPeer {
            url: url.clone(),
            to_client,
            from_client,
        });

        Ok(MockSocket {
            inbound,
            outbound,
            stall_sends: self.stall_sends.clone(),
        })
    }
}

pub(crate) struct MockSocket {
    inbound: mpsc::UnboundedReceiver<Result<Frame, TransportError>>,
    outbound: mpsc::UnboundedSender<Frame>,
    stall_sends: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl Socket for MockSocket {
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        self.inbound.recv().await
    }

    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        if self.stall_sends.load(Ordering::SeqCst) {
            futures_util::future::pending::<()>().await;
        }

        self.outbound
            .send(frame)
            .map_err(|_| TransportError::PeerGone)
    }

    async fn close(&mut self, code: u16) -> Result<(), TransportError> {
        self.outbound
            .send(Frame::Close(Some(code)))
            .map_err(|_| TransportError::PeerGone)
    }
}

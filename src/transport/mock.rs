//! In-memory connector for session tests.
//!
//! Each connection attempt consumes one scripted outcome. Accepted attempts
//! hand a [`MockPeer`] to the test, which plays the remote end.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{Envelope, decode};

use super::{Connector, Link, Outbound, TransportEvent};

/// Scripted connector.
pub(crate) struct MockConnector {
    script: Mutex<VecDeque<bool>>,
    accept_when_exhausted: bool,
    attempts: Mutex<Vec<Instant>>,
    peers: mpsc::UnboundedSender<MockPeer>,
}

impl MockConnector {
    /// Creates a connector that follows `script` (true = accept) and then
    /// falls back to `accept_when_exhausted`.
    pub(crate) fn new(
        script: impl IntoIterator<Item = bool>,
        accept_when_exhausted: bool,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<MockPeer>) {
        let (peers, peers_rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            accept_when_exhausted,
            attempts: Mutex::new(Vec::new()),
            peers,
        });
        (connector, peers_rx)
    }

    /// Connector that accepts every attempt.
    pub(crate) fn accepting() -> (Arc<Self>, mpsc::UnboundedReceiver<MockPeer>) {
        Self::new([], true)
    }

    /// Number of connection attempts so far.
    pub(crate) fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }

    /// Simulated time of each attempt.
    pub(crate) fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _url: &Url) -> Result<Link> {
        self.attempts.lock().push(Instant::now());

        let accept = self
            .script
            .lock()
            .pop_front()
            .unwrap_or(self.accept_when_exhausted);
        if !accept {
            return Err(Error::connection("connection refused"));
        }

        let (link, sent, events) = Link::pair();
        let _ = self.peers.send(MockPeer { sent, events });
        Ok(link)
    }
}

/// Remote end of one accepted mock link.
pub(crate) struct MockPeer {
    sent: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl MockPeer {
    /// Pushes an inbound text frame to the session.
    pub(crate) fn deliver(&self, text: impl Into<String>) {
        let _ = self.events.send(TransportEvent::Frame(text.into()));
    }

    /// Reports a transport error without closing.
    pub(crate) fn fail(&self, message: &str) {
        let _ = self.events.send(TransportEvent::Error(message.to_string()));
    }

    /// Closes the link from the remote side.
    pub(crate) fn close(&self) {
        let _ = self.events.send(TransportEvent::Closed);
    }

    /// Drains everything the session has written so far.
    pub(crate) fn drain(&mut self) -> Vec<Outbound> {
        let mut out = Vec::new();
        while let Ok(command) = self.sent.try_recv() {
            out.push(command);
        }
        out
    }

    /// Drains and decodes the text frames written so far.
    pub(crate) fn drain_frames(&mut self) -> Vec<Envelope> {
        self.drain()
            .into_iter()
            .filter_map(|command| match command {
                Outbound::Frame(text) => decode(&text).ok(),
                Outbound::Close => None,
            })
            .collect()
    }
}

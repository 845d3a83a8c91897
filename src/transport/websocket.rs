//! WebSocket client connector.
//!
//! Opens the socket with `tokio-tungstenite` and spawns a pump task that
//! bridges it to the session's [`Link`] channels.
//!
//! # Pump Loop
//!
//! The pump selects over:
//!
//! - Incoming socket messages (text frames forwarded, close/errors reported)
//! - Outgoing [`Outbound`] commands from the session
//!
//! It always reports [`TransportEvent::Closed`] on exit.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Result;

use super::{Connector, Link, Outbound, TransportEvent};

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream.
type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// WebSocketConnector
// ============================================================================

/// Connects to a `ws://` or `wss://` endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    /// Creates a new connector.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &Url) -> Result<Link> {
        debug!(url = %url, "Opening WebSocket");

        let (ws_stream, response) = connect_async(url.as_str()).await?;

        debug!(url = %url, status = %response.status(), "WebSocket open");

        let (link, outbound_rx, inbound_tx) = Link::pair();
        tokio::spawn(run_pump(ws_stream, outbound_rx, inbound_tx));

        Ok(link)
    }
}

// ============================================================================
// Pump
// ============================================================================

/// Moves frames between the socket and the link channels until either side ends.
async fn run_pump(
    ws_stream: ClientStream,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    inbound_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        if inbound_tx.send(TransportEvent::Frame(text.as_str().to_owned())).is_err() {
                            debug!("Session dropped the link");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }

                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "WebSocket closed by remote");
                        break;
                    }

                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        let _ = inbound_tx.send(TransportEvent::Error(e.to_string()));
                        break;
                    }

                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }

                    // Binary frames are not part of the protocol; tungstenite answers pings.
                    Some(Ok(_)) => {}
                }
            }

            command = outbound_rx.recv() => {
                match command {
                    Some(Outbound::Frame(text)) => {
                        if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                            warn!(error = %e, "Failed to write frame");
                            let _ = inbound_tx.send(TransportEvent::Error(e.to_string()));
                            break;
                        }
                        trace!("Frame written");
                    }

                    Some(Outbound::Close) | None => {
                        debug!("Closing WebSocket");
                        let _ = ws_write.close().await;
                        break;
                    }
                }
            }
        }
    }

    let _ = inbound_tx.send(TransportEvent::Closed);
    debug!("Link pump terminated");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;
    use tracing_subscriber::EnvFilter;

    use crate::error::Error;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[tokio::test]
    async fn test_connect_refused() {
        init_tracing();

        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let url = Url::parse(&format!("ws://127.0.0.1:{port}")).expect("url");
        let err = WebSocketConnector::new().connect(&url).await.unwrap_err();
        assert!(matches!(err, Error::WebSocket(_)));
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream).await.expect("upgrade");

            let first = ws.next().await.expect("frame").expect("ok");
            assert_eq!(first, Message::Text("{\"type\":\"ping\"}".into()));

            ws.send(Message::Text("{\"type\":\"pong\"}".into()))
                .await
                .expect("send");
            ws.close(None).await.expect("close");
        });

        let url = Url::parse(&format!("ws://127.0.0.1:{port}")).expect("url");
        let mut link = WebSocketConnector::new().connect(&url).await.expect("connect");

        link.outbound
            .send(Outbound::Frame("{\"type\":\"ping\"}".to_string()))
            .expect("queue");

        assert_eq!(
            link.inbound.recv().await,
            Some(TransportEvent::Frame("{\"type\":\"pong\"}".to_string()))
        );
        assert_eq!(link.inbound.recv().await, Some(TransportEvent::Closed));

        server.await.expect("server task");
    }
}

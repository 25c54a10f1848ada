//! WebSocket transport: dials the device's live feed and exposes it as a pair
//! of text channels so the connector never touches the socket directly.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};
use url::Url;

use crate::error::FeedError;

/// An open socket. Dropping both halves tears the connection down.
pub struct Link {
    pub outbound: mpsc::UnboundedSender<String>,
    /// Ends (yields `None`) when the peer closes or the socket errors.
    pub inbound: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, endpoint: &Url) -> Result<Link, FeedError>;
}

pub struct WsDialer;

#[async_trait]
impl Dialer for WsDialer {
    async fn dial(&self, endpoint: &Url) -> Result<Link, FeedError> {
        let (ws, _) = connect_async(endpoint.as_str()).await?;
        let (mut sink, mut stream) = ws.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

        // Writer: runs until the connector drops its sender.
        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    debug!(error = %e, "socket write failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // Reader: forwards text frames in arrival order.
        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if in_tx.send(text).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                        Ok(text) => {
                            if in_tx.send(text).is_err() {
                                break;
                            }
                        }
                        Err(_) => warn!("dropping non UTF-8 binary frame"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "socket read failed");
                        break;
                    }
                }
            }
        });

        Ok(Link {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}

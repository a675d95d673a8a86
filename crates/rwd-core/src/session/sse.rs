//! Live session subscription over server-sent events.
//!
//! The subscription runs on its own task and forwards parsed events into a
//! channel the UI drains once per frame. A malformed event is logged and
//! skipped; only transport failures close the stream.

use anyhow::{Result, bail};
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::events::SessionEvent;
use crate::session::SessionClient;

/// One item delivered by a live subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Event(SessionEvent),
    /// The stream ended. `error` is `None` on a clean server-side close.
    Closed { error: Option<String> },
}

/// Opens the SSE stream for a session and spawns the forwarding task.
///
/// `last_event_id` resumes from a known cursor; the server replays events
/// after it. Dropping the receiver tears the task down on its next send.
pub async fn subscribe(
    client: &SessionClient,
    session_id: &str,
    last_event_id: Option<u64>,
) -> Result<mpsc::UnboundedReceiver<StreamItem>> {
    let url = {
        let mut url = client.base_url().clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("base URL cannot be a base"))?
            .pop_if_empty()
            .extend(["api", "v1", "sessions", session_id, "sse"]);
        url
    };

    let mut request = client
        .http()
        .get(url.clone())
        .header("accept", "text/event-stream");
    if let Some(id) = last_event_id {
        request = request.header("last-event-id", id.to_string());
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("SSE subscribe failed with HTTP {status}: {body}");
    }

    tracing::info!(%url, ?last_event_id, "subscribed to live session");
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(pump_events(response.bytes_stream(), tx));
    Ok(rx)
}

/// Drains an SSE byte stream into `tx` until it ends or the receiver drops.
async fn pump_events<S, B, E>(stream: S, tx: mpsc::UnboundedSender<StreamItem>)
where
    S: futures_util::Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::error::Error,
{
    let mut events = stream.eventsource();
    while let Some(item) = events.next().await {
        let outgoing = match item {
            Ok(event) => match serde_json::from_str::<SessionEvent>(&event.data) {
                Ok(parsed) => StreamItem::Event(parsed),
                Err(err) => {
                    tracing::warn!(%err, data = %event.data, "skipping malformed session event");
                    continue;
                }
            },
            Err(err) => {
                let _ = tx.send(StreamItem::Closed {
                    error: Some(err.to_string()),
                });
                return;
            }
        };
        if tx.send(outgoing).is_err() {
            // Receiver is gone; stop reading.
            return;
        }
    }
    let _ = tx.send(StreamItem::Closed { error: None });
}

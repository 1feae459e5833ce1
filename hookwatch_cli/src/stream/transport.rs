//! Server-Sent Events transport over reqwest
//!
//! Follows EventSource behaviour: reconnect after a delay when the stream
//! drops (the server may change the delay with `retry:`), resume with
//! `Last-Event-ID`, and give up for good on a non-success status or a
//! response that is not `text/event-stream`.

use super::sse::SseDecoder;
use super::{ConnectionState, Transport, TransportEvent};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

const EVENT_STREAM_MIME: &str = "text/event-stream";
const LAST_EVENT_ID_HEADER: &str = "Last-Event-ID";

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid stream URL {0}: {1}")]
    InvalidUrl(String, String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server responded with {0}")]
    Status(StatusCode),

    #[error("Unexpected content type: {0}")]
    ContentType(String),
}

impl TransportError {
    /// Errors after which the connection is not re-established
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TransportError::InvalidUrl(..) | TransportError::Status(_) | TransportError::ContentType(_)
        )
    }
}

/// Reconnecting SSE connection to a capture server
pub struct SseTransport {
    client: Client,
    url: Url,
    reconnect_delay: Duration,
}

impl SseTransport {
    pub fn new(url: &str, reconnect_delay: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Self::with_client(client, url, reconnect_delay)
    }

    pub fn with_client(
        client: Client,
        url: &str,
        reconnect_delay: Duration,
    ) -> Result<Self, TransportError> {
        let url = Url::parse(url)
            .map_err(|e| TransportError::InvalidUrl(url.to_string(), e.to_string()))?;
        Ok(Self {
            client,
            url,
            reconnect_delay,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// One connection attempt. Returns `Ok` when the server ends the stream
    /// or nobody is listening for events anymore.
    async fn connect_once(
        &self,
        events: &mpsc::Sender<TransportEvent>,
        last_event_id: &mut Option<String>,
        delay: &mut Duration,
    ) -> Result<(), TransportError> {
        let mut request = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, EVENT_STREAM_MIME)
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = last_event_id.as_deref() {
            request = request.header(LAST_EVENT_ID_HEADER, id);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with(EVENT_STREAM_MIME) {
            return Err(TransportError::ContentType(content_type));
        }

        if events.send(TransportEvent::Open).await.is_err() {
            return Ok(());
        }

        let mut decoder = SseDecoder::with_last_event_id(last_event_id.clone());
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for event in decoder.feed(&chunk) {
                if event.event != "message" {
                    tracing::debug!("Ignoring '{}' event", event.event);
                    continue;
                }
                if event.data.is_empty() {
                    continue;
                }
                if events.send(TransportEvent::Message(event.data)).await.is_err() {
                    return Ok(());
                }
            }
            *last_event_id = decoder.last_event_id().map(str::to_string);
            if let Some(retry) = decoder.retry() {
                *delay = retry;
            }
        }

        Ok(())
    }
}

impl Transport for SseTransport {
    async fn run(self, events: mpsc::Sender<TransportEvent>) {
        let mut last_event_id = None;
        let mut delay = self.reconnect_delay;

        loop {
            tracing::debug!("Connecting to event stream at {}", self.url);
            match self.connect_once(&events, &mut last_event_id, &mut delay).await {
                Ok(()) => tracing::info!("Event stream ended"),
                Err(e) if e.is_fatal() => {
                    tracing::error!("Event stream failed: {}", e);
                    let _ = events.send(TransportEvent::Error(ConnectionState::Closed)).await;
                    return;
                }
                Err(e) => tracing::warn!("Event stream interrupted: {}", e),
            }

            if events
                .send(TransportEvent::Error(ConnectionState::Connecting))
                .await
                .is_err()
            {
                return;
            }
            tracing::debug!("Reconnecting in {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

//! Event stream client
//!
//! A [`Transport`] owns the actual connection (and any reconnection policy)
//! and reports raw events. [`StreamClient`] turns those into a connection
//! state that can be polled and an ordered stream of decoded request records.

mod demo;
mod sse;
mod transport;

pub use demo::DemoTransport;
pub use transport::{SseTransport, TransportError};

use hookwatch_common::RequestRecord;
use std::future::Future;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Buffered transport events between the transport task and the pump
const TRANSPORT_EVENT_BUFFER: usize = 100;

/// Connection state of the event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        }
    }

    /// Text shown in the connection status display
    pub fn status_text(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "connected",
            ConnectionState::Closed => "disconnected",
        }
    }
}

/// Raw events reported by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection established
    Open,
    /// One message payload
    Message(String),
    /// Connection lost or failed; carries the state the transport is now in
    Error(ConnectionState),
}

/// A server-push connection
pub trait Transport: Send + 'static {
    /// Drive the connection until it is closed for good, reporting through `events`
    fn run(self, events: mpsc::Sender<TransportEvent>) -> impl Future<Output = ()> + Send;
}

/// Ordered, single-subscriber stream of decoded records
pub struct RecordStream {
    rx: mpsc::UnboundedReceiver<RequestRecord>,
}

impl RecordStream {
    /// Next record, or `None` once the transport has finished
    pub async fn recv(&mut self) -> Option<RequestRecord> {
        self.rx.recv().await
    }
}

/// Handle to a running stream connection
pub struct StreamClient {
    state: watch::Receiver<ConnectionState>,
    transport_task: JoinHandle<()>,
    pump_task: JoinHandle<()>,
}

impl StreamClient {
    /// Start `transport` and return the client with its only record subscriber
    pub fn connect<T: Transport>(transport: T) -> (Self, RecordStream) {
        let (event_tx, event_rx) = mpsc::channel(TRANSPORT_EVENT_BUFFER);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (record_tx, record_rx) = mpsc::unbounded_channel();

        let transport_task = tokio::spawn(transport.run(event_tx));
        let pump_task = tokio::spawn(pump(event_rx, state_tx, record_tx));

        (
            Self {
                state: state_rx,
                transport_task,
                pump_task,
            },
            RecordStream { rx: record_rx },
        )
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch channel for state changes
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.transport_task.abort();
        self.pump_task.abort();
    }
}

/// Decode transport events in arrival order, publishing state and records
async fn pump(
    mut events: mpsc::Receiver<TransportEvent>,
    state: watch::Sender<ConnectionState>,
    records: mpsc::UnboundedSender<RequestRecord>,
) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Open => {
                tracing::info!("Event stream connected");
                state.send_replace(ConnectionState::Open);
            }
            TransportEvent::Error(next) => {
                tracing::warn!("Event stream error, connection is {}", next.as_str());
                state.send_replace(next);
            }
            TransportEvent::Message(data) => match RequestRecord::from_json(&data) {
                Ok(record) => {
                    tracing::debug!("Received request {} {}", record.method, record.endpoint);
                    if records.send(record).is_err() {
                        tracing::debug!("Record subscriber is gone, dropping record");
                    }
                }
                Err(e) => {
                    tracing::warn!("Dropping malformed event: {}", e);
                }
            },
        }
    }

    state.send_replace(ConnectionState::Closed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Transport that replays a fixed script, optionally staying open afterwards
    struct ScriptedTransport {
        events: Vec<TransportEvent>,
        hold_open: bool,
    }

    impl Transport for ScriptedTransport {
        async fn run(self, events: mpsc::Sender<TransportEvent>) {
            for event in self.events {
                if events.send(event).await.is_err() {
                    return;
                }
            }
            if self.hold_open {
                std::future::pending::<()>().await;
            }
        }
    }

    fn payload(id: &str) -> TransportEvent {
        TransportEvent::Message(format!(
            r#"{{"id":"{}","method":"POST","endpoint":"/hooks","timestamp":1700000000000,"headers":{{}},"body":""}}"#,
            id
        ))
    }

    async fn collect(mut stream: RecordStream) -> Vec<String> {
        let mut ids = Vec::new();
        while let Some(record) = stream.recv().await {
            ids.push(record.id);
        }
        ids
    }

    #[tokio::test]
    async fn test_records_delivered_in_order() {
        let (client, stream) = StreamClient::connect(ScriptedTransport {
            events: vec![TransportEvent::Open, payload("A"), payload("B"), payload("C")],
            hold_open: false,
        });

        assert_eq!(collect(stream).await, vec!["A", "B", "C"]);

        let mut state = client.watch_state();
        state.wait_for(|s| *s == ConnectionState::Closed).await.unwrap();
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_malformed_message_dropped() {
        let (_client, stream) = StreamClient::connect(ScriptedTransport {
            events: vec![
                TransportEvent::Open,
                payload("A"),
                TransportEvent::Message("{\"id\": broken".to_string()),
                TransportEvent::Message(String::new()),
                payload("B"),
            ],
            hold_open: false,
        });

        assert_eq!(collect(stream).await, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_state_follows_transport() {
        let (client, mut stream) = StreamClient::connect(ScriptedTransport {
            events: vec![TransportEvent::Open, payload("A")],
            hold_open: true,
        });
        assert!(stream.recv().await.is_some());
        assert_eq!(client.state(), ConnectionState::Open);

        // The transport is still running; the error alone decides the state
        let (client, _stream) = StreamClient::connect(ScriptedTransport {
            events: vec![
                TransportEvent::Open,
                TransportEvent::Error(ConnectionState::Closed),
            ],
            hold_open: true,
        });
        let mut state = client.watch_state();
        let reached = tokio::time::timeout(
            Duration::from_secs(1),
            state.wait_for(|s| *s == ConnectionState::Closed),
        )
        .await;
        assert!(reached.is_ok());
    }

    #[tokio::test]
    async fn test_starts_connecting() {
        let (client, _stream) = StreamClient::connect(ScriptedTransport {
            events: vec![],
            hold_open: true,
        });

        assert_eq!(client.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(ConnectionState::Connecting.status_text(), "connecting");
        assert_eq!(ConnectionState::Open.status_text(), "connected");
        assert_eq!(ConnectionState::Closed.status_text(), "disconnected");
    }
}

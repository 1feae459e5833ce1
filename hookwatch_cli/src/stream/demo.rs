//! Synthetic event source for trying the viewer without a capture server

use super::{Transport, TransportEvent};
use chrono::Utc;
use hookwatch_common::RequestRecord;
use rand::Rng;
use serde_json::{json, Map};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE"];
const ENDPOINTS: &[&str] = &["/users", "/products", "/orders", "/payments"];
const NAMES: &[&str] = &["John Doe", "Jane Doe", "John Smith", "Jane Smith"];

/// Emits a fake webhook request every `interval`
pub struct DemoTransport {
    interval: Duration,
}

impl DemoTransport {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

/// Build a plausible random request
pub fn fake_record<R: Rng>(rng: &mut R) -> RequestRecord {
    let method = METHODS[rng.gen_range(0..METHODS.len())];
    let endpoint = ENDPOINTS[rng.gen_range(0..ENDPOINTS.len())];
    let name = NAMES[rng.gen_range(0..NAMES.len())];
    let age: u8 = rng.gen_range(0..100);

    let mut headers = Map::new();
    headers.insert("Content-Type".to_string(), json!(["application/json"]));
    headers.insert(
        "User-Agent".to_string(),
        json!([format!("hookwatch-demo/{}", env!("CARGO_PKG_VERSION"))]),
    );

    RequestRecord {
        id: Uuid::new_v4().to_string(),
        method: method.to_string(),
        endpoint: endpoint.to_string(),
        timestamp: Utc::now(),
        headers,
        body: format!("{{\"name\": \"{}\", \"age\": {}}}", name, age),
    }
}

impl Transport for DemoTransport {
    async fn run(self, events: mpsc::Sender<TransportEvent>) {
        if events.send(TransportEvent::Open).await.is_err() {
            return;
        }

        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            let record = fake_record(&mut rand::thread_rng());
            let payload = match record.to_json() {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!("Failed to encode demo request: {}", e);
                    continue;
                }
            };
            if events.send(TransportEvent::Message(payload)).await.is_err() {
                return;
            }
        }
    }
}

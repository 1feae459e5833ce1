//! Session-scoped request registry

use hookwatch_common::RequestRecord;
use std::collections::HashMap;

/// In-memory store of the requests received during this session, keyed by id.
///
/// The store has no ordering of its own; display order belongs to the
/// controller's list.
#[derive(Debug, Default)]
pub struct RequestStore {
    requests: HashMap<String, RequestRecord>,
}

impl RequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request, replacing any earlier record with the same id.
    /// Returns the replaced record.
    pub fn insert(&mut self, request: RequestRecord) -> Option<RequestRecord> {
        self.requests.insert(request.id.clone(), request)
    }

    /// Get a specific request by ID
    pub fn get(&self, id: &str) -> Option<&RequestRecord> {
        self.requests.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.requests.contains_key(id)
    }

    /// Number of distinct ids stored
    pub fn count(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Clear all requests
    pub fn clear(&mut self) {
        self.requests.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestRecord> {
        self.requests.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Map;

    fn record(id: &str, endpoint: &str) -> RequestRecord {
        RequestRecord {
            id: id.to_string(),
            method: "POST".to_string(),
            endpoint: endpoint.to_string(),
            timestamp: Utc::now(),
            headers: Map::new(),
            body: String::new(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = RequestStore::new();
        assert!(store.is_empty());

        assert!(store.insert(record("a", "/users")).is_none());
        assert!(store.insert(record("b", "/orders")).is_none());

        assert_eq!(store.count(), 2);
        assert_eq!(store.get("a").unwrap().endpoint, "/users");
        assert!(store.contains("b"));
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_id_overwrites() {
        let mut store = RequestStore::new();
        store.insert(record("a", "/users"));

        let replaced = store.insert(record("a", "/products"));

        assert_eq!(replaced.unwrap().endpoint, "/users");
        assert_eq!(store.count(), 1);
        assert_eq!(store.get("a").unwrap().endpoint, "/products");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut store = RequestStore::new();
        store.insert(record("a", "/users"));
        store.insert(record("b", "/users"));

        store.clear();
        assert_eq!(store.count(), 0);
        store.clear();
        assert_eq!(store.count(), 0);

        store.insert(record("a", "/users"));
        assert_eq!(store.count(), 1);
    }
}

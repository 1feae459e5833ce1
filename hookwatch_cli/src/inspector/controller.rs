//! Presentation controller: ingestion, storage, rendering and notifications
//!
//! The controller owns the session state (registry, list order, selection,
//! notification permission) and is the only writer of it. Everything it shows
//! goes through a [`RenderTarget`]; everything it announces goes through a
//! [`Notifier`].

use super::detail::{project, DetailView};
use super::store::RequestStore;
use super::time::relative_time;
use crate::notify::{Notifier, Permission};
use crate::stream::ConnectionState;
use chrono::{DateTime, Utc};
use hookwatch_common::RequestRecord;
use std::collections::VecDeque;
use tokio::sync::oneshot;

/// Title used for new-request notifications
pub const NOTIFICATION_TITLE: &str = "Webhook Inspector";

/// One row of the request list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: String,
    pub method: String,
    pub endpoint: String,
    /// Relative-time label, e.g. "5 seconds ago"
    pub label: String,
}

/// Changes applied to the rendered request list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListUpdate {
    /// Insert a new entry at the head of the list
    Prepend(ListEntry),
    /// Replace an existing entry in place, keeping its position
    Replace(ListEntry),
    /// Update the relative-time label of an existing entry
    Relabel { id: String, label: String },
    /// Remove every entry
    Clear,
}

/// Rendering surface the controller draws on
pub trait RenderTarget {
    fn render_list(&mut self, update: ListUpdate);
    /// `None` resets the detail panes to their empty state
    fn render_detail(&mut self, detail: Option<&DetailView>);
    fn render_status(&mut self, status: &str);
    fn render_count(&mut self, count: &str);
}

/// Last text written to a display node. Writes of an unchanged value are skipped.
#[derive(Debug, Default)]
pub struct DisplayedText {
    current: Option<String>,
}

impl DisplayedText {
    pub fn new(initial: String) -> Self {
        Self {
            current: Some(initial),
        }
    }

    /// Record `value`, returning whether it differs from what is displayed
    pub fn update(&mut self, value: &str) -> bool {
        if self.current.as_deref() == Some(value) {
            return false;
        }
        self.current = Some(value.to_string());
        true
    }

    pub fn get(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

struct EntryState {
    id: String,
    label: DisplayedText,
}

/// Session-scoped state
struct Session {
    store: RequestStore,
    /// Rendered list order, most recent first
    entries: VecDeque<EntryState>,
    selected: Option<String>,
    permission: Permission,
    permission_requested: bool,
    status: DisplayedText,
    count: DisplayedText,
}

pub struct Controller<R, N> {
    target: R,
    notifier: N,
    session: Session,
}

impl<R: RenderTarget, N: Notifier> Controller<R, N> {
    pub fn new(target: R, notifier: N) -> Self {
        let permission = notifier.permission();
        let mut controller = Self {
            target,
            notifier,
            session: Session {
                store: RequestStore::new(),
                entries: VecDeque::new(),
                selected: None,
                permission,
                permission_requested: false,
                status: DisplayedText::default(),
                count: DisplayedText::default(),
            },
        };
        controller.refresh_count();
        controller
    }

    /// Handle a record delivered by the stream
    pub fn ingest(&mut self, record: RequestRecord) {
        self.ingest_at(record, Utc::now());
    }

    pub(crate) fn ingest_at(&mut self, record: RequestRecord, now: DateTime<Utc>) {
        let label = relative_time(record.timestamp, now);
        let entry = ListEntry {
            id: record.id.clone(),
            method: record.method.clone(),
            endpoint: record.endpoint.clone(),
            label: label.clone(),
        };

        if self.session.store.contains(&record.id) {
            // Retransmission: replace the record, keep the single list entry
            tracing::debug!("Duplicate request id {}, replacing record", record.id);
            if let Some(state) = self.session.entries.iter_mut().find(|e| e.id == record.id) {
                state.label = DisplayedText::new(label);
            }
            self.target.render_list(ListUpdate::Replace(entry));
            let id = record.id.clone();
            self.session.store.insert(record);
            if self.session.selected.as_deref() == Some(id.as_str()) {
                self.select(&id);
            }
            return;
        }

        let summary = record.summary();
        self.target.render_list(ListUpdate::Prepend(entry));
        self.session.entries.push_front(EntryState {
            id: record.id.clone(),
            label: DisplayedText::new(label),
        });
        self.session.store.insert(record);
        self.refresh_count();

        if self.notifications_enabled() {
            if let Err(e) = self.notifier.notify(NOTIFICATION_TITLE, &summary) {
                tracing::debug!("Failed to show notification: {}", e);
            }
        }
    }

    /// Show the detail of a request. Returns false for unknown ids.
    pub fn select(&mut self, id: &str) -> bool {
        let Some(record) = self.session.store.get(id) else {
            return false;
        };
        let view = project(record);
        self.target.render_detail(Some(&view));
        self.session.selected = Some(id.to_string());
        true
    }

    /// Empty the list, the registry and the detail view
    pub fn clear(&mut self) {
        self.target.render_list(ListUpdate::Clear);
        self.session.entries.clear();
        self.session.store.clear();
        self.session.selected = None;
        self.target.render_detail(None);
        self.refresh_count();
        tracing::info!("Cleared captured requests");
    }

    /// Redraw the connection status if it changed
    pub fn refresh_status(&mut self, state: ConnectionState) {
        let text = state.status_text();
        if self.session.status.update(text) {
            self.target.render_status(text);
        }
    }

    /// Recompute every relative-time label, redrawing only the changed ones
    pub fn refresh_relative_times(&mut self, now: DateTime<Utc>) {
        let Session { store, entries, .. } = &mut self.session;
        for entry in entries.iter_mut() {
            let Some(record) = store.get(&entry.id) else {
                continue;
            };
            let label = relative_time(record.timestamp, now);
            if entry.label.update(&label) {
                self.target.render_list(ListUpdate::Relabel {
                    id: entry.id.clone(),
                    label,
                });
            }
        }
    }

    fn refresh_count(&mut self) {
        let text = self.session.store.count().to_string();
        if self.session.count.update(&text) {
            self.target.render_count(&text);
        }
    }

    /// Ask for notification permission if it is still undecided.
    /// Only the first call can issue a request.
    pub fn request_permission(&mut self) -> Option<oneshot::Receiver<Permission>> {
        if self.session.permission != Permission::Default || self.session.permission_requested {
            return None;
        }
        self.session.permission_requested = true;
        Some(self.notifier.request_permission())
    }

    /// Record the user's answer. A decided permission never changes again.
    pub fn permission_decided(&mut self, permission: Permission) {
        if self.session.permission != Permission::Default {
            return;
        }
        self.session.permission = permission;
        match permission {
            Permission::Granted => tracing::info!("Notification permission granted"),
            Permission::Denied => tracing::info!("Notification permission denied"),
            Permission::Default => tracing::debug!("Notification permission left undecided"),
        }
    }

    pub fn notifications_enabled(&self) -> bool {
        self.session.permission == Permission::Granted
    }

    pub fn count(&self) -> usize {
        self.session.store.count()
    }

    pub fn store(&self) -> &RequestStore {
        &self.session.store
    }

    pub fn selected(&self) -> Option<&str> {
        self.session.selected.as_deref()
    }

    /// Ids in display order
    pub fn list_ids(&self) -> Vec<&str> {
        self.session.entries.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut R {
        &mut self.target
    }
}

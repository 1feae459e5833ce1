//! TUI application state and event handling

use crate::inspector::{DetailView, ListEntry, ListUpdate, RenderTarget};
use crate::notify::Permission;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// How long a notification toast stays visible
const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Lines scrolled by PageUp/PageDown in the body pane
const BODY_PAGE: u16 = 10;

/// Actions the user asked for that the controller has to carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Select(String),
    Clear,
    Quit,
}

/// Transient notification line
#[derive(Debug, Clone)]
pub struct Toast {
    pub title: String,
    pub body: String,
    shown_at: Instant,
}

/// TUI application state
pub struct TuiApp {
    pub source: String,
    pub status: String,
    pub count: String,
    /// Request list, most recent first
    pub entries: Vec<ListEntry>,
    pub selected_index: usize,
    pub detail: Option<DetailView>,
    pub body_scroll: u16,
    pub toast: Option<Toast>,
    permission_prompt: Option<oneshot::Sender<Permission>>,
    pub should_quit: bool,
    dirty: bool,
    bell: bool,
}

impl TuiApp {
    pub fn new(source: String) -> Self {
        Self {
            source,
            status: "connecting".to_string(),
            count: "0".to_string(),
            entries: Vec::new(),
            selected_index: 0,
            detail: None,
            body_scroll: 0,
            toast: None,
            permission_prompt: None,
            should_quit: false,
            dirty: true,
            bell: false,
        }
    }

    /// Whether anything changed since the last frame. Resets the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Whether the terminal bell should ring. Resets the flag.
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }

    /// Force a redraw, e.g. after a terminal resize
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn prompt_visible(&self) -> bool {
        self.permission_prompt.is_some()
    }

    /// Show the notification permission prompt
    pub fn show_permission_prompt(&mut self, reply: oneshot::Sender<Permission>) {
        self.permission_prompt = Some(reply);
        self.dirty = true;
    }

    pub fn show_toast(&mut self, title: String, body: String) {
        self.toast = Some(Toast {
            title,
            body,
            shown_at: Instant::now(),
        });
        self.bell = true;
        self.dirty = true;
    }

    /// Drop the toast once it has been visible long enough
    pub fn expire_toast(&mut self, now: Instant) {
        if let Some(toast) = &self.toast {
            if now.duration_since(toast.shown_at) >= TOAST_DURATION {
                self.toast = None;
                self.dirty = true;
            }
        }
    }

    pub fn highlighted(&self) -> Option<&ListEntry> {
        self.entries.get(self.selected_index)
    }

    fn answer_prompt(&mut self, permission: Option<Permission>) {
        if let Some(reply) = self.permission_prompt.take() {
            if let Some(permission) = permission {
                let _ = reply.send(permission);
            }
            self.dirty = true;
        }
    }

    /// Handle key events
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<UserAction> {
        if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
            self.should_quit = true;
            return Some(UserAction::Quit);
        }

        if self.prompt_visible() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.answer_prompt(Some(Permission::Granted)),
                KeyCode::Char('n') | KeyCode::Char('N') => self.answer_prompt(Some(Permission::Denied)),
                // Dismissed without deciding
                KeyCode::Esc => self.answer_prompt(None),
                _ => {}
            }
            return None;
        }

        let last = self.entries.len().saturating_sub(1);
        let action = match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Some(UserAction::Quit)
            }
            KeyCode::Char('c') => Some(UserAction::Clear),
            KeyCode::Enter => self.highlighted().map(|e| UserAction::Select(e.id.clone())),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_index = self.selected_index.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_index = (self.selected_index + 1).min(last);
                None
            }
            KeyCode::Home => {
                self.selected_index = 0;
                None
            }
            KeyCode::End => {
                self.selected_index = last;
                None
            }
            KeyCode::PageUp => {
                self.body_scroll = self.body_scroll.saturating_sub(BODY_PAGE);
                None
            }
            KeyCode::PageDown => {
                self.body_scroll = self.body_scroll.saturating_add(BODY_PAGE);
                None
            }
            _ => return None,
        };
        self.dirty = true;
        action
    }
}

impl RenderTarget for TuiApp {
    fn render_list(&mut self, update: ListUpdate) {
        match update {
            ListUpdate::Prepend(entry) => {
                // Keep the cursor on the entry it was on
                if !self.entries.is_empty() {
                    self.selected_index += 1;
                }
                self.entries.insert(0, entry);
            }
            ListUpdate::Replace(entry) => {
                if let Some(existing) = self.entries.iter_mut().find(|e| e.id == entry.id) {
                    *existing = entry;
                }
            }
            ListUpdate::Relabel { id, label } => {
                if let Some(existing) = self.entries.iter_mut().find(|e| e.id == id) {
                    existing.label = label;
                }
            }
            ListUpdate::Clear => {
                self.entries.clear();
                self.selected_index = 0;
            }
        }
        self.dirty = true;
    }

    fn render_detail(&mut self, detail: Option<&DetailView>) {
        self.detail = detail.cloned();
        self.body_scroll = 0;
        self.dirty = true;
    }

    fn render_status(&mut self, status: &str) {
        self.status = status.to_string();
        self.dirty = true;
    }

    fn render_count(&mut self, count: &str) {
        self.count = count.to_string();
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn entry(id: &str) -> ListEntry {
        ListEntry {
            id: id.to_string(),
            method: "POST".to_string(),
            endpoint: "/hooks".to_string(),
            label: "0 seconds ago".to_string(),
        }
    }

    fn app_with(ids: &[&str]) -> TuiApp {
        let mut app = TuiApp::new("http://localhost:8080/sse".to_string());
        for id in ids {
            app.render_list(ListUpdate::Prepend(entry(id)));
        }
        app
    }

    #[test]
    fn test_cursor_follows_prepends() {
        let mut app = app_with(&["A"]);
        assert_eq!(app.highlighted().unwrap().id, "A");

        app.render_list(ListUpdate::Prepend(entry("B")));
        assert_eq!(app.highlighted().unwrap().id, "A");
        assert_eq!(app.entries[0].id, "B");
    }

    #[test]
    fn test_navigation_and_select() {
        let mut app = app_with(&["A", "B", "C"]);
        app.selected_index = 0;

        assert_eq!(app.handle_key(key(KeyCode::Down)), None);
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Some(UserAction::Select("B".to_string())));

        app.handle_key(key(KeyCode::End));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.highlighted().unwrap().id, "A");

        app.handle_key(key(KeyCode::Home));
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.highlighted().unwrap().id, "C");
    }

    #[test]
    fn test_enter_on_empty_list() {
        let mut app = app_with(&[]);
        assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
    }

    #[test]
    fn test_clear_and_quit_keys() {
        let mut app = app_with(&["A"]);

        assert_eq!(app.handle_key(key(KeyCode::Char('c'))), Some(UserAction::Clear));
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(UserAction::Quit)
        );
        assert!(app.should_quit);
    }

    #[test]
    fn test_permission_prompt_answers() {
        let mut app = app_with(&["A"]);
        let (tx, mut rx) = oneshot::channel();
        app.show_permission_prompt(tx);

        // keys go to the prompt while it is open
        assert_eq!(app.handle_key(key(KeyCode::Char('c'))), None);
        app.handle_key(key(KeyCode::Char('y')));

        assert!(!app.prompt_visible());
        assert_eq!(rx.try_recv().unwrap(), Permission::Granted);
    }

    #[test]
    fn test_permission_prompt_dismissed() {
        let mut app = app_with(&[]);
        let (tx, mut rx) = oneshot::channel();
        app.show_permission_prompt(tx);

        app.handle_key(key(KeyCode::Esc));

        assert!(!app.prompt_visible());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dirty_tracking() {
        let mut app = app_with(&[]);
        assert!(app.take_dirty());
        assert!(!app.take_dirty());

        app.render_status("connected");
        assert!(app.take_dirty());
        assert!(!app.take_dirty());
    }

    #[test]
    fn test_toast_expires() {
        let mut app = app_with(&[]);
        app.show_toast("Webhook Inspector".to_string(), "GET /".to_string());
        assert!(app.take_bell());

        app.expire_toast(Instant::now());
        assert!(app.toast.is_some());

        app.expire_toast(Instant::now() + TOAST_DURATION);
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_clear_resets_cursor() {
        let mut app = app_with(&["A", "B"]);
        app.render_list(ListUpdate::Clear);

        assert!(app.entries.is_empty());
        assert_eq!(app.selected_index, 0);
    }
}

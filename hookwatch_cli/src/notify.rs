//! User notifications for newly captured requests
//!
//! The controller talks to a [`Notifier`]; the terminal implementation asks
//! for permission inside the TUI and shows notifications as a toast line.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Notification permission, decided at most once per session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Default,
    Granted,
    Denied,
}

/// Notification mode from the config file or command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    /// Ask once after startup
    #[default]
    Ask,
    /// Always notify
    Always,
    /// Never notify
    Never,
}

impl NotifyMode {
    pub fn initial_permission(self) -> Permission {
        match self {
            NotifyMode::Ask => Permission::Default,
            NotifyMode::Always => Permission::Granted,
            NotifyMode::Never => Permission::Denied,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyMode::Ask => "ask",
            NotifyMode::Always => "always",
            NotifyMode::Never => "never",
        }
    }
}

/// Notification errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification surface is no longer available")]
    SurfaceClosed,

    #[error("Notifications are not permitted")]
    NotPermitted,
}

/// The notification collaborator
pub trait Notifier {
    /// Permission as known before any request made this session
    fn permission(&self) -> Permission;

    /// Ask the user for permission. The answer arrives on the returned channel;
    /// a dropped sender means the question went unanswered.
    fn request_permission(&mut self) -> oneshot::Receiver<Permission>;

    /// Show a short notification
    fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Events the terminal notifier hands to the TUI loop
#[derive(Debug)]
pub enum NoticeEvent {
    /// Show the permission prompt and answer through the sender
    PermissionPrompt(oneshot::Sender<Permission>),
    /// Show a notification toast
    Show { title: String, body: String },
}

/// Notifier that surfaces prompts and notifications through the TUI
pub struct TerminalNotifier {
    permission: Permission,
    events: mpsc::UnboundedSender<NoticeEvent>,
}

impl TerminalNotifier {
    pub fn new(mode: NotifyMode) -> (Self, mpsc::UnboundedReceiver<NoticeEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                permission: mode.initial_permission(),
                events,
            },
            rx,
        )
    }
}

impl Notifier for TerminalNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> oneshot::Receiver<Permission> {
        let (tx, rx) = oneshot::channel();
        if self.events.send(NoticeEvent::PermissionPrompt(tx)).is_err() {
            tracing::debug!("Permission prompt dropped, TUI is gone");
        }
        rx
    }

    fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
        if self.permission == Permission::Denied {
            return Err(NotifyError::NotPermitted);
        }
        self.events
            .send(NoticeEvent::Show {
                title: title.to_string(),
                body: body.to_string(),
            })
            .map_err(|_| NotifyError::SurfaceClosed)
    }
}

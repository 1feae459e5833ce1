//! Watch command - live view of requests arriving at the capture server

use crate::config::Config;
use crate::inspector::{relative_time_from_now, Controller, Scheduler, Tick};
use crate::notify::{NoticeEvent, NotifyMode, Permission, TerminalNotifier};
use crate::stream::{DemoTransport, RecordStream, SseTransport, StreamClient};
use crate::tui::{TuiApp, UserAction};
use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

/// How often keyboard input is polled
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);

type Tui = Terminal<CrosstermBackend<io::Stdout>>;
type WatchController = Controller<TuiApp, TerminalNotifier>;

/// Options for the watch command
pub struct WatchOptions {
    pub url: Option<String>,
    pub demo: bool,
    pub notifications: Option<NotifyMode>,
}

/// Where records come from
#[derive(Debug, PartialEq)]
enum StreamSource {
    Demo(Duration),
    Server(String),
}

impl WatchOptions {
    /// Pick the record source. The stream URL is only checked when a server is used.
    fn source(&self, config: &mut Config) -> Result<StreamSource> {
        if self.demo {
            return Ok(StreamSource::Demo(config.demo_interval()));
        }
        let url = self.url.clone().unwrap_or_else(|| config.stream_url.clone());
        config.set_stream_url(&url)?;
        Ok(StreamSource::Server(config.stream_url.clone()))
    }
}

/// Run the watch command
pub async fn run(opts: WatchOptions) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(mode) = opts.notifications {
        config.notifications = mode;
    }

    let (client, records, source) = match opts.source(&mut config)? {
        StreamSource::Demo(interval) => {
            tracing::info!("Starting demo stream every {:?}", interval);
            let (client, records) = StreamClient::connect(DemoTransport::new(interval));
            (client, records, "demo".to_string())
        }
        StreamSource::Server(url) => {
            let transport = SseTransport::new(&url, config.reconnect_delay())
                .context("Failed to set up event stream")?;
            tracing::info!("Connecting to {}", transport.url());
            let (client, records) = StreamClient::connect(transport);
            (client, records, url)
        }
    };

    let (notifier, notices) = TerminalNotifier::new(config.notifications);
    let mut controller = Controller::new(TuiApp::new(source), notifier);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut controller, &client, records, notices).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("Watch ended with {} requests received", controller.count());
    result
}

async fn run_loop(
    terminal: &mut Tui,
    controller: &mut WatchController,
    client: &StreamClient,
    mut records: RecordStream,
    mut notices: mpsc::UnboundedReceiver<NoticeEvent>,
) -> Result<()> {
    let mut scheduler = Scheduler::new();
    let mut input_interval = tokio::time::interval(INPUT_POLL_INTERVAL);
    let mut pending_permission: Option<oneshot::Receiver<Permission>> = None;
    let mut stream_open = true;

    controller.refresh_status(client.state());

    loop {
        let app = controller.target_mut();
        app.expire_toast(Instant::now());
        if app.take_dirty() {
            terminal.draw(|f| crate::tui::draw(f, app))?;
        }
        if app.take_bell() {
            ring_bell(terminal)?;
        }

        tokio::select! {
            record = records.recv(), if stream_open => {
                match record {
                    Some(record) => {
                        tracing::debug!(
                            "Received {} {} (sent {})",
                            record.id,
                            record.summary(),
                            relative_time_from_now(record.timestamp)
                        );
                        controller.ingest(record);
                    }
                    None => {
                        tracing::info!("Event stream finished");
                        stream_open = false;
                    }
                }
            }

            tick = scheduler.next() => {
                match tick {
                    Tick::Status => controller.refresh_status(client.state()),
                    Tick::RelativeTimes => controller.refresh_relative_times(Utc::now()),
                    Tick::RequestPermission => {
                        if let Some(answer) = controller.request_permission() {
                            pending_permission = Some(answer);
                        }
                    }
                }
            }

            Some(notice) = notices.recv() => {
                let app = controller.target_mut();
                match notice {
                    NoticeEvent::PermissionPrompt(reply) => app.show_permission_prompt(reply),
                    NoticeEvent::Show { title, body } => app.show_toast(title, body),
                }
            }

            permission = await_permission(&mut pending_permission), if pending_permission.is_some() => {
                pending_permission = None;
                controller.permission_decided(permission);
            }

            _ = input_interval.tick() => {
                while event::poll(Duration::from_millis(0))? {
                    match event::read()? {
                        Event::Key(key) => {
                            if let Some(action) = controller.target_mut().handle_key(key) {
                                match action {
                                    UserAction::Select(id) => {
                                        controller.select(&id);
                                    }
                                    UserAction::Clear => controller.clear(),
                                    UserAction::Quit => return Ok(()),
                                }
                            }
                        }
                        Event::Resize(_, _) => controller.target_mut().mark_dirty(),
                        _ => {}
                    }
                }
            }
        }
    }
}

/// Wait for the permission answer. An unanswered prompt leaves it undecided.
async fn await_permission(pending: &mut Option<oneshot::Receiver<Permission>>) -> Permission {
    match pending.as_mut() {
        Some(answer) => answer.await.unwrap_or(Permission::Default),
        None => std::future::pending().await,
    }
}

fn ring_bell(terminal: &mut Tui) -> Result<()> {
    let backend = terminal.backend_mut();
    backend.write_all(b"\x07")?;
    backend.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(url: Option<&str>, demo: bool) -> WatchOptions {
        WatchOptions {
            url: url.map(str::to_string),
            demo,
            notifications: None,
        }
    }

    fn config_with_url(url: &str) -> Config {
        Config {
            stream_url: url.to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_demo_ignores_invalid_stream_url() {
        let mut config = config_with_url("not a url");

        let source = options(None, true).source(&mut config).unwrap();

        assert_eq!(source, StreamSource::Demo(Duration::from_secs(5)));
    }

    #[test]
    fn test_server_requires_valid_stream_url() {
        let mut config = config_with_url("not a url");
        assert!(options(None, false).source(&mut config).is_err());

        let source = options(Some("http://127.0.0.1:9000/sse"), false)
            .source(&mut config)
            .unwrap();
        assert_eq!(source, StreamSource::Server("http://127.0.0.1:9000/sse".to_string()));
    }
}

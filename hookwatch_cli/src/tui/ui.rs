//! TUI rendering functions

use super::app::TuiApp;
use ratatui::{
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, Table, TableState, Wrap},
    Frame,
};

/// Draw the TUI
pub fn draw(frame: &mut Frame, app: &TuiApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Min(5),    // Requests + detail
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    draw_title_bar(frame, app, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    draw_request_list(frame, app, panes[0]);
    draw_detail(frame, app, panes[1]);
    draw_footer(frame, app, chunks[2]);

    if app.prompt_visible() {
        let area = frame.area();
        draw_permission_prompt(frame, area);
    }
}

/// Draw the title bar with connection status and request count
fn draw_title_bar(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let status_color = match app.status.as_str() {
        "connected" => Color::Green,
        "connecting" => Color::Yellow,
        _ => Color::Red,
    };

    let max_source_len = (area.width as usize).saturating_sub(50);

    let lines = vec![
        Line::from(vec![
            Span::styled(" HOOKWATCH  ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::styled(truncate_str(&app.source, max_source_len), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::styled(" Status ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                app.status.as_str(),
                Style::default().fg(status_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  │  ", Style::default().fg(Color::DarkGray)),
            Span::styled("Requests ", Style::default().fg(Color::DarkGray)),
            Span::styled(app.count.as_str(), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

/// Draw the request list with scrolling and scrollbar
fn draw_request_list(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let selected_id = app.detail.as_ref().map(|d| d.id.as_str());

    let rows: Vec<Row> = app
        .entries
        .iter()
        .map(|entry| {
            let marker = if Some(entry.id.as_str()) == selected_id { "●" } else { " " };
            Row::new(vec![
                Cell::from(marker).style(Style::default().fg(Color::Cyan)),
                Cell::from(format!("{:>6}", truncate_str(&entry.method, 6))).style(method_style(&entry.method)),
                Cell::from(entry.endpoint.as_str()),
                Cell::from(entry.label.as_str()).style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let table = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Length(7),
            Constraint::Min(8),
            Constraint::Length(16),
        ],
    )
    .block(
        Block::default()
            .title(" Requests ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
    .row_highlight_style(Style::default().bg(Color::Rgb(40, 40, 60)));

    let mut state = TableState::default();
    if !app.entries.is_empty() {
        state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(table, chunks[0], &mut state);

    if !app.entries.is_empty() {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");

        let mut scrollbar_state = ScrollbarState::new(app.entries.len()).position(app.selected_index);

        frame.render_stateful_widget(scrollbar, chunks[1], &mut scrollbar_state);
    }
}

/// Draw the headers and body panes for the selected request
fn draw_detail(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let Some(detail) = &app.detail else {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            "Select a request to see its headers and body",
            Style::default().fg(Color::DarkGray),
        )))
        .block(
            Block::default()
                .title(" Headers ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(placeholder, area);
        return;
    };

    let header_lines: Vec<Line> = detail
        .headers
        .iter()
        .map(|(name, value)| {
            Line::from(vec![
                Span::styled(format!("{}: ", name), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
                Span::raw(value.as_str()),
            ])
        })
        .collect();

    let headers_block = Block::default()
        .title(format!(" {} ", detail.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    // Body pane is hidden entirely for empty bodies
    let Some(body) = detail.body_text() else {
        frame.render_widget(
            Paragraph::new(header_lines).block(headers_block).wrap(Wrap { trim: false }),
            area,
        );
        return;
    };

    let header_height = pane_height(detail.headers.len()).min(area.height / 2).max(3);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(header_height), Constraint::Min(3)])
        .split(area);

    frame.render_widget(
        Paragraph::new(header_lines).block(headers_block).wrap(Wrap { trim: false }),
        chunks[0],
    );

    let body_title = match detail.body.as_ref().map(|b| b.is_json()) {
        Some(true) => " Body (json) ",
        _ => " Body ",
    };
    let body_paragraph = Paragraph::new(body)
        .block(
            Block::default()
                .title(body_title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.body_scroll, 0));
    frame.render_widget(body_paragraph, chunks[1]);
}

/// Draw the footer with key hints, or the current notification toast
fn draw_footer(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let text = if let Some(toast) = &app.toast {
        Line::from(vec![
            Span::styled(format!(" {} ", toast.title), Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::styled(format!(" {}", toast.body), Style::default().fg(Color::White)),
        ])
    } else {
        Line::from(vec![
            Span::styled("↑/↓", Style::default().fg(Color::Cyan)),
            Span::styled(" Navigate  ", Style::default().fg(Color::DarkGray)),
            Span::styled("Enter", Style::default().fg(Color::Cyan)),
            Span::styled(" Details  ", Style::default().fg(Color::DarkGray)),
            Span::styled("PgUp/PgDn", Style::default().fg(Color::Cyan)),
            Span::styled(" Scroll body  ", Style::default().fg(Color::DarkGray)),
            Span::styled("c", Style::default().fg(Color::Cyan)),
            Span::styled(" Clear  ", Style::default().fg(Color::DarkGray)),
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::styled(" Quit", Style::default().fg(Color::DarkGray)),
        ])
    };

    frame.render_widget(Paragraph::new(text), area);
}

/// Draw the notification permission question as a centered popup
fn draw_permission_prompt(frame: &mut Frame, area: Rect) {
    let [popup] = Layout::vertical([Constraint::Length(5)]).flex(Flex::Center).areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(52)]).flex(Flex::Center).areas(popup);

    let lines = vec![
        Line::from("Show a notification for every new request?"),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(Color::Cyan)),
            Span::styled(" Allow  ", Style::default().fg(Color::DarkGray)),
            Span::styled("n", Style::default().fg(Color::Cyan)),
            Span::styled(" Block  ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Cyan)),
            Span::styled(" Later", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(" Notifications ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        ),
        popup,
    );
}

/// Height of a bordered pane holding `lines` lines
fn pane_height(lines: usize) -> u16 {
    u16::try_from(lines).unwrap_or(u16::MAX).saturating_add(2)
}

/// Get style for HTTP method
fn method_style(method: &str) -> Style {
    match method {
        "GET" => Style::default().fg(Color::Green),
        "POST" => Style::default().fg(Color::Yellow),
        "PUT" => Style::default().fg(Color::Blue),
        "PATCH" => Style::default().fg(Color::Magenta),
        "DELETE" => Style::default().fg(Color::Red),
        "HEAD" => Style::default().fg(Color::Cyan),
        _ => Style::default().fg(Color::White),
    }
}

/// Truncate any string to max length (in characters)
fn truncate_str(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else if max_len > 3 {
        format!("{}...", s.chars().take(max_len - 3).collect::<String>())
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::{project, ListEntry, ListUpdate, RenderTarget};
    use chrono::Utc;
    use hookwatch_common::RequestRecord;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::Map;

    fn screen(app: &TuiApp) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_draw_list_and_detail() {
        let mut app = TuiApp::new("http://localhost:8080/sse".to_string());
        app.render_status("connected");
        app.render_count("1");
        app.render_list(ListUpdate::Prepend(ListEntry {
            id: "a".to_string(),
            method: "POST".to_string(),
            endpoint: "/payments".to_string(),
            label: "3 seconds ago".to_string(),
        }));
        let mut headers = Map::new();
        headers.insert("Content-Type".to_string(), serde_json::json!(["application/json"]));
        let record = RequestRecord {
            id: "a".to_string(),
            method: "POST".to_string(),
            endpoint: "/payments".to_string(),
            timestamp: Utc::now(),
            headers,
            body: r#"{"amount":10}"#.to_string(),
        };
        app.render_detail(Some(&project(&record)));

        let text = screen(&app);
        assert!(text.contains("connected"));
        assert!(text.contains("/payments"));
        assert!(text.contains("3 seconds ago"));
        assert!(text.contains("Content-Type: application/json"));
        assert!(text.contains("\"amount\": 10"));
    }

    #[test]
    fn test_draw_permission_prompt() {
        let mut app = TuiApp::new("demo".to_string());
        let (tx, _rx) = tokio::sync::oneshot::channel();
        app.show_permission_prompt(tx);

        assert!(screen(&app).contains("Show a notification for every new request?"));
    }

    #[test]
    fn test_pane_height_saturates() {
        assert_eq!(pane_height(0), 2);
        assert_eq!(pane_height(3), 5);
        assert_eq!(pane_height(65_534), u16::MAX);
        assert_eq!(pane_height(100_000), u16::MAX);
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("/a/very/long/path", 8), "/a/ve...");
        assert_eq!(truncate_str("abcdef", 2), "ab");
    }
}

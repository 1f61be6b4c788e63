//! The "Data from API" window: shows the single fact fetched for it when it
//! opened.

use chrono::{DateTime, Local};
use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use serde_json::Value;

use desk_core::channels::{Channel, Reply};
use desk_core::models::{WindowId, WindowKind};
use desk_runtime::bridge::{BridgeEndpoint, PumpReport};
use desk_runtime::windows::WindowController;

use crate::add_user_view::centered_rect;
use crate::themes::Theme;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum FactState {
    #[default]
    Loading,
    Loaded {
        body: Value,
        fetched_at: DateTime<Local>,
    },
    Failed(String),
}

impl FactState {
    /// Handler for `fact-response`. The body is kept as-is.
    pub fn on_fact(&mut self, payload: Value) {
        *self = match Reply::<Value>::from_payload(payload) {
            Ok(Reply::Ok { data }) => FactState::Loaded {
                body: data,
                fetched_at: Local::now(),
            },
            Ok(Reply::Error { message }) => FactState::Failed(message),
            Err(e) => {
                tracing::warn!(error = %e, "malformed fact-response");
                FactState::Failed(e.to_string())
            }
        };
    }
}

/// Text to show for a fact body: its `fact` string when there is one,
/// otherwise the whole body pretty-printed.
pub fn display_text(body: &Value) -> String {
    match body.get("fact").and_then(Value::as_str) {
        Some(fact) => fact.to_string(),
        None => serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string()),
    }
}

pub struct ApiWindow {
    bridge: BridgeEndpoint<FactState>,
    pub state: FactState,
}

impl ApiWindow {
    /// Open the viewer. The controller queues its one fetch.
    pub fn open(controller: &WindowController) -> Self {
        let mut bridge: BridgeEndpoint<FactState> = controller.open(WindowKind::ApiViewer);
        bridge.receive(Channel::FactResponse.as_str(), FactState::on_fact);
        Self {
            bridge,
            state: FactState::Loading,
        }
    }

    pub fn id(&self) -> WindowId {
        self.bridge.window()
    }

    pub fn pump(&mut self) -> PumpReport {
        self.bridge.pump(&mut self.state)
    }
}

pub fn render_api_view(frame: &mut Frame, area: Rect, state: &FactState, theme: &Theme) {
    let popup = centered_rect(area, 70.min(area.width), 12.min(area.height));
    frame.render_widget(Clear, popup);

    let mut lines = vec![Line::from("")];
    match state {
        FactState::Loading => {
            lines.push(Line::from(Span::styled("Fetching a fact…", theme.info)));
        }
        FactState::Loaded { body, fetched_at } => {
            lines.extend(
                display_text(body)
                    .lines()
                    .map(|l| Line::from(Span::styled(l.to_string(), theme.value))),
            );
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("Fetched at ", theme.label),
                Span::styled(fetched_at.format("%H:%M:%S").to_string(), theme.dim),
            ]));
        }
        FactState::Failed(message) => {
            lines.push(Line::from(Span::styled(
                format!("Could not fetch data: {message}"),
                theme.error,
            )));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Esc: close", theme.dim)));

    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border_style(true))
                    .title(format!(" {} ", WindowKind::ApiViewer.title())),
            ),
        popup,
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! The main window: the full user list, reloaded from the background process
//! on open and whenever a user is added.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use serde_json::Value;

use desk_core::channels::{Channel, Reply};
use desk_core::models::{User, WindowId, WindowKind};
use desk_runtime::bridge::{BridgeEndpoint, PumpReport};
use desk_runtime::windows::WindowController;

use crate::components::menu_bar::MenuBar;
use crate::themes::Theme;

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MainState {
    pub users: Vec<User>,
    pub status: LoadStatus,
}

impl Default for MainState {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            status: LoadStatus::Loading,
        }
    }
}

impl MainState {
    /// Handler for `list-users-response`.
    ///
    /// A failed load keeps the rows from the last good one.
    pub fn on_list_users(&mut self, payload: Value) {
        match Reply::<Vec<User>>::from_payload(payload) {
            Ok(Reply::Ok { data }) => {
                self.users = data;
                self.status = LoadStatus::Loaded;
            }
            Ok(Reply::Error { message }) => {
                tracing::warn!(error = %message, "user list failed to load");
                self.status = LoadStatus::Failed(message);
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed list-users-response");
                self.status = LoadStatus::Failed(e.to_string());
            }
        }
    }
}

// ── MainWindow ────────────────────────────────────────────────────────────────

pub struct MainWindow {
    bridge: BridgeEndpoint<MainState>,
    pub state: MainState,
}

impl MainWindow {
    /// Open the main window and issue its first load.
    pub fn open(controller: &WindowController) -> Self {
        let mut bridge: BridgeEndpoint<MainState> = controller.open(WindowKind::Main);
        bridge.receive(Channel::ListUsersResponse.as_str(), MainState::on_list_users);

        let mut window = Self {
            bridge,
            state: MainState::default(),
        };
        window.load();
        window
    }

    pub fn id(&self) -> WindowId {
        self.bridge.window()
    }

    /// Load sequence: ask the background process for every user.
    pub fn load(&mut self) {
        self.state.status = LoadStatus::Loading;
        self.bridge
            .send(Channel::ListUsersRequest.as_str(), Value::Null);
    }

    /// Run handlers for pending deliveries. A reload request re-runs
    /// [`Self::load`].
    pub fn pump(&mut self) -> PumpReport {
        let report = self.bridge.pump(&mut self.state);
        if report.reload {
            tracing::debug!(window = %self.id(), "main window reloading");
            self.load();
        }
        report
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Render the main window: menu bar, user table and a status line.
pub fn render_main_view(frame: &mut Frame, area: Rect, state: &MainState, status: &str, theme: &Theme) {
    let [menu_area, body_area, status_area] = Layout::vertical([
        Constraint::Length(MenuBar::HEIGHT),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area);

    frame.render_widget(
        Paragraph::new(Text::from(
            MenuBar::new(WindowKind::Main.title(), theme).to_lines(menu_area.width),
        )),
        menu_area,
    );

    match &state.status {
        LoadStatus::Loading if state.users.is_empty() => {
            render_placeholder(frame, body_area, "Loading users…", theme.info, theme)
        }
        _ if state.users.is_empty() => render_no_data(frame, body_area, theme),
        _ => render_users_table(frame, body_area, &state.users, theme),
    }

    let status_line = match &state.status {
        LoadStatus::Failed(message) => {
            Line::from(Span::styled(format!("Could not load users: {message}"), theme.error))
        }
        _ if !status.is_empty() => Line::from(Span::styled(status.to_string(), theme.warning)),
        _ => Line::from(Span::styled(
            format!("{} user(s)", state.users.len()),
            theme.dim,
        )),
    };
    frame.render_widget(Paragraph::new(status_line), status_area);
}

/// Bordered table with one row per user, in insertion order.
pub fn render_users_table(frame: &mut Frame, area: Rect, users: &[User], theme: &Theme) {
    let header = Row::new(
        ["Name", "Email", "Phone"]
            .iter()
            .map(|h| Cell::from(*h).style(theme.table_header)),
    )
    .height(1);

    let rows: Vec<Row> = users
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(vec![
                Cell::from(user.name.clone()),
                Cell::from(user.email.clone()),
                Cell::from(user.phone.clone()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(35),
        Constraint::Percentage(40),
        Constraint::Percentage(25),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(format!(" {} ", WindowKind::Main.title())),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Placeholder shown when the table is empty.
pub fn render_no_data(frame: &mut Frame, area: Rect, theme: &Theme) {
    render_placeholder(frame, area, "No users yet", theme.warning, theme);
}

fn render_placeholder(frame: &mut Frame, area: Rect, message: &str, style: Style, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), style)),
        Line::from(""),
        Line::from(Span::styled("Press 'n' to create a user", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(format!(" {} ", WindowKind::Main.title())),
        ),
        area,
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────

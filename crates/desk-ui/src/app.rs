//! Application state and TUI event loop for userdesk.
//!
//! [`App`] owns the theme, the main window and at most one child window
//! (the add-user form or the API viewer) drawn as a popup over it. Each
//! window holds its own bridge endpoint; the loop pumps them between key
//! events.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

use desk_core::models::{WindowId, WindowKind};
use desk_runtime::bridge::PumpReport;
use desk_runtime::windows::WindowController;

use crate::add_user_view::{self, AddUserWindow, FormAction};
use crate::api_view::{self, ApiWindow};
use crate::main_view::{self, MainWindow};
use crate::themes::Theme;

const TICK_RATE: Duration = Duration::from_millis(250);

// ── ChildWindow ───────────────────────────────────────────────────────────────

/// A window opened from the main window's menu.
pub enum ChildWindow {
    AddUser(AddUserWindow),
    Api(ApiWindow),
}

impl ChildWindow {
    pub fn id(&self) -> WindowId {
        match self {
            ChildWindow::AddUser(w) => w.id(),
            ChildWindow::Api(w) => w.id(),
        }
    }

    pub fn kind(&self) -> WindowKind {
        match self {
            ChildWindow::AddUser(_) => WindowKind::AddUser,
            ChildWindow::Api(_) => WindowKind::ApiViewer,
        }
    }

    fn pump(&mut self) -> PumpReport {
        match self {
            ChildWindow::AddUser(w) => w.pump(),
            ChildWindow::Api(w) => w.pump(),
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    pub theme: Theme,
    controller: WindowController,
    pub main: MainWindow,
    pub child: Option<ChildWindow>,
    /// One-line hint shown under the user table.
    pub status: String,
    pub should_quit: bool,
}

impl App {
    /// Open the main window and issue its first load.
    pub fn new(theme_name: &str, controller: WindowController) -> Self {
        let main = MainWindow::open(&controller);
        Self {
            theme: Theme::from_name(theme_name),
            controller,
            main,
            child: None,
            status: String::new(),
            should_quit: false,
        }
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the TUI until the user quits or the background process stops.
    ///
    /// Keyboard input is polled synchronously with a short timeout so that
    /// deliveries are pumped between key presses. Every window is closed
    /// before the terminal is restored.
    pub fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);
        self.finish(result, || restore_terminal(&mut terminal))
    }

    /// Close every window, then run `restore`. The loop's own error wins
    /// over a restore failure.
    fn finish(
        &mut self,
        result: io::Result<()>,
        restore: impl FnOnce() -> io::Result<()>,
    ) -> io::Result<()> {
        self.close();
        let restored = restore();
        if let Err(e) = &restored {
            tracing::error!(error = %e, "failed to restore terminal");
        }
        result.and(restored)
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            self.tick();
        }
        Ok(())
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
            self.should_quit = true;
            return;
        }

        if let Some(ChildWindow::AddUser(form)) = &mut self.child {
            match form.handle_key(key) {
                FormAction::Cancel => self.close_child(),
                FormAction::Submitted | FormAction::None => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc if self.child.is_some() => self.close_child(),
            KeyCode::Char('n') => self.open_add_user(),
            KeyCode::Char('a') => self.open_api_viewer(),
            KeyCode::Char('d') => {
                self.status = "Delete User is not available".to_string();
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            _ => {}
        }
    }

    pub fn open_add_user(&mut self) {
        self.close_child();
        self.status.clear();
        self.child = Some(ChildWindow::AddUser(AddUserWindow::open(&self.controller)));
    }

    pub fn open_api_viewer(&mut self) {
        self.close_child();
        self.status.clear();
        self.child = Some(ChildWindow::Api(ApiWindow::open(&self.controller)));
    }

    /// Close the child window, cancelling anything still pending for it.
    pub fn close_child(&mut self) {
        if let Some(child) = self.child.take() {
            self.controller.close(child.id());
        }
    }

    /// Close every window this app opened.
    pub fn close(&mut self) {
        self.close_child();
        self.controller.close(self.main.id());
    }

    // ── Deliveries ────────────────────────────────────────────────────────────

    /// Pump every open window once.
    pub fn tick(&mut self) {
        let report = self.main.pump();
        if report.disconnected {
            tracing::warn!("main window disconnected; quitting");
            self.should_quit = true;
        }

        let Some(child) = &mut self.child else {
            return;
        };
        let report = child.pump();
        if report.destroy || report.disconnected {
            let kind = child.kind();
            self.close_child();
            if report.destroy && kind == WindowKind::AddUser {
                self.status = "User added".to_string();
            }
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        main_view::render_main_view(frame, area, &self.main.state, &self.status, &self.theme);

        match &self.child {
            Some(ChildWindow::AddUser(w)) => {
                add_user_view::render_add_user_view(frame, area, &w.form, &self.theme)
            }
            Some(ChildWindow::Api(w)) => api_view::render_api_view(frame, area, &w.state, &self.theme),
            None => {}
        }
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

// ── Tests ──────────────────────────────────────────────────────────────────────

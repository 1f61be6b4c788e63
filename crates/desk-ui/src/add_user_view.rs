//! The "Create User" window: a three-field form that submits one
//! `add-user-request` and waits for the background process to answer.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use desk_core::channels::{Channel, Reply};
use desk_core::models::{User, WindowId, WindowKind};
use desk_runtime::bridge::{BridgeEndpoint, PumpReport};
use desk_runtime::windows::WindowController;

use crate::themes::Theme;

// ── Form state ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Phone,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Name, Field::Email, Field::Phone];

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "Email",
            Field::Phone => "Phone",
        }
    }

    fn next(self) -> Self {
        match self {
            Field::Name => Field::Email,
            Field::Email => Field::Phone,
            Field::Phone => Field::Name,
        }
    }

    fn prev(self) -> Self {
        match self {
            Field::Name => Field::Phone,
            Field::Email => Field::Name,
            Field::Phone => Field::Email,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormPhase {
    Editing,
    /// A request is in flight; further submits are ignored until it answers.
    Submitting,
    /// The last submit failed; the form stays editable for another attempt.
    Failed(String),
    /// The insert succeeded; the window is about to be destroyed.
    Saved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddUserForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub focus: Field,
    pub phase: FormPhase,
}

impl Default for AddUserForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            focus: Field::Name,
            phase: FormPhase::Editing,
        }
    }
}

impl AddUserForm {
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
        }
    }

    fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
        }
    }

    /// The record the form currently describes. No validation.
    pub fn user(&self) -> User {
        User::new(self.name.clone(), self.email.clone(), self.phone.clone())
    }

    /// Handler for `add-user-response`.
    pub fn on_add_user(&mut self, payload: Value) {
        match Reply::<User>::from_payload(payload) {
            Ok(Reply::Ok { .. }) => self.phase = FormPhase::Saved,
            Ok(Reply::Error { message }) => {
                tracing::warn!(error = %message, "user was not saved");
                self.phase = FormPhase::Failed(message);
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed add-user-response");
                self.phase = FormPhase::Failed(e.to_string());
            }
        }
    }
}

/// What the app should do after a key reached the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    None,
    Submitted,
    Cancel,
}

// ── AddUserWindow ─────────────────────────────────────────────────────────────

pub struct AddUserWindow {
    bridge: BridgeEndpoint<AddUserForm>,
    pub form: AddUserForm,
}

impl AddUserWindow {
    pub fn open(controller: &WindowController) -> Self {
        let mut bridge: BridgeEndpoint<AddUserForm> = controller.open(WindowKind::AddUser);
        bridge.receive(Channel::AddUserResponse.as_str(), AddUserForm::on_add_user);
        Self {
            bridge,
            form: AddUserForm::default(),
        }
    }

    pub fn id(&self) -> WindowId {
        self.bridge.window()
    }

    /// Send the current form contents as one `add-user-request`.
    pub fn submit(&mut self) -> bool {
        if self.form.phase == FormPhase::Submitting {
            return false;
        }
        let payload = match serde_json::to_value(self.form.user()) {
            Ok(payload) => payload,
            Err(e) => {
                self.form.phase = FormPhase::Failed(e.to_string());
                return false;
            }
        };
        tracing::debug!(window = %self.id(), "submitting user");
        self.bridge.send(Channel::AddUserRequest.as_str(), payload);
        self.form.phase = FormPhase::Submitting;
        true
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter if self.submit() => return FormAction::Submitted,
            _ => {}
        }

        let form = &mut self.form;
        match key.code {
            KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
            KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
            KeyCode::Backspace => {
                form.value_mut(form.focus).pop();
            }
            KeyCode::Char(c)
                if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                form.value_mut(form.focus).push(c);
            }
            _ => {}
        }
        FormAction::None
    }

    pub fn pump(&mut self) -> PumpReport {
        self.bridge.pump(&mut self.form)
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Centre a `width` x `height` rectangle inside `area`.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    rect
}

const LABEL_WIDTH: u16 = 8;

/// Render the form as a popup over whatever is already in `area`.
pub fn render_add_user_view(frame: &mut Frame, area: Rect, form: &AddUserForm, theme: &Theme) {
    let popup = centered_rect(area, 60.min(area.width), 9.min(area.height));
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(true))
        .title(format!(" {} ", WindowKind::AddUser.title()));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [fields_area, _, status_area, help_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    let field_rows = Layout::vertical([Constraint::Length(1); 3]).split(fields_area);
    for (field, row) in Field::ALL.into_iter().zip(field_rows.iter()) {
        let focused = form.focus == field;
        let line = Line::from(vec![
            Span::styled(
                format!("{:<width$}", format!("{}:", field.label()), width = usize::from(LABEL_WIDTH)),
                theme.label,
            ),
            Span::styled(
                form.value(field).to_string(),
                if focused { theme.input_focused } else { theme.input },
            ),
        ]);
        frame.render_widget(Paragraph::new(line), *row);

        if focused && form.phase != FormPhase::Submitting {
            let typed = u16::try_from(form.value(field).width()).unwrap_or(u16::MAX);
            let x = row
                .x
                .saturating_add(LABEL_WIDTH)
                .saturating_add(typed)
                .min(row.right().saturating_sub(1));
            frame.set_cursor_position((x, row.y));
        }
    }

    let status = match &form.phase {
        FormPhase::Editing => Line::from(""),
        FormPhase::Submitting => Line::from(Span::styled("Saving…", theme.info)),
        FormPhase::Failed(message) => {
            Line::from(Span::styled(format!("Not saved: {message}"), theme.error))
        }
        FormPhase::Saved => Line::from(Span::styled("Saved", theme.success)),
    };
    frame.render_widget(Paragraph::new(status), status_area);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Tab: next field  Enter: add user  Esc: cancel",
            theme.dim,
        ))),
        help_area,
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    // ── Field focus ───────────────────────────────────────────────────────────

    #[test]
    fn test_field_focus_cycles() {
        assert_eq!(Field::Name.next(), Field::Email);
        assert_eq!(Field::Phone.next(), Field::Name);
        assert_eq!(Field::Name.prev(), Field::Phone);
        for f in Field::ALL {
            assert_eq!(f.next().prev(), f);
        }
    }

    // ── on_add_user ───────────────────────────────────────────────────────────

    #[test]
    fn test_on_add_user_ok_marks_saved() {
        let mut form = AddUserForm {
            phase: FormPhase::Submitting,
            ..AddUserForm::default()
        };
        form.on_add_user(json!({
            "status": "ok",
            "data": { "name": "Alice", "email": "a@x.com", "phone": "555-1" }
        }));
        assert_eq!(form.phase, FormPhase::Saved);
    }

    #[test]
    fn test_on_add_user_error_allows_retry() {
        let mut form = AddUserForm {
            phase: FormPhase::Submitting,
            ..AddUserForm::default()
        };
        form.on_add_user(json!({ "status": "error", "message": "no such table: Users" }));
        assert_eq!(
            form.phase,
            FormPhase::Failed("no such table: Users".into())
        );
    }

    #[test]
    fn test_on_add_user_malformed_payload() {
        let mut form = AddUserForm::default();
        form.on_add_user(json!("nonsense"));
        assert!(matches!(form.phase, FormPhase::Failed(_)));
    }

    #[test]
    fn test_user_takes_values_verbatim() {
        let form = AddUserForm {
            name: "".into(),
            email: "not-an-email".into(),
            phone: "☎".into(),
            ..AddUserForm::default()
        };
        assert_eq!(form.user(), User::new("", "not-an-email", "☎"));
    }

    // ── Render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_centered_rect_is_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let r = centered_rect(area, 60, 9);
        assert_eq!((r.width, r.height), (60, 9));
        assert_eq!(r.x, 20);
        assert!(r.y + r.height <= area.height);
    }

    #[test]
    fn test_render_form_shows_labels_and_values() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let theme = Theme::dark();
        let form = AddUserForm {
            name: "Alice".into(),
            email: "a@x.com".into(),
            ..AddUserForm::default()
        };

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_add_user_view(frame, area, &form, &theme);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        for needle in ["Create User", "Name:", "Email:", "Phone:", "Alice", "a@x.com"] {
            assert!(text.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn test_render_failed_phase_shows_message() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let theme = Theme::light();
        let form = AddUserForm {
            phase: FormPhase::Failed("disk full".into()),
            ..AddUserForm::default()
        };

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_add_user_view(frame, area, &form, &theme);
            })
            .unwrap();

        assert!(buffer_text(&terminal).contains("Not saved: disk full"));
    }

    #[test]
    fn test_render_tiny_area_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(12, 4)).unwrap();
        let theme = Theme::dark();
        let form = AddUserForm {
            name: "名前がとても長い".into(),
            ..AddUserForm::default()
        };
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_add_user_view(frame, area, &form, &theme);
            })
            .unwrap();
    }

    // ── Key handling (needs a live controller) ────────────────────────────────

    #[test]
    fn test_typing_and_focus_keys() {
        let (controller, _inbound) = crate::test_support::controller();
        let mut window = AddUserWindow::open(&controller);

        for c in "Al".chars() {
            window.handle_key(key(KeyCode::Char(c)));
        }
        window.handle_key(key(KeyCode::Backspace));
        window.handle_key(key(KeyCode::Char('x')));
        window.handle_key(key(KeyCode::Tab));
        window.handle_key(key(KeyCode::Char('e')));
        window.handle_key(key(KeyCode::BackTab));
        window.handle_key(key(KeyCode::BackTab));
        window.handle_key(key(KeyCode::Char('p')));

        assert_eq!(window.form.user(), User::new("Ax", "e", "p"));
        assert_eq!(window.form.focus, Field::Phone);
    }

    #[test]
    fn test_ctrl_chars_are_not_typed() {
        let (controller, _inbound) = crate::test_support::controller();
        let mut window = AddUserWindow::open(&controller);
        window.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert_eq!(window.form.name, "");
    }

    #[test]
    fn test_enter_submits_once_while_in_flight() {
        let (controller, mut inbound) = crate::test_support::controller();
        let mut window = AddUserWindow::open(&controller);
        window.handle_key(key(KeyCode::Char('A')));

        assert_eq!(window.handle_key(key(KeyCode::Enter)), FormAction::Submitted);
        assert_eq!(window.handle_key(key(KeyCode::Enter)), FormAction::None);
        assert_eq!(window.form.phase, FormPhase::Submitting);

        let requests = crate::test_support::drain_requests(&mut inbound);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, window.id());
        assert_eq!(
            requests[0].1,
            json!({ "name": "A", "email": "", "phone": "" })
        );
    }

    #[test]
    fn test_esc_cancels() {
        let (controller, _inbound) = crate::test_support::controller();
        let mut window = AddUserWindow::open(&controller);
        assert_eq!(window.handle_key(key(KeyCode::Esc)), FormAction::Cancel);
    }
}

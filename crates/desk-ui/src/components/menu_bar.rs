use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// One menu entry bound to a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub key: &'static str,
    pub label: &'static str,
    /// Inert entries are drawn struck through and do nothing when pressed.
    pub enabled: bool,
}

/// A titled group of entries, e.g. `File` or `API`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Menu {
    pub title: &'static str,
    pub items: &'static [MenuItem],
}

/// The application menu, in display order.
pub const MENUS: [Menu; 2] = [
    Menu {
        title: "File",
        items: &[
            MenuItem {
                key: "n",
                label: "Create User",
                enabled: true,
            },
            MenuItem {
                key: "d",
                label: "Delete User",
                enabled: false,
            },
            MenuItem {
                key: "q",
                label: "Quit",
                enabled: true,
            },
        ],
    },
    Menu {
        title: "API",
        items: &[MenuItem {
            key: "a",
            label: "Retrieve data from API",
            enabled: true,
        }],
    },
];

/// Top bar of the main window: title, menu line and a separator.
pub struct MenuBar<'a> {
    pub title: &'a str,
    pub theme: &'a Theme,
}

impl<'a> MenuBar<'a> {
    pub fn new(title: &'a str, theme: &'a Theme) -> Self {
        Self { title, theme }
    }

    /// Number of lines produced by [`Self::to_lines`].
    pub const HEIGHT: u16 = 3;

    /// Render as exactly [`Self::HEIGHT`] lines.
    pub fn to_lines(&self, width: u16) -> Vec<Line<'a>> {
        let mut menu_spans = Vec::new();
        for (i, menu) in MENUS.iter().enumerate() {
            if i > 0 {
                menu_spans.push(Span::styled(" │ ", self.theme.separator));
            }
            menu_spans.push(Span::styled(format!("{}: ", menu.title), self.theme.bold));
            for (j, item) in menu.items.iter().enumerate() {
                if j > 0 {
                    menu_spans.push(Span::raw("  "));
                }
                menu_spans.push(Span::styled(format!("[{}]", item.key), self.theme.menu_key));
                let style = if item.enabled {
                    self.theme.menu_label
                } else {
                    self.theme.menu_disabled
                };
                menu_spans.push(Span::styled(format!(" {}", item.label), style));
            }
        }

        vec![
            Line::from(Span::styled(self.title.to_uppercase(), self.theme.header)),
            Line::from(menu_spans),
            Line::from(Span::styled(
                "─".repeat(usize::from(width)),
                self.theme.separator,
            )),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

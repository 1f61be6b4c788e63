//! Terminal UI layer for userdesk.
//!
//! Provides the theme, the menu bar, one module per window (user list,
//! add-user form, API viewer) and the application event loop built on top of
//! [`ratatui`].

pub mod add_user_view;
pub mod api_view;
pub mod app;
pub mod components;
pub mod main_view;
pub mod themes;

#[cfg(test)]
mod test_support;

pub use desk_runtime as runtime;

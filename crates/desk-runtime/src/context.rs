//! Everything the background process owns, in one explicit value.

use std::sync::Arc;

use desk_data::facts::FactSource;
use desk_data::store::UserStore;

use crate::windows::WindowRegistry;

/// State handed to every background handler.
///
/// Built once at startup, moved into [`crate::background::Background::start`]
/// and dropped when the background task ends, which closes the database.
#[derive(Clone)]
pub struct BackgroundContext {
    pub store: Arc<UserStore>,
    pub facts: Arc<dyn FactSource>,
    pub windows: Arc<WindowRegistry>,
}

impl BackgroundContext {
    pub fn new(store: UserStore, facts: impl FactSource + 'static) -> Self {
        Self {
            store: Arc::new(store),
            facts: Arc::new(facts),
            windows: Arc::new(WindowRegistry::new()),
        }
    }
}

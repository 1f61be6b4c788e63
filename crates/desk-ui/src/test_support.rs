//! Controllers and stub services for driving windows in tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use desk_core::error::{DeskError, Result};
use desk_core::models::WindowId;
use desk_data::facts::FactSource;
use desk_data::store::UserStore;
use desk_runtime::background::{Background, BackgroundHandle};
use desk_runtime::bridge::Inbound;
use desk_runtime::context::BackgroundContext;
use desk_runtime::windows::{WindowController, WindowRegistry};

/// A controller with no background process; requests pile up in the
/// returned receiver.
pub fn controller() -> (WindowController, mpsc::UnboundedReceiver<Inbound>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (WindowController::new(Arc::new(WindowRegistry::new()), tx), rx)
}

/// Every bridge request queued so far, as `(sender, payload)`.
pub fn drain_requests(rx: &mut mpsc::UnboundedReceiver<Inbound>) -> Vec<(WindowId, Value)> {
    let mut out = Vec::new();
    while let Ok(item) = rx.try_recv() {
        if let Inbound::Request(env) = item {
            out.push((env.from, env.payload));
        }
    }
    out
}

pub struct StubFacts(std::result::Result<Value, String>);

#[async_trait]
impl FactSource for StubFacts {
    async fn fetch_fact(&self) -> Result<Value> {
        self.0.clone().map_err(DeskError::Network)
    }
}

fn start(store: UserStore, facts: std::result::Result<Value, String>) -> (WindowController, BackgroundHandle) {
    Background::start(BackgroundContext::new(store, StubFacts(facts)))
}

/// A running background process over a migrated in-memory store.
pub fn background(facts: std::result::Result<Value, String>) -> (WindowController, BackgroundHandle) {
    let store = UserStore::open_in_memory().expect("in-memory store");
    store.migrate().expect("migrate");
    start(store, facts)
}

/// Same, but the `Users` table was never created.
pub fn background_unmigrated() -> (WindowController, BackgroundHandle) {
    let store = UserStore::open_in_memory().expect("in-memory store");
    start(store, Err("unused".into()))
}

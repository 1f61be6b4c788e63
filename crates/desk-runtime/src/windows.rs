//! Live-window arena and the controller that opens and closes surfaces.
//!
//! [`WindowRegistry`] maps every open [`WindowId`] to its kind, its delivery
//! queue and a cancellation token. A window that is not in the registry is
//! dead: deliveries to it fail with [`DeskError::WindowClosed`] and any work
//! bound to its token is cancelled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use desk_core::error::{DeskError, Result};
use desk_core::models::{WindowId, WindowKind};

use crate::bridge::{BridgeEndpoint, Delivery, Inbound};

// ── WindowRegistry ────────────────────────────────────────────────────────────

struct WindowSlot {
    kind: WindowKind,
    deliveries: mpsc::UnboundedSender<Delivery>,
    cancel: CancellationToken,
}

/// Arena of open windows, shared by the UI and the background process.
#[derive(Default)]
pub struct WindowRegistry {
    next_id: AtomicU64,
    slots: Mutex<HashMap<WindowId, WindowSlot>>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new window and return its id and delivery queue.
    pub fn register(&self, kind: WindowKind) -> (WindowId, mpsc::UnboundedReceiver<Delivery>) {
        let id = WindowId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let (tx, rx) = mpsc::unbounded_channel();
        self.slots().insert(
            id,
            WindowSlot {
                kind,
                deliveries: tx,
                cancel: CancellationToken::new(),
            },
        );
        tracing::debug!(window = %id, %kind, "window registered");
        (id, rx)
    }

    /// Remove a window, cancelling anything bound to it.
    ///
    /// Returns `false` if it was already closed.
    pub fn close(&self, id: WindowId) -> bool {
        match self.slots().remove(&id) {
            Some(slot) => {
                slot.cancel.cancel();
                tracing::debug!(window = %id, kind = %slot.kind, "window closed");
                true
            }
            None => false,
        }
    }

    /// Close every window.
    pub fn close_all(&self) {
        let drained: Vec<_> = self.slots().drain().collect();
        for (id, slot) in drained {
            slot.cancel.cancel();
            tracing::debug!(window = %id, kind = %slot.kind, "window closed on shutdown");
        }
    }

    /// Push `delivery` into a live window.
    pub fn deliver(&self, id: WindowId, delivery: Delivery) -> Result<()> {
        let slots = self.slots();
        let slot = slots.get(&id).ok_or(DeskError::WindowClosed(id))?;
        slot.deliveries
            .send(delivery)
            .map_err(|_| DeskError::WindowClosed(id))
    }

    pub fn is_open(&self, id: WindowId) -> bool {
        self.slots().contains_key(&id)
    }

    pub fn kind_of(&self, id: WindowId) -> Option<WindowKind> {
        self.slots().get(&id).map(|slot| slot.kind)
    }

    /// Token cancelled when `id` closes; `None` if it is already closed.
    pub fn cancel_token(&self, id: WindowId) -> Option<CancellationToken> {
        self.slots().get(&id).map(|slot| slot.cancel.clone())
    }

    /// Ids of all open windows of `kind`, oldest first.
    pub fn windows_of(&self, kind: WindowKind) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = self
            .slots()
            .iter()
            .filter(|(_, slot)| slot.kind == kind)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<WindowId, WindowSlot>> {
        // The map stays consistent even if a holder panicked mid-call.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ── WindowController ──────────────────────────────────────────────────────────

/// Opens and closes UI surfaces and wires them to the background process.
#[derive(Clone)]
pub struct WindowController {
    windows: Arc<WindowRegistry>,
    inbound: mpsc::UnboundedSender<Inbound>,
}

impl WindowController {
    /// A controller whose requests land on `inbound`. [`crate::background::Background::start`]
    /// builds the usual one; tests drive surfaces with a bare channel.
    pub fn new(windows: Arc<WindowRegistry>, inbound: mpsc::UnboundedSender<Inbound>) -> Self {
        Self { windows, inbound }
    }

    /// Open a surface of `kind` and hand back its bridge endpoint.
    ///
    /// Opening an API viewer also queues exactly one fact fetch for it.
    pub fn open<S>(&self, kind: WindowKind) -> BridgeEndpoint<S> {
        let (id, deliveries) = self.windows.register(kind);
        tracing::info!(window = %id, %kind, "window opened");

        if kind == WindowKind::ApiViewer && self.inbound.send(Inbound::FetchFact(id)).is_err() {
            tracing::warn!(window = %id, "background stopped; fact fetch not queued");
        }

        BridgeEndpoint::new(id, kind, self.inbound.clone(), deliveries)
    }

    /// Close a surface. Pending work for it is cancelled.
    pub fn close(&self, id: WindowId) {
        if self.windows.close(id) {
            tracing::info!(window = %id, "window closed");
        }
    }

    pub fn is_open(&self, id: WindowId) -> bool {
        self.windows.is_open(id)
    }

    pub fn registry(&self) -> &Arc<WindowRegistry> {
        &self.windows
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

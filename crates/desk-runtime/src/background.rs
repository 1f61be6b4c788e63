//! The background process.
//!
//! A single tokio task owns the [`BackgroundContext`] and consumes the
//! [`Inbound`] queue fed by every bridge endpoint. Each request performs
//! exactly one store or network operation and is always answered on its paired
//! response channel, with either the data or the error text.

use std::sync::Arc;

use desk_core::channels::{Channel, Reply};
use desk_core::error::{DeskError, Result};
use desk_core::models::{User, WindowId, WindowKind};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::bridge::{Delivery, Envelope, Inbound};
use crate::context::BackgroundContext;
use crate::windows::{WindowController, WindowRegistry};

// ── Background ────────────────────────────────────────────────────────────────

/// Entry point for spinning up the background process.
pub struct Background;

impl Background {
    /// Spawn the background task.
    ///
    /// Returns the [`WindowController`] the UI opens surfaces with and a
    /// [`BackgroundHandle`] to stop the task.
    pub fn start(ctx: BackgroundContext) -> (WindowController, BackgroundHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = CancellationToken::new();
        let controller = WindowController::new(ctx.windows.clone(), tx);
        let windows = ctx.windows.clone();

        let task = tokio::spawn(run(ctx, rx, stop.clone()));

        (
            controller,
            BackgroundHandle {
                task,
                stop,
                windows,
            },
        )
    }
}

// ── BackgroundHandle ──────────────────────────────────────────────────────────

/// A handle to the background task.
pub struct BackgroundHandle {
    task: tokio::task::JoinHandle<()>,
    stop: CancellationToken,
    windows: Arc<WindowRegistry>,
}

impl BackgroundHandle {
    /// Stop accepting requests, close every window and wait for the task.
    pub async fn shutdown(self) {
        self.stop.cancel();
        self.windows.close_all();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "background task ended abnormally");
        }
    }
}

// ── Loop ──────────────────────────────────────────────────────────────────────

async fn run(
    ctx: BackgroundContext,
    mut rx: mpsc::UnboundedReceiver<Inbound>,
    stop: CancellationToken,
) {
    tracing::info!("background process started");

    loop {
        let inbound = tokio::select! {
            _ = stop.cancelled() => break,
            next = rx.recv() => match next {
                Some(inbound) => inbound,
                None => break,
            },
        };

        match inbound {
            Inbound::Request(envelope) => handle_request(&ctx, envelope).await,
            Inbound::FetchFact(window) => spawn_fetch(&ctx, window),
        }
    }

    tracing::info!("background process stopped");
}

async fn handle_request(ctx: &BackgroundContext, envelope: Envelope) {
    let Envelope {
        from,
        channel,
        payload,
    } = envelope;

    let Some(kind) = ctx.windows.kind_of(from) else {
        tracing::warn!(window = %from, %channel, "request from closed window dropped");
        return;
    };

    match channel {
        Channel::AddUserRequest => add_user(ctx, from, kind, payload).await,
        Channel::ListUsersRequest => list_users(ctx, from).await,
        other => {
            tracing::debug!(window = %from, channel = %other, "not a request channel; ignored");
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// Insert one user, answer the sender, then destroy an add-user sender and
/// reload every main window.
async fn add_user(ctx: &BackgroundContext, from: WindowId, kind: WindowKind, payload: Value) {
    let result = match serde_json::from_value::<User>(payload) {
        Ok(user) => insert(ctx, user).await,
        Err(e) => Err(DeskError::from(e)),
    };

    match &result {
        Ok(user) => tracing::info!(window = %from, name = %user.name, "user added"),
        Err(e) => tracing::error!(window = %from, error = %e, "add user failed"),
    }
    let inserted = result.is_ok();

    deliver(
        ctx,
        from,
        Delivery::message(Channel::AddUserResponse, Reply::from(result).to_payload()),
    );

    if !inserted {
        return;
    }

    if kind == WindowKind::AddUser {
        deliver(ctx, from, Delivery::Destroy);
        ctx.windows.close(from);
    }
    for main in ctx.windows.windows_of(WindowKind::Main) {
        deliver(ctx, main, Delivery::Reload);
    }
}

async fn list_users(ctx: &BackgroundContext, from: WindowId) {
    let store = ctx.store.clone();
    let result = tokio::task::spawn_blocking(move || store.list_users())
        .await
        .map_err(|e| DeskError::Storage(format!("list task failed: {e}")))
        .and_then(|r| r);

    match &result {
        Ok(users) => tracing::debug!(window = %from, count = users.len(), "users listed"),
        Err(e) => tracing::error!(window = %from, error = %e, "list users failed"),
    }

    deliver(
        ctx,
        from,
        Delivery::message(Channel::ListUsersResponse, Reply::from(result).to_payload()),
    );
}

async fn insert(ctx: &BackgroundContext, user: User) -> Result<User> {
    let store = ctx.store.clone();
    tokio::task::spawn_blocking(move || {
        store
            .add_user(&user.name, &user.email, &user.phone)
            .map(|()| user)
    })
    .await
    .map_err(|e| DeskError::Storage(format!("insert task failed: {e}")))?
}

/// Fetch one fact for `window` in its own task, bound to the window's
/// cancellation token.
fn spawn_fetch(ctx: &BackgroundContext, window: WindowId) {
    let Some(cancel) = ctx.windows.cancel_token(window) else {
        tracing::debug!(window = %window, "viewer closed before fetch started");
        return;
    };
    let facts = ctx.facts.clone();
    let ctx = ctx.clone();

    tokio::spawn(async move {
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(window = %window, "fact fetch cancelled");
                return;
            }
            result = facts.fetch_fact() => result,
        };

        let reply = match result {
            Ok(body) => {
                tracing::info!(window = %window, "fact fetched");
                Reply::ok(body)
            }
            Err(e) => {
                tracing::error!(window = %window, error = %e, "fact fetch failed");
                Reply::error(e.to_string())
            }
        };

        deliver(
            &ctx,
            window,
            Delivery::message(Channel::FactResponse, reply.to_payload()),
        );
    });
}

/// Deliver with a liveness check; a dead target is logged, not an error.
fn deliver(ctx: &BackgroundContext, window: WindowId, delivery: Delivery) {
    if let Err(e) = ctx.windows.deliver(window, delivery) {
        tracing::debug!(window = %window, error = %e, "delivery dropped");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

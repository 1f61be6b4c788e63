//! Allow-listed message bridge between one UI surface and the background
//! process.
//!
//! A [`BridgeEndpoint`] is the only thing a surface holds to talk to the
//! process: `send` forwards a named payload, `receive` registers a handler for
//! a named delivery, and `pump` runs the handlers for whatever has arrived.
//! Names that are not on the [`Channel`] allow-list are dropped without an
//! error on both paths.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc;

use desk_core::channels::Channel;
use desk_core::models::{WindowId, WindowKind};

// ── Wire types ────────────────────────────────────────────────────────────────

/// A message sent by a surface, tagged with its sender.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub from: WindowId,
    pub channel: Channel,
    pub payload: Value,
}

/// Work items queued for the background process.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A bridge message from a surface.
    Request(Envelope),
    /// Fetch one fact for a freshly opened API viewer.
    FetchFact(WindowId),
}

/// Something the background process pushes into a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// A named message; handlers see only `payload`.
    Message { channel: Channel, payload: Value },
    /// The surface should run its load sequence again.
    Reload,
    /// The surface has been destroyed by the process.
    Destroy,
}

impl Delivery {
    pub fn message(channel: Channel, payload: Value) -> Self {
        Self::Message { channel, payload }
    }
}

/// What a call to [`BridgeEndpoint::pump`] observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Messages that reached a registered handler.
    pub handled: usize,
    /// Messages with no handler registered for their channel.
    pub unhandled: usize,
    /// A [`Delivery::Reload`] arrived.
    pub reload: bool,
    /// A [`Delivery::Destroy`] arrived.
    pub destroy: bool,
    /// The process side of this endpoint is gone.
    pub disconnected: bool,
}

impl PumpReport {
    /// Fold a later report into this one.
    pub fn merge(&mut self, other: PumpReport) {
        self.handled += other.handled;
        self.unhandled += other.unhandled;
        self.reload |= other.reload;
        self.destroy |= other.destroy;
        self.disconnected |= other.disconnected;
    }
}

// ── BridgeEndpoint ────────────────────────────────────────────────────────────

/// Handler invoked with the surface state and a message payload.
pub type Handler<S> = Box<dyn FnMut(&mut S, Value)>;

/// One surface's end of the bridge.
///
/// `S` is the surface's own state, handed mutably to every handler when the
/// surface pumps deliveries.
pub struct BridgeEndpoint<S> {
    window: WindowId,
    kind: WindowKind,
    outbound: mpsc::UnboundedSender<Inbound>,
    deliveries: mpsc::UnboundedReceiver<Delivery>,
    handlers: HashMap<Channel, Handler<S>>,
}

impl<S> BridgeEndpoint<S> {
    pub(crate) fn new(
        window: WindowId,
        kind: WindowKind,
        outbound: mpsc::UnboundedSender<Inbound>,
        deliveries: mpsc::UnboundedReceiver<Delivery>,
    ) -> Self {
        Self {
            window,
            kind,
            outbound,
            deliveries,
            handlers: HashMap::new(),
        }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    /// Forward `payload` to the background process on `channel_name`.
    ///
    /// Never fails: an unknown channel or a stopped process is logged at debug
    /// level and the message is dropped.
    pub fn send(&self, channel_name: &str, payload: Value) {
        let Some(channel) = Channel::lookup(channel_name) else {
            tracing::debug!(window = %self.window, channel = channel_name, "send on unknown channel dropped");
            return;
        };

        let envelope = Envelope {
            from: self.window,
            channel,
            payload,
        };
        if self.outbound.send(Inbound::Request(envelope)).is_err() {
            tracing::debug!(window = %self.window, %channel, "background stopped; message dropped");
        }
    }

    /// Register `handler` for deliveries on `channel_name`.
    ///
    /// Unknown channels are ignored. A second registration for the same
    /// channel replaces the first.
    pub fn receive<F>(&mut self, channel_name: &str, handler: F)
    where
        F: FnMut(&mut S, Value) + 'static,
    {
        let Some(channel) = Channel::lookup(channel_name) else {
            tracing::debug!(window = %self.window, channel = channel_name, "receive on unknown channel ignored");
            return;
        };
        if self.handlers.insert(channel, Box::new(handler)).is_some() {
            tracing::debug!(window = %self.window, %channel, "handler replaced");
        }
    }

    /// `true` when a handler is registered for `channel`.
    pub fn has_handler(&self, channel: Channel) -> bool {
        self.handlers.contains_key(&channel)
    }

    /// Run handlers for every delivery already queued. Never blocks.
    pub fn pump(&mut self, state: &mut S) -> PumpReport {
        let mut report = PumpReport::default();
        self.drain(state, &mut report);
        report
    }

    /// Wait for at least one delivery, then behave like [`Self::pump`].
    pub async fn pump_next(&mut self, state: &mut S) -> PumpReport {
        let mut report = PumpReport::default();
        match self.deliveries.recv().await {
            Some(delivery) => self.dispatch(delivery, state, &mut report),
            None => {
                report.disconnected = true;
                return report;
            }
        }
        self.drain(state, &mut report);
        report
    }

    fn drain(&mut self, state: &mut S, report: &mut PumpReport) {
        loop {
            match self.deliveries.try_recv() {
                Ok(delivery) => self.dispatch(delivery, state, report),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    report.disconnected = true;
                    break;
                }
            }
        }
    }

    fn dispatch(&mut self, delivery: Delivery, state: &mut S, report: &mut PumpReport) {
        match delivery {
            Delivery::Message { channel, payload } => match self.handlers.get_mut(&channel) {
                Some(handler) => {
                    handler(state, payload);
                    report.handled += 1;
                }
                None => {
                    tracing::debug!(window = %self.window, %channel, "no handler for delivery");
                    report.unhandled += 1;
                }
            },
            Delivery::Reload => report.reload = true,
            Delivery::Destroy => report.destroy = true,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type Received = Vec<(&'static str, Value)>;

    fn endpoint() -> (
        BridgeEndpoint<Received>,
        mpsc::UnboundedReceiver<Inbound>,
        mpsc::UnboundedSender<Delivery>,
    ) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (del_tx, del_rx) = mpsc::unbounded_channel();
        let ep = BridgeEndpoint::new(WindowId::new(1), WindowKind::Main, out_tx, del_rx);
        (ep, out_rx, del_tx)
    }

    // ── send ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_send_forwards_allowed_channel_with_sender() {
        let (ep, mut out_rx, _del_tx) = endpoint();
        ep.send("list-users-request", Value::Null);

        assert_eq!(
            out_rx.try_recv().unwrap(),
            Inbound::Request(Envelope {
                from: WindowId::new(1),
                channel: Channel::ListUsersRequest,
                payload: Value::Null,
            })
        );
    }

    #[test]
    fn test_send_unknown_channel_is_silent_noop() {
        let (ep, mut out_rx, _del_tx) = endpoint();
        ep.send("delete-user-request", json!({ "name": "Alice" }));
        ep.send("", Value::Null);
        assert!(out_rx.try_recv().is_err());
    }

    #[test]
    fn test_send_after_process_stopped_does_not_panic() {
        let (ep, out_rx, _del_tx) = endpoint();
        drop(out_rx);
        ep.send("add-user-request", json!({ "name": "x" }));
    }

    #[test]
    fn test_send_does_not_validate_payload() {
        let (ep, mut out_rx, _del_tx) = endpoint();
        ep.send("add-user-request", json!("just a string"));
        let Inbound::Request(env) = out_rx.try_recv().unwrap() else {
            panic!("expected a request");
        };
        assert_eq!(env.payload, json!("just a string"));
    }

    // ── receive / pump ────────────────────────────────────────────────────────

    #[test]
    fn test_handler_gets_payload_only() {
        let (mut ep, _out_rx, del_tx) = endpoint();
        ep.receive("list-users-response", |state: &mut Received, payload| {
            state.push(("list", payload));
        });

        del_tx
            .send(Delivery::message(Channel::ListUsersResponse, json!({ "status": "ok", "data": [] })))
            .unwrap();

        let mut received = Vec::new();
        let report = ep.pump(&mut received);
        assert_eq!(report.handled, 1);
        assert_eq!(
            received,
            vec![("list", json!({ "status": "ok", "data": [] }))]
        );
    }

    #[test]
    fn test_receive_unknown_channel_registers_nothing() {
        let (mut ep, _out_rx, del_tx) = endpoint();
        ep.receive("resultSent", |state: &mut Received, payload| {
            state.push(("bogus", payload));
        });
        assert!(Channel::ALL.iter().all(|c| !ep.has_handler(*c)));

        for channel in Channel::ALL {
            del_tx.send(Delivery::message(channel, json!(1))).unwrap();
        }
        let mut received = Vec::new();
        let report = ep.pump(&mut received);
        assert!(received.is_empty());
        assert_eq!(report.unhandled, Channel::ALL.len());
    }

    #[test]
    fn test_last_registration_wins() {
        let (mut ep, _out_rx, del_tx) = endpoint();
        ep.receive("fact-response", |state: &mut Received, p| state.push(("first", p)));
        ep.receive("fact-response", |state: &mut Received, p| state.push(("second", p)));

        del_tx
            .send(Delivery::message(Channel::FactResponse, json!({})))
            .unwrap();
        let mut received = Vec::new();
        ep.pump(&mut received);
        assert_eq!(received, vec![("second", json!({}))]);
    }

    #[test]
    fn test_handlers_are_persistent() {
        let (mut ep, _out_rx, del_tx) = endpoint();
        ep.receive("add-user-response", |state: &mut Received, p| state.push(("add", p)));

        let mut received = Vec::new();
        for i in 0..3 {
            del_tx
                .send(Delivery::message(Channel::AddUserResponse, json!(i)))
                .unwrap();
            ep.pump(&mut received);
        }
        assert_eq!(received.len(), 3);
    }

    #[test]
    fn test_pump_reports_lifecycle_signals() {
        let (mut ep, _out_rx, del_tx) = endpoint();
        del_tx.send(Delivery::Reload).unwrap();
        del_tx.send(Delivery::Destroy).unwrap();

        let report = ep.pump(&mut Vec::new());
        assert!(report.reload);
        assert!(report.destroy);
        assert!(!report.disconnected);
    }

    #[test]
    fn test_pump_reports_disconnect() {
        let (mut ep, _out_rx, del_tx) = endpoint();
        drop(del_tx);
        assert!(ep.pump(&mut Vec::new()).disconnected);
    }

    #[test]
    fn test_pump_on_empty_queue_is_noop() {
        let (mut ep, _out_rx, _del_tx) = endpoint();
        assert_eq!(ep.pump(&mut Vec::new()), PumpReport::default());
    }

    #[tokio::test]
    async fn test_pump_next_waits_for_delivery() {
        let (mut ep, _out_rx, del_tx) = endpoint();
        ep.receive("fact-response", |state: &mut Received, p| state.push(("fact", p)));

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            del_tx
                .send(Delivery::message(Channel::FactResponse, json!({ "fact": "x" })))
                .unwrap();
        });

        let mut received = Vec::new();
        let report = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            ep.pump_next(&mut received),
        )
        .await
        .expect("timed out waiting for delivery");
        assert_eq!(report.handled, 1);
        assert_eq!(received, vec![("fact", json!({ "fact": "x" }))]);
    }
}

//! Notification dispatch collaborator.
//!
//! The core only *invokes* notification delivery. Delivery happens after the
//! unit of work has committed and its outcome is never fed back into the
//! committed state: failures are logged and swallowed by [`dispatch_all`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use depot_core::UserId;

use crate::bus::EventBus;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LowStock,
    TransferRequested,
    TransferApproved,
    TransferDeclined,
    TransferInTransit,
    TransferCompleted,
    TransferFailed,
    TransferCancelled,
    TransferDelivered,
}

/// One message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub recipient_id: UserId,
    pub message: String,
    pub kind: NotificationKind,
    pub related_id: Option<Uuid>,
}

impl Notification {
    pub fn new(recipient_id: UserId, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            recipient_id,
            message: message.into(),
            kind,
            related_id: None,
        }
    }

    pub fn related_to(mut self, id: impl Into<Uuid>) -> Self {
        self.related_id = Some(id.into());
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Fire-and-forget delivery of notifications.
pub trait NotifySink: Send + Sync {
    fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}

impl<S> NotifySink for Arc<S>
where
    S: NotifySink + ?Sized,
{
    fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        (**self).send(notification)
    }
}

/// Sink that forwards notifications onto a bus (delivery workers subscribe to it).
#[derive(Debug)]
pub struct BusNotifySink<B> {
    bus: B,
}

impl<B> BusNotifySink<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<B> NotifySink for BusNotifySink<B>
where
    B: EventBus<Notification>,
{
    fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        self.bus
            .publish(notification)
            .map_err(|e| NotifyError::Delivery(format!("{e:?}")))
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifySink;

impl NotifySink for NoopNotifySink {
    fn send(&self, _notification: Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Deliver a batch best-effort. Returns how many were delivered.
pub fn dispatch_all<S>(sink: &S, notifications: Vec<Notification>) -> usize
where
    S: NotifySink + ?Sized,
{
    let mut delivered = 0;
    for n in notifications {
        let recipient = n.recipient_id;
        let kind = n.kind;
        match sink.send(n) {
            Ok(()) => delivered += 1,
            Err(err) => {
                tracing::warn!(%recipient, ?kind, error = %err, "notification dropped");
            }
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryEventBus;

    struct Broken;

    impl NotifySink for Broken {
        fn send(&self, _notification: Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("smtp down".to_string()))
        }
    }

    #[test]
    fn bus_sink_publishes_to_subscribers() {
        let bus: Arc<InMemoryEventBus<Notification>> = Arc::new(InMemoryEventBus::new());
        let sub = bus.subscribe();
        let sink = BusNotifySink::new(bus.clone());

        let recipient = UserId::new();
        sink.send(Notification::new(recipient, NotificationKind::LowStock, "low"))
            .unwrap();

        let got = sub.drain();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].recipient_id, recipient);
        assert_eq!(got[0].kind, NotificationKind::LowStock);
    }

    #[test]
    fn dispatch_all_swallows_failures() {
        let batch = vec![
            Notification::new(UserId::new(), NotificationKind::TransferFailed, "a"),
            Notification::new(UserId::new(), NotificationKind::TransferFailed, "b"),
        ];
        assert_eq!(dispatch_all(&Broken, batch), 0);
    }

    #[test]
    fn notification_wire_shape() {
        let id = uuid::Uuid::now_v7();
        let n = Notification::new(UserId::new(), NotificationKind::TransferInTransit, "moving")
            .related_to(id);
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["kind"], "transfer_in_transit");
        assert_eq!(json["relatedId"], id.to_string());
    }
}

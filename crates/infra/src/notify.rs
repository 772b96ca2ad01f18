//! Notifications collected during a unit of work and sent after it commits.

use uuid::Uuid;

use depot_auth::WarehouseMembership;
use depot_core::UserId;
use depot_events::{Notification, NotificationKind, NotifySink, dispatch_all};
use depot_inventory::{Product, Warehouse};

/// Pending notifications. Never delivered unless the transaction committed.
#[derive(Debug, Default)]
pub(crate) struct Outbox {
    pending: Vec<Notification>,
}

impl Outbox {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue one message; a recipient gets each (kind, subject) once.
    pub(crate) fn push(&mut self, recipient: UserId, kind: NotificationKind, message: &str, related: Uuid) {
        let queued = self
            .pending
            .iter()
            .any(|n| n.recipient_id == recipient && n.kind == kind && n.related_id == Some(related));
        if !queued {
            self.pending
                .push(Notification::new(recipient, kind, message).related_to(related));
        }
    }

    pub(crate) fn push_all(
        &mut self,
        recipients: impl IntoIterator<Item = UserId>,
        kind: NotificationKind,
        message: &str,
        related: Uuid,
    ) {
        for r in recipients {
            self.push(r, kind, message, related);
        }
    }

    pub(crate) fn managers_of(
        &mut self,
        warehouse: &Warehouse,
        kind: NotificationKind,
        message: &str,
        related: Uuid,
    ) {
        self.push_all(warehouse.managed_by().iter().copied(), kind, message, related);
    }

    /// Low-stock notice to the managers of the product's warehouse.
    pub(crate) fn low_stock(&mut self, product: &Product, warehouse: &Warehouse, threshold: i64) {
        if product.quantity() > threshold {
            return;
        }
        let message = format!(
            "{} is low on stock in {}: {} left",
            product.name(),
            warehouse.name(),
            product.quantity()
        );
        self.managers_of(warehouse, NotificationKind::LowStock, &message, product.id().into());
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Best-effort delivery; failures are logged by [`dispatch_all`].
    pub(crate) fn deliver<S>(self, sink: &S) -> usize
    where
        S: NotifySink + ?Sized,
    {
        let queued = self.len();
        let delivered = dispatch_all(sink, self.pending);
        if delivered < queued {
            tracing::warn!(queued, delivered, "some notifications were not delivered");
        }
        delivered
    }
}

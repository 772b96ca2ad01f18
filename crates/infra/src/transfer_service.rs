//! Transfer request workflow.
//!
//! Each call is one unit of work: load the request and both warehouses,
//! authorize against the warehouse that owns the step, move the state
//! machine, apply stock effects, write the ledger entry, commit, then notify.
//!
//! Stock moves in two phases and only through the warehouses' embedded
//! snapshots: it leaves the source on `InTransit` and arrives at the
//! destination on `Transferred`. Canonical `Product` records are never
//! touched here.

use std::collections::BTreeSet;

use chrono::Utc;

use depot_auth::{Actor, WarehouseMembership, authorize_manager, authorize_party};
use depot_core::{DomainError, ProductId, TransactionId, TransferRequestId, UserId, WarehouseId};
use depot_events::{NotificationKind, NotifySink};
use depot_inventory::{
    InterWarehouseTransferStatus, InventoryTransaction, StockSnapshot, TransactionKind,
    TransactionLine, Warehouse,
};
use depot_transfers::{
    LineDecision, LineSelection, NewTransferRequest, TransferLine, TransferRequest, TransferStatus,
    TransferType,
};

use crate::config::LedgerConfig;
use crate::error::ServiceResult;
use crate::lookup;
use crate::notify::Outbox;
use crate::store::{InventoryStore, StoreTransaction};

/// One requested product line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl RequestedLine {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Input to [`TransferService::create_transfer_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDraft {
    pub from_warehouse_id: WarehouseId,
    pub to_warehouse_id: WarehouseId,
    pub lines: Vec<RequestedLine>,
    pub transfer_type: TransferType,
    pub note: Option<String>,
}

/// Request plus both endpoint warehouses, loaded in one scope.
struct Loaded {
    request: TransferRequest,
    from: Warehouse,
    to: Warehouse,
}

fn load<T: StoreTransaction>(tx: &T, id: TransferRequestId) -> ServiceResult<Loaded> {
    let request = lookup::transfer_request(tx, id)?;
    let from = lookup::warehouse(tx, request.from_warehouse_id())?;
    let to = lookup::warehouse(tx, request.to_warehouse_id())?;
    Ok(Loaded { request, from, to })
}

fn ledger_entry(
    request: &TransferRequest,
    status: InterWarehouseTransferStatus,
    lines: Vec<TransactionLine>,
    actor: &Actor,
    note: Option<String>,
) -> ServiceResult<InventoryTransaction> {
    let kind = match status {
        InterWarehouseTransferStatus::Failed => TransactionKind::FailedTransferRequest {
            from_warehouse_id: request.from_warehouse_id(),
            to_warehouse_id: request.to_warehouse_id(),
            transfer_request_id: request.id(),
        },
        status => TransactionKind::InterWarehouseTransfer {
            from_warehouse_id: request.from_warehouse_id(),
            to_warehouse_id: request.to_warehouse_id(),
            transfer_request_id: request.id(),
            inter_warehouse_transfer_status: status,
        },
    };
    Ok(InventoryTransaction::new(TransactionId::new(), kind, lines, Utc::now(), actor.user_id)?
        .with_admin(actor.is_admin().then_some(actor.user_id))
        .with_note(note))
}

/// Drives transfer requests through their lifecycle.
#[derive(Debug)]
pub struct TransferService<S, N> {
    store: S,
    notifier: N,
    config: LedgerConfig,
}

impl<S, N> TransferService<S, N> {
    pub fn new(store: S, notifier: N, config: LedgerConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }
}

impl<S, N> TransferService<S, N>
where
    S: InventoryStore,
    N: NotifySink,
{
    /// Open a request. The requester must manage the destination warehouse.
    pub fn create_transfer_request(
        &self,
        draft: TransferDraft,
        actor: &Actor,
    ) -> ServiceResult<TransferRequest> {
        if draft.from_warehouse_id == draft.to_warehouse_id {
            return Err(DomainError::validation("source and destination warehouse must differ").into());
        }
        if draft.lines.is_empty() {
            return Err(DomainError::validation("at least one product line is required").into());
        }

        let mut tx = self.store.begin()?;
        let from = lookup::warehouse(&tx, draft.from_warehouse_id)?;
        let to = lookup::warehouse(&tx, draft.to_warehouse_id)?;
        authorize_manager(actor, &to)?;

        for w in [&from, &to] {
            if !w.has_manager() {
                return Err(DomainError::conflict(format!(
                    "warehouse {} has no manager to handle transfers",
                    w.id()
                ))
                .into());
            }
        }
        let expected = TransferType::between(from.kind(), to.kind())?;
        if expected != draft.transfer_type {
            return Err(DomainError::validation(format!(
                "transfer type {:?} does not match warehouses ({:?} expected)",
                draft.transfer_type, expected
            ))
            .into());
        }

        let mut lines = Vec::with_capacity(draft.lines.len());
        for requested in &draft.lines {
            let snapshot = from.snapshot(requested.product_id).ok_or_else(|| {
                DomainError::not_found(format!(
                    "product {} is not stocked in warehouse {}",
                    requested.product_id,
                    from.id()
                ))
            })?;
            if snapshot.quantity < requested.quantity {
                return Err(DomainError::insufficient_stock(format!(
                    "warehouse {} holds {} of product {}, {} requested",
                    from.id(),
                    snapshot.quantity,
                    requested.product_id,
                    requested.quantity
                ))
                .into());
            }
            lines.push(TransferLine::new(
                snapshot.product_id,
                snapshot.name.clone(),
                snapshot.price,
                requested.quantity,
            ));
        }

        let request = TransferRequest::open(NewTransferRequest {
            id: TransferRequestId::new(),
            from_warehouse_id: from.id(),
            to_warehouse_id: to.id(),
            transfer_type: draft.transfer_type,
            requested_by: actor.user_id,
            lines,
            note: draft.note.clone(),
            requested_at: Utc::now(),
        })?;

        for line in request.products() {
            let entry = ledger_entry(
                &request,
                InterWarehouseTransferStatus::Pending,
                vec![line.to_ledger_line()],
                actor,
                draft.note.clone(),
            )?;
            tx.insert_transaction(entry)?;
        }
        tx.insert_transfer_request(request.clone())?;
        tx.commit()?;

        tracing::info!(
            transfer_id = %request.id(),
            from = %request.from_warehouse_id(),
            to = %request.to_warehouse_id(),
            total_quantity = request.total_quantity(),
            "transfer request created"
        );

        let mut outbox = Outbox::new();
        let message = format!(
            "Transfer of {} units requested from {} to {}",
            request.total_quantity(),
            from.name(),
            to.name()
        );
        let related = request.id().into();
        outbox.managers_of(&from, NotificationKind::TransferRequested, &message, related);
        outbox.managers_of(&to, NotificationKind::TransferRequested, &message, related);
        outbox.push(actor.user_id, NotificationKind::TransferRequested, &message, related);
        outbox.deliver(&self.notifier);

        Ok(request)
    }

    /// Move a request to `target`.
    ///
    /// | target | actor |
    /// |---|---|
    /// | Approved, Declined, InTransit, FailedTransferRequest | source manager |
    /// | Completed, Transferred | destination manager |
    /// | Cancelled | requester or approver |
    pub fn transition_transfer_request(
        &self,
        id: TransferRequestId,
        target: TransferStatus,
        actor: &Actor,
        note: Option<String>,
    ) -> ServiceResult<TransferRequest> {
        let mut tx = self.store.begin()?;
        let Loaded {
            mut request,
            mut from,
            mut to,
        } = load(&tx, id)?;
        let now = Utc::now();
        let related = id.into();
        let mut outbox = Outbox::new();

        match target {
            TransferStatus::Approved | TransferStatus::Declined => {
                authorize_manager(actor, &from)?;
                let kind = if target == TransferStatus::Approved {
                    request.approve(actor.user_id, now, note)?;
                    NotificationKind::TransferApproved
                } else {
                    request.decline(actor.user_id, now, note)?;
                    NotificationKind::TransferDeclined
                };
                let message = format!("Your transfer request was {}", target.as_str().to_lowercase());
                outbox.push(request.requested_by(), kind, &message, related);
            }
            TransferStatus::InTransit => {
                authorize_manager(actor, &from)?;
                let leaving = request.dispatch(now)?;
                for line in &leaving {
                    from.deduct(line.product_id, line.quantity)?;
                }
                let entry = ledger_entry(
                    &request,
                    InterWarehouseTransferStatus::InTransit,
                    request.ledger_lines(LineSelection::AcceptedLines),
                    actor,
                    note,
                )?;
                tx.insert_transaction(entry)?;

                let message = format!("Goods left {} and are on the way", from.name());
                outbox.push(request.requested_by(), NotificationKind::TransferInTransit, &message, related);
                outbox.managers_of(&to, NotificationKind::TransferInTransit, &message, related);
            }
            TransferStatus::Completed => {
                authorize_manager(actor, &to)?;
                request.complete(now)?;
                let entry = ledger_entry(
                    &request,
                    InterWarehouseTransferStatus::Completed,
                    request.ledger_lines(self.config.completed_valuation),
                    actor,
                    note,
                )?;
                tx.insert_transaction(entry)?;

                let message = format!("Goods arrived at {}", to.name());
                outbox.push(request.requested_by(), NotificationKind::TransferCompleted, &message, related);
                outbox.managers_of(&from, NotificationKind::TransferCompleted, &message, related);
            }
            TransferStatus::FailedTransferRequest => {
                authorize_manager(actor, &from)?;
                // Stock already deducted at InTransit is not restored.
                request.fail(now, note.clone())?;
                let entry = ledger_entry(
                    &request,
                    InterWarehouseTransferStatus::Failed,
                    request.ledger_lines(LineSelection::AcceptedLines),
                    actor,
                    note,
                )?;
                tx.insert_transaction(entry)?;

                let message = format!("Transfer from {} to {} failed", from.name(), to.name());
                outbox.push(request.requested_by(), NotificationKind::TransferFailed, &message, related);
                if let Some(approver) = request.approved_by() {
                    outbox.push(approver, NotificationKind::TransferFailed, &message, related);
                }
            }
            TransferStatus::Cancelled => {
                let mut parties = vec![request.requested_by()];
                parties.extend(request.approved_by());
                authorize_party(actor, &parties)?;
                request.cancel(now, note)?;

                let message = "A transfer request you are part of was cancelled";
                let others: BTreeSet<UserId> = match request.approved_by() {
                    Some(approver) => [request.requested_by(), approver].into_iter().collect(),
                    None => from
                        .managed_by()
                        .iter()
                        .copied()
                        .chain([request.requested_by()])
                        .collect(),
                };
                outbox.push_all(
                    others.into_iter().filter(|u| *u != actor.user_id),
                    NotificationKind::TransferCancelled,
                    message,
                    related,
                );
            }
            TransferStatus::Transferred => {
                authorize_manager(actor, &to)?;
                let arriving = request.mark_transferred(now, note.clone())?;
                let incoming: i64 = arriving.iter().map(|l| l.quantity).sum();
                to.ensure_capacity_for(incoming)?;
                for line in &arriving {
                    to.receive(StockSnapshot {
                        product_id: line.product_id,
                        name: line.name.clone(),
                        quantity: line.quantity,
                        price: line.price,
                    })?;
                }
                let entry = ledger_entry(
                    &request,
                    InterWarehouseTransferStatus::Transferred,
                    request.ledger_lines(LineSelection::AcceptedLines),
                    actor,
                    note,
                )?;
                tx.insert_transaction(entry)?;

                let message = format!("{incoming} units were added to {}", to.name());
                outbox.push(request.requested_by(), NotificationKind::TransferDelivered, &message, related);
                outbox.managers_of(&from, NotificationKind::TransferDelivered, &message, related);
            }
            TransferStatus::Pending => {
                return Err(DomainError::validation("a request cannot be moved back to Pending").into());
            }
        }

        tx.put_warehouse(from)?;
        tx.put_warehouse(to)?;
        tx.put_transfer_request(request.clone())?;
        tx.commit()?;

        tracing::info!(
            transfer_id = %id,
            status = %request.status(),
            actor = %actor.user_id,
            "transfer request transitioned"
        );
        outbox.deliver(&self.notifier);
        Ok(request)
    }

    /// Record the source warehouse's accept/reject decisions.
    pub fn set_product_line_status(
        &self,
        id: TransferRequestId,
        decisions: &[LineDecision],
        actor: &Actor,
    ) -> ServiceResult<()> {
        let mut tx = self.store.begin()?;
        let mut request = lookup::transfer_request(&tx, id)?;
        let from = lookup::warehouse(&tx, request.from_warehouse_id())?;
        authorize_manager(actor, &from)?;

        request.decide_lines(decisions)?;
        tx.put_transfer_request(request)?;
        tx.commit()?;

        tracing::info!(transfer_id = %id, lines = decisions.len(), "transfer lines decided");
        Ok(())
    }

    /// Credit accepted lines to the destination (`Completed → Transferred`).
    pub fn transfer_products(
        &self,
        id: TransferRequestId,
        actor: &Actor,
        note: Option<String>,
    ) -> ServiceResult<()> {
        self.transition_transfer_request(id, TransferStatus::Transferred, actor, note)
            .map(|_| ())
    }
}

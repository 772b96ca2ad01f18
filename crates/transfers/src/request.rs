use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depot_core::amount::{checked_add, ensure_positive_quantity, ensure_price, line_value};
use depot_core::{DomainError, DomainResult, ProductId, TransferRequestId, UserId, WarehouseId};
use depot_inventory::{TransactionLine, WarehouseKind};

/// Transfer request lifecycle.
///
/// ```text
/// Pending ──► Approved ──► InTransit ──► Completed ──► Transferred
///    │            │             │
///    ├► Declined  └► Cancelled  └► FailedTransferRequest
///    └► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferStatus {
    Pending,
    Approved,
    Declined,
    InTransit,
    Completed,
    Cancelled,
    Transferred,
    FailedTransferRequest,
}

impl TransferStatus {
    pub const ALL: [TransferStatus; 8] = [
        TransferStatus::Pending,
        TransferStatus::Approved,
        TransferStatus::Declined,
        TransferStatus::InTransit,
        TransferStatus::Completed,
        TransferStatus::Cancelled,
        TransferStatus::Transferred,
        TransferStatus::FailedTransferRequest,
    ];

    /// The only edges a request may move along.
    pub fn can_transition_to(self, next: TransferStatus) -> bool {
        use TransferStatus::*;
        matches!(
            (self, next),
            (Pending, Approved | Declined | Cancelled)
                | (Approved, InTransit | Cancelled)
                | (InTransit, Completed | FailedTransferRequest)
                | (Completed, Transferred)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferStatus::Declined
                | TransferStatus::Cancelled
                | TransferStatus::Transferred
                | TransferStatus::FailedTransferRequest
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "Pending",
            TransferStatus::Approved => "Approved",
            TransferStatus::Declined => "Declined",
            TransferStatus::InTransit => "InTransit",
            TransferStatus::Completed => "Completed",
            TransferStatus::Cancelled => "Cancelled",
            TransferStatus::Transferred => "Transferred",
            TransferStatus::FailedTransferRequest => "FailedTransferRequest",
        }
    }
}

impl core::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-line decision by the source warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Warehouse tiers a transfer connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferType {
    SuperToRegular,
    RegularToRegular,
    RegularToSuper,
}

impl TransferType {
    /// The transfer type implied by two warehouse tiers.
    pub fn between(from: WarehouseKind, to: WarehouseKind) -> DomainResult<Self> {
        match (from, to) {
            (WarehouseKind::Super, WarehouseKind::Regular) => Ok(TransferType::SuperToRegular),
            (WarehouseKind::Regular, WarehouseKind::Regular) => Ok(TransferType::RegularToRegular),
            (WarehouseKind::Regular, WarehouseKind::Super) => Ok(TransferType::RegularToSuper),
            (WarehouseKind::Super, WarehouseKind::Super) => Err(DomainError::validation(
                "transfers between two super warehouses are not supported",
            )),
        }
    }
}

/// Which lines a ledger valuation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineSelection {
    AllLines,
    AcceptedLines,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    pub status: LineStatus,
}

impl TransferLine {
    pub fn new(product_id: ProductId, name: impl Into<String>, price: i64, quantity: i64) -> Self {
        Self {
            product_id,
            name: name.into(),
            price,
            quantity,
            status: LineStatus::Pending,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == LineStatus::Accepted
    }

    pub fn to_ledger_line(&self) -> TransactionLine {
        TransactionLine::priced(self.product_id, self.quantity, self.price)
    }
}

/// A source-warehouse decision for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDecision {
    pub product_id: ProductId,
    pub status: LineStatus,
}

/// Input for opening a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransferRequest {
    pub id: TransferRequestId,
    pub from_warehouse_id: WarehouseId,
    pub to_warehouse_id: WarehouseId,
    pub transfer_type: TransferType,
    pub requested_by: UserId,
    pub lines: Vec<TransferLine>,
    pub note: Option<String>,
    pub requested_at: DateTime<Utc>,
}

/// Aggregate root: TransferRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    id: TransferRequestId,
    from_warehouse_id: WarehouseId,
    to_warehouse_id: WarehouseId,
    products: Vec<TransferLine>,
    status: TransferStatus,
    total_quantity: i64,
    total_price: i64,
    transfer_type: TransferType,
    requested_by: UserId,
    approved_by: Option<UserId>,
    request_date: DateTime<Utc>,
    approval_date: Option<DateTime<Utc>>,
    decline_date: Option<DateTime<Utc>>,
    dispatch_date: Option<DateTime<Utc>>,
    completion_date: Option<DateTime<Utc>>,
    failed_request_date: Option<DateTime<Utc>>,
    transferred_date: Option<DateTime<Utc>>,
    cancellation_date: Option<DateTime<Utc>>,
    note: Option<String>,
}

impl TransferRequest {
    /// Open a new request in `Pending` with every line `Pending`.
    pub fn open(new: NewTransferRequest) -> DomainResult<Self> {
        if new.from_warehouse_id == new.to_warehouse_id {
            return Err(DomainError::validation(
                "source and destination warehouse must differ",
            ));
        }
        if new.lines.is_empty() {
            return Err(DomainError::validation("at least one product line is required"));
        }

        let mut seen = HashSet::new();
        let mut total_quantity = 0i64;
        let mut total_price = 0i64;
        let mut lines = new.lines;
        for line in &mut lines {
            ensure_positive_quantity(line.quantity)?;
            ensure_price(line.price)?;
            if !seen.insert(line.product_id) {
                return Err(DomainError::validation(format!(
                    "product {} appears more than once",
                    line.product_id
                )));
            }
            line.status = LineStatus::Pending;
            total_quantity = checked_add(total_quantity, line.quantity)?;
            total_price = checked_add(total_price, line_value(line.quantity, line.price)?)?;
        }

        Ok(Self {
            id: new.id,
            from_warehouse_id: new.from_warehouse_id,
            to_warehouse_id: new.to_warehouse_id,
            products: lines,
            status: TransferStatus::Pending,
            total_quantity,
            total_price,
            transfer_type: new.transfer_type,
            requested_by: new.requested_by,
            approved_by: None,
            request_date: new.requested_at,
            approval_date: None,
            decline_date: None,
            dispatch_date: None,
            completion_date: None,
            failed_request_date: None,
            transferred_date: None,
            cancellation_date: None,
            note: new.note,
        })
    }

    pub fn id(&self) -> TransferRequestId {
        self.id
    }

    pub fn from_warehouse_id(&self) -> WarehouseId {
        self.from_warehouse_id
    }

    pub fn to_warehouse_id(&self) -> WarehouseId {
        self.to_warehouse_id
    }

    pub fn products(&self) -> &[TransferLine] {
        &self.products
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn total_quantity(&self) -> i64 {
        self.total_quantity
    }

    pub fn total_price(&self) -> i64 {
        self.total_price
    }

    pub fn transfer_type(&self) -> TransferType {
        self.transfer_type
    }

    pub fn requested_by(&self) -> UserId {
        self.requested_by
    }

    pub fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    pub fn request_date(&self) -> DateTime<Utc> {
        self.request_date
    }

    pub fn approval_date(&self) -> Option<DateTime<Utc>> {
        self.approval_date
    }

    pub fn decline_date(&self) -> Option<DateTime<Utc>> {
        self.decline_date
    }

    pub fn dispatch_date(&self) -> Option<DateTime<Utc>> {
        self.dispatch_date
    }

    pub fn completion_date(&self) -> Option<DateTime<Utc>> {
        self.completion_date
    }

    pub fn failed_request_date(&self) -> Option<DateTime<Utc>> {
        self.failed_request_date
    }

    pub fn transferred_date(&self) -> Option<DateTime<Utc>> {
        self.transferred_date
    }

    pub fn cancellation_date(&self) -> Option<DateTime<Utc>> {
        self.cancellation_date
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn accepted_lines(&self) -> impl Iterator<Item = &TransferLine> {
        self.products.iter().filter(|l| l.is_accepted())
    }

    pub fn lines_for(&self, selection: LineSelection) -> Vec<&TransferLine> {
        match selection {
            LineSelection::AllLines => self.products.iter().collect(),
            LineSelection::AcceptedLines => self.accepted_lines().collect(),
        }
    }

    /// Priced ledger lines for the selected request lines.
    pub fn ledger_lines(&self, selection: LineSelection) -> Vec<TransactionLine> {
        self.lines_for(selection)
            .into_iter()
            .map(TransferLine::to_ledger_line)
            .collect()
    }

    fn transition(&mut self, next: TransferStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::conflict(format!(
                "transfer request {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    fn remember(&mut self, note: Option<String>) {
        if note.is_some() {
            self.note = note;
        }
    }

    pub fn approve(&mut self, approver: UserId, at: DateTime<Utc>, note: Option<String>) -> DomainResult<()> {
        self.transition(TransferStatus::Approved)?;
        self.approved_by = Some(approver);
        self.approval_date = Some(at);
        self.remember(note);
        Ok(())
    }

    pub fn decline(&mut self, approver: UserId, at: DateTime<Utc>, note: Option<String>) -> DomainResult<()> {
        self.transition(TransferStatus::Declined)?;
        self.approved_by = Some(approver);
        self.decline_date = Some(at);
        self.remember(note);
        Ok(())
    }

    /// Record accept/reject decisions. All-or-nothing: nothing changes if any
    /// decision is invalid.
    pub fn decide_lines(&mut self, decisions: &[LineDecision]) -> DomainResult<()> {
        if !matches!(self.status, TransferStatus::Pending | TransferStatus::Approved) {
            return Err(DomainError::conflict(format!(
                "lines of transfer request {} cannot change once it is {}",
                self.id, self.status
            )));
        }
        if decisions.is_empty() {
            return Err(DomainError::validation("at least one line decision is required"));
        }

        let mut indexed = Vec::with_capacity(decisions.len());
        for d in decisions {
            if d.status == LineStatus::Pending {
                return Err(DomainError::validation(format!(
                    "line {} must be Accepted or Rejected",
                    d.product_id
                )));
            }
            let idx = self
                .products
                .iter()
                .position(|l| l.product_id == d.product_id)
                .ok_or_else(|| {
                    DomainError::not_found(format!(
                        "product {} is not part of transfer request {}",
                        d.product_id, self.id
                    ))
                })?;
            indexed.push((idx, d.status));
        }

        for (idx, status) in indexed {
            self.products[idx].status = status;
        }
        Ok(())
    }

    /// Move to `InTransit`. Returns the accepted lines that leave the source.
    pub fn dispatch(&mut self, at: DateTime<Utc>) -> DomainResult<Vec<TransferLine>> {
        if !self.status.can_transition_to(TransferStatus::InTransit) {
            return self.transition(TransferStatus::InTransit).map(|_| Vec::new());
        }
        if self.products.iter().any(|l| l.status == LineStatus::Pending) {
            return Err(DomainError::conflict(format!(
                "every line of transfer request {} must be accepted or rejected before dispatch",
                self.id
            )));
        }
        let accepted: Vec<TransferLine> = self.accepted_lines().cloned().collect();
        if accepted.is_empty() {
            return Err(DomainError::conflict(format!(
                "transfer request {} has no accepted lines",
                self.id
            )));
        }
        self.transition(TransferStatus::InTransit)?;
        self.dispatch_date = Some(at);
        Ok(accepted)
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(TransferStatus::Completed)?;
        self.completion_date = Some(at);
        Ok(())
    }

    /// Mark as failed in transit. Stock already deducted stays deducted.
    pub fn fail(&mut self, at: DateTime<Utc>, note: Option<String>) -> DomainResult<()> {
        self.transition(TransferStatus::FailedTransferRequest)?;
        self.failed_request_date = Some(at);
        self.remember(note);
        Ok(())
    }

    /// Move to `Transferred`. Returns the accepted lines to credit at the destination.
    pub fn mark_transferred(&mut self, at: DateTime<Utc>, note: Option<String>) -> DomainResult<Vec<TransferLine>> {
        self.transition(TransferStatus::Transferred)?;
        self.transferred_date = Some(at);
        self.remember(note);
        Ok(self.accepted_lines().cloned().collect())
    }

    pub fn cancel(&mut self, at: DateTime<Utc>, note: Option<String>) -> DomainResult<()> {
        self.transition(TransferStatus::Cancelled)?;
        self.cancellation_date = Some(at);
        self.remember(note);
        Ok(())
    }
}

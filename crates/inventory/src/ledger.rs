//! Inventory ledger records.
//!
//! One [`InventoryTransaction`] is written per stock-affecting operation. The
//! entry's [`TransactionKind`] is a tagged union: each transaction type carries
//! exactly the references it requires, so a Restock without a supplier or a
//! transfer entry without both warehouses cannot be represented.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depot_core::amount::{checked_add, line_value};
use depot_core::{
    CustomerId, DomainResult, ProductId, SupplierId, TransactionId, TransferRequestId, UserId,
    WarehouseId,
};

/// Closed set of ledger entry types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Restock,
    Sales,
    Damaged,
    SupplierReturn,
    CustomerReturn,
    OnlineOrder,
    InterWarehouseTransfer,
    AdditionRemoval,
    FailedTransferRequest,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Restock => "Restock",
            TransactionType::Sales => "Sales",
            TransactionType::Damaged => "Damaged",
            TransactionType::SupplierReturn => "SupplierReturn",
            TransactionType::CustomerReturn => "CustomerReturn",
            TransactionType::OnlineOrder => "OnlineOrder",
            TransactionType::InterWarehouseTransfer => "InterWarehouseTransfer",
            TransactionType::AdditionRemoval => "AdditionRemoval",
            TransactionType::FailedTransferRequest => "FailedTransferRequest",
        }
    }
}

impl core::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a product joined or left a warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockAction {
    Add,
    Remove,
}

/// Transfer workflow step a transfer-related entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterWarehouseTransferStatus {
    Pending,
    InTransit,
    Completed,
    Failed,
    Transferred,
}

/// Sign of a ledger posting's effect on stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    /// Signed quantity change for `quantity` units moving in this direction.
    pub fn signed(self, quantity: i64) -> i64 {
        match self {
            Direction::Inbound => quantity,
            Direction::Outbound => -quantity,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Inbound => Direction::Outbound,
            Direction::Outbound => Direction::Inbound,
        }
    }
}

/// Type-specific references of a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transactionType", rename_all_fields = "camelCase")]
pub enum TransactionKind {
    Restock {
        warehouse_id: WarehouseId,
        supplier_id: SupplierId,
    },
    Sales {
        warehouse_id: WarehouseId,
        customer_id: Option<CustomerId>,
    },
    Damaged {
        warehouse_id: WarehouseId,
    },
    SupplierReturn {
        warehouse_id: WarehouseId,
        supplier_id: SupplierId,
    },
    CustomerReturn {
        warehouse_id: WarehouseId,
        customer_id: Option<CustomerId>,
    },
    OnlineOrder {
        warehouse_id: WarehouseId,
        customer_id: Option<CustomerId>,
    },
    InterWarehouseTransfer {
        from_warehouse_id: WarehouseId,
        to_warehouse_id: WarehouseId,
        transfer_request_id: TransferRequestId,
        inter_warehouse_transfer_status: InterWarehouseTransferStatus,
    },
    AdditionRemoval {
        warehouse_id: WarehouseId,
        action: StockAction,
    },
    FailedTransferRequest {
        from_warehouse_id: WarehouseId,
        to_warehouse_id: WarehouseId,
        transfer_request_id: TransferRequestId,
    },
}

impl TransactionKind {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            TransactionKind::Restock { .. } => TransactionType::Restock,
            TransactionKind::Sales { .. } => TransactionType::Sales,
            TransactionKind::Damaged { .. } => TransactionType::Damaged,
            TransactionKind::SupplierReturn { .. } => TransactionType::SupplierReturn,
            TransactionKind::CustomerReturn { .. } => TransactionType::CustomerReturn,
            TransactionKind::OnlineOrder { .. } => TransactionType::OnlineOrder,
            TransactionKind::InterWarehouseTransfer { .. } => TransactionType::InterWarehouseTransfer,
            TransactionKind::AdditionRemoval { .. } => TransactionType::AdditionRemoval,
            TransactionKind::FailedTransferRequest { .. } => TransactionType::FailedTransferRequest,
        }
    }

    /// The single warehouse a location-bound entry is posted against.
    pub fn warehouse_id(&self) -> Option<WarehouseId> {
        match self {
            TransactionKind::Restock { warehouse_id, .. }
            | TransactionKind::Sales { warehouse_id, .. }
            | TransactionKind::Damaged { warehouse_id }
            | TransactionKind::SupplierReturn { warehouse_id, .. }
            | TransactionKind::CustomerReturn { warehouse_id, .. }
            | TransactionKind::OnlineOrder { warehouse_id, .. }
            | TransactionKind::AdditionRemoval { warehouse_id, .. } => Some(*warehouse_id),
            TransactionKind::InterWarehouseTransfer { .. }
            | TransactionKind::FailedTransferRequest { .. } => None,
        }
    }

    /// `(from, to)` for transfer-related entries.
    pub fn route(&self) -> Option<(WarehouseId, WarehouseId)> {
        match self {
            TransactionKind::InterWarehouseTransfer {
                from_warehouse_id,
                to_warehouse_id,
                ..
            }
            | TransactionKind::FailedTransferRequest {
                from_warehouse_id,
                to_warehouse_id,
                ..
            } => Some((*from_warehouse_id, *to_warehouse_id)),
            _ => None,
        }
    }

    pub fn supplier_id(&self) -> Option<SupplierId> {
        match self {
            TransactionKind::Restock { supplier_id, .. }
            | TransactionKind::SupplierReturn { supplier_id, .. } => Some(*supplier_id),
            _ => None,
        }
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        match self {
            TransactionKind::Sales { customer_id, .. }
            | TransactionKind::CustomerReturn { customer_id, .. }
            | TransactionKind::OnlineOrder { customer_id, .. } => *customer_id,
            _ => None,
        }
    }

    pub fn transfer_request_id(&self) -> Option<TransferRequestId> {
        match self {
            TransactionKind::InterWarehouseTransfer {
                transfer_request_id,
                ..
            }
            | TransactionKind::FailedTransferRequest {
                transfer_request_id,
                ..
            } => Some(*transfer_request_id),
            _ => None,
        }
    }

    pub fn transfer_status(&self) -> Option<InterWarehouseTransferStatus> {
        match self {
            TransactionKind::InterWarehouseTransfer {
                inter_warehouse_transfer_status,
                ..
            } => Some(*inter_warehouse_transfer_status),
            TransactionKind::FailedTransferRequest { .. } => {
                Some(InterWarehouseTransferStatus::Failed)
            }
            _ => None,
        }
    }

    /// Stock direction of entries posted directly through the ledger.
    ///
    /// `None` for entries owned by the transfer workflow or by warehouse
    /// membership changes; those move stock through their own rules.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            TransactionKind::Restock { .. } | TransactionKind::CustomerReturn { .. } => {
                Some(Direction::Inbound)
            }
            TransactionKind::Sales { .. }
            | TransactionKind::Damaged { .. }
            | TransactionKind::SupplierReturn { .. }
            | TransactionKind::OnlineOrder { .. } => Some(Direction::Outbound),
            TransactionKind::InterWarehouseTransfer { .. }
            | TransactionKind::AdditionRemoval { .. }
            | TransactionKind::FailedTransferRequest { .. } => None,
        }
    }
}

/// One product line of a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLine {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

impl TransactionLine {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
            price: None,
        }
    }

    pub fn priced(product_id: ProductId, quantity: i64, price: i64) -> Self {
        Self {
            product_id,
            quantity,
            price: Some(price),
        }
    }

    pub fn value(&self) -> DomainResult<i64> {
        line_value(self.quantity, self.price.unwrap_or(0))
    }
}

/// Sum of line values.
pub fn lines_value(lines: &[TransactionLine]) -> DomainResult<i64> {
    lines
        .iter()
        .try_fold(0i64, |acc, line| checked_add(acc, line.value()?))
}

/// Ledger entry.
///
/// Immutable in spirit: an edit replaces the whole record after reverting its
/// effects, it never patches fields in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryTransaction {
    pub id: TransactionId,
    #[serde(flatten)]
    pub kind: TransactionKind,
    pub products: Vec<TransactionLine>,
    pub total_value: i64,
    pub transaction_date: DateTime<Utc>,
    pub staff_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl InventoryTransaction {
    /// Build an entry whose `total_value` is the sum of its (priced) lines.
    pub fn new(
        id: TransactionId,
        kind: TransactionKind,
        products: Vec<TransactionLine>,
        transaction_date: DateTime<Utc>,
        staff_id: UserId,
    ) -> DomainResult<Self> {
        let total_value = lines_value(&products)?;
        Ok(Self {
            id,
            kind,
            products,
            total_value,
            transaction_date,
            staff_id,
            admin_id: None,
            note: None,
        })
    }

    pub fn with_admin(mut self, admin_id: Option<UserId>) -> Self {
        self.admin_id = admin_id;
        self
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.kind.transaction_type()
    }

    /// Sorted `(product, quantity)` pairs; used to compare entries by content.
    pub fn line_signature(&self) -> Vec<(ProductId, i64)> {
        line_signature(&self.products)
    }
}

pub fn line_signature(lines: &[TransactionLine]) -> Vec<(ProductId, i64)> {
    let mut sig: Vec<(ProductId, i64)> = lines.iter().map(|l| (l.product_id, l.quantity)).collect();
    sig.sort();
    sig
}

//! Boundary shape of a ledger posting and its validated form.
//!
//! [`TransactionPayload`] is what callers send: a flat record where every
//! reference is optional. [`StockMovement::try_from`] turns it into a
//! [`TransactionKind`] variant carrying exactly the references that type
//! needs, or rejects it before any record is read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depot_core::amount::{ensure_positive_quantity, ensure_price};
use depot_core::{CustomerId, DomainError, DomainResult, SupplierId, WarehouseId};

use crate::ledger::{Direction, TransactionKind, TransactionLine, TransactionType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    pub products: Vec<TransactionLine>,
    #[serde(default)]
    pub transaction_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
}

impl TransactionPayload {
    pub fn new(transaction_type: TransactionType, products: Vec<TransactionLine>) -> Self {
        Self {
            transaction_type,
            warehouse_id: None,
            supplier_id: None,
            customer_id: None,
            products,
            transaction_date: None,
            note: None,
        }
    }

    pub fn warehouse(mut self, warehouse_id: WarehouseId) -> Self {
        self.warehouse_id = Some(warehouse_id);
        self
    }

    pub fn supplier(mut self, supplier_id: SupplierId) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    pub fn customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn dated(mut self, at: DateTime<Utc>) -> Self {
        self.transaction_date = Some(at);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A ledger posting that passed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    kind: TransactionKind,
    direction: Direction,
    warehouse_id: WarehouseId,
    lines: Vec<TransactionLine>,
    transaction_date: Option<DateTime<Utc>>,
    note: Option<String>,
}

impl StockMovement {
    pub fn kind(&self) -> &TransactionKind {
        &self.kind
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.warehouse_id
    }

    pub fn lines(&self) -> &[TransactionLine] {
        &self.lines
    }

    pub fn transaction_date(&self) -> Option<DateTime<Utc>> {
        self.transaction_date
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn is_customer_return(&self) -> bool {
        matches!(self.kind, TransactionKind::CustomerReturn { .. })
    }
}

fn require<T>(value: Option<T>, field: &str, ty: TransactionType) -> DomainResult<T> {
    value.ok_or_else(|| DomainError::validation(format!("{field} is required for {ty} transactions")))
}

impl TryFrom<TransactionPayload> for StockMovement {
    type Error = DomainError;

    fn try_from(payload: TransactionPayload) -> Result<Self, Self::Error> {
        let ty = payload.transaction_type;
        let warehouse = || require(payload.warehouse_id, "warehouseId", ty);
        let supplier = || require(payload.supplier_id, "supplierId", ty);

        let kind = match ty {
            TransactionType::Restock => TransactionKind::Restock {
                warehouse_id: warehouse()?,
                supplier_id: supplier()?,
            },
            TransactionType::Sales => TransactionKind::Sales {
                warehouse_id: warehouse()?,
                customer_id: payload.customer_id,
            },
            TransactionType::Damaged => TransactionKind::Damaged {
                warehouse_id: warehouse()?,
            },
            TransactionType::SupplierReturn => TransactionKind::SupplierReturn {
                warehouse_id: warehouse()?,
                supplier_id: supplier()?,
            },
            TransactionType::CustomerReturn => TransactionKind::CustomerReturn {
                warehouse_id: warehouse()?,
                customer_id: payload.customer_id,
            },
            TransactionType::OnlineOrder => TransactionKind::OnlineOrder {
                warehouse_id: warehouse()?,
                customer_id: payload.customer_id,
            },
            TransactionType::InterWarehouseTransfer | TransactionType::FailedTransferRequest => {
                return Err(DomainError::validation(format!(
                    "{ty} entries are recorded by the transfer request workflow"
                )));
            }
            TransactionType::AdditionRemoval => {
                return Err(DomainError::validation(
                    "AdditionRemoval entries are recorded by adding or removing warehouse products",
                ));
            }
        };

        if payload.products.is_empty() {
            return Err(DomainError::validation("at least one product line is required"));
        }
        for line in &payload.products {
            ensure_positive_quantity(line.quantity)?;
            if let Some(price) = line.price {
                ensure_price(price)?;
            }
        }

        let (Some(direction), Some(warehouse_id)) = (kind.direction(), kind.warehouse_id()) else {
            return Err(DomainError::invariant(format!("{ty} is not a postable type")));
        };

        Ok(Self {
            kind,
            direction,
            warehouse_id,
            lines: payload.products,
            transaction_date: payload.transaction_date,
            note: payload.note,
        })
    }
}

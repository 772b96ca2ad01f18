//! Persistence seam for the four primary records.
//!
//! Every operation runs inside one [`StoreTransaction`] obtained from
//! [`InventoryStore::begin`]. Reads inside the scope observe the scope's own
//! writes; nothing is visible to other scopes until [`StoreTransaction::commit`].
//! Dropping a scope without committing aborts it.
//!
//! The scope is passed explicitly to every helper; there is no ambient
//! transaction state.

pub mod in_memory;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use depot_core::{ProductId, SupplierId, TransactionId, TransferRequestId, UserId, WarehouseId};
use depot_inventory::{InventoryTransaction, Product, StaffAssignment, Supplier, Warehouse};
use depot_transfers::TransferRequest;

pub use in_memory::{InMemoryInventoryStore, InMemoryTransaction};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("missing record: {0}")]
    MissingRecord(String),

    #[error("commit failed: {0}")]
    CommitFailed(String),
}

/// One atomic unit of work.
pub trait StoreTransaction {
    fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
    fn put_product(&mut self, product: Product) -> Result<(), StoreError>;

    fn warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, StoreError>;
    fn put_warehouse(&mut self, warehouse: Warehouse) -> Result<(), StoreError>;

    fn supplier(&self, id: SupplierId) -> Result<Option<Supplier>, StoreError>;

    fn transaction(&self, id: TransactionId) -> Result<Option<InventoryTransaction>, StoreError>;
    /// Fails with [`StoreError::DuplicateKey`] if the id is taken.
    fn insert_transaction(&mut self, entry: InventoryTransaction) -> Result<(), StoreError>;
    /// Fails with [`StoreError::MissingRecord`] if the id is unknown.
    fn replace_transaction(&mut self, entry: InventoryTransaction) -> Result<(), StoreError>;
    /// Ledger entries dated at or after `since`.
    fn transactions_since(&self, since: DateTime<Utc>) -> Result<Vec<InventoryTransaction>, StoreError>;

    fn transfer_request(&self, id: TransferRequestId) -> Result<Option<TransferRequest>, StoreError>;
    fn insert_transfer_request(&mut self, request: TransferRequest) -> Result<(), StoreError>;
    fn put_transfer_request(&mut self, request: TransferRequest) -> Result<(), StoreError>;

    fn staff_assignment(&self, staff_id: UserId) -> Result<Option<StaffAssignment>, StoreError>;
    fn put_staff_assignment(&mut self, assignment: StaffAssignment) -> Result<(), StoreError>;

    fn commit(self) -> Result<(), StoreError>;
}

/// Source of transaction scopes.
pub trait InventoryStore: Send + Sync {
    type Tx<'a>: StoreTransaction
    where
        Self: 'a;

    fn begin(&self) -> Result<Self::Tx<'_>, StoreError>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore,
{
    type Tx<'a>
        = S::Tx<'a>
    where
        Self: 'a;

    fn begin(&self) -> Result<Self::Tx<'_>, StoreError> {
        (**self).begin()
    }
}

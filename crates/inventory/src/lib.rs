//! Inventory domain module: stock aggregates and the inventory ledger.
//!
//! This crate contains business rules only, implemented as deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod ledger;
pub mod payload;
pub mod product;
pub mod staff;
pub mod warehouse;

pub use ledger::{
    Direction, InterWarehouseTransferStatus, InventoryTransaction, StockAction, TransactionKind,
    TransactionLine, TransactionType, line_signature, lines_value,
};
pub use payload::{StockMovement, TransactionPayload};
pub use product::{Product, Supplier};
pub use staff::StaffAssignment;
pub use warehouse::{StockSnapshot, Warehouse, WarehouseKind};

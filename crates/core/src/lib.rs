//! `depot-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod amount;
pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{
    CategoryId, CustomerId, ProductId, SupplierId, TransactionId, TransferRequestId, UserId,
    WarehouseId,
};

//! Transfer request state machine (inter-warehouse stock movement).
//!
//! Pure domain logic: status edges, per-line decisions and totals. Stock and
//! ledger effects of each step are applied by the infrastructure services.

pub mod request;

pub use request::{
    LineDecision, LineSelection, LineStatus, NewTransferRequest, TransferLine, TransferRequest,
    TransferStatus, TransferType,
};

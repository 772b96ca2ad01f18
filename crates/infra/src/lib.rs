//! Infrastructure layer: transaction scopes, configuration and the operation
//! services that compose the pure domain crates into atomic units of work.

pub mod config;
pub mod error;
pub mod ledger_service;
pub mod staffing_service;
pub mod store;
pub mod transfer_service;
pub mod warehouse_stock_service;

mod lookup;
mod notify;


pub use config::LedgerConfig;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use ledger_service::LedgerService;
pub use staffing_service::StaffingService;
pub use store::{InMemoryInventoryStore, InventoryStore, StoreError, StoreTransaction};
pub use transfer_service::{RequestedLine, TransferDraft, TransferService};
pub use warehouse_stock_service::WarehouseStockService;

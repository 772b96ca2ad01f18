//! Load-or-NotFound helpers over a transaction scope.

use depot_core::{DomainError, ProductId, SupplierId, TransactionId, TransferRequestId, WarehouseId};
use depot_inventory::{InventoryTransaction, Product, Supplier, Warehouse};
use depot_transfers::TransferRequest;

use crate::error::ServiceResult;
use crate::store::StoreTransaction;

pub(crate) fn product<T: StoreTransaction>(tx: &T, id: ProductId) -> ServiceResult<Product> {
    tx.product(id)?
        .ok_or_else(|| DomainError::not_found(format!("product {id}")).into())
}

pub(crate) fn warehouse<T: StoreTransaction>(tx: &T, id: WarehouseId) -> ServiceResult<Warehouse> {
    tx.warehouse(id)?
        .ok_or_else(|| DomainError::not_found(format!("warehouse {id}")).into())
}

pub(crate) fn supplier<T: StoreTransaction>(tx: &T, id: SupplierId) -> ServiceResult<Supplier> {
    tx.supplier(id)?
        .ok_or_else(|| DomainError::not_found(format!("supplier {id}")).into())
}

pub(crate) fn ledger_entry<T: StoreTransaction>(
    tx: &T,
    id: TransactionId,
) -> ServiceResult<InventoryTransaction> {
    tx.transaction(id)?
        .ok_or_else(|| DomainError::not_found(format!("inventory transaction {id}")).into())
}

pub(crate) fn transfer_request<T: StoreTransaction>(
    tx: &T,
    id: TransferRequestId,
) -> ServiceResult<TransferRequest> {
    tx.transfer_request(id)?
        .ok_or_else(|| DomainError::not_found(format!("transfer request {id}")).into())
}

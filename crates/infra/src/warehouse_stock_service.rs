//! Product membership of a warehouse (add / remove).
//!
//! A product lives in at most one warehouse. Joining embeds its snapshot and
//! adds its whole on-hand quantity to the warehouse totals; leaving does the
//! reverse. Both write an `AdditionRemoval` ledger entry.

use chrono::Utc;

use depot_auth::{Actor, authorize_manager};
use depot_core::{ProductId, TransactionId, WarehouseId};
use depot_inventory::{InventoryTransaction, StockAction, TransactionKind, TransactionLine};

use crate::error::ServiceResult;
use crate::lookup;
use crate::store::{InventoryStore, StoreTransaction};

#[derive(Debug)]
pub struct WarehouseStockService<S> {
    store: S,
}

impl<S> WarehouseStockService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S> WarehouseStockService<S>
where
    S: InventoryStore,
{
    pub fn add_product_to_warehouse(
        &self,
        warehouse_id: WarehouseId,
        product_id: ProductId,
        actor: &Actor,
    ) -> ServiceResult<InventoryTransaction> {
        let mut tx = self.store.begin()?;
        let mut warehouse = lookup::warehouse(&tx, warehouse_id)?;
        authorize_manager(actor, &warehouse)?;
        let mut product = lookup::product(&tx, product_id)?;

        product.assign_to(warehouse_id)?;
        warehouse.push_snapshot(product.snapshot())?;

        let entry = InventoryTransaction::new(
            TransactionId::new(),
            TransactionKind::AdditionRemoval {
                warehouse_id,
                action: StockAction::Add,
            },
            vec![TransactionLine::priced(product_id, product.quantity(), product.price())],
            Utc::now(),
            actor.user_id,
        )?
        .with_admin(actor.is_admin().then_some(actor.user_id));

        tx.put_product(product)?;
        tx.put_warehouse(warehouse)?;
        tx.insert_transaction(entry.clone())?;
        tx.commit()?;

        tracing::info!(%warehouse_id, %product_id, entry_id = %entry.id, "product added to warehouse");
        Ok(entry)
    }

    pub fn remove_product_from_warehouse(
        &self,
        warehouse_id: WarehouseId,
        product_id: ProductId,
        actor: &Actor,
    ) -> ServiceResult<InventoryTransaction> {
        let mut tx = self.store.begin()?;
        let mut warehouse = lookup::warehouse(&tx, warehouse_id)?;
        authorize_manager(actor, &warehouse)?;
        let mut product = lookup::product(&tx, product_id)?;

        product.release_from(warehouse_id)?;
        let snapshot = warehouse.pull_snapshot(product_id)?;

        let entry = InventoryTransaction::new(
            TransactionId::new(),
            TransactionKind::AdditionRemoval {
                warehouse_id,
                action: StockAction::Remove,
            },
            vec![TransactionLine::priced(product_id, snapshot.quantity, snapshot.price)],
            Utc::now(),
            actor.user_id,
        )?
        .with_admin(actor.is_admin().then_some(actor.user_id));

        tx.put_product(product)?;
        tx.put_warehouse(warehouse)?;
        tx.insert_transaction(entry.clone())?;
        tx.commit()?;

        tracing::info!(%warehouse_id, %product_id, entry_id = %entry.id, "product removed from warehouse");
        Ok(entry)
    }
}

//! Inventory ledger: post and edit stock-affecting entries.
//!
//! ```text
//! payload
//!   ↓ StockMovement::try_from   (validation, no IO)
//! begin
//!   ↓ load warehouse, authorize, check refs
//!   ↓ [update only] revert old entry's effects
//!   ↓ customer-return guards
//!   ↓ apply deltas to Product + Warehouse snapshot + rollups
//!   ↓ write ledger entry
//! commit
//!   ↓ low-stock notifications (best effort)
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use depot_auth::{Actor, authorize_manager};
use depot_core::amount::checked_add;
use depot_core::{DomainError, ProductId, TransactionId, WarehouseId};
use depot_events::NotifySink;
use depot_inventory::{
    Direction, InventoryTransaction, Product, StockMovement, TransactionKind, TransactionLine,
    TransactionPayload, Warehouse, line_signature,
};

use crate::config::LedgerConfig;
use crate::error::ServiceResult;
use crate::lookup;
use crate::notify::Outbox;
use crate::store::{InventoryStore, StoreTransaction};

/// Warehouses loaded into a unit of work, written back together.
#[derive(Debug, Default)]
struct Touched {
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    /// `total_quantity` of each warehouse when it was first loaded.
    totals_before: BTreeMap<WarehouseId, i64>,
    products: BTreeSet<ProductId>,
}

impl Touched {
    fn load<T: StoreTransaction>(&mut self, tx: &T, id: WarehouseId) -> ServiceResult<&mut Warehouse> {
        if !self.warehouses.contains_key(&id) {
            let warehouse = lookup::warehouse(tx, id)?;
            self.totals_before.insert(id, warehouse.total_quantity());
            self.warehouses.insert(id, warehouse);
        }
        self.warehouses
            .get_mut(&id)
            .ok_or_else(|| DomainError::invariant(format!("warehouse {id} vanished")).into())
    }

    /// Judge the end state of an edit: products and snapshots non-negative,
    /// no warehouse grown past capacity.
    fn ensure_settled<T: StoreTransaction>(&self, tx: &T) -> ServiceResult<()> {
        for id in &self.products {
            lookup::product(tx, *id)?.ensure_settled()?;
        }
        for (id, warehouse) in &self.warehouses {
            let before = self.totals_before.get(id).copied().unwrap_or_default();
            warehouse.ensure_settled(before)?;
        }
        Ok(())
    }

    fn write_back<T: StoreTransaction>(&mut self, tx: &mut T) -> ServiceResult<()> {
        for (_, warehouse) in std::mem::take(&mut self.warehouses) {
            tx.put_warehouse(warehouse)?;
        }
        Ok(())
    }
}

/// Undo the effects of a recorded entry's `lines`. Limits are not enforced
/// here; [`Touched::ensure_settled`] checks the state once the replacement
/// has been applied.
fn revert_lines<T: StoreTransaction>(
    tx: &mut T,
    touched: &mut Touched,
    warehouse_id: WarehouseId,
    direction: Direction,
    lines: &[TransactionLine],
) -> ServiceResult<()> {
    for line in lines {
        let mut product = lookup::product(&*tx, line.product_id)?;
        let delta = direction.reversed().signed(line.quantity);
        product.revert_delta(delta)?;
        touched.load(&*tx, warehouse_id)?.revert_stock(&product, delta)?;
        touched.products.insert(product.id());
        tx.put_product(product)?;
    }
    Ok(())
}

/// Apply `lines` in `direction` against `warehouse_id`, returning the lines
/// priced as they will be recorded.
fn apply_lines<T: StoreTransaction>(
    tx: &mut T,
    touched: &mut Touched,
    warehouse_id: WarehouseId,
    direction: Direction,
    lines: &[TransactionLine],
) -> ServiceResult<Vec<TransactionLine>> {
    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let mut product = lookup::product(&*tx, line.product_id)?;
        if !product.belongs_to(warehouse_id) {
            return Err(DomainError::validation(format!(
                "product {} does not belong to warehouse {warehouse_id}",
                line.product_id
            ))
            .into());
        }

        let delta = direction.signed(line.quantity);
        product.apply_delta(delta)?;
        touched.load(&*tx, warehouse_id)?.adjust_stock(&product, delta)?;

        priced.push(TransactionLine::priced(
            line.product_id,
            line.quantity,
            line.price.unwrap_or(product.price()),
        ));
        touched.products.insert(product.id());
        tx.put_product(product)?;
    }
    Ok(priced)
}

/// Posts and edits ledger entries.
#[derive(Debug)]
pub struct LedgerService<S, N> {
    store: S,
    notifier: N,
    config: LedgerConfig,
}

impl<S, N> LedgerService<S, N> {
    pub fn new(store: S, notifier: N, config: LedgerConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

impl<S, N> LedgerService<S, N>
where
    S: InventoryStore,
    N: NotifySink,
{
    /// Record a new stock movement.
    pub fn post_inventory_transaction(
        &self,
        payload: TransactionPayload,
        actor: &Actor,
    ) -> ServiceResult<InventoryTransaction> {
        let movement = StockMovement::try_from(payload)?;
        let at = movement.transaction_date().unwrap_or_else(Utc::now);

        let mut tx = self.store.begin()?;
        let mut touched = Touched::default();

        self.check_refs(&tx, &mut touched, &movement, actor)?;
        if movement.is_customer_return() {
            self.guard_customer_return(&tx, &movement, at, None)?;
        }
        let lines = apply_lines(
            &mut tx,
            &mut touched,
            movement.warehouse_id(),
            movement.direction(),
            movement.lines(),
        )?;

        let entry = InventoryTransaction::new(
            TransactionId::new(),
            movement.kind().clone(),
            lines,
            at,
            actor.user_id,
        )?
        .with_admin(actor.is_admin().then_some(actor.user_id))
        .with_note(movement.note().map(str::to_owned));

        tx.insert_transaction(entry.clone())?;
        let outbox = self.low_stock_outbox(&tx, &touched)?;
        touched.write_back(&mut tx)?;
        tx.commit()?;

        tracing::info!(
            entry_id = %entry.id,
            transaction_type = %entry.transaction_type(),
            warehouse_id = %movement.warehouse_id(),
            total_value = entry.total_value,
            "inventory transaction posted"
        );
        outbox.deliver(&self.notifier);
        Ok(entry)
    }

    /// Replace an entry: revert its effects, then apply the new payload, in
    /// one unit of work.
    pub fn update_inventory_transaction(
        &self,
        id: TransactionId,
        payload: TransactionPayload,
        actor: &Actor,
    ) -> ServiceResult<InventoryTransaction> {
        let movement = StockMovement::try_from(payload)?;

        let mut tx = self.store.begin()?;
        let mut touched = Touched::default();

        let existing = lookup::ledger_entry(&tx, id)?;
        let (Some(old_direction), Some(old_warehouse)) =
            (existing.kind.direction(), existing.kind.warehouse_id())
        else {
            return Err(DomainError::conflict(format!(
                "{} entries cannot be edited through the ledger",
                existing.transaction_type()
            ))
            .into());
        };

        authorize_manager(actor, &*touched.load(&tx, old_warehouse)?)?;
        revert_lines(&mut tx, &mut touched, old_warehouse, old_direction, &existing.products)?;

        let at = movement
            .transaction_date()
            .unwrap_or(existing.transaction_date);
        self.check_refs(&tx, &mut touched, &movement, actor)?;
        if movement.is_customer_return() {
            self.guard_customer_return(&tx, &movement, at, Some(id))?;
        }
        let lines = apply_lines(
            &mut tx,
            &mut touched,
            movement.warehouse_id(),
            movement.direction(),
            movement.lines(),
        )?;

        let entry = InventoryTransaction::new(id, movement.kind().clone(), lines, at, existing.staff_id)?
            .with_admin(if actor.is_admin() {
                Some(actor.user_id)
            } else {
                existing.admin_id
            })
            .with_note(movement.note().map(str::to_owned));

        touched.ensure_settled(&tx)?;
        tx.replace_transaction(entry.clone())?;
        let outbox = self.low_stock_outbox(&tx, &touched)?;
        touched.write_back(&mut tx)?;
        tx.commit()?;

        tracing::info!(
            entry_id = %entry.id,
            transaction_type = %entry.transaction_type(),
            warehouse_id = %movement.warehouse_id(),
            total_value = entry.total_value,
            "inventory transaction updated"
        );
        outbox.deliver(&self.notifier);
        Ok(entry)
    }

    fn check_refs<T: StoreTransaction>(
        &self,
        tx: &T,
        touched: &mut Touched,
        movement: &StockMovement,
        actor: &Actor,
    ) -> ServiceResult<()> {
        let warehouse = touched.load(tx, movement.warehouse_id())?;
        authorize_manager(actor, &*warehouse)?;
        if let Some(supplier_id) = movement.kind().supplier_id() {
            lookup::supplier(tx, supplier_id)?;
        }
        Ok(())
    }

    /// Duplicate guard first, then the rolling per-product cap. The entry
    /// being edited (if any) is not counted.
    fn guard_customer_return<T: StoreTransaction>(
        &self,
        tx: &T,
        movement: &StockMovement,
        at: DateTime<Utc>,
        exclude: Option<TransactionId>,
    ) -> ServiceResult<()> {
        let window = self.config.customer_return_window();
        let since = at.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let until = at.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let recent: Vec<InventoryTransaction> = tx
            .transactions_since(since)?
            .into_iter()
            .filter(|e| Some(e.id) != exclude)
            .filter(|e| e.transaction_date <= until)
            .filter(|e| matches!(e.kind, TransactionKind::CustomerReturn { .. }))
            .collect();

        let signature = line_signature(movement.lines());
        if let Some(dup) = recent.iter().find(|e| e.line_signature() == signature) {
            return Err(DomainError::conflict(format!(
                "duplicate customer return: entry {} already returned the same products",
                dup.id
            ))
            .into());
        }

        let mut requested: BTreeMap<ProductId, i64> = BTreeMap::new();
        for line in movement.lines() {
            let total = requested.entry(line.product_id).or_default();
            *total = checked_add(*total, line.quantity)?;
        }
        for (product_id, quantity) in requested {
            let already = recent
                .iter()
                .flat_map(|e| e.products.iter())
                .filter(|l| l.product_id == product_id)
                .try_fold(0i64, |sum, l| checked_add(sum, l.quantity))?;
            let reached = checked_add(already, quantity)?;
            if reached > self.config.customer_return_cap {
                return Err(DomainError::validation(format!(
                    "customer returns of product {product_id} would reach {} units within {}h (cap {})",
                    reached,
                    self.config.customer_return_window_hours,
                    self.config.customer_return_cap
                ))
                .into());
            }
        }
        Ok(())
    }

    fn low_stock_outbox<T: StoreTransaction>(&self, tx: &T, touched: &Touched) -> ServiceResult<Outbox> {
        let mut outbox = Outbox::new();
        for id in &touched.products {
            let product: Product = lookup::product(tx, *id)?;
            let Some(warehouse_id) = product.warehouse_id() else {
                continue;
            };
            if let Some(warehouse) = touched.warehouses.get(&warehouse_id) {
                outbox.low_stock(&product, warehouse, self.config.low_stock_threshold);
            }
        }
        Ok(outbox)
    }
}

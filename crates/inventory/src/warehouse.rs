use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use depot_auth::WarehouseMembership;
use depot_core::amount::{checked_add, ensure_positive_quantity, ensure_price, line_value};
use depot_core::{DomainError, DomainResult, ProductId, UserId, WarehouseId};

use crate::product::Product;

/// Warehouse tier. Transfers are typed by the tiers they connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseKind {
    Super,
    Regular,
}

/// Denormalized product copy embedded in a warehouse.
///
/// `name` and `price` may lag behind the canonical product until the next sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub price: i64,
}

/// Warehouse aggregate: embedded stock snapshots plus rollup totals.
///
/// Invariants maintained by every mutating method:
/// - `total_quantity == Σ products[].quantity`
/// - `total_value == Σ products[].quantity * price`
/// - no snapshot quantity is negative
/// - increases never push `total_quantity` above `capacity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    id: WarehouseId,
    name: String,
    kind: WarehouseKind,
    capacity: i64,
    managed_by: BTreeSet<UserId>,
    products: Vec<StockSnapshot>,
    total_quantity: i64,
    total_value: i64,
}

impl Warehouse {
    pub fn new(
        id: WarehouseId,
        name: impl Into<String>,
        kind: WarehouseKind,
        capacity: i64,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("warehouse name cannot be empty"));
        }
        if capacity < 0 {
            return Err(DomainError::validation("warehouse capacity cannot be negative"));
        }
        Ok(Self {
            id,
            name,
            kind,
            capacity,
            managed_by: BTreeSet::new(),
            products: Vec::new(),
            total_quantity: 0,
            total_value: 0,
        })
    }

    pub fn id(&self) -> WarehouseId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> WarehouseKind {
        self.kind
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    pub fn products(&self) -> &[StockSnapshot] {
        &self.products
    }

    pub fn total_quantity(&self) -> i64 {
        self.total_quantity
    }

    pub fn total_value(&self) -> i64 {
        self.total_value
    }

    pub fn snapshot(&self, product_id: ProductId) -> Option<&StockSnapshot> {
        self.products.iter().find(|s| s.product_id == product_id)
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.products.iter().position(|s| s.product_id == product_id)
    }

    pub fn assign_manager(&mut self, user_id: UserId) -> bool {
        self.managed_by.insert(user_id)
    }

    pub fn remove_manager(&mut self, user_id: UserId) -> bool {
        self.managed_by.remove(&user_id)
    }

    /// Pre-write capacity check for an increase of `additional` units.
    pub fn ensure_capacity_for(&self, additional: i64) -> DomainResult<()> {
        if additional <= 0 {
            return Ok(());
        }
        let next = checked_add(self.total_quantity, additional)?;
        if next > self.capacity {
            return Err(DomainError::capacity_exceeded(format!(
                "warehouse {} holds {} of {} units, cannot take {} more",
                self.id, self.total_quantity, self.capacity, additional
            )));
        }
        Ok(())
    }

    /// Incremental adjustment used by ledger postings.
    ///
    /// Moves one snapshot by `delta` and bumps the rollups by the same amount
    /// (value at the snapshot price). A missing snapshot is created on an
    /// increase. Returns the snapshot's resulting quantity.
    pub fn adjust_stock(&mut self, product: &Product, delta: i64) -> DomainResult<i64> {
        self.ensure_capacity_for(delta)?;

        let (next, value_delta) = match self.position(product.id()) {
            Some(idx) => {
                let snap = &self.products[idx];
                let next = checked_add(snap.quantity, delta)?;
                if next < 0 {
                    return Err(DomainError::insufficient_stock(format!(
                        "warehouse {} holds {} of product {}, cannot remove {}",
                        self.id,
                        snap.quantity,
                        product.id(),
                        -delta
                    )));
                }
                let value_delta = line_value(delta, snap.price)?;
                self.products[idx].quantity = next;
                (next, value_delta)
            }
            None if delta >= 0 => {
                let value_delta = line_value(delta, product.price())?;
                self.products.push(StockSnapshot {
                    quantity: delta,
                    ..product.snapshot()
                });
                (delta, value_delta)
            }
            None => {
                return Err(DomainError::insufficient_stock(format!(
                    "warehouse {} holds no stock of product {}",
                    self.id,
                    product.id()
                )));
            }
        };

        self.total_quantity = checked_add(self.total_quantity, delta)?;
        self.total_value = checked_add(self.total_value, value_delta)?;
        Ok(next)
    }

    /// Undo an earlier adjustment of `delta`.
    ///
    /// Only overflow is checked: the intermediate state of an edit may sit
    /// above capacity or below zero until the replacement is applied, and
    /// [`Warehouse::ensure_settled`] judges the final result.
    pub fn revert_stock(&mut self, product: &Product, delta: i64) -> DomainResult<()> {
        let value_delta = match self.position(product.id()) {
            Some(idx) => {
                let snap = &mut self.products[idx];
                snap.quantity = checked_add(snap.quantity, delta)?;
                line_value(delta, snap.price)?
            }
            None => {
                self.products.push(StockSnapshot {
                    quantity: delta,
                    ..product.snapshot()
                });
                line_value(delta, product.price())?
            }
        };
        self.total_quantity = checked_add(self.total_quantity, delta)?;
        self.total_value = checked_add(self.total_value, value_delta)?;
        Ok(())
    }

    /// Final-state check after an edit: no snapshot below zero, and no growth
    /// beyond capacity relative to `total_before`.
    pub fn ensure_settled(&self, total_before: i64) -> DomainResult<()> {
        if let Some(snap) = self.products.iter().find(|s| s.quantity < 0) {
            return Err(DomainError::insufficient_stock(format!(
                "warehouse {} would hold {} of product {}",
                self.id, snap.quantity, snap.product_id
            )));
        }
        if self.total_quantity > self.capacity && self.total_quantity > total_before {
            return Err(DomainError::capacity_exceeded(format!(
                "warehouse {} would hold {} of {} units",
                self.id, self.total_quantity, self.capacity
            )));
        }
        Ok(())
    }

    /// Embed a new snapshot (product joins the warehouse).
    pub fn push_snapshot(&mut self, snapshot: StockSnapshot) -> DomainResult<()> {
        if self.position(snapshot.product_id).is_some() {
            return Err(DomainError::conflict(format!(
                "product {} is already stocked in warehouse {}",
                snapshot.product_id, self.id
            )));
        }
        if snapshot.quantity < 0 {
            return Err(DomainError::validation("snapshot quantity cannot be negative"));
        }
        ensure_price(snapshot.price)?;
        self.ensure_capacity_for(snapshot.quantity)?;

        let value = line_value(snapshot.quantity, snapshot.price)?;
        self.total_quantity = checked_add(self.total_quantity, snapshot.quantity)?;
        self.total_value = checked_add(self.total_value, value)?;
        self.products.push(snapshot);
        Ok(())
    }

    /// Remove a snapshot (product leaves the warehouse) and return it.
    pub fn pull_snapshot(&mut self, product_id: ProductId) -> DomainResult<StockSnapshot> {
        let idx = self.position(product_id).ok_or_else(|| {
            DomainError::not_found(format!(
                "product {product_id} is not stocked in warehouse {}",
                self.id
            ))
        })?;
        let value = line_value(self.products[idx].quantity, self.products[idx].price)?;
        let quantity = self.products[idx].quantity;

        self.total_quantity = checked_add(self.total_quantity, -quantity)?;
        self.total_value = checked_add(self.total_value, -value)?;
        Ok(self.products.remove(idx))
    }

    /// Take `quantity` units out of a snapshot (goods leaving on a transfer),
    /// then recompute the rollups from the snapshots.
    pub fn deduct(&mut self, product_id: ProductId, quantity: i64) -> DomainResult<()> {
        ensure_positive_quantity(quantity)?;
        let idx = self.position(product_id).ok_or_else(|| {
            DomainError::not_found(format!(
                "product {product_id} is not stocked in warehouse {}",
                self.id
            ))
        })?;
        let snap = &mut self.products[idx];
        if snap.quantity < quantity {
            return Err(DomainError::insufficient_stock(format!(
                "warehouse {} holds {} of product {product_id}, cannot ship {quantity}",
                self.id, snap.quantity
            )));
        }
        snap.quantity -= quantity;
        self.recompute_totals()
    }

    /// Credit incoming goods: increment the existing snapshot or insert a new
    /// one, then recompute the rollups.
    pub fn receive(&mut self, incoming: StockSnapshot) -> DomainResult<()> {
        ensure_positive_quantity(incoming.quantity)?;
        ensure_price(incoming.price)?;
        self.ensure_capacity_for(incoming.quantity)?;

        match self.position(incoming.product_id) {
            Some(idx) => {
                let snap = &mut self.products[idx];
                snap.quantity = checked_add(snap.quantity, incoming.quantity)?;
            }
            None => self.products.push(incoming),
        }
        self.recompute_totals()
    }

    /// Rebuild `total_quantity` / `total_value` from the embedded snapshots.
    pub fn recompute_totals(&mut self) -> DomainResult<()> {
        let (quantity, value) = self.summed_totals()?;
        self.total_quantity = quantity;
        self.total_value = value;
        Ok(())
    }

    fn summed_totals(&self) -> DomainResult<(i64, i64)> {
        let mut quantity = 0i64;
        let mut value = 0i64;
        for s in &self.products {
            quantity = checked_add(quantity, s.quantity)?;
            value = checked_add(value, line_value(s.quantity, s.price)?)?;
        }
        Ok((quantity, value))
    }

    /// Whether the rollups agree with the snapshots.
    pub fn totals_consistent(&self) -> bool {
        matches!(self.summed_totals(), Ok((q, v)) if q == self.total_quantity && v == self.total_value)
    }
}

impl WarehouseMembership for Warehouse {
    fn warehouse_id(&self) -> WarehouseId {
        self.id
    }

    fn managed_by(&self) -> &BTreeSet<UserId> {
        &self.managed_by
    }
}

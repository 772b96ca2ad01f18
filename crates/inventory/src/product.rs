use serde::{Deserialize, Serialize};

use depot_core::amount::{checked_add, ensure_price};
use depot_core::{CategoryId, DomainError, DomainResult, ProductId, SupplierId, WarehouseId};

use crate::warehouse::StockSnapshot;

/// Canonical product record.
///
/// `quantity` is the canonical on-hand count. It is only moved by ledger
/// postings and by nothing in the transfer workflow: transfers act on the
/// warehouse snapshots alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    name: String,
    category_id: Option<CategoryId>,
    price: i64,
    quantity: i64,
    warehouse_id: Option<WarehouseId>,
    supplier_id: Option<SupplierId>,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, price: i64, quantity: i64) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        ensure_price(price)?;
        if quantity < 0 {
            return Err(DomainError::validation("product quantity cannot be negative"));
        }
        Ok(Self {
            id,
            name,
            category_id: None,
            price,
            quantity,
            warehouse_id: None,
            supplier_id: None,
        })
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_supplier(mut self, supplier_id: SupplierId) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn warehouse_id(&self) -> Option<WarehouseId> {
        self.warehouse_id
    }

    pub fn supplier_id(&self) -> Option<SupplierId> {
        self.supplier_id
    }

    pub fn belongs_to(&self, warehouse_id: WarehouseId) -> bool {
        self.warehouse_id == Some(warehouse_id)
    }

    /// Apply a signed quantity change, refusing to go below zero.
    ///
    /// Returns the resulting quantity.
    pub fn apply_delta(&mut self, delta: i64) -> DomainResult<i64> {
        let next = checked_add(self.quantity, delta)?;
        if next < 0 {
            return Err(DomainError::insufficient_stock(format!(
                "product {} has {} on hand, cannot remove {}",
                self.id,
                self.quantity,
                -delta
            )));
        }
        self.quantity = next;
        Ok(next)
    }

    /// Undo an earlier [`Product::apply_delta`]. Only overflow is checked; the
    /// caller validates the final quantity with [`Product::ensure_settled`].
    pub fn revert_delta(&mut self, delta: i64) -> DomainResult<i64> {
        self.quantity = checked_add(self.quantity, delta)?;
        Ok(self.quantity)
    }

    pub fn ensure_settled(&self) -> DomainResult<()> {
        if self.quantity < 0 {
            return Err(DomainError::insufficient_stock(format!(
                "product {} would have {} on hand",
                self.id, self.quantity
            )));
        }
        Ok(())
    }

    /// Place the product in a warehouse. A product lives in at most one.
    pub fn assign_to(&mut self, warehouse_id: WarehouseId) -> DomainResult<()> {
        if let Some(current) = self.warehouse_id {
            return Err(DomainError::conflict(format!(
                "product {} already belongs to warehouse {current}",
                self.id
            )));
        }
        self.warehouse_id = Some(warehouse_id);
        Ok(())
    }

    /// Detach the product from `warehouse_id`.
    pub fn release_from(&mut self, warehouse_id: WarehouseId) -> DomainResult<()> {
        if !self.belongs_to(warehouse_id) {
            return Err(DomainError::conflict(format!(
                "product {} does not belong to warehouse {warehouse_id}",
                self.id
            )));
        }
        self.warehouse_id = None;
        Ok(())
    }

    /// Denormalized copy for embedding in a warehouse.
    pub fn snapshot(&self) -> StockSnapshot {
        StockSnapshot {
            product_id: self.id,
            name: self.name.clone(),
            quantity: self.quantity,
            price: self.price,
        }
    }
}

/// Supplier master record (read-only for the core).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
}

impl Supplier {
    pub fn new(id: SupplierId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(quantity: i64) -> Product {
        Product::new(ProductId::new(), "Widget", 5, quantity).unwrap()
    }

    #[test]
    fn negative_result_is_insufficient_stock() {
        let mut p = widget(10);
        let err = p.apply_delta(-15).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock(_)));
        assert_eq!(p.quantity(), 10);
    }

    #[test]
    fn delta_to_exactly_zero_is_allowed() {
        let mut p = widget(10);
        assert_eq!(p.apply_delta(-10).unwrap(), 0);
    }

    #[test]
    fn revert_can_dip_below_zero_until_settled() {
        let mut p = widget(5);
        assert_eq!(p.revert_delta(-20).unwrap(), -15);
        assert!(matches!(p.ensure_settled(), Err(DomainError::InsufficientStock(_))));
        p.apply_delta(20).unwrap();
        p.ensure_settled().unwrap();
        assert!(matches!(p.revert_delta(i64::MAX), Err(DomainError::Validation(_))));
    }

    #[test]
    fn product_lives_in_one_warehouse_at_a_time() {
        let mut p = widget(1);
        let a = WarehouseId::new();
        p.assign_to(a).unwrap();
        assert!(matches!(p.assign_to(WarehouseId::new()), Err(DomainError::Conflict(_))));
        assert!(matches!(p.release_from(WarehouseId::new()), Err(DomainError::Conflict(_))));
        p.release_from(a).unwrap();
        assert_eq!(p.warehouse_id(), None);
    }

    #[test]
    fn rejects_blank_name_and_negative_price() {
        assert!(Product::new(ProductId::new(), "  ", 1, 0).is_err());
        assert!(Product::new(ProductId::new(), "x", -1, 0).is_err());
    }
}

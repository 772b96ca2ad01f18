use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use depot_core::{ProductId, SupplierId, TransactionId, TransferRequestId, UserId, WarehouseId};
use depot_inventory::{InventoryTransaction, Product, StaffAssignment, Supplier, Warehouse};
use depot_transfers::TransferRequest;

use super::{InventoryStore, StoreError, StoreTransaction};

#[derive(Debug, Default)]
struct Tables {
    products: HashMap<ProductId, Product>,
    warehouses: HashMap<WarehouseId, Warehouse>,
    suppliers: HashMap<SupplierId, Supplier>,
    transactions: HashMap<TransactionId, InventoryTransaction>,
    transfer_requests: HashMap<TransferRequestId, TransferRequest>,
    staff: HashMap<UserId, StaffAssignment>,
}

impl Tables {
    fn merge(&mut self, staged: Tables) {
        self.products.extend(staged.products);
        self.warehouses.extend(staged.warehouses);
        self.suppliers.extend(staged.suppliers);
        self.transactions.extend(staged.transactions);
        self.transfer_requests.extend(staged.transfer_requests);
        self.staff.extend(staged.staff);
    }
}

fn lookup<K, V>(staged: &HashMap<K, V>, committed: &HashMap<K, V>, key: &K) -> Option<V>
where
    K: Eq + Hash,
    V: Clone,
{
    staged.get(key).or_else(|| committed.get(key)).cloned()
}

/// In-memory store with serializable transactions.
///
/// A transaction holds the store lock for its whole lifetime, so units of
/// work run one at a time and always validate against the latest committed
/// state. Writes are staged and merged on commit.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.products.contains_key(&product.id()) {
            return Err(StoreError::DuplicateKey(format!("product {}", product.id())));
        }
        tables.products.insert(product.id(), product);
        Ok(())
    }

    pub fn insert_warehouse(&self, warehouse: Warehouse) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.warehouses.contains_key(&warehouse.id()) {
            return Err(StoreError::DuplicateKey(format!("warehouse {}", warehouse.id())));
        }
        tables.warehouses.insert(warehouse.id(), warehouse);
        Ok(())
    }

    pub fn insert_supplier(&self, supplier: Supplier) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.suppliers.contains_key(&supplier.id) {
            return Err(StoreError::DuplicateKey(format!("supplier {}", supplier.id)));
        }
        tables.suppliers.insert(supplier.id, supplier);
        Ok(())
    }

    pub fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.tables()?.products.get(&id).cloned())
    }

    pub fn warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, StoreError> {
        Ok(self.tables()?.warehouses.get(&id).cloned())
    }

    pub fn ledger_entry(&self, id: TransactionId) -> Result<Option<InventoryTransaction>, StoreError> {
        Ok(self.tables()?.transactions.get(&id).cloned())
    }

    pub fn transfer_request(&self, id: TransferRequestId) -> Result<Option<TransferRequest>, StoreError> {
        Ok(self.tables()?.transfer_requests.get(&id).cloned())
    }

    pub fn staff_assignment(&self, staff_id: UserId) -> Result<Option<StaffAssignment>, StoreError> {
        Ok(self.tables()?.staff.get(&staff_id).cloned())
    }

    /// Every ledger entry, oldest first.
    pub fn ledger(&self) -> Result<Vec<InventoryTransaction>, StoreError> {
        let tables = self.tables()?;
        let mut entries: Vec<InventoryTransaction> = tables.transactions.values().cloned().collect();
        entries.sort_by_key(|e| (e.transaction_date, e.id));
        Ok(entries)
    }
}

impl InventoryStore for InMemoryInventoryStore {
    type Tx<'a> = InMemoryTransaction<'a>;

    fn begin(&self) -> Result<Self::Tx<'_>, StoreError> {
        Ok(InMemoryTransaction {
            committed: self.tables()?,
            staged: Tables::default(),
        })
    }
}

/// Transaction scope over [`InMemoryInventoryStore`].
pub struct InMemoryTransaction<'a> {
    committed: MutexGuard<'a, Tables>,
    staged: Tables,
}

impl core::fmt::Debug for InMemoryTransaction<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryTransaction")
            .field("staged_products", &self.staged.products.len())
            .field("staged_warehouses", &self.staged.warehouses.len())
            .field("staged_transactions", &self.staged.transactions.len())
            .field("staged_transfer_requests", &self.staged.transfer_requests.len())
            .finish()
    }
}

impl StoreTransaction for InMemoryTransaction<'_> {
    fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(lookup(&self.staged.products, &self.committed.products, &id))
    }

    fn put_product(&mut self, product: Product) -> Result<(), StoreError> {
        self.staged.products.insert(product.id(), product);
        Ok(())
    }

    fn warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, StoreError> {
        Ok(lookup(&self.staged.warehouses, &self.committed.warehouses, &id))
    }

    fn put_warehouse(&mut self, warehouse: Warehouse) -> Result<(), StoreError> {
        self.staged.warehouses.insert(warehouse.id(), warehouse);
        Ok(())
    }

    fn supplier(&self, id: SupplierId) -> Result<Option<Supplier>, StoreError> {
        Ok(lookup(&self.staged.suppliers, &self.committed.suppliers, &id))
    }

    fn transaction(&self, id: TransactionId) -> Result<Option<InventoryTransaction>, StoreError> {
        Ok(lookup(&self.staged.transactions, &self.committed.transactions, &id))
    }

    fn insert_transaction(&mut self, entry: InventoryTransaction) -> Result<(), StoreError> {
        if self.transaction(entry.id)?.is_some() {
            return Err(StoreError::DuplicateKey(format!("inventory transaction {}", entry.id)));
        }
        self.staged.transactions.insert(entry.id, entry);
        Ok(())
    }

    fn replace_transaction(&mut self, entry: InventoryTransaction) -> Result<(), StoreError> {
        if self.transaction(entry.id)?.is_none() {
            return Err(StoreError::MissingRecord(format!("inventory transaction {}", entry.id)));
        }
        self.staged.transactions.insert(entry.id, entry);
        Ok(())
    }

    fn transactions_since(&self, since: DateTime<Utc>) -> Result<Vec<InventoryTransaction>, StoreError> {
        let committed = self
            .committed
            .transactions
            .iter()
            .filter(|(id, _)| !self.staged.transactions.contains_key(id))
            .map(|(_, e)| e);
        let mut entries: Vec<InventoryTransaction> = committed
            .chain(self.staged.transactions.values())
            .filter(|e| e.transaction_date >= since)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.transaction_date, e.id));
        Ok(entries)
    }

    fn transfer_request(&self, id: TransferRequestId) -> Result<Option<TransferRequest>, StoreError> {
        Ok(lookup(&self.staged.transfer_requests, &self.committed.transfer_requests, &id))
    }

    fn insert_transfer_request(&mut self, request: TransferRequest) -> Result<(), StoreError> {
        if self.transfer_request(request.id())?.is_some() {
            return Err(StoreError::DuplicateKey(format!("transfer request {}", request.id())));
        }
        self.staged.transfer_requests.insert(request.id(), request);
        Ok(())
    }

    fn put_transfer_request(&mut self, request: TransferRequest) -> Result<(), StoreError> {
        self.staged.transfer_requests.insert(request.id(), request);
        Ok(())
    }

    fn staff_assignment(&self, staff_id: UserId) -> Result<Option<StaffAssignment>, StoreError> {
        Ok(lookup(&self.staged.staff, &self.committed.staff, &staff_id))
    }

    fn put_staff_assignment(&mut self, assignment: StaffAssignment) -> Result<(), StoreError> {
        self.staged.staff.insert(assignment.staff_id, assignment);
        Ok(())
    }

    fn commit(mut self) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut self.staged);
        self.committed.merge(staged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_inventory::WarehouseKind;

    fn test_product() -> Product {
        Product::new(ProductId::new(), "Widget", 5, 10).unwrap()
    }

    #[test]
    fn reads_see_own_writes_before_commit() {
        let store = InMemoryInventoryStore::new();
        let product = test_product();
        let id = product.id();

        let mut tx = store.begin().unwrap();
        tx.put_product(product).unwrap();
        assert!(tx.product(id).unwrap().is_some());
        tx.commit().unwrap();

        assert!(store.product(id).unwrap().is_some());
    }

    #[test]
    fn dropping_a_transaction_discards_staged_writes() {
        let store = InMemoryInventoryStore::new();
        let warehouse =
            Warehouse::new(WarehouseId::new(), "North", WarehouseKind::Regular, 100).unwrap();
        let id = warehouse.id();
        {
            let mut tx = store.begin().unwrap();
            tx.put_warehouse(warehouse).unwrap();
        }
        assert!(store.warehouse(id).unwrap().is_none());
    }

    #[test]
    fn ledger_keys_are_unique_and_replace_needs_existing() {
        use chrono::Utc;
        use depot_inventory::{TransactionKind, TransactionLine};

        let store = InMemoryInventoryStore::new();
        let entry = InventoryTransaction::new(
            TransactionId::new(),
            TransactionKind::Damaged {
                warehouse_id: WarehouseId::new(),
            },
            vec![TransactionLine::priced(ProductId::new(), 1, 5)],
            Utc::now(),
            UserId::new(),
        )
        .unwrap();

        let mut tx = store.begin().unwrap();
        assert!(matches!(
            tx.replace_transaction(entry.clone()),
            Err(StoreError::MissingRecord(_))
        ));
        tx.insert_transaction(entry.clone()).unwrap();
        assert!(matches!(
            tx.insert_transaction(entry.clone()),
            Err(StoreError::DuplicateKey(_))
        ));
        tx.commit().unwrap();

        assert_eq!(store.ledger().unwrap(), vec![entry]);
    }

    #[test]
    fn seeding_twice_is_rejected() {
        let store = InMemoryInventoryStore::new();
        let product = test_product();
        store.insert_product(product.clone()).unwrap();
        assert!(matches!(
            store.insert_product(product),
            Err(StoreError::DuplicateKey(_))
        ));
    }
}

//! Keeps `Warehouse.managed_by` and `StaffAssignment` in step.

use chrono::Utc;

use depot_auth::Actor;
use depot_core::{DomainError, UserId, WarehouseId};
use depot_inventory::StaffAssignment;

use crate::error::ServiceResult;
use crate::lookup;
use crate::store::{InventoryStore, StoreTransaction};

fn require_admin(actor: &Actor) -> ServiceResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(DomainError::unauthorized("only administrators manage staff assignments").into())
    }
}

#[derive(Debug)]
pub struct StaffingService<S> {
    store: S,
}

impl<S> StaffingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S> StaffingService<S>
where
    S: InventoryStore,
{
    /// Employ `staff_id` as a manager of `warehouse_id`. A staff member holds
    /// one active assignment; use [`StaffingService::reassign`] to move them.
    pub fn assign(&self, staff_id: UserId, warehouse_id: WarehouseId, actor: &Actor) -> ServiceResult<StaffAssignment> {
        require_admin(actor)?;
        let mut tx = self.store.begin()?;
        if let Some(existing) = tx.staff_assignment(staff_id)? {
            if existing.is_active() {
                return Err(DomainError::conflict(format!(
                    "staff {staff_id} is already assigned; reassign instead"
                ))
                .into());
            }
        }

        let mut warehouse = lookup::warehouse(&tx, warehouse_id)?;
        warehouse.assign_manager(staff_id);
        let assignment = StaffAssignment::new(staff_id, warehouse_id, Utc::now());

        tx.put_warehouse(warehouse)?;
        tx.put_staff_assignment(assignment.clone())?;
        tx.commit()?;

        tracing::info!(%staff_id, %warehouse_id, "staff assigned");
        Ok(assignment)
    }

    /// Move an active staff member to another warehouse.
    pub fn reassign(&self, staff_id: UserId, warehouse_id: WarehouseId, actor: &Actor) -> ServiceResult<StaffAssignment> {
        require_admin(actor)?;
        let mut tx = self.store.begin()?;
        let mut assignment = tx
            .staff_assignment(staff_id)?
            .ok_or_else(|| DomainError::not_found(format!("staff assignment {staff_id}")))?;
        let previous = assignment.warehouse_id;

        let mut target = lookup::warehouse(&tx, warehouse_id)?;
        assignment.reassign(warehouse_id)?;
        if let Some(previous) = previous.filter(|p| *p != warehouse_id) {
            let mut old = lookup::warehouse(&tx, previous)?;
            old.remove_manager(staff_id);
            tx.put_warehouse(old)?;
        }
        target.assign_manager(staff_id);

        tx.put_warehouse(target)?;
        tx.put_staff_assignment(assignment.clone())?;
        tx.commit()?;

        tracing::info!(%staff_id, from = ?previous, to = %warehouse_id, "staff reassigned");
        Ok(assignment)
    }

    /// Terminate employment and drop the warehouse membership.
    pub fn release(&self, staff_id: UserId, actor: &Actor) -> ServiceResult<StaffAssignment> {
        require_admin(actor)?;
        let mut tx = self.store.begin()?;
        let mut assignment = tx
            .staff_assignment(staff_id)?
            .ok_or_else(|| DomainError::not_found(format!("staff assignment {staff_id}")))?;

        if let Some(previous) = assignment.terminate(Utc::now())? {
            let mut warehouse = lookup::warehouse(&tx, previous)?;
            warehouse.remove_manager(staff_id);
            tx.put_warehouse(warehouse)?;
        }
        tx.put_staff_assignment(assignment.clone())?;
        tx.commit()?;

        tracing::info!(%staff_id, "staff released");
        Ok(assignment)
    }
}

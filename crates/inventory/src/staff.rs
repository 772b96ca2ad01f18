use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depot_core::{DomainError, DomainResult, UserId, WarehouseId};

/// Secondary index of `Warehouse.managed_by`: where a staff member works.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffAssignment {
    pub staff_id: UserId,
    pub warehouse_id: Option<WarehouseId>,
    pub employment_date: DateTime<Utc>,
    pub termination_date: Option<DateTime<Utc>>,
}

impl StaffAssignment {
    pub fn new(staff_id: UserId, warehouse_id: WarehouseId, employment_date: DateTime<Utc>) -> Self {
        Self {
            staff_id,
            warehouse_id: Some(warehouse_id),
            employment_date,
            termination_date: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.termination_date.is_none()
    }

    pub fn reassign(&mut self, warehouse_id: WarehouseId) -> DomainResult<()> {
        if !self.is_active() {
            return Err(DomainError::conflict(format!(
                "staff {} has been terminated",
                self.staff_id
            )));
        }
        self.warehouse_id = Some(warehouse_id);
        Ok(())
    }

    pub fn terminate(&mut self, at: DateTime<Utc>) -> DomainResult<Option<WarehouseId>> {
        if !self.is_active() {
            return Err(DomainError::conflict(format!(
                "staff {} is already terminated",
                self.staff_id
            )));
        }
        self.termination_date = Some(at);
        Ok(self.warehouse_id.take())
    }
}

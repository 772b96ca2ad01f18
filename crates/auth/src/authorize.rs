//! Warehouse membership gate.
//!
//! Every stock-affecting operation names at least one warehouse; the actor must
//! either be an administrator or appear in that warehouse's `managed_by` set.
//! The checks here are pure: callers pass records they loaded inside their own
//! transaction scope so the decision is made against the same data they write.

use std::collections::BTreeSet;

use thiserror::Error;

use depot_core::{DomainError, UserId, WarehouseId};

use crate::Actor;

/// Read-only view of who manages a warehouse.
pub trait WarehouseMembership {
    fn warehouse_id(&self) -> WarehouseId;

    fn managed_by(&self) -> &BTreeSet<UserId>;

    fn is_managed_by(&self, user_id: UserId) -> bool {
        self.managed_by().contains(&user_id)
    }

    fn has_manager(&self) -> bool {
        !self.managed_by().is_empty()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("user {user_id} does not manage warehouse {warehouse_id}")]
    NotManager {
        user_id: UserId,
        warehouse_id: WarehouseId,
    },

    #[error("user {user_id} is not a party to this request")]
    NotParty { user_id: UserId },
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::unauthorized(value.to_string())
    }
}

/// How an authorization check was satisfied (useful for audit logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    Admin,
    Manager,
    Party,
}

/// Authorize an actor to act on behalf of a warehouse.
///
/// - No IO
/// - No panics
/// - Admin is unconditional
pub fn authorize_manager<W>(actor: &Actor, warehouse: &W) -> Result<Grant, AuthzError>
where
    W: WarehouseMembership + ?Sized,
{
    if actor.is_admin() {
        return Ok(Grant::Admin);
    }
    if warehouse.is_managed_by(actor.user_id) {
        return Ok(Grant::Manager);
    }
    Err(AuthzError::NotManager {
        user_id: actor.user_id,
        warehouse_id: warehouse.warehouse_id(),
    })
}

/// Authorize an actor that must be one of the named parties (e.g. requester or approver).
pub fn authorize_party(actor: &Actor, parties: &[UserId]) -> Result<Grant, AuthzError> {
    if actor.is_admin() {
        return Ok(Grant::Admin);
    }
    if parties.contains(&actor.user_id) {
        return Ok(Grant::Party);
    }
    Err(AuthzError::NotParty {
        user_id: actor.user_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        id: WarehouseId,
        managers: BTreeSet<UserId>,
    }

    impl WarehouseMembership for Fixture {
        fn warehouse_id(&self) -> WarehouseId {
            self.id
        }

        fn managed_by(&self) -> &BTreeSet<UserId> {
            &self.managers
        }
    }

    fn fixture(managers: &[UserId]) -> Fixture {
        Fixture {
            id: WarehouseId::new(),
            managers: managers.iter().copied().collect(),
        }
    }

    #[test]
    fn manager_is_granted() {
        let staff = UserId::new();
        let w = fixture(&[staff]);
        assert_eq!(authorize_manager(&Actor::staff(staff), &w), Ok(Grant::Manager));
    }

    #[test]
    fn non_manager_is_denied() {
        let w = fixture(&[UserId::new()]);
        let outsider = UserId::new();
        let err = authorize_manager(&Actor::staff(outsider), &w).unwrap_err();
        assert_eq!(
            err,
            AuthzError::NotManager {
                user_id: outsider,
                warehouse_id: w.id
            }
        );
    }

    #[test]
    fn admin_bypasses_membership() {
        let w = fixture(&[]);
        assert_eq!(authorize_manager(&Actor::admin(UserId::new()), &w), Ok(Grant::Admin));
    }

    #[test]
    fn party_check() {
        let requester = UserId::new();
        let approver = UserId::new();
        let parties = [requester, approver];

        assert_eq!(authorize_party(&Actor::staff(approver), &parties), Ok(Grant::Party));
        assert!(authorize_party(&Actor::staff(UserId::new()), &parties).is_err());
    }

    #[test]
    fn authz_error_maps_to_unauthorized_domain_error() {
        let err: DomainError = AuthzError::NotParty { user_id: UserId::new() }.into();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[test]
    fn role_comparison_is_case_insensitive_for_admin() {
        let actor: Actor = serde_json::from_str(&format!(
            r#"{{"userId":"{}","role":"Admin"}}"#,
            UserId::new()
        ))
        .unwrap();
        assert!(actor.is_admin());
    }
}

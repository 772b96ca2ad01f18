use serde::{Deserialize, Serialize};

use depot_core::UserId;

use crate::Role;

/// Authenticated caller of a core operation (identity + role).
///
/// Produced by the authentication collaborator; the core never constructs
/// identities on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::admin())
    }

    pub fn staff(user_id: UserId) -> Self {
        Self::new(user_id, Role::staff())
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

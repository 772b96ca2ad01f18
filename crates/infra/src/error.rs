//! Structured error surfaced by every operation.

use serde::Serialize;
use thiserror::Error;

use depot_auth::AuthzError;
use depot_core::DomainError;

use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthzError> for ServiceError {
    fn from(value: AuthzError) -> Self {
        ServiceError::Domain(value.into())
    }
}

/// Stable, machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Authorization,
    InsufficientStock,
    CapacityExceeded,
    Conflict,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Authorization => "authorization",
            ErrorKind::InsufficientStock => "insufficient_stock",
            ErrorKind::CapacityExceeded => "capacity_exceeded",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Storage => "storage",
        }
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Domain(e) => match e {
                DomainError::Validation(_) | DomainError::InvalidId(_) => ErrorKind::Validation,
                DomainError::NotFound(_) => ErrorKind::NotFound,
                DomainError::Unauthorized(_) => ErrorKind::Authorization,
                DomainError::InsufficientStock(_) => ErrorKind::InsufficientStock,
                DomainError::CapacityExceeded(_) => ErrorKind::CapacityExceeded,
                DomainError::Conflict(_) | DomainError::InvariantViolation(_) => ErrorKind::Conflict,
            },
            ServiceError::Store(_) => ErrorKind::Storage,
        }
    }

    /// Human-readable message. Storage details stay in the logs.
    pub fn message(&self) -> String {
        match self {
            ServiceError::Domain(e) => e.to_string(),
            ServiceError::Store(_) => "storage failure; no changes were applied".to_string(),
        }
    }

    /// `{ "error": kind, "message": message }` for boundary layers.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.kind(),
            "message": self.message(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::{UserId, WarehouseId};

    #[test]
    fn kinds_follow_the_taxonomy() {
        let insufficient: ServiceError = DomainError::insufficient_stock("only 10 left").into();
        assert_eq!(insufficient.kind(), ErrorKind::InsufficientStock);

        let denied: ServiceError = AuthzError::NotManager {
            user_id: UserId::new(),
            warehouse_id: WarehouseId::new(),
        }
        .into();
        assert_eq!(denied.kind(), ErrorKind::Authorization);

        let storage: ServiceError = StoreError::CommitFailed("disk full".into()).into();
        assert_eq!(storage.kind(), ErrorKind::Storage);
        assert!(!storage.message().contains("disk full"));
    }

    #[test]
    fn json_shape_is_kind_and_message() {
        let err: ServiceError = DomainError::conflict("transfer request is not Pending").into();
        let json = err.to_json();
        assert_eq!(json["error"], "conflict");
        assert_eq!(json["message"], "conflict: transfer request is not Pending");
    }
}

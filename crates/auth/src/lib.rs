//! `depot-auth`: warehouse membership / authorization gate.
//!
//! Identity comes from the authentication collaborator as an [`Actor`]; the
//! gate decides whether that actor may act on a given warehouse or request.

pub mod actor;
pub mod authorize;
pub mod roles;

pub use actor::Actor;
pub use authorize::{AuthzError, Grant, WarehouseMembership, authorize_manager, authorize_party};
pub use roles::Role;

//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    principal::{AuthenticatedPrincipal, NewPrincipal, Principal, PrincipalCredentials},
    role::Role,
};
pub use repository::{PrincipalRepository, RoleRepository};

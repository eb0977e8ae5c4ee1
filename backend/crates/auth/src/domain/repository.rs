//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//!
//! Every method takes `&mut self`: implementors are transaction handles
//! handed out by a `kernel::uow::TransactionManager`, so a use case can only
//! reach the store through the unit of work it opened.

use kernel::id::PrincipalId;

use crate::domain::entity::{
    principal::{NewPrincipal, Principal, PrincipalCredentials},
    role::Role,
};
use crate::domain::value_object::{email::Email, role_name::RoleName};
use crate::error::AuthResult;

/// Principal (user account) repository trait
#[trait_variant::make(PrincipalRepository: Send)]
pub trait LocalPrincipalRepository {
    /// Check whether an active principal uses this email
    async fn exists_by_email(&mut self, email: &Email) -> AuthResult<bool>;

    /// Find an active principal by ID
    async fn find_by_id(&mut self, id: PrincipalId) -> AuthResult<Option<Principal>>;

    /// Load the stored password hash for sign-in
    async fn find_credentials_by_email(
        &mut self,
        email: &Email,
    ) -> AuthResult<Option<PrincipalCredentials>>;

    /// Insert a new principal with the given role
    ///
    /// A duplicate email or username fails with `AuthError::AlreadyExists`.
    async fn insert(&mut self, new: NewPrincipal, role: &Role) -> AuthResult<Principal>;
}

/// Role repository trait
#[trait_variant::make(RoleRepository: Send)]
pub trait LocalRoleRepository {
    /// Return the role with this name, creating it if absent
    async fn get_or_create(&mut self, name: &RoleName) -> AuthResult<Role>;

    /// Create a role; fails with `AuthError::AlreadyExists` if the name is taken
    async fn create(&mut self, name: &RoleName) -> AuthResult<Role>;

    /// Role of an active principal
    async fn find_by_principal(&mut self, id: PrincipalId) -> AuthResult<Option<Role>>;
}

//! Privilege Checks
//!
//! Admin status is always read from the store inside the caller's
//! transaction. Nothing the client sends (headers, token claims) is trusted
//! for authorization.

use kernel::id::PrincipalId;
use platform::crypto::constant_time_eq;

use crate::application::config::AuthConfig;
use crate::domain::entity::role::Role;
use crate::domain::repository::RoleRepository;
use crate::error::{AuthError, AuthResult};

pub const ADMIN_REQUIRED_MESSAGE: &str = "Admin privileges required";

/// Require that `principal` currently holds the admin role
pub async fn require_admin<T>(tx: &mut T, principal: PrincipalId) -> AuthResult<Role>
where
    T: RoleRepository + Send,
{
    match tx.find_by_principal(principal).await? {
        Some(role) if role.is_admin() => Ok(role),
        Some(_) => {
            tracing::warn!(principal_id = %principal, "Admin check failed");
            Err(AuthError::Forbidden(ADMIN_REQUIRED_MESSAGE.to_string()))
        }
        None => Err(AuthError::Unauthorized(
            crate::application::token::INVALID_TOKEN_MESSAGE.to_string(),
        )),
    }
}

/// Compare a submitted enrollment code against the configured one
pub fn verify_enrollment_code(config: &AuthConfig, submitted: Option<&str>) -> AuthResult<()> {
    let submitted = submitted.unwrap_or_default();
    let expected = config.admin_enrollment_code.as_bytes();

    if expected.is_empty() || !constant_time_eq(submitted.as_bytes(), expected) {
        tracing::warn!("Admin sign-up rejected: invalid enrollment code");
        return Err(AuthError::Forbidden("Invalid enrollment code".to_string()));
    }

    Ok(())
}

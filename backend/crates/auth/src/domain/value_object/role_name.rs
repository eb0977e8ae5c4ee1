//! Role Name Value Object
//!
//! Roles are rows in the `roles` table, created lazily on first use.
//! Two names are built in: `user` (default for sign-up) and `admin`.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ROLE_NAME_MAX_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleName(String);

impl RoleName {
    pub const USER: &'static str = "user";
    pub const ADMIN: &'static str = "admin";

    /// Validate a role name: lower-case ASCII letters, digits and `_`
    pub fn new(raw: impl Into<String>) -> AppResult<Self> {
        let name = raw.into().trim().to_ascii_lowercase();

        if name.is_empty() || name.len() > ROLE_NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Role name must be between 1 and {} characters",
                ROLE_NAME_MAX_LENGTH
            )));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(AppError::bad_request("Role name contains invalid characters")
                .with_action("Use lower-case letters, digits or '_'"));
        }

        Ok(Self(name))
    }

    #[inline]
    pub fn user() -> Self {
        Self(Self::USER.to_string())
    }

    #[inline]
    pub fn admin() -> Self {
        Self(Self::ADMIN.to_string())
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_roles() {
        assert!(RoleName::admin().is_admin());
        assert!(!RoleName::user().is_admin());
        assert_eq!(RoleName::new("ADMIN").unwrap(), RoleName::admin());
    }

    #[test]
    fn test_role_name_validation() {
        assert!(RoleName::new("moderator").is_ok());
        assert!(RoleName::new("support_2").is_ok());
        assert!(RoleName::new("").is_err());
        assert!(RoleName::new("super-admin").is_err());
        assert!(RoleName::new("a".repeat(ROLE_NAME_MAX_LENGTH + 1)).is_err());
    }
}

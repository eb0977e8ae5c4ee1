//! Principal Entity
//!
//! A registered account. The password hash lives in [`PrincipalCredentials`]
//! and is only loaded by the sign-in path.

use chrono::{DateTime, Utc};
use kernel::id::PrincipalId;

use crate::domain::entity::role::Role;
use crate::domain::value_object::{email::Email, user_name::UserName, user_password::UserPassword};

/// Principal projection (never carries the password hash)
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: PrincipalId,
    pub username: UserName,
    pub email: Email,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Values needed to insert a new principal
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub username: UserName,
    pub email: Email,
    pub password_hash: UserPassword,
}

/// Stored credentials, looked up by email during sign-in
#[derive(Debug, Clone)]
pub struct PrincipalCredentials {
    pub id: PrincipalId,
    pub password_hash: UserPassword,
}

/// Identity established by the session gate from a verified access token
///
/// Placed in request extensions; handlers receive it through the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    pub id: PrincipalId,
}

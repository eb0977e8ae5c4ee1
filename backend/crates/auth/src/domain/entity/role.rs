//! Role Entity

use chrono::{DateTime, Utc};
use kernel::id::RoleId;

use crate::domain::value_object::role_name::RoleName;

/// A named role a principal belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        self.name.is_admin()
    }
}

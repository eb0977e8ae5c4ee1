//! In-Memory Store
//!
//! A `TransactionManager` over process memory with the same observable
//! behavior as the PostgreSQL store:
//!
//! - a transaction reads a snapshot taken at `begin` plus its own writes
//! - writes become visible to others only on `commit`
//! - uniqueness (active email, active username, role name) is checked on
//!   insert and again on commit
//! - IDs come from shared counters, so rolled-back IDs are never reused
//!
//! The lock is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use kernel::error::app_error::{AppError, AppResult};
use kernel::id::{PrincipalId, RoleId};
use kernel::uow::{Transaction, TransactionManager};

use crate::domain::entity::{
    principal::{NewPrincipal, Principal, PrincipalCredentials},
    role::Role,
};
use crate::domain::repository::{PrincipalRepository, RoleRepository};
use crate::domain::value_object::{
    email::Email, role_name::RoleName, user_name::UserName, user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone)]
struct StoredPrincipal {
    id: PrincipalId,
    username: UserName,
    email: Email,
    password_hash: UserPassword,
    role_id: RoleId,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredPrincipal {
    fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    principals: Vec<StoredPrincipal>,
    roles: Vec<Role>,
    next_principal_id: i64,
    next_role_id: i64,
}

impl MemoryState {
    fn active_principal(&self, id: PrincipalId) -> Option<&StoredPrincipal> {
        self.principals.iter().find(|p| p.id == id && p.is_active())
    }

    fn role(&self, id: RoleId) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    fn role_by_name(&self, name: &RoleName) -> Option<&Role> {
        self.roles.iter().find(|r| &r.name == name)
    }

    fn conflict_for(&self, candidate: &StoredPrincipal) -> Option<&'static str> {
        self.principals
            .iter()
            .filter(|p| p.is_active() && p.id != candidate.id)
            .find_map(|p| {
                if p.email == candidate.email {
                    Some("Email already registered")
                } else if p.username == candidate.username {
                    Some("Username already taken")
                } else {
                    None
                }
            })
    }

    fn project(&self, stored: &StoredPrincipal) -> AuthResult<Principal> {
        let role = self
            .role(stored.role_id)
            .cloned()
            .ok_or_else(|| AuthError::Internal(format!("Role {} missing", stored.role_id)))?;

        Ok(Principal {
            id: stored.id,
            username: stored.username.clone(),
            email: stored.email.clone(),
            role,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }
}

fn lock(state: &Mutex<MemoryState>) -> AppResult<MutexGuard<'_, MemoryState>> {
    state
        .lock()
        .map_err(|_| AppError::internal("In-memory store lock poisoned"))
}

/// Process-local auth store
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed, active principals
    pub fn principal_count(&self) -> usize {
        lock(&self.state)
            .map(|s| s.principals.iter().filter(|p| p.is_active()).count())
            .unwrap_or_default()
    }

    /// Number of committed roles
    pub fn role_count(&self) -> usize {
        lock(&self.state).map(|s| s.roles.len()).unwrap_or_default()
    }

    /// Committed role names, in creation order
    pub fn role_names(&self) -> Vec<String> {
        lock(&self.state)
            .map(|s| s.roles.iter().map(|r| r.name.to_string()).collect())
            .unwrap_or_default()
    }

    /// Soft-delete a committed principal; returns whether it was active
    pub fn soft_delete(&self, id: PrincipalId) -> AppResult<bool> {
        let mut state = lock(&self.state)?;
        let now = Utc::now();

        match state
            .principals
            .iter_mut()
            .find(|p| p.id == id && p.is_active())
        {
            Some(principal) => {
                principal.deleted_at = Some(now);
                principal.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Move a committed principal to another (existing) role
    pub fn assign_role(&self, id: PrincipalId, name: &RoleName) -> AppResult<()> {
        let mut state = lock(&self.state)?;
        let role_id = state
            .role_by_name(name)
            .map(|r| r.id)
            .ok_or_else(|| AppError::not_found(format!("Role {} not found", name)))?;

        let principal = state
            .principals
            .iter_mut()
            .find(|p| p.id == id && p.is_active())
            .ok_or_else(|| AppError::not_found("Principal not found"))?;

        principal.role_id = role_id;
        principal.updated_at = Utc::now();
        Ok(())
    }

    fn next_principal_id(&self) -> AppResult<PrincipalId> {
        let mut state = lock(&self.state)?;
        state.next_principal_id += 1;
        Ok(PrincipalId::new(state.next_principal_id))
    }

    fn next_role_id(&self) -> AppResult<RoleId> {
        let mut state = lock(&self.state)?;
        state.next_role_id += 1;
        Ok(RoleId::new(state.next_role_id))
    }
}

impl TransactionManager for InMemoryAuthStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> AppResult<InMemoryTransaction> {
        let snapshot = lock(&self.state)?.clone();

        Ok(InMemoryTransaction {
            store: self.clone(),
            working: snapshot,
            staged_principals: Vec::new(),
            staged_roles: Vec::new(),
        })
    }
}

/// How a role came to be staged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoleOrigin {
    /// `get_or_create`: an existing row of the same name satisfies it
    Provisioned,
    /// `create`: the name must still be free at commit
    Created,
}

/// Open in-memory transaction
pub struct InMemoryTransaction {
    store: InMemoryAuthStore,
    working: MemoryState,
    staged_principals: Vec<StoredPrincipal>,
    staged_roles: Vec<(Role, RoleOrigin)>,
}

impl InMemoryTransaction {
    fn stage_role(&mut self, name: &RoleName, origin: RoleOrigin) -> AuthResult<Role> {
        let now = Utc::now();
        let role = Role {
            id: self.store.next_role_id()?,
            name: name.clone(),
            created_at: now,
            updated_at: now,
        };

        self.working.roles.push(role.clone());
        self.staged_roles.push((role.clone(), origin));
        Ok(role)
    }
}

impl Transaction for InMemoryTransaction {
    async fn commit(self) -> AppResult<()> {
        let mut state = lock(&self.store.state)?;

        // A provisioned role committed concurrently under the same name is
        // reused; an explicitly created one conflicts.
        let mut remapped = Vec::new();
        let mut new_roles = Vec::new();
        for (role, origin) in self.staged_roles {
            match (state.role_by_name(&role.name), origin) {
                (Some(existing), RoleOrigin::Provisioned) => remapped.push((role.id, existing.id)),
                (Some(_), RoleOrigin::Created) => {
                    return Err(AppError::conflict("Role already exists"));
                }
                (None, _) => new_roles.push(role),
            }
        }

        let mut principals = self.staged_principals;
        for principal in &mut principals {
            let remap = remapped
                .iter()
                .find(|(staged, _)| *staged == principal.role_id);
            if let Some((_, existing)) = remap {
                principal.role_id = *existing;
            }
            if let Some(message) = state.conflict_for(principal) {
                return Err(AppError::conflict(message));
            }
        }

        state.roles.extend(new_roles);
        state.principals.extend(principals);
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        Ok(())
    }
}

impl PrincipalRepository for InMemoryTransaction {
    async fn exists_by_email(&mut self, email: &Email) -> AuthResult<bool> {
        Ok(self
            .working
            .principals
            .iter()
            .any(|p| p.is_active() && &p.email == email))
    }

    async fn find_by_id(&mut self, id: PrincipalId) -> AuthResult<Option<Principal>> {
        self.working
            .active_principal(id)
            .map(|p| self.working.project(p))
            .transpose()
    }

    async fn find_credentials_by_email(
        &mut self,
        email: &Email,
    ) -> AuthResult<Option<PrincipalCredentials>> {
        Ok(self
            .working
            .principals
            .iter()
            .find(|p| p.is_active() && &p.email == email)
            .map(|p| PrincipalCredentials {
                id: p.id,
                password_hash: p.password_hash.clone(),
            }))
    }

    async fn insert(&mut self, new: NewPrincipal, role: &Role) -> AuthResult<Principal> {
        let now = Utc::now();
        let stored = StoredPrincipal {
            id: self.store.next_principal_id()?,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role_id: role.id,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        if let Some(message) = self.working.conflict_for(&stored) {
            return Err(AuthError::AlreadyExists(message.to_string()));
        }

        let principal = Principal {
            id: stored.id,
            username: stored.username.clone(),
            email: stored.email.clone(),
            role: role.clone(),
            created_at: now,
            updated_at: now,
        };

        self.working.principals.push(stored.clone());
        self.staged_principals.push(stored);
        Ok(principal)
    }
}

impl RoleRepository for InMemoryTransaction {
    async fn get_or_create(&mut self, name: &RoleName) -> AuthResult<Role> {
        match self.working.role_by_name(name) {
            Some(role) => Ok(role.clone()),
            None => self.stage_role(name, RoleOrigin::Provisioned),
        }
    }

    async fn create(&mut self, name: &RoleName) -> AuthResult<Role> {
        if self.working.role_by_name(name).is_some() {
            return Err(AuthError::AlreadyExists("Role already exists".to_string()));
        }
        self.stage_role(name, RoleOrigin::Created)
    }

    async fn find_by_principal(&mut self, id: PrincipalId) -> AuthResult<Option<Role>> {
        Ok(self
            .working
            .active_principal(id)
            .and_then(|p| self.working.role(p.role_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;
    use kernel::error::kind::ErrorKind;

    fn new_principal(username: &str, email: &str) -> NewPrincipal {
        let raw = RawPassword::for_verification("Passw0rd!".to_string());
        NewPrincipal {
            username: UserName::new(username).unwrap(),
            email: Email::new(email).unwrap(),
            password_hash: UserPassword::from_raw(&raw, None).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_writes_invisible_until_commit() {
        let store = InMemoryAuthStore::new();
        let mut tx = store.begin().await.unwrap();

        let role = tx.get_or_create(&RoleName::user()).await.unwrap();
        let principal = tx.insert(new_principal("u1", "u1@x.com"), &role).await.unwrap();

        assert!(tx.find_by_id(principal.id).await.unwrap().is_some());
        assert_eq!(store.principal_count(), 0);

        tx.commit().await.unwrap();
        assert_eq!(store.principal_count(), 1);
        assert_eq!(store.role_names(), vec!["user".to_string()]);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = InMemoryAuthStore::new();
        let mut tx = store.begin().await.unwrap();

        let role = tx.get_or_create(&RoleName::user()).await.unwrap();
        tx.insert(new_principal("u1", "u1@x.com"), &role).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.principal_count(), 0);
        assert_eq!(store.role_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_email_fails_on_commit() {
        let store = InMemoryAuthStore::new();
        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();

        let role = first.get_or_create(&RoleName::user()).await.unwrap();
        first.insert(new_principal("a1", "dup@x.com"), &role).await.unwrap();

        let role = second.get_or_create(&RoleName::user()).await.unwrap();
        second.insert(new_principal("b1", "dup@x.com"), &role).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(store.principal_count(), 1);
        assert_eq!(store.role_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_role_creation_reuses_committed_row() {
        let store = InMemoryAuthStore::new();
        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();

        first.get_or_create(&RoleName::admin()).await.unwrap();
        let role = second.get_or_create(&RoleName::admin()).await.unwrap();
        let principal = second
            .insert(new_principal("root", "root@x.com"), &role)
            .await
            .unwrap();

        first.commit().await.unwrap();
        second.commit().await.unwrap();

        assert_eq!(store.role_count(), 1);

        let mut tx = store.begin().await.unwrap();
        let role = tx.find_by_principal(principal.id).await.unwrap().unwrap();
        assert!(role.is_admin());
    }

    #[tokio::test]
    async fn test_concurrent_explicit_role_creation_conflicts() {
        let store = InMemoryAuthStore::new();
        let name = RoleName::new("moderator").unwrap();
        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();

        let created = first.create(&name).await.unwrap();
        second.create(&name).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.message(), "Role already exists");
        assert_eq!(store.role_names(), vec!["moderator".to_string()]);

        // The committed row is the one the first caller was told about
        let mut tx = store.begin().await.unwrap();
        let provisioned = tx.get_or_create(&name).await.unwrap();
        assert_eq!(provisioned.id, created.id);
    }

    #[tokio::test]
    async fn test_soft_deleted_principal_is_hidden() {
        let store = InMemoryAuthStore::new();
        let mut tx = store.begin().await.unwrap();
        let role = tx.get_or_create(&RoleName::user()).await.unwrap();
        let principal = tx.insert(new_principal("u1", "u1@x.com"), &role).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.soft_delete(principal.id).unwrap());

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_by_id(principal.id).await.unwrap().is_none());
        assert!(!tx.exists_by_email(&principal.email).await.unwrap());

        // Email is free again after soft delete
        tx.insert(new_principal("u2", "u1@x.com"), &role).await.unwrap();
    }
}

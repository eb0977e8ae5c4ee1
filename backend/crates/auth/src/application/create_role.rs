//! Create Role Use Case
//!
//! Admin-only. The caller's role is re-read inside the same transaction
//! that inserts the new role.

use std::sync::Arc;

use kernel::uow::{TransactionManager, with_transaction};

use crate::application::config::AuthConfig;
use crate::application::privilege::require_admin;
use crate::domain::entity::{principal::AuthenticatedPrincipal, role::Role};
use crate::domain::repository::{PrincipalRepository, RoleRepository};
use crate::domain::value_object::role_name::RoleName;
use crate::error::{AuthError, AuthResult};

pub struct CreateRoleUseCase<S>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> CreateRoleUseCase<S>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, caller: AuthenticatedPrincipal, name: String) -> AuthResult<Role> {
        let name = RoleName::new(name)?;

        let deadline = Some(self.config.request_timeout);

        let role = with_transaction(&*self.store, deadline, move |tx| {
            Box::pin(async move {
                require_admin(&mut *tx, caller.id).await?;
                Ok::<_, AuthError>(tx.create(&name).await?)
            })
        })
        .await?;

        tracing::info!(
            principal_id = %caller.id,
            role_id = %role.id,
            role = %role.name,
            "Role created"
        );

        Ok(role)
    }
}

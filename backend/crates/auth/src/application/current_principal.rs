//! Current Principal Use Case
//!
//! Loads the profile of the caller identified by the session gate.

use std::sync::Arc;

use kernel::uow::{TransactionManager, with_transaction};

use crate::application::config::AuthConfig;
use crate::domain::entity::principal::{AuthenticatedPrincipal, Principal};
use crate::domain::repository::{PrincipalRepository, RoleRepository};
use crate::error::{AuthError, AuthResult};

pub struct CurrentPrincipalUseCase<S>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> CurrentPrincipalUseCase<S>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, caller: AuthenticatedPrincipal) -> AuthResult<Principal> {
        let deadline = Some(self.config.request_timeout);

        with_transaction(&*self.store, deadline, move |tx| {
            Box::pin(async move {
                tx.find_by_id(caller.id)
                    .await?
                    .ok_or_else(|| AuthError::NotFound("Principal not found".to_string()))
            })
        })
        .await
    }
}

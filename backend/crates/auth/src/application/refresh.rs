//! Refresh Use Case
//!
//! Exchanges a valid refresh token for a new access token. The refresh
//! token itself is not rotated.

use std::sync::Arc;

use kernel::uow::{TransactionManager, with_transaction};

use crate::application::config::AuthConfig;
use crate::application::token::{INVALID_TOKEN_MESSAGE, TokenService};
use crate::domain::repository::{PrincipalRepository, RoleRepository};
use crate::error::{AuthError, AuthResult};

pub const REFRESH_TOKEN_REQUIRED_MESSAGE: &str = "refresh token required";

/// Refresh use case
pub struct RefreshUseCase<S>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    store: Arc<S>,
    tokens: Arc<TokenService>,
    config: Arc<AuthConfig>,
}

impl<S> RefreshUseCase<S>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    pub fn new(store: Arc<S>, tokens: Arc<TokenService>, config: Arc<AuthConfig>) -> Self {
        Self {
            store,
            tokens,
            config,
        }
    }

    /// Returns a fresh access token
    pub async fn execute(&self, refresh_token: Option<&str>) -> AuthResult<String> {
        let token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::Unauthorized(REFRESH_TOKEN_REQUIRED_MESSAGE.to_string()))?;

        let claims = self.tokens.verify_refresh(token)?;
        let principal_id = claims.principal_id()?;
        let tokens = Arc::clone(&self.tokens);
        let deadline = Some(self.config.request_timeout);

        let access_token = with_transaction(&*self.store, deadline, move |tx| {
            Box::pin(async move {
                // Deleted principals keep valid-looking refresh tokens
                if tx.find_by_id(principal_id).await?.is_none() {
                    return Err(AuthError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string()));
                }

                Ok::<_, AuthError>(tokens.issue_access(principal_id)?)
            })
        })
        .await?;

        tracing::info!(principal_id = %principal_id, "Access token refreshed");

        Ok(access_token)
    }
}

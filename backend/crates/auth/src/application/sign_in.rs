//! Sign In Use Case
//!
//! Authenticates a principal by email and password and issues a token pair.
//! Unknown email and wrong password produce the same error.

use std::sync::Arc;

use kernel::uow::{TransactionManager, with_transaction};

use crate::application::config::AuthConfig;
use crate::application::privilege::ADMIN_REQUIRED_MESSAGE;
use crate::application::sign_up::AccountKind;
use crate::application::token::{TokenPair, TokenService};
use crate::domain::entity::principal::Principal;
use crate::domain::repository::{PrincipalRepository, RoleRepository};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in output
pub struct SignInOutput {
    pub principal: Principal,
    pub tokens: TokenPair,
}

/// Sign in use case
pub struct SignInUseCase<S>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    store: Arc<S>,
    tokens: Arc<TokenService>,
    config: Arc<AuthConfig>,
}

impl<S> SignInUseCase<S>
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

    pub async fn execute(&self, kind: AccountKind, input: SignInInput) -> AuthResult<SignInOutput> {
        // A malformed email cannot match any account
        let email = Email::new(input.email).map_err(|_| AuthError::InvalidCredentials)?;
        let password = RawPassword::for_verification(input.password);
        let pepper = self.config.password_pepper.clone();
        let tokens = Arc::clone(&self.tokens);
        let deadline = Some(self.config.request_timeout);

        let (principal, pair) = with_transaction(&*self.store, deadline, move |tx| {
            Box::pin(async move {
                let credentials = tx
                    .find_credentials_by_email(&email)
                    .await?
                    .ok_or(AuthError::InvalidCredentials)?;

                if !credentials
                    .password_hash
                    .verify(&password, pepper.as_deref())
                {
                    return Err(AuthError::InvalidCredentials);
                }

                let principal = tx.find_by_id(credentials.id).await?.ok_or_else(|| {
                    AuthError::Internal("Principal disappeared during sign-in".to_string())
                })?;

                if kind == AccountKind::Admin && !principal.is_admin() {
                    tracing::warn!(principal_id = %principal.id, "Admin sign-in by non-admin");
                    return Err(AuthError::Forbidden(ADMIN_REQUIRED_MESSAGE.to_string()));
                }

                let pair = tokens.issue_pair(principal.id)?;

                Ok::<_, AuthError>((principal, pair))
            })
        })
        .await?;

        tracing::info!(
            principal_id = %principal.id,
            role = %principal.role.name,
            "Principal signed in"
        );

        Ok(SignInOutput {
            principal,
            tokens: pair,
        })
    }
}

//! Sign Up Use Case
//!
//! Creates a new principal and issues its first token pair. Regular and
//! admin sign-up share the flow; admin sign-up additionally checks the
//! enrollment code before anything touches the store.

use std::sync::Arc;

use kernel::uow::{TransactionManager, with_transaction};

use crate::application::config::AuthConfig;
use crate::application::privilege::verify_enrollment_code;
use crate::application::token::{TokenPair, TokenService};
use crate::domain::entity::principal::{NewPrincipal, Principal};
use crate::domain::repository::{PrincipalRepository, RoleRepository};
use crate::domain::value_object::{
    email::Email,
    role_name::RoleName,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Which kind of account a sign-up or sign-in targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    User,
    Admin,
}

impl AccountKind {
    /// Role assigned on sign-up
    pub fn role_name(&self) -> RoleName {
        match self {
            AccountKind::User => RoleName::user(),
            AccountKind::Admin => RoleName::admin(),
        }
    }
}

/// Sign up input
pub struct SignUpInput {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Must equal `password` when present
    pub confirm_password: Option<String>,
    /// Required for admin sign-up
    pub enrollment_code: Option<String>,
}

/// Sign up output
pub struct SignUpOutput {
    pub principal: Principal,
    pub tokens: TokenPair,
}

/// Sign up use case
pub struct SignUpUseCase<S>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    store: Arc<S>,
    tokens: Arc<TokenService>,
    config: Arc<AuthConfig>,
}

impl<S> SignUpUseCase<S>
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

    pub async fn execute(&self, kind: AccountKind, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let username = UserName::new(input.username)?;
        let email = Email::new(input.email)?;

        if input
            .confirm_password
            .as_deref()
            .is_some_and(|confirm| confirm != input.password)
        {
            return Err(AuthError::Validation("Passwords do not match".to_string()));
        }

        let raw_password = RawPassword::new(input.password)?;

        if kind == AccountKind::Admin {
            verify_enrollment_code(&self.config, input.enrollment_code.as_deref())?;
        }

        let new_principal = NewPrincipal {
            username,
            email,
            password_hash: UserPassword::from_raw(&raw_password, self.config.pepper())?,
        };
        let role_name = kind.role_name();
        let tokens = Arc::clone(&self.tokens);
        let deadline = Some(self.config.request_timeout);

        let (principal, pair) = with_transaction(&*self.store, deadline, move |tx| {
            Box::pin(async move {
                if tx.exists_by_email(&new_principal.email).await? {
                    return Err(AuthError::AlreadyExists("Email already registered".to_string()));
                }

                let role = tx.get_or_create(&role_name).await?;
                let principal = tx.insert(new_principal, &role).await?;
                let pair = tokens.issue_pair(principal.id)?;

                Ok::<_, AuthError>((principal, pair))
            })
        })
        .await?;

        tracing::info!(
            principal_id = %principal.id,
            username = %principal.username,
            role = %principal.role.name,
            "Principal signed up"
        );

        Ok(SignUpOutput {
            principal,
            tokens: pair,
        })
    }
}

//! HTTP Handlers

use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use std::sync::Arc;

use kernel::response::ApiResponse;
use kernel::uow::TransactionManager;
use platform::cookie::extract_cookie;

use crate::application::config::AuthConfig;
use crate::application::token::TokenService;
use crate::application::{
    AccountKind, CreateRoleUseCase, CurrentPrincipalUseCase, RefreshUseCase, SignInInput,
    SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase,
};
use crate::domain::entity::principal::AuthenticatedPrincipal;
use crate::domain::repository::{PrincipalRepository, RoleRepository};
use crate::error::AuthResult;
use crate::presentation::dto::{
    AccessTokenResponse, AdminSignUpRequest, CreateRoleRequest, HealthResponse, JsonBody,
    MessageResponse, PrincipalView, RoleView, SessionResponse, SignInRequest, SignUpRequest,
};

/// Shared state for auth handlers
pub struct AuthAppState<S>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    pub store: Arc<S>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<AuthConfig>,
}

impl<S> Clone for AuthAppState<S>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tokens: Arc::clone(&self.tokens),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> AuthAppState<S>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    fn refresh_cookie_value(&self, headers: &HeaderMap) -> Option<String> {
        extract_cookie(headers, &self.config.refresh_cookie_name)
    }

    fn set_refresh_cookie(&self, refresh_token: &str) -> String {
        self.config.refresh_cookie().build_set_cookie(refresh_token)
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signup
pub async fn sign_up<S>(
    State(state): State<AuthAppState<S>>,
    JsonBody(req): JsonBody<SignUpRequest>,
) -> AuthResult<impl IntoResponse>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    let input = SignUpInput {
        username: req.username,
        email: req.email,
        password: req.password,
        confirm_password: req.confirm_password,
        enrollment_code: None,
    };

    sign_up_as(state, AccountKind::User, input).await
}

/// POST /api/auth/admin/signup
pub async fn admin_sign_up<S>(
    State(state): State<AuthAppState<S>>,
    JsonBody(req): JsonBody<AdminSignUpRequest>,
) -> AuthResult<impl IntoResponse>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    let input = SignUpInput {
        username: req.username,
        email: req.email,
        password: req.password,
        confirm_password: req.confirm_password,
        enrollment_code: req.enrollment_code,
    };

    sign_up_as(state, AccountKind::Admin, input).await
}

async fn sign_up_as<S>(
    state: AuthAppState<S>,
    kind: AccountKind,
    input: SignUpInput,
) -> AuthResult<impl IntoResponse>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    let use_case = SignUpUseCase::new(
        state.store.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );
    let output = use_case.execute(kind, input).await?;

    let cookie = state.set_refresh_cookie(&output.tokens.refresh_token);

    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::created(SessionResponse {
            access_token: output.tokens.access_token,
            user: PrincipalView::from(&output.principal),
        }),
    ))
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in<S>(
    State(state): State<AuthAppState<S>>,
    JsonBody(req): JsonBody<SignInRequest>,
) -> AuthResult<impl IntoResponse>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    sign_in_as(state, AccountKind::User, req).await
}

/// POST /api/auth/admin/signin
pub async fn admin_sign_in<S>(
    State(state): State<AuthAppState<S>>,
    JsonBody(req): JsonBody<SignInRequest>,
) -> AuthResult<impl IntoResponse>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    sign_in_as(state, AccountKind::Admin, req).await
}

async fn sign_in_as<S>(
    state: AuthAppState<S>,
    kind: AccountKind,
    req: SignInRequest,
) -> AuthResult<impl IntoResponse>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    let use_case = SignInUseCase::new(
        state.store.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let input = SignInInput {
        email: req.email,
        password: req.password,
    };

    let output = use_case.execute(kind, input).await?;

    let cookie = state.set_refresh_cookie(&output.tokens.refresh_token);

    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::ok(SessionResponse {
            access_token: output.tokens.access_token,
            user: PrincipalView::from(&output.principal),
        }),
    ))
}

// ============================================================================
// Refresh / Sign Out
// ============================================================================

/// POST /api/auth/refresh
pub async fn refresh<S>(
    State(state): State<AuthAppState<S>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    let use_case = RefreshUseCase::new(
        state.store.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let token = state.refresh_cookie_value(&headers);
    let access_token = use_case.execute(token.as_deref()).await?;

    Ok(ApiResponse::ok(AccessTokenResponse { access_token }))
}

/// POST /api/auth/signout
///
/// Always succeeds and always clears the refresh cookie.
pub async fn sign_out<S>(
    State(state): State<AuthAppState<S>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    let use_case = SignOutUseCase::new(state.tokens.clone());
    use_case.execute(state.refresh_cookie_value(&headers).as_deref());

    let cookie = state.config.refresh_cookie().build_delete_cookie();

    (
        [(header::SET_COOKIE, cookie)],
        ApiResponse::ok(MessageResponse {
            message: "Signed out".to_string(),
        }),
    )
}

// ============================================================================
// Protected
// ============================================================================

/// GET /api/auth/me
pub async fn me<S>(
    State(state): State<AuthAppState<S>>,
    caller: AuthenticatedPrincipal,
) -> AuthResult<impl IntoResponse>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    let use_case = CurrentPrincipalUseCase::new(state.store.clone(), state.config.clone());
    let principal = use_case.execute(caller).await?;

    Ok(ApiResponse::ok(PrincipalView::from(&principal)))
}

/// POST /api/roles
pub async fn create_role<S>(
    State(state): State<AuthAppState<S>>,
    caller: AuthenticatedPrincipal,
    JsonBody(req): JsonBody<CreateRoleRequest>,
) -> AuthResult<impl IntoResponse>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    let use_case = CreateRoleUseCase::new(state.store.clone(), state.config.clone());
    let role = use_case.execute(caller, req.name).await?;

    Ok(ApiResponse::created(RoleView::from(&role)))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    ApiResponse::ok(HealthResponse { status: "ok" })
}

//! Auth Router
//!
//! Builds the full API surface with the session gate applied to every
//! route. The gate sees complete request paths, so the public allow-list
//! is written with the `/api/...` prefix.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use kernel::uow::TransactionManager;

use crate::application::config::AuthConfig;
use crate::application::token::TokenService;
use crate::domain::repository::{PrincipalRepository, RoleRepository};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{GateState, PublicRoutes, session_gate};

/// Create the API router for any store implementation
pub fn api_router<S>(store: S, config: AuthConfig) -> Router
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    let config = Arc::new(config);
    let tokens = Arc::new(TokenService::new(&config));

    let gate = GateState {
        tokens: Arc::clone(&tokens),
        public_routes: Arc::new(PublicRoutes::default()),
    };

    let state = AuthAppState {
        store: Arc::new(store),
        tokens,
        config,
    };

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/auth", auth_routes::<S>())
        .route("/api/roles", post(handlers::create_role::<S>))
        .with_state(state)
        .layer(middleware::from_fn_with_state(gate, session_gate))
}

fn auth_routes<S>() -> Router<AuthAppState<S>>
where
    S: TransactionManager + Send + Sync + 'static,
    S::Tx: PrincipalRepository + RoleRepository,
{
    Router::new()
        .route("/signup", post(handlers::sign_up::<S>))
        .route("/signin", post(handlers::sign_in::<S>))
        .route("/admin/signup", post(handlers::admin_sign_up::<S>))
        .route("/admin/signin", post(handlers::admin_sign_in::<S>))
        .route("/refresh", post(handlers::refresh::<S>))
        .route("/signout", post(handlers::sign_out::<S>))
        .route("/me", get(handlers::me::<S>))
}

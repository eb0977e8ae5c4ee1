//! Auth Middleware
//!
//! The session gate runs in front of every route. Paths on the public
//! allow-list pass straight through; every other request needs
//! `Authorization: Bearer <access token>`. On success the verified identity
//! is stored in request extensions as [`AuthenticatedPrincipal`].

use std::sync::Arc;

use axum::extract::{FromRequestParts, OriginalUri, Request, State};
use axum::http::{HeaderMap, header, request::Parts};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::token::TokenService;
use crate::domain::entity::principal::AuthenticatedPrincipal;
use crate::error::AuthError;

pub const TOKEN_REQUIRED_MESSAGE: &str = "authorization token required";

/// Exact request paths that skip authentication
#[derive(Debug, Clone)]
pub struct PublicRoutes(Vec<String>);

impl PublicRoutes {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self(paths.into_iter().map(Into::into).collect())
    }

    /// Exact match only; `/api/auth/signup/x` is not public
    pub fn contains(&self, path: &str) -> bool {
        self.0.iter().any(|p| p == path)
    }
}

impl Default for PublicRoutes {
    fn default() -> Self {
        Self::new([
            "/api/auth/signup",
            "/api/auth/signin",
            "/api/auth/admin/signup",
            "/api/auth/admin/signin",
            "/api/auth/signout",
            "/api/auth/refresh",
            "/health",
        ])
    }
}

/// Middleware state
#[derive(Clone)]
pub struct GateState {
    pub tokens: Arc<TokenService>,
    pub public_routes: Arc<PublicRoutes>,
}

/// Token from `Authorization: Bearer <token>` (scheme is case-insensitive)
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Middleware that requires a valid access token outside the allow-list
pub async fn session_gate(State(gate): State<GateState>, mut req: Request, next: Next) -> Response {
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    if gate.public_routes.contains(&path) {
        return next.run(req).await;
    }

    let Some(token) = bearer_token(req.headers()) else {
        tracing::debug!(path = %path, "Request without bearer token");
        return AuthError::Unauthorized(TOKEN_REQUIRED_MESSAGE.to_string()).into_response();
    };

    let principal = match gate
        .tokens
        .verify_access(token)
        .and_then(|claims| claims.principal_id())
    {
        Ok(id) => AuthenticatedPrincipal { id },
        Err(e) => {
            tracing::debug!(path = %path, error = %e, "Rejected access token");
            return AuthError::from(e).into_response();
        }
    };

    req.extensions_mut().insert(principal);
    next.run(req).await
}

impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .copied()
            .ok_or_else(|| AuthError::Unauthorized(TOKEN_REQUIRED_MESSAGE.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("BEARER  abc ")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_public_routes_exact_match() {
        let routes = PublicRoutes::default();
        assert!(routes.contains("/api/auth/signup"));
        assert!(routes.contains("/health"));
        assert!(!routes.contains("/api/auth/signup/"));
        assert!(!routes.contains("/api/auth/signupx"));
        assert!(!routes.contains("/api/auth/me"));
        assert!(!routes.contains("/api/auth"));
    }
}

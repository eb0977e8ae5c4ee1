//! Sign Out Use Case
//!
//! Tokens are stateless, so signing out only clears the refresh cookie on
//! the client. The presented token is inspected for logging only; a missing
//! or invalid token still signs out successfully.

use std::sync::Arc;

use crate::application::token::TokenService;

/// Sign out use case
pub struct SignOutUseCase {
    tokens: Arc<TokenService>,
}

impl SignOutUseCase {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    pub fn execute(&self, refresh_token: Option<&str>) {
        match refresh_token.map(|t| self.tokens.verify_refresh(t)) {
            Some(Ok(claims)) => {
                tracing::info!(principal_id = %claims.sub, "Principal signed out");
            }
            Some(Err(_)) => {
                tracing::debug!("Sign-out with an invalid refresh token");
            }
            None => {
                tracing::debug!("Sign-out without a refresh token");
            }
        }
    }
}

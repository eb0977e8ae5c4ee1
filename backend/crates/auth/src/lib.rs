//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases, token service, privilege checks
//! - `infra/` - PostgreSQL and in-memory stores
//! - `presentation/` - HTTP handlers, DTOs, session gate, router
//!
//! ## Features
//! - Sign-up / sign-in with email + password, for users and admins
//! - Stateless JWT access tokens with a cookie-held refresh token
//! - A session gate in front of every non-public route
//! - Admin-only role management
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Access and refresh tokens signed with distinct secrets
//! - Privilege is re-read from the store on every admin operation
//! - Every store mutation runs inside one unit of work per request

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::token::{SigningSecret, TokenService};
pub use domain::entity::principal::AuthenticatedPrincipal;
pub use error::{AuthError, AuthResult};
pub use infra::{InMemoryAuthStore, PgAuthStore};
pub use presentation::router::api_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

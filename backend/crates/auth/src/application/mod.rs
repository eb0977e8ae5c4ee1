//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod create_role;
pub mod current_principal;
pub mod privilege;
pub mod refresh;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod token;

// Re-exports
pub use config::AuthConfig;
pub use create_role::CreateRoleUseCase;
pub use current_principal::CurrentPrincipalUseCase;
pub use refresh::RefreshUseCase;
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{AccountKind, SignUpInput, SignUpOutput, SignUpUseCase};
pub use token::{Claims, SigningSecret, TokenError, TokenPair, TokenService};

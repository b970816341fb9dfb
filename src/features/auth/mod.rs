//! Bearer token validation and admin guard.
//!
//! Tokens are issued by an external OIDC provider; this service only
//! validates them against the provider's JWKS and reads the roles claim.

mod jwks;
mod validator;

pub mod guards;
pub mod model;

pub use guards::RequireAdmin;
pub use jwks::JwksClient;
pub use model::AuthenticatedUser;
pub use validator::JwtValidator;

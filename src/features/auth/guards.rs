//! Role-based authorization guards.
//!
//! Guards run as extractors, ahead of any body extractor, so a rejected
//! caller never gets as far as reading a multipart upload.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Guard for catalogue mutations.
///
/// Any caller without the `admin` or `super_admin` role gets 403, anonymous
/// ones included. A bad bearer token never reaches here: the auth
/// middleware answers it with 401.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(user): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Forbidden("Admin access required".to_string()))?;

        if !user.is_admin() {
            tracing::warn!("Rejected non-admin mutation attempt by {}", user.sub);
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(RequireAdmin(user.clone()))
    }
}

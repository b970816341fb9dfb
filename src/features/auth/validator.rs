use super::model::AuthenticatedUser;
use crate::core::config::AuthConfig;
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::jwks::JwksClient;

/// Verifies RS256 bearer tokens against the issuer's signing keys
pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    validation: Validation,
    roles_claim: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    // Everything else; roles live under a provider-specific claim name
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

impl JwtValidator {
    pub fn new(jwks_client: Arc<JwksClient>, config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.leeway = config.jwt_leeway.as_secs();
        validation.validate_nbf = true;

        Self {
            jwks_client,
            validation,
            roles_claim: config.roles_claim.clone(),
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let kid = match decode_header(token) {
            Ok(header) if header.alg != Algorithm::RS256 => {
                return Err(AppError::Auth(format!(
                    "Unsupported algorithm {:?}, expected RS256",
                    header.alg
                )))
            }
            Ok(header) => header
                .kid
                .ok_or_else(|| AppError::Auth("Token header has no kid".to_string()))?,
            Err(e) => return Err(AppError::Auth(e.to_string())),
        };

        let key = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let Claims { sub, extra } = decode::<Claims>(token, &key, &self.validation)
            .map_err(|e| AppError::Auth(e.to_string()))?
            .claims;

        Ok(AuthenticatedUser {
            roles: extract_roles(extra.get(&self.roles_claim)),
            sub,
        })
    }
}

/// Roles may be a plain string array, a space-separated string, or an
/// object carrying a `roles` array (namespaced custom claims).
fn extract_roles(claim: Option<&Value>) -> Vec<String> {
    match claim {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(joined)) => joined.split_whitespace().map(str::to_string).collect(),
        Some(Value::Object(map)) => extract_roles(map.get("roles")),
        _ => Vec::new(),
    }
}

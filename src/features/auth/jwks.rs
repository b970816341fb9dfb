use jsonwebtoken::DecodingKey;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{OnceCell, RwLock};

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    jwks_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

struct JwksCache {
    keys: HashMap<String, DecodingKey>,
    last_fetched: Instant,
}

impl JwksCache {
    fn fresh_key(&self, kid: &str, ttl: Duration) -> Option<DecodingKey> {
        if self.last_fetched.elapsed() < ttl {
            self.keys.get(kid).cloned()
        } else {
            None
        }
    }
}

/// Fetches and caches the issuer's signing keys.
///
/// The JWKS location is resolved once from the issuer's OIDC discovery
/// document; keys are refetched when the cache expires or an unknown `kid`
/// shows up (key rotation).
pub struct JwksClient {
    issuer_url: String,
    client: reqwest::Client,
    jwks_uri: OnceCell<String>,
    cache: RwLock<Option<JwksCache>>,
    cache_ttl: Duration,
}

impl JwksClient {
    pub fn new(issuer_url: &str, cache_ttl: Duration) -> Self {
        Self {
            issuer_url: issuer_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            jwks_uri: OnceCell::new(),
            cache: RwLock::new(None),
            cache_ttl,
        }
    }

    pub async fn get_key(&self, kid: &str) -> Result<DecodingKey, JwksError> {
        if let Some(key) = self
            .cache
            .read()
            .await
            .as_ref()
            .and_then(|cached| cached.fresh_key(kid, self.cache_ttl))
        {
            return Ok(key);
        }

        self.fetch_jwks().await?;

        self.cache
            .read()
            .await
            .as_ref()
            .and_then(|cached| cached.keys.get(kid).cloned())
            .ok_or_else(|| JwksError::KeyNotFound(kid.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, JwksError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| JwksError::FetchError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JwksError::FetchError(format!("{} returned HTTP {}", url, status)));
        }

        response
            .json()
            .await
            .map_err(|e| JwksError::ParseError(e.to_string()))
    }

    async fn jwks_uri(&self) -> Result<&str, JwksError> {
        self.jwks_uri
            .get_or_try_init(|| async {
                let discovery_url = format!("{}/.well-known/openid-configuration", self.issuer_url);
                let document: DiscoveryDocument = self.get_json(&discovery_url).await?;
                Ok(document.jwks_uri)
            })
            .await
            .map(String::as_str)
    }

    async fn fetch_jwks(&self) -> Result<(), JwksError> {
        let jwks_uri = self.jwks_uri().await?;
        let jwks: JwksResponse = self.get_json(jwks_uri).await?;

        let keys = decode_rsa_keys(jwks.keys)?;
        tracing::debug!("Fetched {} signing keys from {}", keys.len(), jwks_uri);

        *self.cache.write().await = Some(JwksCache {
            keys,
            last_fetched: Instant::now(),
        });

        Ok(())
    }
}

fn decode_rsa_keys(keys: Vec<Jwk>) -> Result<HashMap<String, DecodingKey>, JwksError> {
    let mut decoded = HashMap::new();
    for jwk in keys {
        if jwk.kty != "RSA" {
            continue;
        }
        let (Some(kid), Some(n), Some(e)) = (jwk.kid, jwk.n, jwk.e) else {
            continue;
        };
        let key = DecodingKey::from_rsa_components(&n, &e)
            .map_err(|err| JwksError::KeyConversionError(err.to_string()))?;
        decoded.insert(kid, key);
    }
    Ok(decoded)
}

#[derive(Debug, thiserror::Error)]
pub enum JwksError {
    #[error("Failed to fetch JWKS: {0}")]
    FetchError(String),

    #[error("Failed to parse JWKS: {0}")]
    ParseError(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Failed to convert key: {0}")]
    KeyConversionError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_rsa_and_incomplete_keys_are_skipped() {
        let keys = vec![
            Jwk {
                kid: Some("ec".to_string()),
                kty: "EC".to_string(),
                n: None,
                e: None,
            },
            Jwk {
                kid: None,
                kty: "RSA".to_string(),
                n: Some("AQAB".to_string()),
                e: Some("AQAB".to_string()),
            },
        ];

        assert!(decode_rsa_keys(keys).unwrap().is_empty());
    }

    #[test]
    fn test_expired_cache_yields_no_key() {
        let mut keys = HashMap::new();
        keys.insert("k1".to_string(), DecodingKey::from_secret(b"secret"));
        let cache = JwksCache {
            keys,
            last_fetched: Instant::now(),
        };

        assert!(cache.fresh_key("k1", Duration::from_secs(60)).is_some());
        assert!(cache.fresh_key("k2", Duration::from_secs(60)).is_none());
        assert!(cache.fresh_key("k1", Duration::ZERO).is_none());
    }
}

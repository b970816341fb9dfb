use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub image_store: ImageStoreConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Largest header image accepted by the upload endpoints, in bytes
    pub max_image_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Bearer token validation against an external OIDC issuer
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    /// Name of the claim carrying the user's roles
    pub roles_claim: String,
    pub jwks_cache_ttl: Duration,
    pub jwt_leeway: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStoreProvider {
    Cloudinary,
    S3,
}

/// Cloud image storage configuration
#[derive(Debug, Clone)]
pub struct ImageStoreConfig {
    pub provider: ImageStoreProvider,
    pub cloudinary: CloudinaryConfig,
    pub s3: S3Config,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Base URL of the upload API (overridable for tests and proxies)
    pub api_base_url: String,
    /// Root folder every upload is placed under
    pub root_folder: String,
}

/// MinIO/S3 storage configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Public endpoint URL used when building image URLs (defaults to endpoint)
    pub public_endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    /// Prefix for publicly readable images
    pub public_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // A missing .env is fine in production
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            image_store: ImageStoreConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_IMAGE_UPLOAD_BYTES: usize = 50 * 1024 * 1024; // 50MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_image_upload_bytes = env::var("MAX_IMAGE_UPLOAD_BYTES")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_IMAGE_UPLOAD_BYTES.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_IMAGE_UPLOAD_BYTES must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_image_upload_bytes,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_or("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_or("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_or("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl AuthConfig {
    const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600; // 1 hour
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60; // 1 minute

    pub fn from_env() -> Result<Self, String> {
        let issuer = env::var("OIDC_ISSUER")
            .map_err(|_| "OIDC_ISSUER environment variable is required".to_string())?;

        let audience = env::var("OIDC_AUDIENCE")
            .map_err(|_| "OIDC_AUDIENCE environment variable is required".to_string())?;

        let roles_claim = env::var("OIDC_ROLES_CLAIM").unwrap_or_else(|_| "roles".to_string());

        let jwks_cache_ttl_secs = parse_or("JWKS_CACHE_TTL", Self::DEFAULT_JWKS_CACHE_TTL_SECS)?;
        let jwt_leeway_secs = parse_or("JWT_LEEWAY", Self::DEFAULT_JWT_LEEWAY_SECS)?;

        Ok(Self {
            issuer,
            audience,
            roles_claim,
            jwks_cache_ttl: Duration::from_secs(jwks_cache_ttl_secs),
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "District Atlas API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "Catalogue of districts and gram panchayats".to_string()
        });

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl ImageStoreConfig {
    pub fn from_env() -> Result<Self, String> {
        let provider = match env::var("IMAGE_STORE_PROVIDER")
            .unwrap_or_else(|_| "cloudinary".to_string())
            .to_lowercase()
            .as_str()
        {
            "cloudinary" => ImageStoreProvider::Cloudinary,
            "s3" | "minio" => ImageStoreProvider::S3,
            other => {
                return Err(format!(
                    "IMAGE_STORE_PROVIDER must be 'cloudinary' or 's3', got '{}'",
                    other
                ))
            }
        };

        let cloudinary = CloudinaryConfig::from_env(provider == ImageStoreProvider::Cloudinary)?;
        let s3 = S3Config::from_env();

        Ok(Self {
            provider,
            cloudinary,
            s3,
        })
    }
}

impl CloudinaryConfig {
    fn from_env(required: bool) -> Result<Self, String> {
        let read = |key: &str| -> Result<String, String> {
            match env::var(key) {
                Ok(value) if !value.is_empty() => Ok(value),
                _ if required => Err(format!("{} environment variable is required", key)),
                _ => Ok(String::new()),
            }
        };

        Ok(Self {
            cloud_name: read("CLOUDINARY_CLOUD_NAME")?,
            api_key: read("CLOUDINARY_API_KEY")?,
            api_secret: read("CLOUDINARY_API_SECRET")?,
            api_base_url: env::var("CLOUDINARY_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.cloudinary.com/v1_1".to_string()),
            root_folder: env::var("CLOUDINARY_ROOT_FOLDER")
                .unwrap_or_else(|_| "district-atlas".to_string()),
        })
    }
}

impl S3Config {
    fn from_env() -> Self {
        let endpoint =
            env::var("S3_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());
        let public_endpoint = env::var("S3_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        Self {
            endpoint,
            public_endpoint,
            access_key: env::var("S3_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
            secret_key: env::var("S3_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
            bucket: env::var("S3_BUCKET").unwrap_or_else(|_| "district-atlas-images".to_string()),
            region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            public_prefix: env::var("S3_PUBLIC_PREFIX").unwrap_or_else(|_| "public".to_string()),
        }
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr + ToString,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|_| format!("{} must be a valid number", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_falls_back_and_rejects_garbage() {
        assert_eq!(parse_or("ATLAS_TEST_UNSET_NUMBER", 42u32), Ok(42));

        env::set_var("ATLAS_TEST_BAD_NUMBER", "forty-two");
        assert!(parse_or("ATLAS_TEST_BAD_NUMBER", 42u32).is_err());
        env::remove_var("ATLAS_TEST_BAD_NUMBER");
    }

    #[test]
    fn test_swagger_credentials_need_both_parts() {
        let mut swagger = SwaggerConfig {
            username: Some("docs".to_string()),
            password: None,
            title: String::new(),
            version: String::new(),
            description: String::new(),
        };
        assert_eq!(swagger.credentials(), None);

        swagger.password = Some("secret".to_string());
        assert_eq!(swagger.credentials(), Some("docs:secret".to_string()));
    }
}

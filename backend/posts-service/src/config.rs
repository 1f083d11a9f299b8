/// Configuration management for posts-service
///
/// Everything comes from environment variables (a `.env` file is loaded by the
/// binaries first). Missing values fall back to development defaults;
/// production refuses the few defaults that are unsafe there.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_JWT_SECRET: &str = "dev-only-insecure-secret";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub store: StoreConfig,
    pub feed: FeedConfig,
    pub media: MediaConfig,
    pub auth: AuthConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Entity store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: String,
    pub max_connections: u32,
}

/// Feed pagination and caching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub posts_per_page: usize,
    /// TTL of the cached index page; 0 disables the cache
    pub index_cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("POSTS_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("POSTS_SERVICE_PORT", 8000)?,
            },
            store: StoreConfig {
                backend: match std::env::var("STORE_BACKEND")
                    .unwrap_or_else(|_| "postgres".to_string())
                    .to_ascii_lowercase()
                    .as_str()
                {
                    "postgres" | "postgresql" => StoreBackend::Postgres,
                    "memory" => StoreBackend::Memory,
                    other => return Err(format!("Unknown STORE_BACKEND '{}'", other)),
                },
                database_url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/yatube".to_string()),
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            feed: {
                let posts_per_page: usize = parse_env_or_default("POSTS_PER_PAGE", 10)?;
                if posts_per_page == 0 {
                    return Err("POSTS_PER_PAGE must be at least 1".to_string());
                }
                FeedConfig {
                    posts_per_page,
                    index_cache_ttl_secs: parse_env_or_default("INDEX_CACHE_TTL_SECS", 20)?,
                }
            },
            media: MediaConfig {
                root: std::env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("media")),
            },
            auth: {
                let jwt_secret = match std::env::var("JWT_SECRET") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err("JWT_SECRET must be set in production".to_string())
                    }
                    Err(_) => DEFAULT_JWT_SECRET.to_string(),
                };
                if production && (jwt_secret.trim().is_empty() || jwt_secret == DEFAULT_JWT_SECRET)
                {
                    return Err(
                        "JWT_SECRET must be set to a non-default value in production".to_string(),
                    );
                }
                AuthConfig { jwt_secret }
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

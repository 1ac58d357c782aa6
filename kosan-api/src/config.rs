/// Configuration for the API server
///
/// Loaded once at startup from environment variables (a `.env` file is read
/// first if present).
///
/// # Environment Variables
///
/// | Variable | Default | |
/// |---|---|---|
/// | `API_HOST` | `0.0.0.0` | |
/// | `API_PORT` | `8080` | |
/// | `CORS_ORIGINS` | `*` | comma-separated |
/// | `APP_ENV` | `development` | `production` enables HSTS and secure cookies |
/// | `PUBLIC_BASE_URL` | `http://localhost:3000` | used in WhatsApp links |
/// | `STATIC_DIR` | unset | pre-built client assets |
/// | `STORAGE_ORIGIN` | unset | object storage the client uploads photos to |
/// | `DATABASE_URL` | required | |
/// | `DATABASE_MAX_CONNECTIONS` | `10` | |
/// | `JWT_SECRET` | required | at least 32 characters |
/// | `MIDTRANS_SERVER_KEY` | required | |
/// | `MIDTRANS_CLIENT_KEY` | required | |
/// | `MIDTRANS_IS_PRODUCTION` | `false` | |
/// | `MIDTRANS_VERIFY_SIGNATURE` | `true` | |
/// | `MIDTRANS_TIMEOUT_SECONDS` | `15` | |
/// | `REGISTRATION_FEE` | `50000` | rupiah |
///
/// # Example
///
/// ```no_run
/// use kosan_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub midtrans: MidtransConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS header, `Secure` cookie flag)
    pub production: bool,

    /// Public URL of the client, without trailing slash
    pub public_base_url: String,

    /// Directory of pre-built client assets served behind the page guard
    pub static_dir: Option<PathBuf>,

    /// Object storage origin the served client uploads photos to directly
    pub storage_origin: Option<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing secret, at least 32 characters
    pub secret: String,
}

/// Payment gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MidtransConfig {
    /// Server-side key, used for Basic auth and webhook signatures
    pub server_key: String,

    /// Client-side key handed to the Snap widget
    pub client_key: String,

    /// Use the production endpoints instead of the sandbox
    pub is_production: bool,

    /// Require a valid `signature_key` on webhook notifications
    pub verify_signature: bool,

    /// Activation fee in rupiah
    pub registration_fee: i64,

    /// Gateway HTTP timeout in seconds
    pub timeout_seconds: u64,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not
    /// parse
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let registration_fee: i64 = parse_or(&lookup, "REGISTRATION_FEE", 50_000)?;
        if registration_fee <= 0 {
            anyhow::bail!("REGISTRATION_FEE must be positive");
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = lookup("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api: ApiConfig {
                host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "API_PORT", 8080)?,
                cors_origins,
                production,
                public_base_url,
                static_dir: lookup("STATIC_DIR")
                    .filter(|v| !v.trim().is_empty())
                    .map(PathBuf::from),
                storage_origin: lookup("STORAGE_ORIGIN")
                    .map(|v| v.trim().trim_end_matches('/').to_string())
                    .filter(|v| !v.is_empty()),
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            jwt: JwtConfig { secret: jwt_secret },
            midtrans: MidtransConfig {
                server_key: required("MIDTRANS_SERVER_KEY")?,
                client_key: required("MIDTRANS_CLIENT_KEY")?,
                is_production: parse_or(&lookup, "MIDTRANS_IS_PRODUCTION", false)?,
                verify_signature: parse_or(&lookup, "MIDTRANS_VERIFY_SIGNATURE", true)?,
                registration_fee,
                timeout_seconds: parse_or(&lookup, "MIDTRANS_TIMEOUT_SECONDS", 15)?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", key, value)),
        _ => Ok(default),
    }
}

//! Application configuration loaded from environment variables.

use std::env;
use std::fmt;
use std::path::PathBuf;

use actix_web::cookie::Key;

#[cfg(feature = "postgres")]
use usof_infra::DatabaseConfig;

/// Minimum secret length accepted by [`Key::derive_from`].
const MIN_SESSION_SECRET_LEN: usize = 32;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    pub session: SessionConfig,
    /// Hide internal error details from clients.
    pub production: bool,
    /// Base URL used in links sent by mail.
    pub public_url: String,
    pub uploads_dir: PathBuf,
    pub mail: Option<MailConfig>,
    pub admin: Option<AdminBootstrap>,
}

/// Cookie session settings.
#[derive(Clone)]
pub struct SessionConfig {
    pub key: Key,
    pub cookie_secure: bool,
    pub ttl_hours: i64,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("key", &"<redacted>")
            .field("cookie_secure", &self.cookie_secure)
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

/// HTTP mail relay settings.
#[derive(Clone)]
pub struct MailConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub from: String,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("from", &self.from)
            .finish()
    }
}

/// Administrator account created on first start.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub login: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("login", &self.login)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("PORT").unwrap_or(8080);

        #[cfg(feature = "postgres")]
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS").unwrap_or(20),
            min_connections: parse_var("DB_MIN_CONNECTIONS").unwrap_or(2),
        });

        let production = flag("PRODUCTION")
            .unwrap_or_else(|| env::var("RUST_ENV").is_ok_and(|v| v == "production"));

        let public_url =
            env::var("PUBLIC_URL").unwrap_or_else(|_| format!("http://{host}:{port}"));

        let mail = env::var("MAIL_API_URL").ok().map(|url| MailConfig {
            url,
            api_key: env::var("MAIL_API_KEY").ok(),
            from: env::var("MAIL_FROM").unwrap_or_else(|_| "USOF <no-reply@usof.local>".to_string()),
        });

        let admin = match (
            env::var("ADMIN_LOGIN"),
            env::var("ADMIN_EMAIL"),
            env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(login), Ok(email), Ok(password)) => Some(AdminBootstrap {
                login,
                email,
                password,
            }),
            _ => None,
        };

        Self {
            host,
            port,
            #[cfg(feature = "postgres")]
            database,
            session: SessionConfig {
                key: session_key(env::var("SESSION_SECRET").ok()),
                cookie_secure: flag("COOKIE_SECURE").unwrap_or(production),
                ttl_hours: parse_var("SESSION_TTL_HOURS").unwrap_or(24),
            },
            production,
            public_url,
            uploads_dir: env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            mail,
            admin,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Derive the cookie key from `secret`, or fall back to a per-process key.
fn session_key(secret: Option<String>) -> Key {
    match secret {
        Some(secret) if secret.len() >= MIN_SESSION_SECRET_LEN => Key::derive_from(secret.as_bytes()),
        Some(_) => {
            tracing::warn!(
                "SESSION_SECRET is shorter than {MIN_SESSION_SECRET_LEN} bytes; using a random key, sessions will not survive a restart"
            );
            Key::generate()
        }
        None => {
            tracing::warn!("SESSION_SECRET not set; using a random key, sessions will not survive a restart");
            Key::generate()
        }
    }
}

//! Application state - shared across all handlers.

use std::path::PathBuf;
use std::sync::Arc;

use usof_core::ports::Mailer;
use usof_core::services::{Credentials, Links, Repositories, Services};
use usof_infra::{Argon2PasswordService, HexTokenGenerator, InMemoryStore, LogMailer};

use crate::config::AppConfig;
use crate::middleware::session_store::MemorySessionStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
    /// Session state for every worker; the cookie only names an entry.
    pub sessions: MemorySessionStore,
    /// Where uploaded profile pictures are written.
    pub uploads_dir: PathBuf,
    /// Hide internal error details from clients.
    pub production: bool,
}

impl AppState {
    pub fn with_services(services: Services, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            services: Arc::new(services),
            sessions: MemorySessionStore::new(),
            uploads_dir: uploads_dir.into(),
            production: false,
        }
    }

    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let repositories = repositories(config).await;
        let credentials = Credentials {
            passwords: Arc::new(Argon2PasswordService::new()),
            tokens: Arc::new(HexTokenGenerator),
            mailer: mailer(config),
            links: Links::new(&config.public_url),
        };

        tracing::info!("Application state initialized");

        Self {
            production: config.production,
            ..Self::with_services(
                Services::new(repositories, credentials),
                config.uploads_dir.clone(),
            )
        }
    }
}

async fn repositories(config: &AppConfig) -> Repositories {
    #[cfg(feature = "postgres")]
    {
        if let Some(db_config) = &config.database {
            match connect_postgres(db_config).await {
                Ok(repositories) => return repositories,
                Err(e) => {
                    tracing::error!(
                        "Failed to prepare database: {}. Using in-memory fallback.",
                        e
                    );
                }
            }
        } else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }
    }

    #[cfg(not(feature = "postgres"))]
    {
        let _ = config;
        tracing::info!("Running without postgres feature - using in-memory repositories");
    }

    Arc::new(InMemoryStore::new()).repositories()
}

/// Connect, bring the schema up to date and hand out the repositories.
#[cfg(feature = "postgres")]
async fn connect_postgres(
    db_config: &usof_infra::DatabaseConfig,
) -> Result<Repositories, migration::DbErr> {
    use migration::{Migrator, MigratorTrait};

    let connections = usof_infra::DatabaseConnections::init(db_config).await?;
    Migrator::up(&connections.main, None).await?;
    tracing::info!("Database schema is up to date");
    Ok(usof_infra::postgres_repositories(connections.main))
}

fn mailer(config: &AppConfig) -> Arc<dyn Mailer> {
    match &config.mail {
        #[cfg(feature = "mail-http")]
        Some(mail) => {
            tracing::info!(relay = %mail.url, "Mail relay configured");
            Arc::new(usof_infra::HttpMailer::new(usof_infra::HttpMailerConfig {
                url: mail.url.clone(),
                api_key: mail.api_key.clone(),
                from: mail.from.clone(),
            }))
        }
        #[cfg(not(feature = "mail-http"))]
        Some(_) => {
            tracing::warn!("MAIL_API_URL set but mail-http feature is disabled; logging mail instead");
            Arc::new(LogMailer)
        }
        None => {
            tracing::warn!("MAIL_API_URL not set; outgoing mail will only be logged");
            Arc::new(LogMailer)
        }
    }
}

//! Application assembly shared by the server and the HTTP tests.

use actix_session::SessionMiddleware;
use actix_session::config::PersistentSession;
use actix_web::body::MessageBody;
use actix_web::cookie::{SameSite, time::Duration};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::ErrorHandlers;
use actix_web::{App, web};
use tracing_actix_web::TracingLogger;

use crate::config::SessionConfig;
use crate::handlers;
use crate::middleware::error::{json_error_handler, path_error_handler, redact_internal};
use crate::middleware::session_store::MemorySessionStore;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "usof.sid";

/// Server-side sessions; the encrypted cookie only carries the session key.
fn session_middleware(
    config: &SessionConfig,
    store: MemorySessionStore,
) -> SessionMiddleware<MemorySessionStore> {
    SessionMiddleware::builder(store, config.key.clone())
        .cookie_name(SESSION_COOKIE.to_string())
        .cookie_path("/".to_string())
        .cookie_secure(config.cookie_secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(
            PersistentSession::default().session_ttl(Duration::hours(config.ttl_hours)),
        )
        .build()
}

pub fn build_app(
    state: AppState,
    session: &SessionConfig,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody + use<>>,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let session = session_middleware(session, state.sessions.clone());
    App::new()
        .app_data(web::Data::new(state))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .configure(handlers::configure_routes)
        .wrap(ErrorHandlers::new().handler(StatusCode::INTERNAL_SERVER_ERROR, redact_internal))
        .wrap(session)
        .wrap(TracingLogger::default())
}

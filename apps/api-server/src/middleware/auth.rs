//! Session helpers and the viewer extractor.

use std::ops::Deref;

use actix_session::{Session, SessionExt};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures::future::LocalBoxFuture;

use usof_core::viewer::Viewer;

use crate::middleware::error::AppError;
use crate::state::AppState;

pub(crate) const USER_ID_KEY: &str = "user_id";

/// Thin wrapper so handlers deal in user ids rather than cookie details.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Start a fresh session for `user_id`. The session id is rotated first.
    pub fn persist_user(&self, user_id: i32) -> Result<(), AppError> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id)
            .map_err(|e| AppError::Internal(format!("failed to persist session: {e}")))
    }

    /// The signed-in user id. A value that does not decode counts as signed out.
    pub fn user_id(&self) -> Option<i32> {
        match self.0.get::<i32>(USER_ID_KEY) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("invalid user id in session cookie: {e}");
                None
            }
        }
    }

    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

/// The viewer behind the current request, anonymous when no session exists.
///
/// The role is read from the store on every request. A session pointing at a
/// deleted account is dropped and the request proceeds anonymously.
#[derive(Debug, Clone, Copy)]
pub struct CurrentViewer(pub Viewer);

impl Deref for CurrentViewer {
    type Target = Viewer;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for CurrentViewer {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = SessionContext::new(req.get_session());
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                AppError::Internal("AppState not found in app data".to_string())
            })?;
            let user_id = session.user_id();
            let viewer = state.services.identity.resolve_viewer(user_id).await?;
            if user_id.is_some() && !viewer.is_authenticated() {
                session.clear();
            }
            Ok(CurrentViewer(viewer))
        })
    }
}

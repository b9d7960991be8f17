//! Startup tasks that run before the server accepts traffic.

use anyhow::Context;

use crate::config::AdminBootstrap;
use crate::state::AppState;

/// Make sure the configured administrator exists.
pub async fn ensure_admin(state: &AppState, admin: &AdminBootstrap) -> anyhow::Result<()> {
    let created = state
        .services
        .users
        .bootstrap_admin(&admin.login, &admin.email, &admin.password)
        .await
        .with_context(|| format!("failed to bootstrap administrator '{}'", admin.login))?;

    match created {
        Some(user) => tracing::info!(user_id = user.id, login = %user.login, "Administrator created"),
        None => tracing::debug!(login = %admin.login, "Administrator already present"),
    }
    Ok(())
}

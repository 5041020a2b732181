use axum::extract::FromRef;
use ring::digest;
use sqlx::PgPool;
use tower_sessions::{cookie::Key, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

/// Session keys used by the admin surface
pub const SESSION_KEY_ADMIN_ID: &str = "admin_id";

/// Stretches the configured session secret into the 64 bytes a cookie
/// signing key needs.
fn signing_key(secret: &[u8]) -> Key {
    let digest = digest::digest(&digest::SHA512, secret);
    Key::from(digest.as_ref())
}

/// Creates the session layer backing `/admin` authentication. Session
/// cookies are signed with a key derived from `session_secret`.
pub async fn create_session_layer(
    pool: PgPool,
    session_secret: &[u8],
    base_url: &str,
) -> Result<SessionManagerLayer<PostgresStore, tower_sessions::service::SignedCookie>, sqlx::Error> {
    // Create the session store backed by PostgreSQL
    let session_store = PostgresStore::new(pool);
    session_store.migrate().await?;

    // Local development runs over plain HTTP
    let secure = base_url.starts_with("https://");

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure)
        .with_signed(signing_key(session_secret))
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(8)));

    Ok(session_layer)
}

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: crate::config::Config,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.pool.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_deterministic() {
        assert_eq!(
            signing_key(b"session-secret").master(),
            signing_key(b"session-secret").master()
        );
    }

    #[test]
    fn test_signing_key_varies_with_the_secret() {
        assert_ne!(
            signing_key(b"session-secret").master(),
            signing_key(b"another-secret").master()
        );
    }

    #[test]
    fn test_short_secrets_still_yield_a_full_key() {
        // Key::from wants 64 bytes no matter how short the input is
        assert_eq!(signing_key(b"x").master().len(), 64);
    }
}

//! Session middleware configuration.
//!
//! Sessions hold the signed-in user and the cart. They live in the process
//! (tower-sessions `MemoryStore`), so a restart signs everyone out and
//! empties every cart.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "arthive_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer.
///
/// `secure` marks the cookie HTTPS-only; pass `false` for local HTTP.
#[must_use]
pub fn create_session_layer(store: MemoryStore, secure: bool) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

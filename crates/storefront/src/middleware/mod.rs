//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route; added in `main`)
//! 2. `TraceLayer` (request span carrying `request_id`)
//! 3. Request ID (reuse or mint `x-request-id`)
//! 4. Session layer (tower-sessions, in-memory store)

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{
    AuthRejection, OptionalAuth, RequireAdmin, RequireArtist, RequireAuth, clear_current_user,
    set_current_user,
};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};

//! Authentication extractors.
//!
//! Handlers declare the access they need by taking one of these extractors;
//! the role check happens before the handler body runs. Role-gated
//! extractors re-read the role from the user's profile on every request, so
//! a promotion or demotion applies to sessions that are already open.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};
use crate::platform::PlatformError;
use crate::state::AppState;

/// Error returned when a request lacks the required identity or role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No signed-in user.
    Unauthorized,
    /// Signed in, but the role is insufficient.
    Forbidden,
    /// The role could not be checked against the platform.
    Unavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Sign in required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Could not verify permissions",
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn session_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    session_user(parts.extensions.get::<Session>()?).await
}

/// The signed-in user with their role re-read from the platform.
///
/// A role that differs from the session copy is written back to the session.
async fn current_user_with_role(
    parts: &Parts,
    state: &AppState,
) -> Result<CurrentUser, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;
    let mut user = session_user(session)
        .await
        .ok_or(AuthRejection::Unauthorized)?;

    let profile = match state
        .platform()
        .get_profile(&user.access_token, &user.id)
        .await
    {
        Ok(profile) => profile,
        Err(PlatformError::Unauthorized(_) | PlatformError::NotFound(_)) => {
            return Err(AuthRejection::Unauthorized);
        }
        Err(e) => {
            tracing::warn!(error = %e, user_id = %user.id, "Failed to refresh role");
            return Err(AuthRejection::Unavailable);
        }
    };

    if profile.role != user.role {
        tracing::info!(
            user_id = %user.id,
            from = %user.role,
            to = %profile.role,
            "Role changed since sign-in"
        );
        user.role = profile.role;
        if let Err(e) = session.insert(session_keys::CURRENT_USER, &user).await {
            tracing::warn!(error = %e, "Failed to store refreshed role");
        }
    }

    Ok(user)
}

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts)
            .await
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

/// Extractor that requires the artist or admin role, checked against the
/// user's current profile.
pub struct RequireArtist(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireArtist
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user_with_role(parts, &AppState::from_ref(state)).await?;
        if !user.role.can_sell() {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}

/// Extractor that requires the admin role, checked against the user's
/// current profile.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user_with_role(parts, &AppState::from_ref(state)).await?;
        if !user.role.is_admin() {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Store the signed-in user in the session.
///
/// The session ID is cycled first so a pre-login session ID cannot be
/// reused after sign-in.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the signed-in user from the session (sign-out).
///
/// The cart stays; it belongs to the device, not the account.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

//! Authentication route handlers.
//!
//! Credentials are checked by the platform's identity service; the
//! storefront only keeps the resulting user and access token in the session.

use axum::{Form, Json, extract::State};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use arthive_core::{Email, UserRole};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::platform::{AuthSession, NewProfile, Profile, SignUpOutcome};
use crate::state::AppState;

/// Shortest password the identity service accepts.
const MIN_PASSWORD_LENGTH: usize = 6;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Sign-up form data.
#[derive(Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
}

/// Result of a sign-up or sign-in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// `true` when the account exists but the email must be confirmed first.
    pub confirmation_required: bool,
    pub profile: Option<Profile>,
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn validate_password(password: &str) -> Result<SecretString> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(SecretString::from(password.to_owned()))
}

/// Normalize a requested username: trimmed, non-empty.
fn clean_username(raw: Option<String>) -> Option<String> {
    raw.map(|u| u.trim().to_owned()).filter(|u| !u.is_empty())
}

/// Load (or create) the profile and store the user in the session.
async fn establish_session(
    state: &AppState,
    session: &Session,
    auth: AuthSession,
    email: Email,
    username: Option<String>,
) -> Result<Profile> {
    let new_profile = NewProfile {
        id: auth.user.id.clone(),
        email: Some(email.as_str().to_owned()),
        username,
        bio: None,
        role: UserRole::User,
        artist_request: false,
    };
    let profile = state
        .platform()
        .ensure_profile(&auth.access_token, &new_profile)
        .await?;

    let user = CurrentUser {
        id: profile.id.clone(),
        email,
        role: profile.role,
        access_token: auth.access_token,
    };
    set_current_user(session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(profile)
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account.
#[instrument(skip(state, session, form))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignUpForm>,
) -> Result<Json<AuthResponse>> {
    let email = parse_email(&form.email)?;
    let password = validate_password(&form.password)?;
    let username = clean_username(form.username);

    if let Some(name) = &username
        && !state.platform().username_available(name).await?
    {
        return Err(AppError::Conflict("Username is already taken".to_string()));
    }

    match state.platform().sign_up(&email, &password).await? {
        SignUpOutcome::Session(auth) => {
            let profile = establish_session(&state, &session, auth, email, username).await?;
            tracing::info!(user_id = %profile.id, "Account created");
            Ok(Json(AuthResponse {
                confirmation_required: false,
                profile: Some(profile),
            }))
        }
        SignUpOutcome::ConfirmationRequired(user) => {
            tracing::info!(user_id = %user.id, "Account created, awaiting email confirmation");
            Ok(Json(AuthResponse {
                confirmation_required: true,
                profile: None,
            }))
        }
    }
}

/// Sign in with email and password.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Json<AuthResponse>> {
    let email = parse_email(&form.email)?;
    let password = SecretString::from(form.password);

    let auth = state.platform().sign_in(&email, &password).await?;
    let profile = establish_session(&state, &session, auth, email, None).await?;
    tracing::info!(user_id = %profile.id, "Signed in");

    Ok(Json(AuthResponse {
        confirmation_required: false,
        profile: Some(profile),
    }))
}

/// Sign out. Always succeeds locally even if the platform call fails.
#[instrument(skip(state, session, user))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<serde_json::Value>> {
    if let Some(user) = user
        && let Err(e) = state.platform().sign_out(&user.access_token).await
    {
        tracing::warn!(error = %e, "Failed to revoke platform session");
    }

    clear_current_user(&session).await?;
    clear_sentry_user();

    Ok(Json(serde_json::json!({ "signed_out": true })))
}

//! Signed-in user's own profile.

use axum::{
    Form, Json,
    extract::{Multipart, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::platform::{AVATARS_BUCKET, Profile, ProfileUpdate};
use crate::state::AppState;

use super::upload::MultipartForm;

/// Longest accepted username.
const MAX_USERNAME_LENGTH: usize = 32;

/// Profile edit form. Blank fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    pub username: Option<String>,
    pub bio: Option<String>,
}

/// Check a username: letters, digits, `_`, `-` and `.`, at most 32 chars.
fn validate_username(username: &str) -> Result<()> {
    let valid_chars = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !valid_chars || username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Username may use letters, digits, '_', '-' and '.', up to {MAX_USERNAME_LENGTH} characters"
        )));
    }
    Ok(())
}

impl ProfileForm {
    fn into_update(self) -> Result<ProfileUpdate> {
        let username = self
            .username
            .map(|u| u.trim().to_owned())
            .filter(|u| !u.is_empty());
        if let Some(name) = &username {
            validate_username(name)?;
        }

        let update = ProfileUpdate {
            username,
            bio: self.bio.map(|b| b.trim().to_owned()),
            ..ProfileUpdate::default()
        };
        if update.is_empty() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }
        Ok(update)
    }
}

/// Current user's profile.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    Ok(Json(
        state
            .platform()
            .get_profile(&user.access_token, &user.id)
            .await?,
    ))
}

/// Update username and bio.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Json<Profile>> {
    let update = form.into_update()?;

    if let Some(name) = &update.username {
        let current = state
            .platform()
            .get_profile(&user.access_token, &user.id)
            .await?;
        if current.username.as_deref() != Some(name.as_str())
            && !state.platform().username_available(name).await?
        {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }
    }

    let profile = state
        .platform()
        .update_profile(&user.access_token, &user.id, &update)
        .await?;
    Ok(Json(profile))
}

/// Upload a new profile picture (multipart field `avatar`).
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<Json<Profile>> {
    let form = MultipartForm::read(multipart, "avatar").await?;
    let image = form
        .image
        .ok_or_else(|| AppError::BadRequest("Choose an image to upload".to_string()))?;

    let path = image.object_path(&user.id);
    let url = state
        .platform()
        .upload_object(
            &user.access_token,
            AVATARS_BUCKET,
            &path,
            image.bytes,
            &image.content_type,
        )
        .await?;

    let update = ProfileUpdate {
        avatar_url: Some(url.to_string()),
        ..ProfileUpdate::default()
    };
    let profile = state
        .platform()
        .update_profile(&user.access_token, &user.id, &update)
        .await?;

    tracing::info!(path = %path, "Avatar updated");
    Ok(Json(profile))
}

/// Ask an admin for the artist role.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn request_artist(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    let current = state
        .platform()
        .get_profile(&user.access_token, &user.id)
        .await?;
    if current.role.can_sell() {
        return Err(AppError::BadRequest(
            "You can already sell artwork".to_string(),
        ));
    }

    let profile = state
        .platform()
        .request_artist(&user.access_token, &user.id)
        .await?;
    tracing::info!("Artist role requested");
    Ok(Json(profile))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("maria.santos_99").is_ok());
        assert!(validate_username("no spaces").is_err());
        assert!(validate_username("semi;colon").is_err());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_profile_form_into_update() {
        let update = ProfileForm {
            username: Some(" maria ".to_string()),
            bio: None,
        }
        .into_update()
        .unwrap();
        assert_eq!(update.username.as_deref(), Some("maria"));

        let bio_only = ProfileForm {
            username: Some("  ".to_string()),
            bio: Some("Painter from Cebu".to_string()),
        }
        .into_update()
        .unwrap();
        assert!(bio_only.username.is_none());

        assert!(ProfileForm::default().into_update().is_err());
    }
}

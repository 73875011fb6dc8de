use log::{debug, error, info, warn};

use super::{message_or, user_from_metadata, user_from_profile, DataError, DataService};
use crate::backend::UserMetadata;
use crate::constants::{AVATAR_SEED_URL, ERROR_LOGIN_FAILED, ERROR_REGISTER_FAILED, FALLBACK_NAME, FALLBACK_USERNAME};
use crate::models::User;

/// Generated avatar for a new account, seeded by username
pub fn seeded_avatar_url(username: &str) -> String {
    format!("{}{}", AVATAR_SEED_URL, urlencoding::encode(username))
}

impl DataService {
    /// Create an account with profile metadata attached.
    ///
    /// The profile row is written by a backend trigger and may not exist yet;
    /// in that case the submitted metadata is returned.
    pub async fn register(&self, email: &str, name: &str, username: &str, password: &str) -> Result<User, DataError> {
        let avatar_url = seeded_avatar_url(username);
        let metadata = UserMetadata {
            full_name: Some(name.to_string()),
            username: Some(username.to_string()),
            avatar_url: Some(avatar_url.clone()),
        };

        let auth_user = self.backend.sign_up(email, password, &metadata).await.map_err(|e| {
            error!("Registration failed: {}", e);
            DataError::Auth(message_or(&e, ERROR_REGISTER_FAILED))
        })?;
        info!("Registered user {}", auth_user.id);

        match self.backend.fetch_profile(&auth_user.id).await {
            Ok(Some(profile)) => Ok(user_from_profile(profile)),
            Ok(None) => {
                debug!("Profile for {} not materialized yet, using submitted metadata", auth_user.id);
                Ok(user_from_metadata(&auth_user, name, username, &avatar_url))
            }
            Err(e) => {
                warn!("Profile read after registration failed: {}", e);
                Ok(user_from_metadata(&auth_user, name, username, &avatar_url))
            }
        }
    }

    /// Verify credentials with the backend and load the profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, DataError> {
        let session = self
            .backend
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| {
                error!("Login failed: {}", e);
                DataError::Auth(message_or(&e, ERROR_LOGIN_FAILED))
            })?;
        info!("Signed in {}", session.user.id);

        match self.backend.fetch_profile(&session.user.id).await {
            Ok(Some(profile)) => Ok(user_from_profile(profile)),
            Ok(None) => Ok(user_from_metadata(&session.user, FALLBACK_NAME, FALLBACK_USERNAME, "")),
            Err(e) => {
                warn!("Profile read after login failed: {}", e);
                Ok(user_from_metadata(&session.user, FALLBACK_NAME, FALLBACK_USERNAME, ""))
            }
        }
    }

    /// End the backend session.
    pub async fn logout(&self) -> Result<(), DataError> {
        self.backend
            .sign_out()
            .await
            .map_err(|e| DataError::Auth(e.message().to_string()))?;
        info!("Signed out");
        Ok(())
    }

    /// The signed-in user, or `None` when there is no valid session.
    pub async fn restore_session(&self) -> Result<Option<User>, DataError> {
        let session = match self.backend.get_session().await {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(None),
            Err(e) => {
                error!("Session lookup failed: {}", e);
                return Err(DataError::Auth(e.message().to_string()));
            }
        };

        let user = match self.backend.fetch_profile(&session.user.id).await {
            Ok(Some(profile)) => user_from_profile(profile),
            Ok(None) => user_from_metadata(&session.user, FALLBACK_NAME, FALLBACK_USERNAME, ""),
            Err(e) => {
                warn!("Profile read during session restore failed: {}", e);
                user_from_metadata(&session.user, FALLBACK_NAME, FALLBACK_USERNAME, "")
            }
        };
        debug!("Restored session for {}", user.id);
        Ok(Some(user))
    }
}

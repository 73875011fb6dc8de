//! Data-access layer.
//!
//! [`DataService`] is the only component that talks to the backend. It maps
//! backend rows to the domain records in [`crate::models`] and back, and turns
//! backend failures into [`DataError`]s carrying a user-facing message. "No
//! session" and "no rows" are successes (`None` and an empty list).

use chrono::Utc;
use std::sync::Arc;

use crate::backend::{AuthUser, Backend, BackendError, ProfileRow};
use crate::constants::{
    ERROR_AVATAR_PROFILE, ERROR_AVATAR_UPLOAD, ERROR_AVATAR_URL, ERROR_NO_USER, FALLBACK_NAME, FALLBACK_USERNAME,
};
use crate::models::User;

pub mod auth;
pub mod avatar;
pub mod workouts;

pub use avatar::{AvatarCheckError, AvatarFile};

/// Errors surfaced by the data-access layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    /// Account creation or sign-in was rejected
    #[error("{0}")]
    Auth(String),

    /// A read was rejected
    #[error("{0}")]
    Data(String),

    /// Saving a workout failed part-way.
    ///
    /// `orphaned_workout` is set when the workout row was written but could not
    /// be removed again.
    #[error("{message}")]
    Save {
        message: String,
        orphaned_workout: Option<String>,
    },

    #[error("{}", ERROR_AVATAR_UPLOAD)]
    AvatarUpload(String),

    #[error("{}", ERROR_AVATAR_URL)]
    AvatarUrl,

    #[error("{}", ERROR_AVATAR_PROFILE)]
    AvatarProfile(String),

    #[error("{}", ERROR_NO_USER)]
    NotAuthenticated,
}

impl DataError {
    /// Backend detail behind an avatar failure, for logs
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::AvatarUpload(detail) | Self::AvatarProfile(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Use the backend's own message unless it is empty.
fn message_or(err: &BackendError, fallback: &str) -> String {
    let message = err.message().trim();
    if message.is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}

/// Map a profile row to a [`User`]
pub(crate) fn user_from_profile(profile: ProfileRow) -> User {
    User {
        id: profile.id,
        name: profile.full_name.unwrap_or_else(|| FALLBACK_NAME.to_string()),
        username: profile.username.unwrap_or_else(|| FALLBACK_USERNAME.to_string()),
        avatar: profile.avatar_url.unwrap_or_default(),
        joined_date: profile.updated_at.unwrap_or_else(Utc::now),
    }
}

/// Map an auth user to a [`User`] from its metadata, with explicit defaults
pub(crate) fn user_from_metadata(user: &AuthUser, name: &str, username: &str, avatar: &str) -> User {
    let meta = &user.user_metadata;
    let pick = |value: &Option<String>, default: &str| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
            .to_string()
    };
    User {
        id: user.id.clone(),
        name: pick(&meta.full_name, name),
        username: pick(&meta.username, username),
        avatar: pick(&meta.avatar_url, avatar),
        joined_date: Utc::now(),
    }
}

/// Data-access service bound to one backend handle.
#[derive(Clone)]
pub struct DataService {
    backend: Arc<dyn Backend>,
    avatar_bucket: String,
}

impl DataService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            avatar_bucket: crate::constants::AVATAR_BUCKET.to_string(),
        }
    }

    /// Upload avatars to `bucket` instead of the default one.
    pub fn with_avatar_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.avatar_bucket = bucket.into();
        self
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }
}

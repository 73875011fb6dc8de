use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info};
use std::path::Path;

use super::{message_or, user_from_profile, DataError, DataService};
use crate::backend::BackendError;
use crate::constants::{AVATAR_DEFAULT_EXTENSION, ERROR_AVATAR_NOT_IMAGE, ERROR_AVATAR_TOO_LARGE, ERROR_NO_USER};
use crate::models::User;
use crate::utils::datetime::unix_millis;

const IMAGE_TYPES: [(&str, &str); 7] = [
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("avif", "image/avif"),
];

/// Why a file was refused as an avatar before upload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvatarCheckError {
    #[error("{}", ERROR_AVATAR_NOT_IMAGE)]
    NotAnImage,
    #[error("{} ({size} bytes)", ERROR_AVATAR_TOO_LARGE)]
    TooLarge { size: u64 },
}

/// An image file chosen for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AvatarFile {
    /// Wrap raw bytes; the content type is derived from the file extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file_name, bytes))
    }

    /// Extension used for the stored object, `png` when the name has none
    pub fn extension(&self) -> String {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| AVATAR_DEFAULT_EXTENSION.to_string())
    }

    /// Presentation-side check: an image type within `max_bytes`.
    pub fn check_image(&self, max_bytes: u64) -> Result<(), AvatarCheckError> {
        if !self.content_type.starts_with("image/") {
            return Err(AvatarCheckError::NotAnImage);
        }
        let size = self.bytes.len() as u64;
        if size > max_bytes {
            return Err(AvatarCheckError::TooLarge { size });
        }
        Ok(())
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    IMAGE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map_or("application/octet-stream", |(_, mime)| mime)
}

impl DataService {
    /// Upload a new avatar and point the profile at it.
    ///
    /// The profile is only updated after the upload and URL lookup both
    /// succeed, so every failure leaves the previous avatar in place.
    pub async fn upload_avatar(&self, file: AvatarFile) -> Result<User, DataError> {
        let user = match self.backend.get_user().await {
            Ok(Some(user)) => user,
            Ok(None) | Err(BackendError::Auth(_)) => return Err(DataError::NotAuthenticated),
            Err(e) => {
                error!("User lookup before avatar upload failed: {}", e);
                return Err(DataError::Data(message_or(&e, ERROR_NO_USER)));
            }
        };

        let path = format!("avatars/{}-{}.{}", user.id, unix_millis(&Utc::now()), file.extension());
        let content_type = file.content_type.clone();

        self.backend
            .upload_object(&self.avatar_bucket, &path, file.bytes, &content_type)
            .await
            .map_err(|e| {
                error!("Avatar upload failed: {}", e);
                DataError::AvatarUpload(e.message().to_string())
            })?;

        let public_url = self
            .backend
            .public_url(&self.avatar_bucket, &path)
            .filter(|url| !url.is_empty())
            .ok_or(DataError::AvatarUrl)?;

        let profile = self
            .backend
            .update_profile_avatar(&user.id, &public_url)
            .await
            .map_err(|e| {
                error!("Avatar profile update failed: {}", e);
                DataError::AvatarProfile(e.message().to_string())
            })?
            .ok_or_else(|| DataError::AvatarProfile("profile row not found".to_string()))?;

        info!("Avatar for {} updated to {}", user.id, public_url);
        Ok(user_from_profile(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_defaults_to_png() {
        assert_eq!(AvatarFile::new("me.JPG", vec![]).extension(), "jpg");
        assert_eq!(AvatarFile::new("me", vec![]).extension(), "png");
        assert_eq!(AvatarFile::new("me.", vec![]).extension(), "png");
    }

    #[test]
    fn check_image_rejects_non_images_and_large_files() {
        let text = AvatarFile::new("notes.txt", vec![1, 2, 3]);
        assert_eq!(text.check_image(10), Err(AvatarCheckError::NotAnImage));

        let big = AvatarFile::new("me.png", vec![0; 11]);
        assert_eq!(big.check_image(10), Err(AvatarCheckError::TooLarge { size: 11 }));

        let ok = AvatarFile::new("me.webp", vec![0; 10]);
        assert_eq!(ok.content_type, "image/webp");
        assert!(ok.check_image(10).is_ok());
    }
}

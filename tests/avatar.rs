use fittrack::backend::{Backend, FailPoint, MemoryBackend};
use fittrack::constants::AVATAR_MAX_BYTES;
use fittrack::data::{AvatarCheckError, AvatarFile, DataError, DataService};
use std::sync::Arc;

const PUBLIC_PREFIX: &str = "memory://local/object/public/";

async fn signed_in() -> (DataService, Arc<MemoryBackend>, String) {
    let backend = Arc::new(MemoryBackend::new());
    let handle: Arc<dyn Backend> = backend.clone();
    let data = DataService::new(handle);
    let user = data
        .register("ada@example.com", "Ada", "ada", "secret123")
        .await
        .unwrap();
    (data, backend, user.id)
}

fn png() -> AvatarFile {
    AvatarFile::new("me.png", vec![0x89, b'P', b'N', b'G'])
}

fn stored_avatar(backend: &MemoryBackend, user_id: &str) -> Option<String> {
    backend.profile(user_id).and_then(|p| p.avatar_url)
}

#[tokio::test]
async fn test_upload_updates_profile() {
    let (data, backend, user_id) = signed_in().await;

    let user = data.upload_avatar(png()).await.unwrap();

    assert_eq!(user.id, user_id);
    assert_eq!(stored_avatar(&backend, &user_id), Some(user.avatar.clone()));

    let object_key = user.avatar.strip_prefix(PUBLIC_PREFIX).unwrap();
    assert!(object_key.starts_with(&format!("avatars/avatars/{user_id}-")));
    assert!(object_key.ends_with(".png"));
    assert_eq!(backend.object(object_key), Some(vec![0x89, b'P', b'N', b'G']));
}

#[tokio::test]
async fn test_custom_bucket() {
    let (data, _, user_id) = signed_in().await;
    let data = data.with_avatar_bucket("profile-pictures");

    let user = data.upload_avatar(AvatarFile::new("me.webp", vec![1])).await.unwrap();

    let object_key = user.avatar.strip_prefix(PUBLIC_PREFIX).unwrap();
    assert!(object_key.starts_with(&format!("profile-pictures/avatars/{user_id}-")));
    assert!(object_key.ends_with(".webp"));
}

#[tokio::test]
async fn test_upload_failure_keeps_previous_avatar() {
    let (data, backend, user_id) = signed_in().await;
    let before = stored_avatar(&backend, &user_id);
    backend.fail_on(FailPoint::Upload);

    let err = data.upload_avatar(png()).await.unwrap_err();

    assert!(matches!(err, DataError::AvatarUpload(_)));
    assert!(err.to_string().contains("previous avatar is still in place"));
    assert_eq!(err.detail(), Some("injected failure: Upload"));
    assert_eq!(stored_avatar(&backend, &user_id), before);
}

#[tokio::test]
async fn test_missing_public_url_keeps_previous_avatar() {
    let (data, backend, user_id) = signed_in().await;
    let before = stored_avatar(&backend, &user_id);
    backend.fail_on(FailPoint::PublicUrl);

    let err = data.upload_avatar(png()).await.unwrap_err();

    assert_eq!(err, DataError::AvatarUrl);
    assert!(err.to_string().contains("previous avatar is still in place"));
    assert_eq!(stored_avatar(&backend, &user_id), before);
}

#[tokio::test]
async fn test_profile_update_failure_keeps_previous_avatar() {
    let (data, backend, user_id) = signed_in().await;
    let before = stored_avatar(&backend, &user_id);
    backend.fail_on(FailPoint::UpdateProfile);

    let err = data.upload_avatar(png()).await.unwrap_err();

    assert!(matches!(err, DataError::AvatarProfile(_)));
    assert!(err.to_string().contains("previous avatar is still in place"));
    assert_eq!(stored_avatar(&backend, &user_id), before);
}

#[tokio::test]
async fn test_upload_requires_session() {
    let (data, _, _) = signed_in().await;
    data.logout().await.unwrap();

    let err = data.upload_avatar(png()).await.unwrap_err();
    assert_eq!(err, DataError::NotAuthenticated);
}

#[tokio::test]
async fn test_user_lookup_failure_keeps_backend_message() {
    let (data, backend, user_id) = signed_in().await;
    let before = stored_avatar(&backend, &user_id);
    backend.fail_on(FailPoint::GetUser);

    let err = data.upload_avatar(png()).await.unwrap_err();

    assert_eq!(err, DataError::Data("injected failure: GetUser".to_string()));
    assert_eq!(stored_avatar(&backend, &user_id), before);
}

#[test]
fn test_check_image_limits() {
    assert_eq!(png().check_image(AVATAR_MAX_BYTES), Ok(()));
    assert_eq!(
        AvatarFile::new("resume.pdf", vec![1]).check_image(AVATAR_MAX_BYTES),
        Err(AvatarCheckError::NotAnImage)
    );

    let oversized = AvatarFile::new("big.jpg", vec![0; AVATAR_MAX_BYTES as usize + 1]);
    assert!(matches!(
        oversized.check_image(AVATAR_MAX_BYTES),
        Err(AvatarCheckError::TooLarge { .. })
    ));
}

#[test]
fn test_from_path_detects_content_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("avatar.jpeg");
    std::fs::write(&path, [1u8, 2, 3]).unwrap();

    let file = AvatarFile::from_path(&path).unwrap();
    assert_eq!(file.file_name, "avatar.jpeg");
    assert_eq!(file.content_type, "image/jpeg");
    assert_eq!(file.bytes, vec![1, 2, 3]);

    assert!(AvatarFile::from_path(&dir.path().join("missing.png")).is_err());
}

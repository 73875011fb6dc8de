//! Backend abstraction layer for the hosted backend-as-a-service.
//!
//! This module defines the interface the data-access layer uses to reach
//! authentication, relational storage, and object storage, along with the row
//! types and error handling shared by every implementation.

use async_trait::async_trait;

pub mod factory;
pub mod memory;
pub mod rows;
pub mod supabase;

pub use memory::{FailPoint, MemoryBackend};
pub use rows::{
    AuthSession, AuthUser, ExerciseRecord, ExerciseRow, NewExerciseRow, NewSetRow, NewWorkoutRow,
    OwnerRef, ProfileRow, SetRecord, SetRow, UserMetadata, WorkoutRecord, WorkoutRow,
};
pub use supabase::SupabaseBackend;

/// Common error types for backend operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Backend error: {0}")]
    Other(String),
}

impl BackendError {
    /// The backend's own message, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Auth(m)
            | Self::NotFound(m)
            | Self::Network(m)
            | Self::InvalidData(m)
            | Self::Rejected(m)
            | Self::Storage(m)
            | Self::Other(m) => m,
        }
    }
}

/// Backend trait that every backend-as-a-service adapter must implement.
///
/// Row-level primitives only: mapping to domain records, multi-step writes and
/// fallbacks live in [`crate::data::DataService`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Returns the backend type identifier (e.g., "supabase", "memory").
    fn backend_type(&self) -> &str;

    /// The endpoint this backend talks to, for diagnostics.
    fn endpoint(&self) -> &str;

    // Authentication
    async fn sign_up(&self, email: &str, password: &str, metadata: &UserMetadata) -> Result<AuthUser, BackendError>;
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BackendError>;
    async fn sign_out(&self) -> Result<(), BackendError>;
    /// The current session, or `None` when nobody is signed in.
    async fn get_session(&self) -> Result<Option<AuthSession>, BackendError>;
    /// The user behind the current session, verified with the backend.
    async fn get_user(&self) -> Result<Option<AuthUser>, BackendError>;

    // Profiles
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, BackendError>;
    async fn update_profile_avatar(&self, user_id: &str, avatar_url: &str) -> Result<Option<ProfileRow>, BackendError>;

    // Workouts
    /// Composite read of workouts with owner username, exercises and sets, newest first.
    async fn fetch_workouts(&self) -> Result<Vec<WorkoutRecord>, BackendError>;
    async fn insert_workout(&self, row: &NewWorkoutRow) -> Result<WorkoutRow, BackendError>;
    async fn insert_exercises(&self, rows: &[NewExerciseRow]) -> Result<Vec<ExerciseRow>, BackendError>;
    async fn insert_sets(&self, rows: &[NewSetRow]) -> Result<Vec<SetRow>, BackendError>;
    /// Delete a workout row; exercises and sets go with it.
    async fn delete_workout(&self, workout_id: &str) -> Result<(), BackendError>;

    // Object storage
    async fn upload_object(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BackendError>;
    fn public_url(&self, bucket: &str, path: &str) -> Option<String>;
}

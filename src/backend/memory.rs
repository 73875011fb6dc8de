//! In-process backend.
//!
//! Keeps accounts, profiles, workouts and objects in memory with the same
//! observable behavior as the hosted backend: a profile row materialized by a
//! sign-up "trigger", cascade deletes, newest-first composite reads and public
//! object URLs. Individual operations can be made to fail to exercise partial
//! failure paths.

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::rows::{
    AuthSession, AuthUser, ExerciseRecord, ExerciseRow, NewExerciseRow, NewSetRow, NewWorkoutRow, OwnerRef,
    ProfileRow, SetRecord, SetRow, UserMetadata, WorkoutRecord, WorkoutRow,
};
use super::{Backend, BackendError};

const MEMORY_ENDPOINT: &str = "memory://local";

/// Operations that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    SignUp,
    SignIn,
    GetUser,
    FetchProfile,
    UpdateProfile,
    FetchWorkouts,
    InsertWorkout,
    InsertExercises,
    InsertSets,
    DeleteWorkout,
    Upload,
    PublicUrl,
}

struct Account {
    password: String,
    user: AuthUser,
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    session: Option<AuthSession>,
    profiles: HashMap<String, ProfileRow>,
    workouts: Vec<WorkoutRow>,
    exercises: Vec<ExerciseRow>,
    sets: Vec<SetRow>,
    objects: HashMap<String, (Vec<u8>, String)>,
    failures: HashSet<FailPoint>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn check(&self, point: FailPoint) -> Result<(), BackendError> {
        if self.failures.contains(&point) {
            Err(BackendError::Rejected(format!("injected failure: {point:?}")))
        } else {
            Ok(())
        }
    }
}

/// Backend that lives entirely in process memory.
pub struct MemoryBackend {
    state: Mutex<State>,
    create_profiles: bool,
    reverse_batches: bool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            create_profiles: true,
            reverse_batches: false,
        }
    }

    /// Do not materialize profile rows at sign-up, as when the trigger has not run yet.
    pub fn without_profile_trigger(mut self) -> Self {
        self.create_profiles = false;
        self
    }

    /// Return batch-insert results in reverse submission order.
    pub fn with_reordered_batches(mut self) -> Self {
        self.reverse_batches = true;
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, BackendError> {
        self.state
            .lock()
            .map_err(|_| BackendError::Other("memory backend state poisoned".to_string()))
    }

    /// Make `point` fail until [`MemoryBackend::clear_failure`] is called.
    pub fn fail_on(&self, point: FailPoint) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.insert(point);
        }
    }

    pub fn clear_failure(&self, point: FailPoint) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.remove(&point);
        }
    }

    /// Insert or replace a profile row directly.
    pub fn put_profile(&self, profile: ProfileRow) {
        if let Ok(mut state) = self.state.lock() {
            state.profiles.insert(profile.id.clone(), profile);
        }
    }

    pub fn profile(&self, user_id: &str) -> Option<ProfileRow> {
        self.state.lock().ok()?.profiles.get(user_id).cloned()
    }

    pub fn workout_count(&self) -> usize {
        self.state.lock().map(|s| s.workouts.len()).unwrap_or(0)
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().ok()?.objects.get(path).map(|(bytes, _)| bytes.clone())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn backend_type(&self) -> &str {
        "memory"
    }

    fn endpoint(&self) -> &str {
        MEMORY_ENDPOINT
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: &UserMetadata) -> Result<AuthUser, BackendError> {
        let mut state = self.lock()?;
        state.check(FailPoint::SignUp)?;

        if state.accounts.contains_key(email) {
            return Err(BackendError::Auth("User already registered".to_string()));
        }
        if password.len() < 6 {
            return Err(BackendError::Auth("Password should be at least 6 characters".to_string()));
        }

        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
            user_metadata: metadata.clone(),
        };

        if self.create_profiles {
            let profile = ProfileRow {
                id: user.id.clone(),
                full_name: metadata.full_name.clone(),
                username: metadata.username.clone(),
                avatar_url: metadata.avatar_url.clone(),
                updated_at: Some(Utc::now()),
            };
            state.profiles.insert(user.id.clone(), profile);
        }

        state.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        state.session = Some(AuthSession {
            access_token: uuid::Uuid::new_v4().to_string(),
            refresh_token: None,
            expires_at: None,
            user: user.clone(),
        });

        debug!("memory backend: registered {}", user.id);
        Ok(user)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let mut state = self.lock()?;
        state.check(FailPoint::SignIn)?;

        let user = match state.accounts.get(email) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(BackendError::Auth("Invalid login credentials".to_string())),
        };

        let session = AuthSession {
            access_token: uuid::Uuid::new_v4().to_string(),
            refresh_token: Some(uuid::Uuid::new_v4().to_string()),
            expires_at: None,
            user,
        };
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.lock()?.session = None;
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<AuthSession>, BackendError> {
        Ok(self.lock()?.session.clone())
    }

    async fn get_user(&self) -> Result<Option<AuthUser>, BackendError> {
        let state = self.lock()?;
        state.check(FailPoint::GetUser)?;
        Ok(state.session.as_ref().map(|s| s.user.clone()))
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, BackendError> {
        let state = self.lock()?;
        state.check(FailPoint::FetchProfile)?;
        Ok(state.profiles.get(user_id).cloned())
    }

    async fn update_profile_avatar(&self, user_id: &str, avatar_url: &str) -> Result<Option<ProfileRow>, BackendError> {
        let mut state = self.lock()?;
        state.check(FailPoint::UpdateProfile)?;
        Ok(state.profiles.get_mut(user_id).map(|profile| {
            profile.avatar_url = Some(avatar_url.to_string());
            profile.updated_at = Some(Utc::now());
            profile.clone()
        }))
    }

    async fn fetch_workouts(&self) -> Result<Vec<WorkoutRecord>, BackendError> {
        let state = self.lock()?;
        state.check(FailPoint::FetchWorkouts)?;

        let mut records: Vec<WorkoutRecord> = state
            .workouts
            .iter()
            .map(|w| {
                let mut exercises: Vec<ExerciseRecord> = state
                    .exercises
                    .iter()
                    .filter(|e| e.workout_id == w.id)
                    .map(|e| ExerciseRecord {
                        id: e.id.clone(),
                        name: e.name.clone(),
                        order_index: e.order_index,
                        workout_sets: state
                            .sets
                            .iter()
                            .filter(|s| s.exercise_id == e.id)
                            .map(|s| SetRecord {
                                id: s.id.clone(),
                                reps: s.reps,
                                weight: s.weight,
                                completed: s.completed,
                            })
                            .collect(),
                    })
                    .collect();
                exercises.sort_by_key(|e| e.order_index.unwrap_or(i32::MAX));

                WorkoutRecord {
                    id: w.id.clone(),
                    user_id: w.user_id.clone(),
                    name: w.name.clone(),
                    date: w.date,
                    notes: w.notes.clone(),
                    profiles: state.profiles.get(&w.user_id).map(|p| OwnerRef {
                        username: p.username.clone(),
                    }),
                    exercises,
                }
            })
            .collect();

        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    async fn insert_workout(&self, row: &NewWorkoutRow) -> Result<WorkoutRow, BackendError> {
        let mut state = self.lock()?;
        state.check(FailPoint::InsertWorkout)?;

        let inserted = WorkoutRow {
            id: state.next_id(),
            user_id: row.user_id.clone(),
            name: row.name.clone(),
            date: row.date,
            notes: row.notes.clone(),
        };
        state.workouts.push(inserted.clone());
        Ok(inserted)
    }

    async fn insert_exercises(&self, rows: &[NewExerciseRow]) -> Result<Vec<ExerciseRow>, BackendError> {
        let mut state = self.lock()?;
        state.check(FailPoint::InsertExercises)?;

        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let exercise = ExerciseRow {
                id: state.next_id(),
                workout_id: row.workout_id.clone(),
                name: row.name.clone(),
                order_index: Some(row.order_index),
            };
            state.exercises.push(exercise.clone());
            inserted.push(exercise);
        }
        if self.reverse_batches {
            inserted.reverse();
        }
        Ok(inserted)
    }

    async fn insert_sets(&self, rows: &[NewSetRow]) -> Result<Vec<SetRow>, BackendError> {
        let mut state = self.lock()?;
        state.check(FailPoint::InsertSets)?;

        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let set = SetRow {
                id: state.next_id(),
                exercise_id: row.exercise_id.clone(),
                reps: row.reps,
                weight: row.weight,
                completed: row.completed,
            };
            state.sets.push(set.clone());
            inserted.push(set);
        }
        if self.reverse_batches {
            inserted.reverse();
        }
        Ok(inserted)
    }

    async fn delete_workout(&self, workout_id: &str) -> Result<(), BackendError> {
        let mut state = self.lock()?;
        state.check(FailPoint::DeleteWorkout)?;

        let exercise_ids: HashSet<String> = state
            .exercises
            .iter()
            .filter(|e| e.workout_id == workout_id)
            .map(|e| e.id.clone())
            .collect();
        state.sets.retain(|s| !exercise_ids.contains(&s.exercise_id));
        state.exercises.retain(|e| e.workout_id != workout_id);
        state.workouts.retain(|w| w.id != workout_id);
        Ok(())
    }

    async fn upload_object(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BackendError> {
        let mut state = self.lock()?;
        if state.failures.contains(&FailPoint::Upload) {
            return Err(BackendError::Storage("injected failure: Upload".to_string()));
        }
        state
            .objects
            .insert(format!("{bucket}/{path}"), (bytes, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Option<String> {
        let state = self.state.lock().ok()?;
        if state.failures.contains(&FailPoint::PublicUrl) {
            return None;
        }
        Some(format!("{MEMORY_ENDPOINT}/object/public/{bucket}/{path}"))
    }
}

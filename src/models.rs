//! Domain records shared by the data-access layer, the coach, and the CLI.
//!
//! These are plain value types. The backend's relational rows live in
//! [`crate::backend`] and are mapped into these records by [`crate::data`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ERROR_WORKOUT_EXERCISES_REQUIRED, ERROR_WORKOUT_NAME_REQUIRED};

/// A signed-in user as seen by the client (read copy of the profile row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub avatar: String,
    pub joined_date: DateTime<Utc>,
}

impl User {
    /// First word of the display name, used for greetings
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// A single set: reps at a given weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: String,
    pub reps: u32,
    pub weight: f64,
    pub completed: bool,
}

impl WorkoutSet {
    pub fn new(reps: u32, weight: f64, completed: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            reps,
            weight,
            completed,
        }
    }

    /// Weight moved across all reps of this set
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub sets: Vec<WorkoutSet>,
}

impl Exercise {
    /// Create an exercise with one blank set, the way the logger form starts.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            sets: vec![WorkoutSet::new(0, 0.0, false)],
        }
    }

    /// Create an exercise from explicit sets.
    pub fn with_sets(name: impl Into<String>, sets: Vec<WorkoutSet>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            sets,
        }
    }

    /// Append a set pre-filled with the previous set's reps and weight.
    pub fn add_set(&mut self) -> &mut WorkoutSet {
        let (reps, weight) = self.sets.last().map_or((0, 0.0), |s| (s.reps, s.weight));
        self.sets.push(WorkoutSet::new(reps, weight, false));
        let last = self.sets.len() - 1;
        &mut self.sets[last]
    }

    /// Remove a set by id. Returns whether anything was removed.
    pub fn remove_set(&mut self, set_id: &str) -> bool {
        let before = self.sets.len();
        self.sets.retain(|s| s.id != set_id);
        self.sets.len() != before
    }

    pub fn volume(&self) -> f64 {
        self.sets.iter().map(WorkoutSet::volume).sum()
    }
}

/// A logged workout. Created wholly client-side and persisted as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    /// Owner display name copied at creation for feed rendering
    pub user_name: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub notes: String,
    pub exercises: Vec<Exercise>,
}

/// Compact per-workout summary sent to the coach.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSummary {
    pub date: DateTime<Utc>,
    pub name: String,
    pub total_exercises: usize,
    pub volume: f64,
}

/// Reasons a workout draft cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", ERROR_WORKOUT_NAME_REQUIRED)]
    MissingName,
    #[error("{}", ERROR_WORKOUT_EXERCISES_REQUIRED)]
    NoExercises,
}

impl Workout {
    /// Start a new workout for `owner`, stamped with the current time.
    pub fn draft(owner: &User, name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: owner.id.clone(),
            user_name: owner.name.clone(),
            name: name.into(),
            date: Utc::now(),
            notes: notes.into(),
            exercises: Vec::new(),
        }
    }

    pub fn add_exercise(&mut self, exercise: Exercise) -> &mut Exercise {
        self.exercises.push(exercise);
        let last = self.exercises.len() - 1;
        &mut self.exercises[last]
    }

    pub fn remove_exercise(&mut self, exercise_id: &str) -> bool {
        let before = self.exercises.len();
        self.exercises.retain(|e| e.id != exercise_id);
        self.exercises.len() != before
    }

    /// Total weight moved in this workout
    pub fn volume(&self) -> f64 {
        self.exercises.iter().map(Exercise::volume).sum()
    }

    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    pub fn summary(&self) -> WorkoutSummary {
        WorkoutSummary {
            date: self.date,
            name: self.name.clone(),
            total_exercises: self.exercises.len(),
            volume: self.volume(),
        }
    }

    /// Check a draft before submission.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.exercises.is_empty() {
            return Err(ValidationError::NoExercises);
        }
        Ok(())
    }
}

use log::{debug, error, info, warn};
use std::collections::HashMap;

use super::{message_or, DataError, DataService};
use crate::backend::{BackendError, NewExerciseRow, NewSetRow, NewWorkoutRow, WorkoutRecord};
use crate::constants::{ERROR_LOAD_WORKOUTS, ERROR_SAVE_EXERCISES, ERROR_SAVE_SETS, ERROR_SAVE_WORKOUT, UNKNOWN_OWNER};
use crate::models::{Exercise, Workout, WorkoutSet};

fn workout_from_record(record: WorkoutRecord) -> Workout {
    let user_name = record
        .profiles
        .and_then(|p| p.username)
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| UNKNOWN_OWNER.to_string());

    Workout {
        id: record.id,
        user_id: record.user_id,
        user_name,
        name: record.name,
        date: record.date,
        notes: record.notes.unwrap_or_default(),
        exercises: record
            .exercises
            .into_iter()
            .map(|e| Exercise {
                id: e.id,
                name: e.name,
                sets: e
                    .workout_sets
                    .into_iter()
                    .map(|s| WorkoutSet {
                        id: s.id,
                        reps: s.reps,
                        weight: s.weight,
                        completed: s.completed,
                    })
                    .collect(),
            })
            .collect(),
    }
}

impl DataService {
    /// All visible workouts, newest first.
    pub async fn list_workouts(&self) -> Result<Vec<Workout>, DataError> {
        let records = self.backend.fetch_workouts().await.map_err(|e| {
            error!("Loading workouts failed: {}", e);
            DataError::Data(message_or(&e, ERROR_LOAD_WORKOUTS))
        })?;

        let mut workouts: Vec<Workout> = records.into_iter().map(workout_from_record).collect();
        workouts.sort_by(|a, b| b.date.cmp(&a.date));
        debug!("Loaded {} workouts", workouts.len());
        Ok(workouts)
    }

    /// Workouts owned by `user_id`, newest first.
    pub async fn list_user_workouts(&self, user_id: &str) -> Result<Vec<Workout>, DataError> {
        let mut workouts = self.list_workouts().await?;
        workouts.retain(|w| w.user_id == user_id);
        Ok(workouts)
    }

    /// Persist a workout with its exercises and sets. Returns the stored workout id.
    ///
    /// Three dependent writes: the workout row, then every exercise (one batch),
    /// then every set (one batch). Exercise rows are matched back to their sets
    /// by `order_index`. If the second or third write fails, the workout row is
    /// deleted again; if that delete fails too, the error names the orphan.
    pub async fn save_workout(&self, workout: &Workout) -> Result<String, DataError> {
        let notes = Some(workout.notes.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        let row = NewWorkoutRow {
            user_id: workout.user_id.clone(),
            name: workout.name.clone(),
            date: workout.date,
            notes,
        };

        let stored = self.backend.insert_workout(&row).await.map_err(|e| {
            error!("Saving workout failed: {}", e);
            DataError::Save {
                message: format!("{}: {}", ERROR_SAVE_WORKOUT, message_or(&e, "no row returned")),
                orphaned_workout: None,
            }
        })?;
        let workout_id = stored.id;

        let exercise_rows: Vec<NewExerciseRow> = workout
            .exercises
            .iter()
            .enumerate()
            .map(|(index, exercise)| NewExerciseRow {
                workout_id: workout_id.clone(),
                name: exercise.name.clone(),
                order_index: index as i32,
            })
            .collect();

        let inserted = match self.backend.insert_exercises(&exercise_rows).await {
            Ok(rows) => rows,
            Err(e) => return Err(self.compensate(&workout_id, ERROR_SAVE_EXERCISES, &e).await),
        };

        let ids_by_index: HashMap<i32, String> = inserted
            .into_iter()
            .filter_map(|row| row.order_index.map(|index| (index, row.id)))
            .collect();

        let mut set_rows = Vec::with_capacity(workout.set_count());
        for (index, exercise) in workout.exercises.iter().enumerate() {
            let Some(exercise_id) = ids_by_index.get(&(index as i32)) else {
                let missing = BackendError::InvalidData(format!("no exercise row returned for position {index}"));
                return Err(self.compensate(&workout_id, ERROR_SAVE_EXERCISES, &missing).await);
            };
            set_rows.extend(exercise.sets.iter().map(|set| NewSetRow {
                exercise_id: exercise_id.clone(),
                reps: set.reps,
                weight: set.weight,
                completed: set.completed,
            }));
        }

        if !set_rows.is_empty() {
            if let Err(e) = self.backend.insert_sets(&set_rows).await {
                return Err(self.compensate(&workout_id, ERROR_SAVE_SETS, &e).await);
            }
        }

        info!(
            "Saved workout {} ({} exercises, {} sets)",
            workout_id,
            workout.exercises.len(),
            set_rows.len()
        );
        Ok(workout_id)
    }

    /// Delete a partially written workout and build the error for the failed step.
    async fn compensate(&self, workout_id: &str, step: &str, cause: &BackendError) -> DataError {
        error!("{} for workout {}: {}", step, workout_id, cause);
        let message = format!("{}: {}", step, message_or(cause, "unknown error"));

        match self.backend.delete_workout(workout_id).await {
            Ok(()) => {
                warn!("Removed partially saved workout {}", workout_id);
                DataError::Save {
                    message,
                    orphaned_workout: None,
                }
            }
            Err(e) => {
                error!("Could not remove partially saved workout {}: {}", workout_id, e);
                DataError::Save {
                    message,
                    orphaned_workout: Some(workout_id.to_string()),
                }
            }
        }
    }
}

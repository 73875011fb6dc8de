//! Row types exchanged with the backend.
//!
//! Column names match the relational schema (`profiles`, `workouts`, `exercises`,
//! `workout_sets`). Deserialization is lenient about representation: identifiers
//! may be UUID strings or integers, and numeric columns may come back as numbers
//! or numeric strings depending on the column type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::datetime::flexible;

/// Profile metadata attached to an account at sign-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Authentication record owned by the identity service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "de::metadata_or_null")]
    pub user_metadata: UserMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now.timestamp())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default, deserialize_with = "flexible::option::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWorkoutRow {
    pub user_id: String,
    pub name: String,
    #[serde(with = "flexible")]
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRow {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(deserialize_with = "de::id")]
    pub user_id: String,
    pub name: String,
    #[serde(with = "flexible")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewExerciseRow {
    pub workout_id: String,
    pub name: String,
    /// Position within the workout; echoed back and used to correlate inserted rows
    pub order_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRow {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(deserialize_with = "de::id")]
    pub workout_id: String,
    pub name: String,
    #[serde(default)]
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSetRow {
    pub exercise_id: String,
    pub reps: u32,
    pub weight: f64,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRow {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(deserialize_with = "de::id")]
    pub exercise_id: String,
    #[serde(deserialize_with = "de::reps")]
    pub reps: u32,
    #[serde(deserialize_with = "de::number")]
    pub weight: f64,
    #[serde(default, deserialize_with = "de::bool_or_null")]
    pub completed: bool,
}

/// Owner columns embedded through `profiles:user_id(username)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnerRef {
    #[serde(default)]
    pub username: Option<String>,
}

/// One row of the composite workout read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(deserialize_with = "de::id")]
    pub user_id: String,
    pub name: String,
    #[serde(with = "flexible")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub profiles: Option<OwnerRef>,
    #[serde(default, deserialize_with = "de::vec_or_null")]
    pub exercises: Vec<ExerciseRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub order_index: Option<i32>,
    #[serde(default, deserialize_with = "de::vec_or_null")]
    pub workout_sets: Vec<SetRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(deserialize_with = "de::reps")]
    pub reps: u32,
    #[serde(deserialize_with = "de::number")]
    pub weight: f64,
    #[serde(default, deserialize_with = "de::bool_or_null")]
    pub completed: bool,
}

mod de {
    use super::*;
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Text(String),
        Int(i64),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberRepr {
        Float(f64),
        Text(String),
    }

    pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match IdRepr::deserialize(deserializer)? {
            IdRepr::Text(s) => Ok(s),
            IdRepr::Int(i) => Ok(i.to_string()),
        }
    }

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = match Option::<NumberRepr>::deserialize(deserializer)? {
            None => 0.0,
            Some(NumberRepr::Float(f)) => f,
            Some(NumberRepr::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| Error::custom(format!("invalid number {s:?}: {e}")))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Error::custom(format!("invalid number: {value}")))
        }
    }

    pub fn reps<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = number(deserializer)?;
        if value >= 0.0 && value <= f64::from(u32::MAX) {
            Ok(value.round() as u32)
        } else {
            Err(Error::custom(format!("invalid reps value: {value}")))
        }
    }

    pub fn bool_or_null<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
    }

    pub fn vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn metadata_or_null<'de, D>(deserializer: D) -> Result<UserMetadata, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<UserMetadata>::deserialize(deserializer)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn composite_record_accepts_mixed_representations() {
        let raw = json!({
            "id": 42,
            "user_id": "8f1c",
            "name": "Leg Day",
            "date": "2024-01-05T10:00:00+00:00",
            "notes": null,
            "profiles": { "username": "ada" },
            "exercises": [{
                "id": 7,
                "name": "Squat",
                "order_index": 0,
                "workout_sets": [
                    { "id": 1, "reps": 5, "weight": "135.50", "completed": true },
                    { "id": 2, "reps": 5.0, "weight": 185, "completed": null }
                ]
            }]
        });

        let record: WorkoutRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.notes, None);
        let sets = &record.exercises[0].workout_sets;
        assert_eq!(sets[0].weight, 135.5);
        assert_eq!(sets[1].reps, 5);
        assert!(!sets[1].completed);
    }

    #[test]
    fn null_embeds_become_empty() {
        let raw = json!({
            "id": "w1",
            "user_id": "u1",
            "name": "Empty",
            "date": "2024-01-05T10:00:00Z",
            "profiles": null,
            "exercises": null
        });
        let record: WorkoutRecord = serde_json::from_value(raw).unwrap();
        assert!(record.exercises.is_empty());
        assert!(record.profiles.is_none());
    }

    #[test]
    fn negative_reps_are_rejected() {
        let raw = json!({ "id": 1, "exercise_id": 2, "reps": -3, "weight": 10, "completed": true });
        assert!(serde_json::from_value::<SetRow>(raw).is_err());
    }

    #[test]
    fn session_expiry() {
        let session = AuthSession {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: Some(100),
            user: AuthUser {
                id: "u".to_string(),
                email: None,
                user_metadata: UserMetadata::default(),
            },
        };
        let now = DateTime::from_timestamp(101, 0).unwrap();
        assert!(session.is_expired(now));
    }
}

//! Supabase backend implementation.
//!
//! Talks to the three Supabase HTTP services directly:
//! - GoTrue (`/auth/v1`) for sign-up, password sign-in, refresh, sign-out and user lookup
//! - PostgREST (`/rest/v1`) for the `profiles`, `workouts`, `exercises` and `workout_sets` tables
//! - Storage (`/storage/v1`) for avatar objects
//!
//! The session is kept in memory and mirrored into a [`SettingsStore`] so a later
//! process can pick it up again.

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info, warn};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::rows::{
    AuthSession, AuthUser, ExerciseRow, NewExerciseRow, NewSetRow, NewWorkoutRow, ProfileRow, SetRow,
    UserMetadata, WorkoutRecord, WorkoutRow,
};
use super::{Backend, BackendError};
use crate::constants::SETTING_SESSION;
use crate::storage::SettingsStore;

/// Columns pulled by the composite workout read
const WORKOUT_SELECT: &str = "id,user_id,name,date,notes,profiles:user_id(username),exercises(id,name,order_index,workout_sets(id,reps,weight,completed))";

/// Which service a request went to; drives error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Service {
    Auth,
    Rest,
    Storage,
}

#[derive(Default)]
struct SessionSlot {
    loaded: bool,
    session: Option<AuthSession>,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl From<TokenResponse> for AuthSession {
    fn from(token: TokenResponse) -> Self {
        let expires_at = token
            .expires_at
            .or_else(|| token.expires_in.map(|secs| Utc::now().timestamp() + secs));
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: token.user,
        }
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

/// Supabase backend implementation.
pub struct SupabaseBackend {
    client: Client,
    base_url: String,
    api_key: String,
    session: Mutex<SessionSlot>,
    session_store: Option<Arc<dyn SettingsStore>>,
}

impl SupabaseBackend {
    /// Create a backend for the project at `url` using its anon `key`.
    ///
    /// Nothing is sent over the network; the URL is only validated.
    pub fn new(url: &str, key: &str) -> Result<Self, BackendError> {
        let parsed = Url::parse(url.trim()).map_err(|e| BackendError::InvalidData(format!("Invalid URL '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(BackendError::InvalidData(format!(
                "Invalid URL '{url}': expected an http(s) URL with a host"
            )));
        }
        if key.trim().is_empty() {
            return Err(BackendError::InvalidData("API key cannot be empty".to_string()));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| BackendError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            api_key: key.trim().to_string(),
            session: Mutex::new(SessionSlot::default()),
            session_store: None,
        })
    }

    /// Persist the session through `store`.
    pub fn with_session_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Access token of the current session, loading and refreshing it as
    /// needed; the anon key when signed out.
    async fn bearer(&self) -> Result<String, BackendError> {
        Ok(self
            .get_session()
            .await?
            .map_or_else(|| self.api_key.clone(), |s| s.access_token))
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, BackendError> {
        let bearer = self.bearer().await?;
        Ok(self
            .client
            .request(method, self.url(path))
            .header("apikey", &self.api_key)
            .bearer_auth(bearer))
    }

    /// Pull the most specific message out of a Supabase error body.
    fn extract_error_message(status: StatusCode, body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                ["error_description", "msg", "message", "error"]
                    .iter()
                    .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
            })
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status.to_string()
                } else {
                    trimmed.to_string()
                }
            })
    }

    fn map_status_error(service: Service, status: StatusCode, body: &str) -> BackendError {
        let message = Self::extract_error_message(status, body);
        if service == Service::Storage {
            return BackendError::Storage(message);
        }
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Auth(message),
            StatusCode::NOT_FOUND => BackendError::NotFound(message),
            s if service == Service::Auth && s.is_client_error() => BackendError::Auth(message),
            s if s.is_client_error() => BackendError::Rejected(message),
            _ => BackendError::Other(message),
        }
    }

    async fn send_raw(service: Service, builder: RequestBuilder) -> Result<String, BackendError> {
        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::Network(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            error!("Supabase {:?} request failed with {}: {}", service, status, body);
            return Err(Self::map_status_error(service, status, &body));
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(service: Service, builder: RequestBuilder) -> Result<T, BackendError> {
        let body = Self::send_raw(service, builder).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse Supabase response: {} ({})", e, body);
            BackendError::InvalidData(format!("Failed to parse response: {e}"))
        })
    }

    async fn load_slot(&self) -> tokio::sync::MutexGuard<'_, SessionSlot> {
        let mut slot = self.session.lock().await;
        if !slot.loaded {
            slot.loaded = true;
            if let Some(store) = &self.session_store {
                match store.get(SETTING_SESSION).await {
                    Ok(Some(raw)) => match serde_json::from_str::<AuthSession>(&raw) {
                        Ok(session) => slot.session = Some(session),
                        Err(e) => warn!("Discarding unreadable stored session: {}", e),
                    },
                    Ok(None) => {}
                    Err(e) => warn!("Failed to read stored session: {}", e),
                }
            }
        }
        slot
    }

    async fn store_session(&self, session: Option<AuthSession>) {
        {
            let mut slot = self.session.lock().await;
            slot.loaded = true;
            slot.session = session.clone();
        }

        let Some(store) = &self.session_store else {
            return;
        };
        let result = match &session {
            Some(s) => match serde_json::to_string(s) {
                Ok(raw) => store.set(SETTING_SESSION, &raw).await,
                Err(e) => Err(e.into()),
            },
            None => store.remove(SETTING_SESSION).await,
        };
        if let Err(e) = result {
            warn!("Failed to persist session: {}", e);
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let builder = self
            .client
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.api_key)
            .json(&json!({ "refresh_token": refresh_token }));
        let token: TokenResponse = Self::send_json(Service::Auth, builder).await?;
        Ok(token.into())
    }

    fn first_row<T>(rows: Vec<T>, what: &str) -> Result<T, BackendError> {
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::InvalidData(format!("{what} insert returned no rows")))
    }
}

#[async_trait]
impl Backend for SupabaseBackend {
    fn backend_type(&self) -> &str {
        "supabase"
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: &UserMetadata) -> Result<AuthUser, BackendError> {
        let builder = self
            .client
            .post(self.url("/auth/v1/signup"))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password, "data": metadata }));
        let body: Value = Self::send_json(Service::Auth, builder).await?;

        // With email confirmation disabled the response is a full session;
        // otherwise it is the bare user (or `{ user, session: null }`).
        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body)
                .map_err(|e| BackendError::InvalidData(format!("Failed to parse session: {e}")))?;
            let session: AuthSession = token.into();
            let user = session.user.clone();
            self.store_session(Some(session)).await;
            info!("Registered and signed in {}", user.id);
            return Ok(user);
        }

        let user_value = body.get("user").cloned().unwrap_or(body);
        let user: AuthUser = serde_json::from_value(user_value)
            .map_err(|e| BackendError::InvalidData(format!("Failed to parse user: {e}")))?;
        info!("Registered {} (awaiting confirmation)", user.id);
        Ok(user)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let builder = self
            .client
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&PasswordGrant { email, password });
        let token: TokenResponse = Self::send_json(Service::Auth, builder).await?;
        let session: AuthSession = token.into();
        self.store_session(Some(session.clone())).await;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let had_session = self.load_slot().await.session.is_some();
        let result = if had_session {
            match self.request(Method::POST, "/auth/v1/logout").await {
                Ok(builder) => Self::send_raw(Service::Auth, builder).await.map(|_| ()),
                Err(e) => Err(e),
            }
        } else {
            Ok(())
        };
        self.store_session(None).await;

        match result {
            // The token was already invalid; the local session is gone either way.
            Err(BackendError::Auth(message)) | Err(BackendError::NotFound(message)) => {
                debug!("Remote sign-out ignored: {}", message);
                Ok(())
            }
            other => other,
        }
    }

    async fn get_session(&self) -> Result<Option<AuthSession>, BackendError> {
        let current = self.load_slot().await.session.clone();
        let Some(session) = current else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.as_deref() else {
            self.store_session(None).await;
            return Ok(None);
        };
        match self.refresh(refresh_token).await {
            Ok(refreshed) => {
                debug!("Refreshed session for {}", refreshed.user.id);
                self.store_session(Some(refreshed.clone())).await;
                Ok(Some(refreshed))
            }
            Err(BackendError::Network(message)) => Err(BackendError::Network(message)),
            Err(e) => {
                warn!("Session refresh failed, signing out locally: {}", e);
                self.store_session(None).await;
                Ok(None)
            }
        }
    }

    async fn get_user(&self) -> Result<Option<AuthUser>, BackendError> {
        if self.get_session().await?.is_none() {
            return Ok(None);
        }
        let builder = self.request(Method::GET, "/auth/v1/user").await?;
        match Self::send_json::<AuthUser>(Service::Auth, builder).await {
            Ok(user) => Ok(Some(user)),
            Err(BackendError::Auth(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, BackendError> {
        let builder = self
            .request(Method::GET, "/rest/v1/profiles")
            .await?
            .query(&[("select", "*".to_string()), ("id", format!("eq.{user_id}"))]);
        let rows: Vec<ProfileRow> = Self::send_json(Service::Rest, builder).await?;
        Ok(rows.into_iter().next())
    }

    async fn update_profile_avatar(&self, user_id: &str, avatar_url: &str) -> Result<Option<ProfileRow>, BackendError> {
        let builder = self
            .request(Method::PATCH, "/rest/v1/profiles")
            .await?
            .query(&[("select", "*".to_string()), ("id", format!("eq.{user_id}"))])
            .header("Prefer", "return=representation")
            .json(&json!({ "avatar_url": avatar_url }));
        let rows: Vec<ProfileRow> = Self::send_json(Service::Rest, builder).await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_workouts(&self) -> Result<Vec<WorkoutRecord>, BackendError> {
        let builder = self.request(Method::GET, "/rest/v1/workouts").await?.query(&[
            ("select", WORKOUT_SELECT),
            ("order", "date.desc"),
            ("exercises.order", "order_index.asc"),
        ]);
        Self::send_json(Service::Rest, builder).await
    }

    async fn insert_workout(&self, row: &NewWorkoutRow) -> Result<WorkoutRow, BackendError> {
        let builder = self
            .request(Method::POST, "/rest/v1/workouts")
            .await?
            .header("Prefer", "return=representation")
            .json(row);
        let rows: Vec<WorkoutRow> = Self::send_json(Service::Rest, builder).await?;
        Self::first_row(rows, "workout")
    }

    async fn insert_exercises(&self, rows: &[NewExerciseRow]) -> Result<Vec<ExerciseRow>, BackendError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let builder = self
            .request(Method::POST, "/rest/v1/exercises")
            .await?
            .header("Prefer", "return=representation")
            .json(rows);
        Self::send_json(Service::Rest, builder).await
    }

    async fn insert_sets(&self, rows: &[NewSetRow]) -> Result<Vec<SetRow>, BackendError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let builder = self
            .request(Method::POST, "/rest/v1/workout_sets")
            .await?
            .header("Prefer", "return=representation")
            .json(rows);
        Self::send_json(Service::Rest, builder).await
    }

    async fn delete_workout(&self, workout_id: &str) -> Result<(), BackendError> {
        let builder = self
            .request(Method::DELETE, "/rest/v1/workouts")
            .await?
            .query(&[("id", format!("eq.{workout_id}"))]);
        Self::send_raw(Service::Rest, builder).await.map(|_| ())
    }

    async fn upload_object(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BackendError> {
        let builder = self
            .request(Method::POST, &format!("/storage/v1/object/{bucket}/{path}"))
            .await?
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        Self::send_raw(Service::Storage, builder).await.map(|_| ())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Option<String> {
        if bucket.is_empty() || path.is_empty() {
            return None;
        }
        Some(self.url(&format!("/storage/v1/object/public/{bucket}/{path}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_urls() {
        assert!(SupabaseBackend::new("not a url", "key").is_err());
        assert!(SupabaseBackend::new("ftp://example.com", "key").is_err());
        assert!(SupabaseBackend::new("https://example.supabase.co", "  ").is_err());
    }

    #[test]
    fn trims_trailing_slash() {
        let backend = SupabaseBackend::new("https://example.supabase.co/", "key").unwrap();
        assert_eq!(backend.endpoint(), "https://example.supabase.co");
        assert_eq!(
            backend.public_url("avatars", "avatars/u1-1.png").as_deref(),
            Some("https://example.supabase.co/storage/v1/object/public/avatars/avatars/u1-1.png")
        );
    }

    #[test]
    fn error_message_prefers_specific_fields() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            SupabaseBackend::extract_error_message(status, r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            SupabaseBackend::extract_error_message(status, r#"{"code":"23505","message":"duplicate key"}"#),
            "duplicate key"
        );
        assert_eq!(SupabaseBackend::extract_error_message(status, ""), "400 Bad Request");
    }

    #[test]
    fn auth_client_errors_map_to_auth() {
        let err = SupabaseBackend::map_status_error(Service::Auth, StatusCode::UNPROCESSABLE_ENTITY, r#"{"msg":"User already registered"}"#);
        assert_eq!(err, BackendError::Auth("User already registered".to_string()));

        let err = SupabaseBackend::map_status_error(Service::Rest, StatusCode::CONFLICT, r#"{"message":"conflict"}"#);
        assert_eq!(err, BackendError::Rejected("conflict".to_string()));

        let err = SupabaseBackend::map_status_error(Service::Storage, StatusCode::UNAUTHORIZED, r#"{"message":"denied"}"#);
        assert_eq!(err, BackendError::Storage("denied".to_string()));
    }
}

//! Backend factory for creating backend instances from credentials.

use anyhow::{anyhow, Result};
use std::sync::Arc;

use super::{supabase::SupabaseBackend, Backend};
use crate::connection::Credentials;
use crate::storage::SettingsStore;

/// Create a backend instance from a credential pair.
///
/// Only the HTTP backend is built here. The in-process
/// [`MemoryBackend`](super::MemoryBackend) keeps its state for the life of one
/// value, so it is handed to [`crate::connection::ConnectionManager::with_backend`]
/// directly instead.
///
/// # Arguments
/// * `credentials` - Endpoint URL and API key
/// * `session_store` - Where the backend persists its auth session, if anywhere
///
/// # Returns
/// A shared Backend trait object
///
/// # Errors
/// Returns error if:
/// - The endpoint is not a valid http(s) URL
/// - The key is empty
pub fn create_backend(
    credentials: &Credentials,
    session_store: Option<Arc<dyn SettingsStore>>,
) -> Result<Arc<dyn Backend>> {
    let backend = SupabaseBackend::new(&credentials.url, &credentials.key)
        .map_err(|e| anyhow!("Failed to create Supabase backend: {}", e))?;
    let backend = match session_store {
        Some(store) => backend.with_session_store(store),
        None => backend,
    };
    Ok(Arc::new(backend))
}

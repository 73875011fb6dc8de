//! Connection holder for the backend-as-a-service.
//!
//! Resolves the project URL and anon key from locally stored settings and
//! deployment defaults, and owns the live backend handle. Callers never reach a
//! global client: they ask the manager for [`ConnectionManager::current`] or a
//! [`DataService`] bound to it, so rebinding after a settings change only
//! affects services built afterwards.

use anyhow::{Context, Result};
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::factory::create_backend;
use crate::backend::Backend;
use crate::config::Config;
use crate::constants::{PLACEHOLDER_KEY, PLACEHOLDER_MARKER, PLACEHOLDER_URL, SETTING_SUPABASE_KEY, SETTING_SUPABASE_URL};
use crate::data::DataService;
use crate::storage::SettingsStore;

/// Endpoint and key for one backend project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub key: String,
}

impl Credentials {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
        }
    }

    fn placeholder() -> Self {
        Self::new(PLACEHOLDER_URL, PLACEHOLDER_KEY)
    }

    /// Whether these are real credentials rather than placeholders
    pub fn is_real(&self) -> bool {
        let url = self.url.to_ascii_lowercase();
        (url.starts_with("https://") || url.starts_with("http://"))
            && !self.key.is_empty()
            && !self.url.contains(PLACEHOLDER_MARKER)
            && self.key != PLACEHOLDER_KEY
    }
}

/// Deployment-time defaults, captured once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDefaults {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl EnvDefaults {
    /// Read the environment variables named in the config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            supabase_url: read_env(&config.backend.url_env),
            supabase_key: read_env(&config.backend.key_env),
            gemini_api_key: read_env(&config.coach.api_key_env),
        }
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Holds the credentials and the live backend handle.
pub struct ConnectionManager {
    settings: Arc<dyn SettingsStore>,
    env: EnvDefaults,
    current: RwLock<Arc<dyn Backend>>,
}

impl ConnectionManager {
    /// Resolve credentials and bind the initial backend.
    ///
    /// Falls back to placeholder credentials when nothing resolves, so the
    /// handle always exists; [`ConnectionManager::is_configured`] reports whether
    /// it is usable.
    pub async fn new(settings: Arc<dyn SettingsStore>, env: EnvDefaults) -> Result<Self> {
        let credentials = Self::resolve_from(settings.as_ref(), &env)
            .await?
            .unwrap_or_else(Credentials::placeholder);

        let backend = match create_backend(&credentials, Some(Arc::clone(&settings))) {
            Ok(backend) => backend,
            Err(e) => {
                log::warn!("Stored backend credentials are unusable, using placeholder: {}", e);
                create_backend(&Credentials::placeholder(), Some(Arc::clone(&settings)))?
            }
        };
        debug!("Bound {} backend at {}", backend.backend_type(), backend.endpoint());

        Ok(Self {
            settings,
            env,
            current: RwLock::new(backend),
        })
    }

    /// Build a manager around an existing backend, e.g. an in-process one.
    pub fn with_backend(settings: Arc<dyn SettingsStore>, env: EnvDefaults, backend: Arc<dyn Backend>) -> Self {
        Self {
            settings,
            env,
            current: RwLock::new(backend),
        }
    }

    async fn resolve_from(settings: &dyn SettingsStore, env: &EnvDefaults) -> Result<Option<Credentials>> {
        let stored_url = non_empty(settings.get(SETTING_SUPABASE_URL).await.context("Failed to read stored URL")?);
        let stored_key = non_empty(settings.get(SETTING_SUPABASE_KEY).await.context("Failed to read stored key")?);

        let url = stored_url.or_else(|| non_empty(env.supabase_url.clone()));
        let key = stored_key.or_else(|| non_empty(env.supabase_key.clone()));

        Ok(match (url, key) {
            (Some(url), Some(key)) => Some(Credentials { url, key }),
            _ => None,
        })
    }

    /// Stored values win over environment defaults, field by field.
    pub async fn resolve_credentials(&self) -> Result<Option<Credentials>> {
        Self::resolve_from(self.settings.as_ref(), &self.env).await
    }

    /// True when both values resolve and neither is a placeholder.
    pub async fn is_configured(&self) -> Result<bool> {
        Ok(self
            .resolve_credentials()
            .await?
            .is_some_and(|credentials| credentials.is_real()))
    }

    /// Persist new credentials and rebind the live handle.
    ///
    /// The new backend is built before anything is written, so a failure leaves
    /// both the stored settings and the current handle untouched.
    pub async fn save_config(&self, url: &str, key: &str) -> Result<()> {
        let credentials = Credentials::new(url.trim(), key.trim());
        let backend = create_backend(&credentials, Some(Arc::clone(&self.settings)))?;

        let mut current = self.current.write().await;
        self.settings
            .set(SETTING_SUPABASE_URL, &credentials.url)
            .await
            .context("Failed to save URL")?;
        if let Err(e) = self.settings.set(SETTING_SUPABASE_KEY, &credentials.key).await {
            // Best effort: keep the pair consistent with what is bound.
            let _ = self.settings.remove(SETTING_SUPABASE_URL).await;
            return Err(e.context("Failed to save key"));
        }
        *current = backend;

        info!("Backend configuration saved for {}", credentials.url);
        Ok(())
    }

    /// Remove stored credentials and rebind to the defaults or placeholders.
    pub async fn clear_config(&self) -> Result<()> {
        let mut current = self.current.write().await;
        self.settings.remove(SETTING_SUPABASE_URL).await.context("Failed to clear URL")?;
        self.settings.remove(SETTING_SUPABASE_KEY).await.context("Failed to clear key")?;

        let credentials = match (non_empty(self.env.supabase_url.clone()), non_empty(self.env.supabase_key.clone())) {
            (Some(url), Some(key)) => Credentials { url, key },
            _ => Credentials::placeholder(),
        };
        *current = match create_backend(&credentials, Some(Arc::clone(&self.settings))) {
            Ok(backend) => backend,
            Err(_) => create_backend(&Credentials::placeholder(), Some(Arc::clone(&self.settings)))?,
        };

        info!("Backend configuration cleared");
        Ok(())
    }

    /// The live backend handle
    pub async fn current(&self) -> Arc<dyn Backend> {
        Arc::clone(&*self.current.read().await)
    }

    /// A data-access service bound to the current handle
    pub async fn data_service(&self) -> DataService {
        DataService::new(self.current().await)
    }

    pub fn env(&self) -> &EnvDefaults {
        &self.env
    }
}

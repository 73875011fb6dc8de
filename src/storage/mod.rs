//! Local storage module for client-side settings persistence
//!
//! This module provides:
//! - The [`SettingsStore`] trait the connection holder and session persistence use
//! - [`LocalStorage`], a SQLite database accessed through SeaORM
//! - [`MemorySettings`], a process-local store for tests and ephemeral runs

use anyhow::Result;
use async_trait::async_trait;

pub mod db;
pub mod memory;
pub mod settings;

pub use db::LocalStorage;
pub use memory::MemorySettings;

/// String key/value settings that survive between runs.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

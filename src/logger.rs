//! Logging setup.
//!
//! The rest of the crate logs through the `log` macros. [`Logger::init`] installs a
//! `fern` dispatch that formats every record once and hands it to a [`Logger`],
//! which keeps a bounded in-memory buffer of recent lines and, when logging is
//! enabled in the config, appends them to a log file.

use anyhow::{Context, Result};
use chrono::Local;
use log::LevelFilter;
use once_cell::sync::OnceCell;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::LoggingConfig;
use crate::constants::LOG_BUFFER_CAPACITY;

static GLOBAL: OnceCell<Logger> = OnceCell::new();

/// Shared logger that can be used across the application
#[derive(Clone)]
pub struct Logger {
    logs: Arc<Mutex<VecDeque<String>>>,
    enabled: bool,
    level: LevelFilter,
    file_writer: Option<Arc<Mutex<BufWriter<File>>>>,
}

impl Logger {
    /// In-memory logger at `info` level with no file output
    pub fn new() -> Self {
        Self {
            logs: Arc::new(Mutex::new(VecDeque::with_capacity(LOG_BUFFER_CAPACITY))),
            enabled: false,
            level: LevelFilter::Info,
            file_writer: None,
        }
    }

    /// Build a logger from the `[logging]` section, writing to the default log file when enabled
    pub fn from_config(config: &LoggingConfig) -> Result<Self> {
        if config.enabled {
            Self::with_log_file(config, &Self::get_log_file_path()?)
        } else {
            Self::with_log_file(config, Path::new(""))
        }
    }

    /// Build a logger from the `[logging]` section, writing to `path` when enabled
    pub fn with_log_file(config: &LoggingConfig, path: &Path) -> Result<Self> {
        let level = config
            .level_filter()
            .with_context(|| format!("Invalid log level '{}'", config.level))?;

        let file_writer = if config.enabled {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(Arc::new(Mutex::new(BufWriter::new(file))))
        } else {
            None
        };

        Ok(Self {
            enabled: config.enabled,
            level,
            file_writer,
            ..Self::new()
        })
    }

    /// Install this logger as the `log` backend. Only the first call takes effect.
    pub fn init(&self) -> Result<()> {
        if GLOBAL.set(self.clone()).is_err() {
            return Ok(());
        }

        let sink = self.clone();
        fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{} {} {}] {}",
                    Local::now().format("%H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .level(self.level)
            .level_for("sqlx", LevelFilter::Warn)
            .level_for("sea_orm", LevelFilter::Warn)
            .level_for("hyper", LevelFilter::Warn)
            .level_for("hyper_util", LevelFilter::Warn)
            .level_for("reqwest", LevelFilter::Warn)
            .level_for("rustls", LevelFilter::Warn)
            .chain(fern::Output::call(move |record| sink.push(record.args().to_string())))
            .apply()
            .context("Failed to install logger")?;

        Ok(())
    }

    /// The logger installed by [`Logger::init`], if any
    pub fn global() -> Option<&'static Logger> {
        GLOBAL.get()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_file_writer(&self) -> bool {
        self.file_writer.is_some()
    }

    pub fn file_writer(&self) -> Option<&Arc<Mutex<BufWriter<File>>>> {
        self.file_writer.as_ref()
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Add a log entry directly, bypassing the `log` facade
    pub fn log(&self, message: impl Into<String>) {
        let line = format!("[{}] {}", Local::now().format("%H:%M:%S%.3f"), message.into());
        self.push(line);
    }

    fn push(&self, line: String) {
        if let Some(writer) = &self.file_writer {
            if let Ok(mut writer) = writer.lock() {
                let _ = writeln!(writer, "{line}");
                let _ = writer.flush();
            }
        }

        if let Ok(mut logs) = self.logs.lock() {
            if logs.len() == LOG_BUFFER_CAPACITY {
                logs.pop_front();
            }
            logs.push_back(line);
        }
    }

    /// Get all logs, newest first
    pub fn get_logs(&self) -> Vec<String> {
        self.logs
            .lock()
            .map(|logs| logs.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Clear all logs
    pub fn clear(&self) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.clear();
        }
    }

    /// Default log file location under the user's data directory
    pub fn get_log_file_path() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|dir| dir.join("fittrack").join("fittrack.log"))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

//! FitTrack - a workout tracking client with an AI coach
//!
//! This library provides the client side of a workout tracker whose accounts,
//! data and files live in a Supabase project, plus a coach backed by the
//! Gemini API. It includes the connection holder, the data-access layer,
//! dashboard statistics and a command-line front end.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`backend`] - Backend-as-a-service boundary and its implementations
//! * [`connection`] - Credential resolution and the live backend handle
//! * [`data`] - Data-access layer for auth, workouts and avatars
//! * [`coach`] - Hosted-model client and chat
//! * [`storage`] - Local settings persistence
//! * [`cli`] - Command-line interface

/// Backend abstraction layer for the hosted backend-as-a-service
pub mod backend;

/// Command-line front end
pub mod cli;

/// AI coach backed by a hosted text model
pub mod coach;

/// Configuration module for managing application settings
pub mod config;

/// Connection holder for backend credentials and the live client
pub mod connection;

/// Application constants and default values
pub mod constants;

/// Data-access layer mapping backend rows to domain records
pub mod data;

/// SeaORM entity models for database tables
pub mod entities;

/// Logging setup and recent-log buffer
pub mod logger;

/// Domain records: users, workouts, exercises and sets
pub mod models;

/// Repository layer for database operations
pub mod repositories;

/// Dashboard statistics
pub mod stats;

/// Local storage for settings and the auth session
pub mod storage;

/// Utility functions for date/time handling and other helpers
pub mod utils;

// Re-export the types most callers need
pub use entities::setting;
pub use models::{Exercise, User, Workout, WorkoutSet};

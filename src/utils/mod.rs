//! Utility modules for the FitTrack application.
//!
//! - [`datetime`] - Timestamp parsing, normalization and formatting

pub mod datetime;

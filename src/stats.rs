//! Dashboard aggregates computed from the loaded workouts.
//!
//! Every function takes the list as returned by
//! [`crate::data::DataService::list_workouts`], newest first.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Workout;
use crate::utils::datetime::format_chart_label;

/// Sessions shown in the volume chart
pub const CHART_SESSIONS: usize = 7;

/// Entries shown in the community feed
pub const FEED_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Short date label, e.g. "Jan 5"
    pub label: String,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastSession {
    pub name: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_workouts: usize,
    pub total_volume: f64,
    pub last_session: Option<LastSession>,
    /// Oldest first
    pub chart: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEntry {
    pub owner: String,
    pub workout_name: String,
    pub date: DateTime<Utc>,
    pub exercise_count: usize,
}

/// Stats for one user's own workouts.
pub fn dashboard_stats(workouts: &[Workout], user_id: &str) -> DashboardStats {
    let own: Vec<&Workout> = workouts.iter().filter(|w| w.user_id == user_id).collect();

    let mut chart: Vec<ChartPoint> = own
        .iter()
        .take(CHART_SESSIONS)
        .map(|w| ChartPoint {
            label: format_chart_label(&w.date),
            volume: w.volume(),
        })
        .collect();
    chart.reverse();

    DashboardStats {
        total_workouts: own.len(),
        total_volume: own.iter().map(|w| w.volume()).sum(),
        last_session: own.first().map(|w| LastSession {
            name: w.name.clone(),
            date: w.date,
        }),
        chart,
    }
}

/// Latest workouts across all users.
pub fn recent_activity(workouts: &[Workout], limit: usize) -> Vec<FeedEntry> {
    workouts
        .iter()
        .take(limit)
        .map(|w| FeedEntry {
            owner: w.user_name.clone(),
            workout_name: w.name.clone(),
            date: w.date,
            exercise_count: w.exercises.len(),
        })
        .collect()
}

/// Render a volume in thousands with one decimal, e.g. `12.3k`
pub fn format_volume_k(volume: f64) -> String {
    format!("{:.1}k", volume / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_in_thousands() {
        assert_eq!(format_volume_k(0.0), "0.0k");
        assert_eq!(format_volume_k(1600.0), "1.6k");
        assert_eq!(format_volume_k(12_345.0), "12.3k");
    }

    #[test]
    fn empty_history_has_no_last_session() {
        let stats = dashboard_stats(&[], "u1");
        assert_eq!(stats.total_workouts, 0);
        assert!(stats.last_session.is_none());
        assert!(stats.chart.is_empty());
    }
}

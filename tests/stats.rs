use chrono::{Duration, TimeZone, Utc};
use fittrack::models::{Exercise, Workout, WorkoutSet};
use fittrack::stats::{dashboard_stats, format_volume_k, recent_activity, CHART_SESSIONS, FEED_SIZE};

fn workout(id: &str, owner: &str, days_ago: i64, weight: f64) -> Workout {
    let today = Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap();
    Workout {
        id: id.to_string(),
        user_id: owner.to_string(),
        user_name: owner.to_string(),
        name: format!("Workout {id}"),
        date: today - Duration::days(days_ago),
        notes: String::new(),
        exercises: vec![Exercise::with_sets("Squat", vec![WorkoutSet::new(10, weight, true)])],
    }
}

#[test]
fn test_dashboard_counts_only_own_workouts() {
    let workouts = vec![
        workout("a", "ada", 0, 100.0),
        workout("b", "grace", 1, 50.0),
        workout("c", "ada", 2, 60.0),
    ];

    let stats = dashboard_stats(&workouts, "ada");

    assert_eq!(stats.total_workouts, 2);
    assert_eq!(stats.total_volume, 1600.0);
    assert_eq!(format_volume_k(stats.total_volume), "1.6k");
    let last = stats.last_session.unwrap();
    assert_eq!(last.name, "Workout a");
}

#[test]
fn test_chart_shows_latest_sessions_oldest_first() {
    let workouts: Vec<Workout> = (0..10)
        .map(|i| workout(&i.to_string(), "ada", i, 10.0 * (i + 1) as f64))
        .collect();

    let stats = dashboard_stats(&workouts, "ada");

    assert_eq!(stats.chart.len(), CHART_SESSIONS);
    assert_eq!(stats.chart.first().unwrap().label, "Jan 14");
    assert_eq!(stats.chart.last().unwrap().label, "Jan 20");
    assert_eq!(stats.chart.last().unwrap().volume, 100.0);
}

#[test]
fn test_recent_activity_spans_all_users() {
    let workouts = vec![
        workout("a", "ada", 0, 100.0),
        workout("b", "grace", 1, 50.0),
        workout("c", "linus", 2, 60.0),
    ];

    let feed = recent_activity(&workouts, FEED_SIZE);
    assert_eq!(feed.len(), 3);
    assert_eq!(feed[1].owner, "grace");
    assert_eq!(feed[1].workout_name, "Workout b");
    assert_eq!(feed[1].exercise_count, 1);

    assert_eq!(recent_activity(&workouts, 2).len(), 2);
    assert!(recent_activity(&[], FEED_SIZE).is_empty());
}

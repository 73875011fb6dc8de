use fittrack::config::LoggingConfig;
use fittrack::constants::LOG_BUFFER_CAPACITY;
use fittrack::logger::Logger;
use std::fs;
use std::io::Write;

fn logging(enabled: bool, level: &str) -> LoggingConfig {
    LoggingConfig {
        enabled,
        level: level.to_string(),
    }
}

#[test]
fn test_config_based_logging_disabled() {
    let logger = Logger::from_config(&logging(false, "info")).unwrap();
    assert!(!logger.is_enabled());
    assert!(!logger.has_file_writer());

    logger.log("Test message");
    let logs = logger.get_logs();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].contains("Test message"));
}

#[test]
fn test_config_based_logging_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("logs").join("fittrack.log");

    let logger = Logger::with_log_file(&logging(true, "debug"), &log_path).unwrap();
    assert!(logger.is_enabled());
    assert!(logger.has_file_writer());
    assert_eq!(logger.level(), log::LevelFilter::Debug);

    logger.log("Test message with file");

    let logs = logger.get_logs();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].contains("Test message with file"));

    if let Some(writer_arc) = logger.file_writer() {
        if let Ok(mut writer) = writer_arc.lock() {
            let _ = writer.flush();
        }
    }
    let file_content = fs::read_to_string(&log_path).unwrap();
    assert!(file_content.contains("Test message with file"));
}

#[test]
fn test_invalid_level_is_rejected() {
    assert!(Logger::from_config(&logging(false, "loud")).is_err());
}

#[test]
fn test_logs_are_newest_first_and_bounded() {
    let logger = Logger::new();
    for i in 0..LOG_BUFFER_CAPACITY + 10 {
        logger.log(format!("line {i}"));
    }

    let logs = logger.get_logs();
    assert_eq!(logs.len(), LOG_BUFFER_CAPACITY);
    assert!(logs[0].ends_with(&format!("line {}", LOG_BUFFER_CAPACITY + 9)));
    assert!(logs.last().unwrap().ends_with("line 10"));

    logger.clear();
    assert!(logger.get_logs().is_empty());
}

#[test]
fn test_log_file_path_is_under_data_dir() {
    if let Ok(path) = Logger::get_log_file_path() {
        assert!(path.ends_with("fittrack/fittrack.log"));
    }
}

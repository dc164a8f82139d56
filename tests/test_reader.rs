use log_reader::{LogEntry, LogReader, ReadError, SearchCriteria};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::{TempDir, tempdir};

fn write_log(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("failed to write test log");
    path
}

/// Pin a file's mtime so discovery order is deterministic.
fn set_modified(path: &Path, seconds_after_epoch: u64) {
    let file = File::options()
        .write(true)
        .open(path)
        .expect("open for set_modified");
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(seconds_after_epoch))
        .expect("set_modified");
}

fn sample_dir() -> TempDir {
    let dir = tempdir().expect("temp dir");
    let newer = write_log(
        dir.path(),
        "laravel.log",
        "[2024-01-02 09:00:00] app.INFO: User logged in [] []\n\
         [2024-01-02 09:00:01] security.ERROR: Database connection failed [] []\n\
         [2024-01-02 09:00:02] app.DEBUG: Cache hit [] []\n",
    );
    let older = write_log(
        dir.path(),
        "app_staging.log",
        "[2024-01-01 08:00:00] app.INFO: Deploy started [] []\n\
         [2024-01-01 08:00:01] app.ERROR: Deploy failed [] []\n",
    );
    set_modified(&older, 1_000);
    set_modified(&newer, 2_000);
    dir
}

#[test]
fn test_empty_directory_lists_nothing() {
    let dir = tempdir().expect("temp dir");
    let reader = LogReader::new(dir.path());
    assert!(reader.log_files().is_empty());
    assert!(reader.log_files_for_environment("staging").is_empty());
}

#[test]
fn test_missing_directory_lists_nothing() {
    let reader = LogReader::new("/definitely/not/a/real/log/root");
    assert!(reader.log_files().is_empty());
    assert!(reader.read_all(&SearchCriteria::new()).next().is_none());
}

#[test]
fn test_files_ordered_most_recent_first() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());
    let names: Vec<String> = reader
        .log_files()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["laravel.log", "app_staging.log"]);
}

#[test]
fn test_non_log_files_are_ignored() {
    let dir = sample_dir();
    write_log(dir.path(), "notes.txt", "not a log\n");
    let reader = LogReader::new(dir.path());
    assert_eq!(reader.log_files().len(), 2);
}

#[test]
fn test_environment_filter_matches_both_naming_conventions() {
    let dir = tempdir().expect("temp dir");
    let a = write_log(dir.path(), "staging.log", "");
    let b = write_log(dir.path(), "app_staging.log", "");
    let c = write_log(dir.path(), "production.log", "");
    set_modified(&a, 3_000);
    set_modified(&b, 2_000);
    set_modified(&c, 1_000);

    let reader = LogReader::new(dir.path());
    let names: Vec<String> = reader
        .log_files_for_environment("staging")
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["staging.log", "app_staging.log"]);
}

#[test]
fn test_read_all_streams_files_in_listed_order() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());
    let messages: Vec<String> = reader
        .read_all(&SearchCriteria::new())
        .map(|entry| entry.message)
        .collect();
    assert_eq!(
        messages,
        vec![
            "User logged in",
            "Database connection failed",
            "Cache hit",
            "Deploy started",
            "Deploy failed",
        ]
    );
}

#[test]
fn test_limit_bounds_the_stream() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());

    let criteria = SearchCriteria::new().with_limit(Some(2));
    assert_eq!(reader.read_all(&criteria).count(), 2);

    // A limit beyond the total yields everything that matches
    let criteria = SearchCriteria::new().with_limit(Some(50));
    assert_eq!(reader.read_all(&criteria).count(), 5);
}

#[test]
fn test_offset_applies_globally_across_files() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());

    // Skip past the whole first file and into the second
    let criteria = SearchCriteria::new().with_offset(4);
    let messages: Vec<String> = reader
        .read_all(&criteria)
        .map(|entry| entry.message)
        .collect();
    assert_eq!(messages, vec!["Deploy failed"]);

    let criteria = SearchCriteria::new().with_offset(99);
    assert_eq!(reader.read_all(&criteria).count(), 0);
}

#[test]
fn test_offset_and_limit_page_through_matches() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());

    let criteria = SearchCriteria::new().with_offset(1).with_limit(Some(2));
    let messages: Vec<String> = reader
        .read_all(&criteria)
        .map(|entry| entry.message)
        .collect();
    assert_eq!(messages, vec!["Database connection failed", "Cache hit"]);
}

#[test]
fn test_fresh_reads_reproduce_identical_sequences() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());
    let criteria = SearchCriteria::new().with_level(Some("ERROR"));

    let first: Vec<String> = reader
        .read_all(&criteria)
        .map(|entry| entry.message)
        .collect();
    let second: Vec<String> = reader
        .read_all(&criteria)
        .map(|entry| entry.message)
        .collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn test_search_term_finds_single_entry() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());

    let criteria = SearchCriteria::new().with_term(Some("logged in"));
    let entries: Vec<LogEntry> = reader.read_all(&criteria).collect();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].message.contains("User logged in"));
}

#[test]
fn test_level_filter_finds_errors() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());

    let criteria = SearchCriteria::new().with_level(Some("ERROR"));
    let entries: Vec<LogEntry> = reader.read_all(&criteria).collect();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry.level == "ERROR"));
}

#[test]
fn test_regex_criteria_against_stream() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());

    let criteria = SearchCriteria::new()
        .with_regex("Database.*failed")
        .expect("valid pattern");
    let entries: Vec<LogEntry> = reader.read_all(&criteria).collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].channel, "security");
}

#[test]
fn test_read_for_environment_only_touches_matching_files() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());

    let messages: Vec<String> = reader
        .read_for_environment("staging", &SearchCriteria::new())
        .map(|entry| entry.message)
        .collect();
    assert_eq!(messages, vec!["Deploy started", "Deploy failed"]);
}

#[test]
fn test_read_file_not_found_is_an_error() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());

    let result = reader.read_file("missing.log", &SearchCriteria::new());
    assert!(matches!(result, Err(ReadError::NotFound { .. })));
}

#[test]
fn test_read_files_skips_missing_members_silently() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());

    let paths = vec![PathBuf::from("missing.log"), PathBuf::from("laravel.log")];
    let entries: Vec<LogEntry> = reader
        .read_files(&paths, &SearchCriteria::new())
        .collect();
    assert_eq!(entries.len(), 3);
}

#[test]
fn test_multi_line_entry_spans_continuations() {
    let dir = tempdir().expect("temp dir");
    write_log(
        dir.path(),
        "laravel.log",
        "[2024-01-01 10:00:00] app.ERROR: Unhandled exception [] []\n\
         #0 /app/Handler.php(10): report()\n\
         #1 {main}\n\
         [2024-01-01 10:00:05] app.INFO: Recovered [] []\n",
    );

    let reader = LogReader::new(dir.path());
    let entries: Vec<LogEntry> = reader.read_all(&SearchCriteria::new()).collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[0].message,
        "Unhandled exception\n#0 /app/Handler.php(10): report()\n#1 {main}"
    );
    assert_eq!(entries[0].line_number, 1);
    assert_eq!(entries[1].message, "Recovered");
    assert_eq!(entries[1].line_number, 4);
}

#[test]
fn test_trailing_continuations_flush_at_end_of_file() {
    let dir = tempdir().expect("temp dir");
    write_log(
        dir.path(),
        "laravel.log",
        "[2024-01-01 10:00:00] app.ERROR: Crash [] []\n#0 {main}\n",
    );

    let reader = LogReader::new(dir.path());
    let entries: Vec<LogEntry> = reader.read_all(&SearchCriteria::new()).collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, "Crash\n#0 {main}");
}

#[test]
fn test_continuation_state_does_not_cross_files() {
    let dir = tempdir().expect("temp dir");
    let first = write_log(
        dir.path(),
        "first.log",
        "[2024-01-01 10:00:00] app.ERROR: Crash [] []\n",
    );
    let second = write_log(dir.path(), "second.log", "orphan continuation line\n");
    set_modified(&first, 2_000);
    set_modified(&second, 1_000);

    let reader = LogReader::new(dir.path());
    let entries: Vec<LogEntry> = reader.read_all(&SearchCriteria::new()).collect();
    // The orphan line has no prior entry in its own file, so it is dropped
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, "Crash");
}

#[test]
fn test_context_criteria_matches_decoded_values() {
    let dir = tempdir().expect("temp dir");
    write_log(
        dir.path(),
        "laravel.log",
        "[2024-01-01 10:00:00] app.INFO: User created {\"user_id\":123} []\n\
         [2024-01-01 10:00:01] app.INFO: User created {\"user_id\":456} []\n",
    );

    let reader = LogReader::new(dir.path());
    let criteria = SearchCriteria::new().with_context(Some("user_id"), Some("123"));
    let entries: Vec<LogEntry> = reader.read_all(&criteria).collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].context_value("user_id"), Some(&serde_json::json!(123)));
}

#[test]
fn test_unique_channels_are_sorted_and_deduplicated() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());
    assert_eq!(reader.unique_channels(), vec!["app", "security"]);
}

#[test]
fn test_source_file_is_relative_to_root() {
    let dir = sample_dir();
    let reader = LogReader::new(dir.path());
    let entry = reader
        .read_all(&SearchCriteria::new())
        .next()
        .expect("at least one entry");
    assert_eq!(entry.source_file, "laravel.log");
}

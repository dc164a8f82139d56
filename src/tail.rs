use crate::catalog;
use crate::parser::{self, LogEntry, ParsedLine};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Returns the most recent `count` entries from the newest log file,
/// oldest-to-newest, optionally restricted to one level and one
/// environment's files.
///
/// The scan is a single forward pass keeping the last `2 * count` raw
/// lines in a sliding window. The factor of two leaves room for lines the
/// header parse or the level filter will discard. It is a heuristic, not
/// a guarantee: when more than half of the buffered tail is filtered
/// out, fewer than `count` entries come back even though earlier matches
/// exist in the file.
pub fn tail_entries(
    root: &Path,
    count: usize,
    level: Option<&str>,
    environment: Option<&str>,
) -> Vec<LogEntry> {
    if count == 0 {
        return Vec::new();
    }

    let files = match environment {
        Some(env) => catalog::list_log_files_for_environment(root, env),
        None => catalog::list_log_files(root),
    };
    // Tailing spans one file only: the most recently modified
    let Some(path) = files.first() else {
        return Vec::new();
    };
    let Ok(file) = File::open(path) else {
        return Vec::new();
    };
    let source_file = path
        .strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string();

    let window = count * 2;
    let mut buffered: VecDeque<(String, usize)> = VecDeque::with_capacity(window);
    let mut line_number = 0;
    for line in BufReader::new(file).lines() {
        let Ok(line) = line else {
            break;
        };
        line_number += 1;
        if buffered.len() == window {
            buffered.pop_front();
        }
        buffered.push_back((line, line_number));
    }

    // Walk the window newest-to-oldest; buffered lines are parsed as
    // standalone headers, so continuation lines simply drop out here
    let mut entries = Vec::with_capacity(count);
    for (line, number) in buffered.iter().rev() {
        if entries.len() == count {
            break;
        }
        let ParsedLine::Entry(entry) = parser::parse_line(line, &source_file, *number) else {
            continue;
        };
        if level.is_some_and(|wanted| !entry.level.eq_ignore_ascii_case(wanted)) {
            continue;
        }
        entries.push(entry);
    }

    entries.reverse();
    entries
}

use crate::parser::LogEntry;
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_BORDERS_ONLY};
use serde_json::json;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

/// Formats a batch of entries for the terminal.
pub fn format_entries_text(entries: &[LogEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} entr{}",
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" }
    );

    if entries.is_empty() {
        let _ = writeln!(out, "No matching log entries found.");
        return out;
    }

    out.push('\n');
    for entry in entries {
        let _ = writeln!(
            out,
            "{:>6}: {} {}.{}: {}",
            entry.line_number,
            entry.datetime.format("%Y-%m-%d %H:%M:%S"),
            entry.channel,
            level_colored(&entry.level),
            entry.message
        );
        if !entry.context.is_empty() {
            let _ = writeln!(out, "        context: {}", compact_json(&entry.context));
        }
        if !entry.extra.is_empty() {
            let _ = writeln!(out, "        extra: {}", compact_json(&entry.extra));
        }
    }

    out
}

/// Formats a batch of entries as a JSON document.
pub fn format_entries_json(entries: &[LogEntry]) -> String {
    serde_json::to_string_pretty(&json!({
        "count": entries.len(),
        "entries": entries,
    }))
    .unwrap_or_else(|_| "{\"error\":\"failed to serialize entries\"}".into())
}

/// Renders the discovered file list as a table (name, size, modified).
pub fn format_files_table(root: &Path, files: &[PathBuf]) -> String {
    if files.is_empty() {
        return "No log files found.\n".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["File", "Size", "Modified"]);

    for path in files {
        let name = path
            .strip_prefix(root)
            .unwrap_or(path)
            .display()
            .to_string();
        let (size, modified) = match fs::metadata(path) {
            Ok(meta) => (
                format_size(meta.len()),
                meta.modified()
                    .map(|time| {
                        DateTime::<Utc>::from(time)
                            .format("%Y-%m-%d %H:%M:%S")
                            .to_string()
                    })
                    .unwrap_or_else(|_| "-".to_string()),
            ),
            Err(_) => ("-".to_string(), "-".to_string()),
        };
        table.add_row(vec![Cell::new(name), Cell::new(size), Cell::new(modified)]);
    }

    format!("{table}\n")
}

/// Renders the discovered file list as a JSON document.
pub fn format_files_json(root: &Path, files: &[PathBuf]) -> String {
    let names: Vec<String> = files
        .iter()
        .map(|path| {
            path.strip_prefix(root)
                .unwrap_or(path)
                .display()
                .to_string()
        })
        .collect();
    serde_json::to_string_pretty(&json!({ "files": names }))
        .unwrap_or_else(|_| "{\"error\":\"failed to serialize file list\"}".into())
}

pub fn format_channels_text(channels: &[String]) -> String {
    if channels.is_empty() {
        return "No channels found.\n".to_string();
    }
    let mut out = String::new();
    for channel in channels {
        let _ = writeln!(out, "{channel}");
    }
    out
}

pub fn format_channels_json(channels: &[String]) -> String {
    serde_json::to_string_pretty(&json!({ "channels": channels }))
        .unwrap_or_else(|_| "{\"error\":\"failed to serialize channels\"}".into())
}

fn level_colored(level: &str) -> ColoredString {
    match level {
        "EMERGENCY" | "ALERT" | "CRITICAL" | "ERROR" => level.red().bold(),
        "WARNING" | "NOTICE" => level.yellow(),
        "INFO" => level.green(),
        "DEBUG" => level.dimmed(),
        _ => level.normal(),
    }
}

fn compact_json(map: &serde_json::Map<String, serde_json::Value>) -> String {
    serde_json::to_string(map).unwrap_or_else(|_| "<unserializable>".to_string())
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

mod entities;

pub use entities::LogEntry;

/// Key under which a structured payload that failed to decode is kept.
pub const RAW_PAYLOAD_KEY: &str = "raw";

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?P<ts>[^\]]+)\]\s+(?P<channel>[^\s.\[\]]+)\.(?P<level>[A-Za-z_]+):\s?(?P<body>.*)$")
        .expect("valid header regex")
});

/// Outcome of parsing one physical line.
#[derive(Debug)]
pub enum ParsedLine {
    /// The line opened a new entry
    Entry(LogEntry),
    /// The line belongs to the previous entry (stack trace frame etc.)
    Continuation(String),
    /// Blank line, dropped
    Blank,
}

/// Parses one raw physical line.
///
/// A line is an entry header when it has the shape
/// `[<timestamp>] <channel>.<LEVEL>: <message> <context-json> <extra-json>`,
/// with the trailing payload blocks optional. Anything else that is not
/// blank is a continuation of the preceding entry; the caller decides when
/// the accumulating entry is closed (next header line or end of file).
pub fn parse_line(line: &str, source_file: &str, line_number: usize) -> ParsedLine {
    if line.trim().is_empty() {
        return ParsedLine::Blank;
    }

    let Some(caps) = HEADER_RE.captures(line) else {
        return ParsedLine::Continuation(line.to_string());
    };

    let body = caps.name("body").map_or("", |m| m.as_str());
    let (message, context_raw, extra_raw) = split_payload_blocks(body);

    ParsedLine::Entry(LogEntry {
        datetime: parse_timestamp(caps.name("ts").map_or("", |m| m.as_str())),
        channel: caps["channel"].to_string(),
        level: caps["level"].to_uppercase(),
        message: message.trim_end().to_string(),
        context: decode_payload(context_raw),
        extra: decode_payload(extra_raw),
        source_file: source_file.to_string(),
        line_number,
    })
}

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse the header timestamp, falling back to the Unix epoch so entries
/// stay sortable even when the timestamp is mangled.
fn parse_timestamp(raw: &str) -> NaiveDateTime {
    let trimmed = raw.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return parsed;
        }
    }
    // Timestamps carrying a UTC offset ("2024-01-01T10:00:00.123456+02:00")
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return parsed.naive_utc();
    }
    NaiveDateTime::UNIX_EPOCH
}

/// Splits the trailing context/extra JSON blocks off the message body.
///
/// Blocks are located with a forward balanced-bracket scan; only blocks
/// that sit flush at the end of the line count as payload. A single
/// trailing block is treated as context with no extra.
fn split_payload_blocks(body: &str) -> (&str, Option<&str>, Option<&str>) {
    let trimmed_len = body.trim_end().len();
    let blocks = top_level_blocks(body);

    let Some(&(last_start, last_end)) = blocks.last() else {
        return (body, None, None);
    };
    if last_end != trimmed_len {
        return (body, None, None);
    }

    let last = &body[last_start..last_end];
    if let Some(&(prev_start, prev_end)) = blocks.len().checked_sub(2).and_then(|i| blocks.get(i))
        && body[prev_end..last_start].trim().is_empty()
    {
        let context = &body[prev_start..prev_end];
        return (&body[..prev_start], Some(context), Some(last));
    }

    (&body[..last_start], Some(last), None)
}

/// Byte ranges of all top-level `{...}` / `[...]` blocks in `input`.
fn top_level_blocks(input: &str) -> Vec<(usize, usize)> {
    let mut blocks = Vec::new();
    let mut pos = 0;
    while pos < input.len() {
        let Some(offset) = input[pos..].find(['{', '[']) else {
            break;
        };
        let start = pos + offset;
        match balanced_block_end(input, start) {
            Some(end) => {
                blocks.push((start, end));
                pos = end;
            }
            None => pos = start + 1,
        }
    }
    blocks
}

/// Finds the end (exclusive) of the balanced block starting at `start`,
/// tracking brace/bracket nesting and skipping over quoted strings.
fn balanced_block_end(input: &str, start: usize) -> Option<usize> {
    let mut chars = input[start..].char_indices();
    let (_, first) = chars.next()?;
    if first != '{' && first != '[' {
        return None;
    }

    let mut braces = i32::from(first == '{');
    let mut brackets = i32::from(first == '[');
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in chars {
        if in_string {
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => braces += 1,
            '[' => brackets += 1,
            '}' => {
                braces -= 1;
                if braces < 0 {
                    return None;
                }
            }
            ']' => {
                brackets -= 1;
                if brackets < 0 {
                    return None;
                }
            }
            _ => {}
        }

        if braces == 0 && brackets == 0 {
            return Some(start + i + c.len_utf8());
        }
    }

    None
}

/// Decodes a payload block into a string-keyed map.
///
/// Objects map directly; arrays keep their indices as keys ("0", "1", ...).
/// A block that fails to decode is kept verbatim under [`RAW_PAYLOAD_KEY`]
/// so the entry itself is never dropped.
fn decode_payload(raw: Option<&str>) -> Map<String, Value> {
    let Some(raw) = raw else {
        return Map::new();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "[]" || trimmed == "{}" {
        return Map::new();
    }

    match json5::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => map,
        Ok(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect(),
        _ => {
            let mut map = Map::new();
            map.insert(
                RAW_PAYLOAD_KEY.to_string(),
                Value::String(trimmed.to_string()),
            );
            map
        }
    }
}

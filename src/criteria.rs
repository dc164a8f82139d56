use crate::parser::LogEntry;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while building search criteria
#[derive(Debug, Error)]
pub enum CriteriaError {
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Immutable filter settings for a read.
///
/// Every set field must match for an entry to pass; unset fields impose no
/// constraint. `term` and `regex` are independent and may both be set.
/// `limit` and `offset` are honored by the streaming reader, globally
/// across all files in scan order.
#[derive(Debug, Default, Clone)]
pub struct SearchCriteria {
    term: Option<String>,
    regex: Option<Regex>,
    level: Option<String>,
    channel: Option<String>,
    environment: Option<String>,
    context_key: Option<String>,
    context_value: Option<String>,
    limit: Option<usize>,
    offset: usize,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring match against the message.
    pub fn with_term(mut self, term: Option<impl Into<String>>) -> Self {
        self.term = term.map(|t| t.into());
        self
    }

    /// Regex matched against the message.
    ///
    /// A pattern wrapped in `/` delimiters may carry trailing flags
    /// (`/timeout/i`); a bare pattern compiles as-is, case-sensitively.
    /// An invalid pattern fails here rather than being silently ignored.
    pub fn with_regex(mut self, pattern: &str) -> Result<Self, CriteriaError> {
        self.regex = Some(compile_pattern(pattern)?);
        Ok(self)
    }

    /// Exact level match, case-insensitive.
    pub fn with_level(mut self, level: Option<impl Into<String>>) -> Self {
        self.level = level.map(|l| l.into());
        self
    }

    /// Exact channel match, case-insensitive.
    pub fn with_channel(mut self, channel: Option<impl Into<String>>) -> Self {
        self.channel = channel.map(|c| c.into());
        self
    }

    /// Keep only entries whose source file name contains this token.
    pub fn with_environment(mut self, environment: Option<impl Into<String>>) -> Self {
        self.environment = environment.map(|e| e.into());
        self
    }

    /// Keep only entries whose `context[key]` stringifies to text
    /// containing `value`.
    pub fn with_context(
        mut self,
        key: Option<impl Into<String>>,
        value: Option<impl Into<String>>,
    ) -> Self {
        self.context_key = key.map(|k| k.into());
        self.context_value = value.map(|v| v.into());
        self
    }

    /// Maximum number of matching entries to yield; `None` is unbounded.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Number of matching entries to skip before yielding.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The single predicate all filtering routines honor.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        fn contains_ci(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }

        let term_match = self
            .term
            .as_ref()
            .map(|term| contains_ci(&entry.message, term))
            .unwrap_or(true);

        let regex_match = self
            .regex
            .as_ref()
            .map(|regex| regex.is_match(&entry.message))
            .unwrap_or(true);

        let level_match = self
            .level
            .as_ref()
            .map(|level| entry.level.eq_ignore_ascii_case(level))
            .unwrap_or(true);

        let channel_match = self
            .channel
            .as_ref()
            .map(|channel| entry.channel.eq_ignore_ascii_case(channel))
            .unwrap_or(true);

        let environment_match = self
            .environment
            .as_ref()
            .map(|environment| entry.source_file.contains(environment))
            .unwrap_or(true);

        let context_match = match (&self.context_key, &self.context_value) {
            (Some(key), Some(value)) => entry
                .context_value(key)
                .map(|found| stringify(found).contains(value))
                .unwrap_or(false),
            (Some(key), None) => entry.context.contains_key(key),
            _ => true,
        };

        term_match
            && regex_match
            && level_match
            && channel_match
            && environment_match
            && context_match
    }
}

/// Render a context value for substring comparison: strings compare by
/// their content, everything else by its JSON text.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, CriteriaError> {
    let mut source = pattern;
    let mut case_insensitive = false;
    let mut multi_line = false;
    let mut dot_matches_new_line = false;
    let mut ignore_whitespace = false;

    if let Some((inner, flags)) = split_delimited(pattern) {
        source = inner;
        for flag in flags.chars() {
            match flag {
                'i' => case_insensitive = true,
                'm' => multi_line = true,
                's' => dot_matches_new_line = true,
                'x' => ignore_whitespace = true,
                // 'u': unicode is already the default
                _ => {}
            }
        }
    }

    RegexBuilder::new(source)
        .case_insensitive(case_insensitive)
        .multi_line(multi_line)
        .dot_matches_new_line(dot_matches_new_line)
        .ignore_whitespace(ignore_whitespace)
        .build()
        .map_err(|source| CriteriaError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
}

/// Recognize the `/pattern/flags` delimiter form. Returns `None` when the
/// input is not delimited (or carries unknown trailing flags), in which
/// case the whole input is compiled as a bare pattern.
fn split_delimited(pattern: &str) -> Option<(&str, &str)> {
    let rest = pattern.strip_prefix('/')?;
    let close = rest.rfind('/')?;
    let flags = &rest[close + 1..];
    if !flags.chars().all(|c| matches!(c, 'i' | 'm' | 's' | 'u' | 'x')) {
        return None;
    }
    Some((&rest[..close], flags))
}

use crate::catalog;
use crate::criteria::SearchCriteria;
use crate::parser::{self, LogEntry, ParsedLine};
use std::collections::{BTreeSet, VecDeque};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by read operations.
///
/// Only mistakes in the caller's own explicit input surface; files that
/// vanish between listing and reading are skipped silently.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Log file not found: '{path}'")]
    NotFound { path: String },
}

/// Read-only facade over a directory of log files.
///
/// Holds no file handles between calls; every operation re-lists and
/// re-opens from scratch, so concurrent callers are safe by construction.
#[derive(Debug, Clone)]
pub struct LogReader {
    root: PathBuf,
}

impl LogReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All log files under the root, most recently modified first.
    pub fn log_files(&self) -> Vec<PathBuf> {
        catalog::list_log_files(&self.root)
    }

    /// Log files whose names contain the environment token.
    pub fn log_files_for_environment(&self, environment: &str) -> Vec<PathBuf> {
        catalog::list_log_files_for_environment(&self.root, environment)
    }

    /// Lazily reads matching entries from every log file under the root.
    pub fn read_all(&self, criteria: &SearchCriteria) -> EntryStream {
        EntryStream::new(self.root.clone(), self.log_files(), criteria.clone())
    }

    /// Like [`read_all`](Self::read_all), restricted to one environment's files.
    pub fn read_for_environment(&self, environment: &str, criteria: &SearchCriteria) -> EntryStream {
        EntryStream::new(
            self.root.clone(),
            self.log_files_for_environment(environment),
            criteria.clone(),
        )
    }

    /// Reads a single named file. Unlike the batch operations, an
    /// explicitly named file that does not exist is the caller's error.
    pub fn read_file(
        &self,
        path: impl AsRef<Path>,
        criteria: &SearchCriteria,
    ) -> Result<EntryStream, ReadError> {
        let path = self.resolve(path.as_ref());
        if !path.is_file() {
            return Err(ReadError::NotFound {
                path: path.display().to_string(),
            });
        }
        Ok(EntryStream::new(
            self.root.clone(),
            vec![path],
            criteria.clone(),
        ))
    }

    /// Reads a caller-supplied file list in the given order; missing files
    /// are skipped silently.
    pub fn read_files(&self, paths: &[PathBuf], criteria: &SearchCriteria) -> EntryStream {
        let files = paths.iter().map(|path| self.resolve(path)).collect();
        EntryStream::new(self.root.clone(), files, criteria.clone())
    }

    /// The most recent `count` entries from the newest log file,
    /// oldest-to-newest.
    pub fn tail(
        &self,
        count: usize,
        level: Option<&str>,
        environment: Option<&str>,
    ) -> Vec<LogEntry> {
        crate::tail::tail_entries(&self.root, count, level, environment)
    }

    /// Every channel name seen across all log files, sorted and
    /// deduplicated.
    pub fn unique_channels(&self) -> Vec<String> {
        let mut channels = BTreeSet::new();
        for entry in self.read_all(&SearchCriteria::new()) {
            channels.insert(entry.channel);
        }
        channels.into_iter().collect()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Lazy, single-pass stream of matching entries across a file list.
///
/// Offset and limit apply to the filtered sequence globally, not per
/// file, and hitting the limit stops the scan without opening further
/// files. The open handle lives inside the stream, so dropping the stream
/// (or exhausting it) releases it on every exit path.
pub struct EntryStream {
    root: PathBuf,
    files: VecDeque<PathBuf>,
    criteria: SearchCriteria,
    current: Option<OpenFile>,
    skipped: usize,
    count: usize,
}

/// One open file plus the accumulation state machine: `pending` is the
/// entry currently collecting continuation lines (Accumulating) or `None`
/// (Idle). The state never crosses a file boundary.
struct OpenFile {
    lines: Lines<BufReader<File>>,
    source_file: String,
    line_number: usize,
    pending: Option<LogEntry>,
}

impl EntryStream {
    fn new(root: PathBuf, files: Vec<PathBuf>, criteria: SearchCriteria) -> Self {
        Self {
            root,
            files: files.into(),
            criteria,
            current: None,
            skipped: 0,
            count: 0,
        }
    }

    fn limit_reached(&self) -> bool {
        self.criteria.limit().is_some_and(|limit| self.count >= limit)
    }

    /// Opens the next file, skipping any that cannot be opened; a file can
    /// disappear between listing and reading.
    fn open_next(&mut self) -> bool {
        while let Some(path) = self.files.pop_front() {
            let Ok(file) = File::open(&path) else {
                continue;
            };
            let source_file = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .display()
                .to_string();
            self.current = Some(OpenFile {
                lines: BufReader::new(file).lines(),
                source_file,
                line_number: 0,
                pending: None,
            });
            return true;
        }
        false
    }

    /// Applies the criteria and the global offset/limit bookkeeping to a
    /// completed entry.
    fn deliver(&mut self, entry: LogEntry) -> Option<LogEntry> {
        if !self.criteria.matches(&entry) {
            return None;
        }
        if self.skipped < self.criteria.offset() {
            self.skipped += 1;
            return None;
        }
        self.count += 1;
        Some(entry)
    }
}

impl Iterator for EntryStream {
    type Item = LogEntry;

    fn next(&mut self) -> Option<LogEntry> {
        loop {
            if self.limit_reached() {
                self.current = None;
                self.files.clear();
                return None;
            }
            if self.current.is_none() && !self.open_next() {
                return None;
            }

            let mut file_finished = false;
            let completed = {
                let open = self.current.as_mut()?;
                match open.lines.next() {
                    Some(Ok(line)) => {
                        open.line_number += 1;
                        match parser::parse_line(&line, &open.source_file, open.line_number) {
                            // A new header closes the accumulating entry
                            ParsedLine::Entry(entry) => open.pending.replace(entry),
                            ParsedLine::Continuation(text) => {
                                if let Some(pending) = open.pending.as_mut() {
                                    pending.append_line(&text);
                                }
                                None
                            }
                            ParsedLine::Blank => None,
                        }
                    }
                    // EOF flushes; a mid-file read error is treated the same,
                    // abandoning the rest of the file
                    Some(Err(_)) | None => {
                        file_finished = true;
                        open.pending.take()
                    }
                }
            };

            if file_finished {
                self.current = None;
            }
            if let Some(done) = completed
                && let Some(matched) = self.deliver(done)
            {
                return Some(matched);
            }
        }
    }
}

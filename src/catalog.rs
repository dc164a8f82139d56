use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const LOG_EXTENSION: &str = "log";

/// Lists `*.log` files directly under `root`, most recently modified
/// first. A missing or unreadable root yields an empty list rather than an
/// error; a directory listing is a best-effort snapshot. Ties in
/// modification time keep their discovery order (stable sort).
pub fn list_log_files(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };

    let mut files: Vec<(PathBuf, SystemTime)> = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(LOG_EXTENSION) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((path, modified));
    }

    files.sort_by_key(|(_, modified)| Reverse(*modified));
    files.into_iter().map(|(path, _)| path).collect()
}

/// The subsequence of [`list_log_files`] whose file names contain
/// `environment`, covering both `env.log` and `app_env.log` naming.
pub fn list_log_files_for_environment(root: &Path, environment: &str) -> Vec<PathBuf> {
    list_log_files(root)
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.contains(environment))
        })
        .collect()
}

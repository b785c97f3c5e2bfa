//! Platform-specific directory paths.
//!
//! Uses XDG on Linux, standard locations on macOS/Windows.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "tablestate";
const APPLICATION: &str = "tablestate-tui";
const LATEST_LOG: &str = "latest.log";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Directory for the layout database.
///
/// - Linux: `$XDG_DATA_HOME/tablestate-tui` or `~/.local/share/tablestate-tui`
/// - macOS: `~/Library/Application Support/dev.tablestate.tablestate-tui`
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Directory for logs.
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Get the path to the layout database.
pub fn layouts_db() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("layouts.db"))
}

/// Get the path to the latest log file.
pub fn log_file() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join(LATEST_LOG))
}

/// Archived logs kept next to `latest.log`.
pub const KEPT_LOGS: usize = 10;

/// Archive `latest.log` in `dir` under a timestamp, then drop all but the
/// newest `keep` archives.
///
/// Archive names sort chronologically, so pruning goes by name.
pub fn archive_logs(dir: &Path, keep: usize) -> io::Result<()> {
    let latest = dir.join(LATEST_LOG);
    if latest.exists() {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        fs::rename(&latest, dir.join(format!("{stamp}.log")))?;
    }

    let mut archives: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "log")
                && path.file_name().is_some_and(|name| name != LATEST_LOG)
        })
        .collect();
    archives.sort();
    let excess = archives.len().saturating_sub(keep);
    for path in &archives[..excess] {
        fs::remove_file(path)?;
    }
    Ok(())
}

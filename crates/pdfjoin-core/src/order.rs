//! Input ordering for merges

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Case-insensitive file name
    #[default]
    Name,
    /// File creation time, falling back to modification time
    Created,
    /// Keep the order the files were given in
    AsGiven,
}

/// Order merge inputs; ties keep their given order
pub fn sort_inputs(mut paths: Vec<PathBuf>, mode: SortMode) -> Vec<PathBuf> {
    match mode {
        SortMode::Name => paths.sort_by_cached_key(|path| name_key(path)),
        SortMode::Created => paths.sort_by_cached_key(|path| created_key(path)),
        SortMode::AsGiven => {}
    }
    paths
}

fn name_key(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn created_key(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|meta| meta.created().or_else(|_| meta.modified()))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

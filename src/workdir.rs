//! Working-Tree Walker (C5, §4.5): recursively lists the working directory, skipping the
//! metadata directory, in canonical order.

use crate::error::{StatusError, StatusResult};
use crate::mode::FileMode;
use log::trace;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingEntry {
    pub path: String,
    pub mode: FileMode,
    pub size: u64,
    pub mtime_sec: u32,
    pub mtime_nsec: u32,
}

/// Walks `root`, yielding files and symlinks (never directories — empty subdirectories
/// contribute nothing, per §4.5) in the sibling-sorted canonical order. `metadata_dir_name` is
/// excluded at the root (e.g. `.git`, or whatever override is configured, §4.12).
pub fn walk_working_tree(root: &Path, metadata_dir_name: &str) -> StatusResult<Vec<WorkingEntry>> {
    trace!("walking working tree at `{}`", root.display());
    let mut entries = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by(|a, b| {
            crate::path::cmp_siblings(
                &a.file_name().to_string_lossy(),
                a.file_type().is_dir(),
                &b.file_name().to_string_lossy(),
                b.file_type().is_dir(),
            )
        })
        .into_iter()
        .filter_entry(|e| e.depth() != 1 || e.file_name() != metadata_dir_name);

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            let source = e.into_io_error().unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walk failed"));
            StatusError::os_error("readdir", path, source)
        })?;

        let relative = entry
            .path()
            .strip_prefix(root)
            .expect("walkdir yields descendants of root");

        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }

        let path = relative.to_str().map(to_canonical_path).ok_or_else(|| {
            StatusError::InvalidPath(relative.to_string_lossy().into_owned())
        })?;

        let metadata = entry
            .metadata()
            .map_err(|e| {
                let source = e.into_io_error().unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "stat failed"));
                StatusError::os_error("lstat", entry.path().to_path_buf(), source)
            })?;
        let mode = FileMode::from_metadata(&metadata);
        let (mtime_sec, mtime_nsec) = mtime_parts(&metadata);

        entries.push(WorkingEntry { path, mode, size: metadata.len(), mtime_sec, mtime_nsec });
    }

    Ok(entries)
}

fn to_canonical_path(s: &str) -> String {
    if std::path::MAIN_SEPARATOR == '/' {
        s.to_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

#[cfg(unix)]
fn mtime_parts(metadata: &std::fs::Metadata) -> (u32, u32) {
    use std::os::unix::fs::MetadataExt;
    (metadata.mtime() as u32, metadata.mtime_nsec() as u32)
}

#[cfg(not(unix))]
fn mtime_parts(metadata: &std::fs::Metadata) -> (u32, u32) {
    let secs = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);
    (secs, 0)
}

/// Used only to compute the metadata-directory path the engine needs to avoid (e.g. to locate
/// `HEAD`/index files); kept alongside the walker since both read the same repo layout.
pub fn metadata_dir(root: &Path, metadata_dir_name: &str) -> PathBuf {
    root.join(metadata_dir_name)
}

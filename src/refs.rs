//! Reference Store (C9, §4.9): resolves `HEAD` (direct or one level of symbolic indirection) to
//! a commit oid, then a commit to its tree oid.

use crate::error::{StatusError, StatusResult};
use crate::odb::ObjectDatabase;
use crate::oid::{oid_from_hex, Oid};
use std::path::{Path, PathBuf};

const SYMBOLIC_PREFIX: &str = "ref: ";

/// Resolves `HEAD` down to the tree of its current commit. Tests substitute an in-memory
/// fake (§4.13); production reads the real `HEAD`/`refs/...` files on disk.
pub trait RefStore {
    /// `None` means HEAD is unborn (points at a branch ref that doesn't exist yet) — not an
    /// error (§4.9).
    fn head_commit(&self) -> StatusResult<Option<Oid>>;
}

impl<T: RefStore + ?Sized> RefStore for &T {
    fn head_commit(&self) -> StatusResult<Option<Oid>> {
        (**self).head_commit()
    }
}

/// Reads `HEAD` and, if symbolic, the one ref file it points at, directly off disk.
pub struct FileRefStore {
    metadata_dir: PathBuf,
}

impl FileRefStore {
    pub fn new(metadata_dir: impl Into<PathBuf>) -> Self {
        Self { metadata_dir: metadata_dir.into() }
    }

    fn read_ref_file(&self, path: &Path) -> StatusResult<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StatusError::os_error("read", path, e)),
        }
    }
}

impl RefStore for FileRefStore {
    fn head_commit(&self) -> StatusResult<Option<Oid>> {
        let head_path = self.metadata_dir.join("HEAD");
        let contents = match self.read_ref_file(&head_path)? {
            Some(c) => c,
            None => return Err(StatusError::RefCorrupted("HEAD is missing".into())),
        };
        let contents = contents.trim_end_matches('\n');

        let target = if let Some(rest) = contents.strip_prefix(SYMBOLIC_PREFIX) {
            let ref_path = self.metadata_dir.join(rest.trim());
            match self.read_ref_file(&ref_path)? {
                Some(c) => c.trim_end_matches('\n').to_owned(),
                None => return Ok(None), // unborn branch
            }
        } else {
            contents.to_owned()
        };

        let oid = oid_from_hex(&target)
            .map_err(|_| StatusError::RefCorrupted(format!("HEAD does not resolve to a valid oid: `{}`", target)))?;
        Ok(Some(oid))
    }
}

/// Extracts the `tree <oid>` line from a raw commit object's body (§4.9).
pub fn commit_tree_oid(commit_body: &[u8], commit_oid: Oid) -> StatusResult<Oid> {
    let text = std::str::from_utf8(commit_body)
        .map_err(|_| StatusError::object_corrupted(commit_oid, "commit body is not utf8"))?;
    let line = text
        .lines()
        .next()
        .ok_or_else(|| StatusError::object_corrupted(commit_oid, "commit body is empty"))?;
    let hex = line
        .strip_prefix("tree ")
        .ok_or_else(|| StatusError::object_corrupted(commit_oid, "commit does not begin with a tree line"))?;
    oid_from_hex(hex).map_err(|_| StatusError::object_corrupted(commit_oid, format!("bad tree oid `{}`", hex)))
}

/// Resolves HEAD all the way to a root tree oid, or `None` if HEAD is unborn (§4.3, §4.9).
pub fn head_tree(refs: &impl RefStore, odb: &impl ObjectDatabase) -> StatusResult<Option<Oid>> {
    let commit_oid = match refs.head_commit()? {
        Some(oid) => oid,
        None => return Ok(None),
    };
    let commit_body = odb.read_commit(commit_oid)?;
    Ok(Some(commit_tree_oid(&commit_body, commit_oid)?))
}

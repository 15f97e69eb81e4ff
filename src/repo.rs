//! Public Surface (C7, §4.7) and configuration (§4.12): wires the object database, reference
//! store, index, and working-tree walker together behind `status_foreach`/`status_file`.

use crate::error::{StatusError, StatusResult};
use crate::index::{self, IndexEntry};
use crate::mode::FileMode;
use crate::odb::{LooseObjectDb, ObjectDatabase};
use crate::path::cmp_full_paths;
use crate::refs::{self, FileRefStore, RefStore};
use crate::status::{self, StatusFlags};
use crate::tree::{self, FlattenedTree, TreeEntry};
use crate::workdir::{self, WorkingEntry};
use fallible_iterator::FallibleIterator;
use std::path::{Path, PathBuf};

const DEFAULT_METADATA_DIR: &str = ".git";
const INDEX_FILE_NAME: &str = "index";

/// A repository: its working directory root plus the backends that answer committed-tree and
/// ref questions. Generic so tests can substitute in-memory fakes (§4.12, §4.13) without
/// touching the filesystem.
pub struct Repository<O = LooseObjectDb, R = FileRefStore>
where
    O: ObjectDatabase,
    R: RefStore,
{
    root: PathBuf,
    metadata_dir_name: String,
    odb: O,
    refs: R,
}

impl Repository<LooseObjectDb, FileRefStore> {
    /// Opens a repository at `root` using the conventional metadata directory name and the
    /// production loose-object/file-ref backends.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::with_metadata_dir_name(root, DEFAULT_METADATA_DIR)
    }

    /// Like [`open`](Self::open) but with a non-default metadata directory name — the test
    /// harness uses this so on-disk fixtures don't need hidden-file support (§4.12).
    pub fn with_metadata_dir_name(root: impl Into<PathBuf>, metadata_dir_name: impl Into<String>) -> Self {
        let root = root.into();
        let metadata_dir_name = metadata_dir_name.into();
        let metadata_dir = root.join(&metadata_dir_name);
        let odb = LooseObjectDb::new(metadata_dir.join("objects"));
        let refs = FileRefStore::new(metadata_dir);
        Self { root, metadata_dir_name, odb, refs }
    }
}

impl<O: ObjectDatabase, R: RefStore> Repository<O, R> {
    /// Builds a repository from caller-supplied backends, e.g. the in-memory testkit (§4.12).
    pub fn with_backends(root: impl Into<PathBuf>, metadata_dir_name: impl Into<String>, odb: O, refs: R) -> Self {
        Self { root: root.into(), metadata_dir_name: metadata_dir_name.into(), odb, refs }
    }

    fn metadata_dir(&self) -> PathBuf {
        workdir::metadata_dir(&self.root, &self.metadata_dir_name)
    }

    fn load_index(&self) -> StatusResult<Vec<IndexEntry>> {
        let index_path = self.metadata_dir().join(INDEX_FILE_NAME);
        match std::fs::File::open(&index_path) {
            Ok(file) => index::parse_index(std::io::BufReader::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StatusError::os_error("open", &index_path, e)),
        }
    }

    fn flatten_head_tree(&self) -> StatusResult<Vec<TreeEntry>> {
        let root_oid = refs::head_tree(&self.refs, &self.odb)?;
        let mut iter = FlattenedTree::new(&self.odb, root_oid)?;
        let mut entries = Vec::new();
        while let Some(entry) = iter.next()? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Enumerates every path whose status is non-zero, in canonical order (§4.7). `callback`
    /// returning `true` aborts enumeration; that abort is a successful early stop, not an error.
    pub fn status_foreach(&self, callback: impl FnMut(&str, StatusFlags) -> bool) -> StatusResult<()> {
        let tree = self.flatten_head_tree()?;
        let index = self.load_index()?;
        let working = workdir::walk_working_tree(&self.root, &self.metadata_dir_name)?;
        status::merge_and_classify(&self.root, &tree, &index, &working, callback)
    }

    /// Looks up a single path's status without materializing the full tree/index/working
    /// listings (§4.7).
    pub fn status_file(&self, path: &str) -> StatusResult<StatusFlags> {
        if path.is_empty() || path.contains('\0') {
            return Err(StatusError::InvalidPath(path.to_owned()));
        }

        let absolute = self.root.join(path);
        let metadata = match std::fs::symlink_metadata(&absolute) {
            Ok(m) => Some(m),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(StatusError::os_error("lstat", &absolute, e)),
        };
        if let Some(m) = &metadata {
            if m.is_dir() {
                return Err(StatusError::InvalidPath(path.to_owned()));
            }
        }
        let working_entry = metadata.as_ref().map(|m| to_working_entry(path, m));

        let root_oid = refs::head_tree(&self.refs, &self.odb)?;
        let tree_entry = match root_oid {
            Some(oid) => tree::find_tree_entry(&self.odb, oid, path)?,
            None => None,
        };

        let index_entries = self.load_index()?;
        let index_entry = index_entries
            .binary_search_by(|e| cmp_full_paths(&e.path, path))
            .ok()
            .map(|idx| index_entries[idx].clone());

        if tree_entry.is_none() && index_entry.is_none() && working_entry.is_none() {
            return Err(StatusError::NotFound(path.to_owned()));
        }

        let i_flags = status::index_half(tree_entry.as_ref(), index_entry.as_ref());
        let w_flags = status::working_half(&self.root, index_entry.as_ref(), path, working_entry.as_ref())?;
        Ok(i_flags | w_flags)
    }
}

fn to_working_entry(path: &str, metadata: &std::fs::Metadata) -> WorkingEntry {
    let mode = FileMode::from_metadata(metadata);
    let (mtime_sec, mtime_nsec) = mtime_parts(metadata);
    WorkingEntry { path: path.to_owned(), mode, size: metadata.len(), mtime_sec, mtime_nsec }
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

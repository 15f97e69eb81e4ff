//! Test Harness (C12, §4.13). Two fixture builders, both grounded in the teacher's
//! `test_utils.rs` convention of building small repositories under a `tempfile::TempDir`:
//!
//! - [`InMemoryRepo`] fakes the object database and reference store over `HashMap`s, writing
//!   only the index and working-tree files for real — fast, for unit tests of the merge logic.
//! - [`OnDiskFixture`] writes everything for real: zlib loose objects, a `HEAD`/`refs/heads`
//!   chain, and a binary index — for the end-to-end scenarios in §8.

use crate::index::{self, IndexEntry};
use crate::odb::{write_loose_object, ObjectDatabase, ObjectKind, RawObject};
use crate::oid::{hash_with_header, Oid};
use crate::refs::RefStore;
use crate::repo::Repository;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct InMemoryObjectDb(RefCell<HashMap<Oid, RawObject>>);

impl InMemoryObjectDb {
    pub fn new() -> Self {
        Self(RefCell::new(HashMap::new()))
    }

    pub fn insert(&self, kind: ObjectKind, body: Vec<u8>) -> Oid {
        let kind_str = match kind {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        };
        let oid = hash_with_header(kind_str, &body);
        self.0.borrow_mut().insert(oid, RawObject { kind, bytes: body });
        oid
    }
}

impl ObjectDatabase for InMemoryObjectDb {
    fn read_raw(&self, oid: Oid) -> crate::error::StatusResult<RawObject> {
        self.0
            .borrow()
            .get(&oid)
            .cloned()
            .ok_or_else(|| crate::error::StatusError::NotFound(oid.to_hex()))
    }
}

#[derive(Default)]
pub struct InMemoryRefStore(Cell<Option<Oid>>);

impl InMemoryRefStore {
    pub fn set_head(&self, oid: Oid) {
        self.0.set(Some(oid));
    }
}

impl RefStore for InMemoryRefStore {
    fn head_commit(&self) -> crate::error::StatusResult<Option<Oid>> {
        Ok(self.0.get())
    }
}

const METADATA_DIR: &str = ".git";

/// A repository with a faked object database and ref store, but real files on disk for the
/// index and working tree (§4.13).
pub struct InMemoryRepo {
    dir: TempDir,
    odb: InMemoryObjectDb,
    refs: InMemoryRefStore,
    index_entries: Vec<IndexEntry>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            odb: InMemoryObjectDb::new(),
            refs: InMemoryRefStore::default(),
            index_entries: Vec::new(),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn write_workdir_file(&mut self, path: &str, body: &[u8]) {
        let full = self.dir.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, body).unwrap();
    }

    pub fn insert_tree(&mut self, body: Vec<u8>) -> Oid {
        self.odb.insert(ObjectKind::Tree, body)
    }

    pub fn insert_blob(&mut self, body: Vec<u8>) -> Oid {
        self.odb.insert(ObjectKind::Blob, body)
    }

    pub fn set_head_tree(&mut self, tree_oid: Oid) {
        let commit_body = format!("tree {}\n", tree_oid.to_hex()).into_bytes();
        let commit_oid = self.odb.insert(ObjectKind::Commit, commit_body);
        self.refs.set_head(commit_oid);
    }

    pub fn stage_entry(&mut self, entry: IndexEntry) {
        self.index_entries.push(entry);
        self.index_entries.sort_by(|a, b| crate::path::cmp_full_paths(&a.path, &b.path));
        self.flush_index();
    }

    fn flush_index(&self) {
        let index_path = self.dir.path().join(METADATA_DIR).join("index");
        std::fs::create_dir_all(index_path.parent().unwrap()).unwrap();
        std::fs::write(index_path, index::serialize_index(&self.index_entries)).unwrap();
    }

    pub fn repository(&self) -> Repository<&InMemoryObjectDb, &InMemoryRefStore> {
        Repository::with_backends(self.dir.path(), METADATA_DIR, &self.odb, &self.refs)
    }
}

/// A repository written entirely for real: loose objects, `HEAD`/`refs/heads/...`, a binary
/// index file, and working-tree files — for the end-to-end scenarios (§8, §4.13).
pub struct OnDiskFixture {
    dir: TempDir,
    metadata_dir_name: String,
}

impl OnDiskFixture {
    pub fn new(metadata_dir_name: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(metadata_dir_name).join("objects")).unwrap();
        Self { dir, metadata_dir_name: metadata_dir_name.to_owned() }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    fn objects_dir(&self) -> PathBuf {
        self.dir.path().join(&self.metadata_dir_name).join("objects")
    }

    pub fn write_blob(&self, body: &[u8]) -> Oid {
        write_loose_object(&self.objects_dir(), "blob", body).unwrap()
    }

    pub fn write_tree(&self, body: &[u8]) -> Oid {
        write_loose_object(&self.objects_dir(), "tree", body).unwrap()
    }

    pub fn write_commit(&self, tree_oid: Oid) -> Oid {
        let body = format!("tree {}\n", tree_oid.to_hex()).into_bytes();
        write_loose_object(&self.objects_dir(), "commit", &body).unwrap()
    }

    pub fn set_head_branch(&self, branch: &str, commit_oid: Oid) {
        let refs_heads = self.dir.path().join(&self.metadata_dir_name).join("refs/heads");
        std::fs::create_dir_all(&refs_heads).unwrap();
        std::fs::write(refs_heads.join(branch), format!("{}\n", commit_oid.to_hex())).unwrap();
        std::fs::write(
            self.dir.path().join(&self.metadata_dir_name).join("HEAD"),
            format!("ref: refs/heads/{}\n", branch),
        )
        .unwrap();
    }

    pub fn write_index(&self, entries: &[IndexEntry]) {
        let index_path = self.dir.path().join(&self.metadata_dir_name).join("index");
        std::fs::write(index_path, index::serialize_index(entries)).unwrap();
    }

    pub fn write_workdir_file(&self, path: &str, body: &[u8]) {
        let full = self.dir.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, body).unwrap();
    }

    pub fn repository(&self) -> Repository {
        Repository::with_metadata_dir_name(self.dir.path(), &self.metadata_dir_name)
    }
}

/// Builds a minimal, valid tree entry line: `mode_in_octal SP name NUL oid_20_bytes`.
pub fn tree_entry_bytes(mode_octal: u32, name: &str, oid: Oid) -> Vec<u8> {
    let mut buf = format!("{:o} {}\0", mode_octal, name).into_bytes();
    buf.extend_from_slice(oid.as_bytes());
    buf
}

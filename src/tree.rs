//! Tree Flattener (C3, §4.3): turns a committed root tree into a lazy, fully-qualified, sorted
//! sequence of `(path, mode, oid)` leaf entries.

use crate::error::{StatusError, StatusResult};
use crate::mode::FileMode;
use crate::odb::ObjectDatabase;
use crate::oid::Oid;
use crate::path;
use fallible_iterator::FallibleIterator;
use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub mode: FileMode,
    pub oid: Oid,
}

struct RawEntry {
    name: String,
    mode: FileMode,
    oid: Oid,
}

/// Parses a tree object's body: `mode_in_octal SP name NUL oid_20_bytes`, repeated to the end
/// of the buffer.
fn parse_raw_entries(oid: Oid, body: &[u8]) -> StatusResult<Vec<RawEntry>> {
    let mut entries = Vec::new();
    let mut cursor = body;

    while !cursor.is_empty() {
        let space = cursor
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| StatusError::object_corrupted(oid, "truncated tree entry: missing mode separator"))?;
        let mode_str = std::str::from_utf8(&cursor[..space])
            .map_err(|_| StatusError::object_corrupted(oid, "tree entry mode is not utf8"))?;
        let mode_bits = u32::from_str_radix(mode_str, 8)
            .map_err(|_| StatusError::object_corrupted(oid, format!("bad mode `{}` in tree entry", mode_str)))?;
        let mode = FileMode::from_octal(mode_bits)
            .ok_or_else(|| StatusError::object_corrupted(oid, format!("unrecognized mode `{:o}`", mode_bits)))?;
        cursor = &cursor[space + 1..];

        let nul = cursor
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| StatusError::object_corrupted(oid, "truncated tree entry: missing name terminator"))?;
        let name = std::str::from_utf8(&cursor[..nul])
            .map_err(|_| StatusError::object_corrupted(oid, "tree entry name is not utf8"))?
            .to_owned();
        cursor = &cursor[nul + 1..];

        if cursor.len() < crate::oid::OID_SIZE {
            return Err(StatusError::object_corrupted(oid, "truncated tree entry: short oid"));
        }
        let mut oid_bytes = [0u8; crate::oid::OID_SIZE];
        oid_bytes.copy_from_slice(&cursor[..crate::oid::OID_SIZE]);
        cursor = &cursor[crate::oid::OID_SIZE..];

        entries.push(RawEntry { name, mode, oid: Oid::new(oid_bytes) });
    }

    Ok(entries)
}

/// Stack-based lazy flattening of a tree into leaf `(path, mode, oid)` entries, recursing into
/// directories on demand and re-sorting each level with the sibling rule (§4.2) before emission.
pub struct FlattenedTree<'a, D: ObjectDatabase> {
    db: &'a D,
    // (base path, entry): popped in canonical order because each level is pushed reversed.
    stack: Vec<(String, RawEntry)>,
}

impl<'a, D: ObjectDatabase> FlattenedTree<'a, D> {
    /// Starts flattening at `root_oid`. Pass `root_oid = None` for an unborn HEAD — yields an
    /// empty sequence (§4.3).
    pub fn new(db: &'a D, root_oid: Option<Oid>) -> StatusResult<Self> {
        let stack = match root_oid {
            None => Vec::new(),
            Some(oid) => {
                let body = db.read_tree(oid)?;
                let entries = sorted_entries(oid, &body)?;
                entries.into_iter().rev().map(|e| (String::new(), e)).collect()
            }
        };
        Ok(Self { db, stack })
    }
}

fn sorted_entries(oid: Oid, body: &[u8]) -> StatusResult<Vec<RawEntry>> {
    let mut entries = parse_raw_entries(oid, body)?;
    entries.sort_by(|a, b| path::cmp_siblings(&a.name, a.mode.is_directory(), &b.name, b.mode.is_directory()));
    Ok(entries)
}

impl<'a, D: ObjectDatabase> FallibleIterator for FlattenedTree<'a, D> {
    type Item = TreeEntry;
    type Error = StatusError;

    fn next(&mut self) -> StatusResult<Option<TreeEntry>> {
        loop {
            let (base, entry) = match self.stack.pop() {
                Some(x) => x,
                None => return Ok(None),
            };

            if entry.mode.is_directory() {
                let child_base = path::join(&base, &entry.name);
                debug!("flattening tree: descending into `{}` ({})", child_base, entry.oid);
                let body = self.db.read_tree(entry.oid)?;
                let children = sorted_entries(entry.oid, &body)?;
                self.stack.extend(children.into_iter().rev().map(|e| (child_base.clone(), e)));
                continue;
            }

            let full_path = path::join(&base, &entry.name);
            return Ok(Some(TreeEntry { path: full_path, mode: entry.mode, oid: entry.oid }));
        }
    }
}

/// Looks up a single path directly, descending only the tree objects on its path instead of
/// flattening the whole tree — the fast path `status_file` needs (§4.7).
pub fn find_tree_entry(db: &impl ObjectDatabase, root_oid: Oid, path: &str) -> StatusResult<Option<TreeEntry>> {
    let mut current_oid = root_oid;
    let mut base = String::new();
    let components: Vec<&str> = path.split('/').collect();

    for (idx, name) in components.iter().enumerate() {
        let body = db.read_tree(current_oid)?;
        let entries = parse_raw_entries(current_oid, &body)?;
        let found = match entries.iter().find(|e| e.name == *name) {
            Some(e) => e,
            None => return Ok(None),
        };
        let full_path = path::join(&base, &found.name);

        if idx == components.len() - 1 {
            return if found.mode.is_directory() { Ok(None) } else { Ok(Some(TreeEntry { path: full_path, mode: found.mode, oid: found.oid })) };
        }
        if !found.mode.is_directory() {
            return Ok(None);
        }
        current_oid = found.oid;
        base = full_path;
    }
    Ok(None)
}

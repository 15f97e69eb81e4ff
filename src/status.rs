//! Three-Way Merge & Classifier (C6, §4.6): the core algorithm. Walks the three sorted streams
//! in lockstep and derives a status bit-pair per path.

use crate::error::StatusResult;
use crate::index::IndexEntry;
use crate::oid::{hash_file, hash_symlink_target};
use crate::path::cmp_full_paths;
use crate::tree::TreeEntry;
use crate::workdir::WorkingEntry;
use bitflags::bitflags;
use log::trace;
use std::path::Path;

bitflags! {
    pub struct StatusFlags: u8 {
        const INDEX_NEW      = 0b0000_0001;
        const INDEX_MODIFIED = 0b0000_0010;
        const INDEX_DELETED  = 0b0000_0100;
        const WT_NEW         = 0b0000_1000;
        const WT_MODIFIED    = 0b0001_0000;
        const WT_DELETED     = 0b0010_0000;
    }
}

pub(crate) fn index_half(t: Option<&TreeEntry>, i: Option<&IndexEntry>) -> StatusFlags {
    match (t, i) {
        (None, None) => StatusFlags::empty(),
        (None, Some(_)) => StatusFlags::INDEX_NEW,
        (Some(_), None) => StatusFlags::INDEX_DELETED,
        (Some(t), Some(i)) if t.mode == i.mode && t.oid == i.oid => StatusFlags::empty(),
        (Some(_), Some(_)) => StatusFlags::INDEX_MODIFIED,
    }
}

/// Decides whether an index entry and a working-tree entry describe the same content (§4.6):
/// the stat shortcut first, falling back to hashing the working file. A hash match with a
/// changed mode is still reported as a mismatch — mode changes alone count as a modification.
fn working_content_matches(repo_root: &Path, i: &IndexEntry, w_path: &str, w: &WorkingEntry) -> StatusResult<bool> {
    if i.mode == w.mode
        && i.stat.size as u64 == w.size
        && i.stat.mtime_sec == w.mtime_sec
        && i.stat.mtime_nsec == w.mtime_nsec
    {
        return Ok(true);
    }

    let absolute = repo_root.join(w_path);
    let oid = if w.mode.is_symlink() { hash_symlink_target(&absolute)? } else { hash_file(&absolute)? };
    Ok(oid == i.oid && i.mode == w.mode)
}

pub(crate) fn working_half(repo_root: &Path, i: Option<&IndexEntry>, w_path: &str, w: Option<&WorkingEntry>) -> StatusResult<StatusFlags> {
    Ok(match (i, w) {
        (None, None) => StatusFlags::empty(),
        (None, Some(_)) => StatusFlags::WT_NEW,
        (Some(_), None) => StatusFlags::WT_DELETED,
        (Some(i), Some(w)) => {
            if working_content_matches(repo_root, i, w_path, w)? {
                StatusFlags::empty()
            } else {
                StatusFlags::WT_MODIFIED
            }
        }
    })
}

/// Three-way merge over materialized, canonically-sorted streams (§3 Invariants: all three
/// listings are materialized per invocation). Invokes `callback(path, flags)` for every row
/// whose flags are non-zero, in canonical order; a truthy return aborts enumeration, which is
/// not an error (§4.6, §4.7).
pub fn merge_and_classify(
    repo_root: &Path,
    tree: &[TreeEntry],
    index: &[IndexEntry],
    working: &[WorkingEntry],
    mut callback: impl FnMut(&str, StatusFlags) -> bool,
) -> StatusResult<()> {
    let (mut ti, mut ii, mut wi) = (0usize, 0usize, 0usize);

    loop {
        let t_path = tree.get(ti).map(|e| e.path.as_str());
        let i_path = index.get(ii).map(|e| e.path.as_str());
        let w_path = working.get(wi).map(|e| e.path.as_str());

        let min_path = match [t_path, i_path, w_path].into_iter().flatten().min_by(|a, b| cmp_full_paths(a, b)) {
            Some(p) => p.to_owned(),
            None => break,
        };

        let t = t_path.filter(|p| *p == min_path).map(|_| &tree[ti]);
        let i = i_path.filter(|p| *p == min_path).map(|_| &index[ii]);
        let w = w_path.filter(|p| *p == min_path).map(|_| &working[wi]);

        let i_flags = index_half(t, i);
        let w_flags = working_half(repo_root, i, &min_path, w)?;
        let flags = i_flags | w_flags;
        trace!("merge: `{}` -> {:?}", min_path, flags);

        if !flags.is_empty() && callback(&min_path, flags) {
            return Ok(());
        }

        if t.is_some() {
            ti += 1;
        }
        if i.is_some() {
            ii += 1;
        }
        if w.is_some() {
            wi += 1;
        }
    }

    Ok(())
}

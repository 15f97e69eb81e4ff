//! Canonical path ordering (§4.2).
//!
//! Two comparators are exposed. `cmp_full_paths` is plain byte-lexicographic comparison and is
//! what the three-way merge (§4.6) uses once every stream yields fully-qualified paths — a
//! strict prefix always sorts first, so a file `current_file` naturally sorts before the
//! deeper path `current_file/current_file` without any special-casing, because the real `/`
//! byte is already present in the string at the point of divergence.
//!
//! `cmp_siblings` is the rule tree/directory recursion needs while deciding in what order to
//! descend into *bare* sibling names at a single level, before they've been joined into full
//! paths: a name that denotes a directory sorts as though it carried a trailing `/`, so that
//! e.g. `subdir.txt` (continuing with `.`, 0x2E) sorts before the expansion of directory
//! `subdir` (continuing with `/`, 0x2F) even though `subdir` alone is a shorter byte-prefix of
//! neither.

use std::cmp::Ordering;

/// Ordinary byte-lexicographic comparison of two complete paths (§4.2, §4.6).
pub fn cmp_full_paths(a: &str, b: &str) -> Ordering {
    a.as_bytes().cmp(b.as_bytes())
}

/// Comparison of two bare sibling names at one directory/tree level, where `a_is_dir`/
/// `b_is_dir` says whether that name is about to be expanded into a subtree (§4.2, §4.3, §4.5).
pub fn cmp_siblings(a: &str, a_is_dir: bool, b: &str, b_is_dir: bool) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let min_len = a.len().min(b.len());
    a[..min_len].cmp(&b[..min_len]).then_with(|| {
        let x = if a.len() == min_len {
            if a_is_dir { b'/' } else { 0u8 }
        } else {
            a[min_len]
        };
        let y = if b.len() == min_len {
            if b_is_dir { b'/' } else { 0u8 }
        } else {
            b[min_len]
        };
        x.cmp(&y)
    })
}

/// Joins a parent path and a child name with `/`, treating an empty parent as the root.
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_owned()
    } else {
        format!("{}/{}", parent, child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_path_prefix_sorts_first() {
        assert_eq!(cmp_full_paths("current_file", "current_file/current_file"), Ordering::Less);
        assert_eq!(cmp_full_paths("current_file/current_file", "current_file"), Ordering::Greater);
    }

    #[test]
    fn full_path_file_before_directory_contents() {
        // '.' (0x2E) < '/' (0x2F), so the file sorts before the directory's children.
        assert_eq!(cmp_full_paths("subdir.txt", "subdir/nested.txt"), Ordering::Less);
    }

    #[test]
    fn sibling_rule_orders_directory_after_dotted_file() {
        // bare sibling names at one level: "subdir" (a directory) vs "subdir.txt" (a file)
        assert_eq!(cmp_siblings("subdir.txt", false, "subdir", true), Ordering::Less);
        assert_eq!(cmp_siblings("subdir", true, "subdir.txt", false), Ordering::Greater);
    }

    #[test]
    fn sibling_rule_matches_plain_order_for_two_files() {
        assert_eq!(cmp_siblings("current_file", false, "current_file2", false), Ordering::Less);
    }

    #[test]
    fn strictly_ascending_sequence_detects_violation() {
        let paths = ["a", "b", "b", "c"];
        let mut ok = true;
        for w in paths.windows(2) {
            if cmp_full_paths(w[0], w[1]) != Ordering::Less {
                ok = false;
            }
        }
        assert!(!ok);
    }
}

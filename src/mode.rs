//! File modes (§3).

use std::fmt::{self, Display, Formatter};
use std::fs::Metadata;

/// The ordering of variants is significant: directories must sort after every "file" kind
/// within a tree so that [`crate::path::cmp_siblings`]'s virtual trailing slash is the only
/// thing that can move them earlier.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum FileMode {
    Regular,
    Executable,
    Symlink,
    Directory,
    Gitlink,
}

impl FileMode {
    pub fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }

    pub fn is_symlink(self) -> bool {
        matches!(self, Self::Symlink)
    }

    pub fn from_metadata(metadata: &Metadata) -> Self {
        if metadata.file_type().is_symlink() {
            Self::Symlink
        } else if metadata.is_dir() {
            Self::Directory
        } else {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if metadata.permissions().mode() & 0o111 != 0 {
                    return Self::Executable;
                }
            }
            Self::Regular
        }
    }

    pub fn as_octal(self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
            Self::Gitlink => 0o160000,
        }
    }

    pub fn from_octal(mode: u32) -> Option<Self> {
        Some(match mode {
            0o100644 | 0o100664 | 0o100666 => Self::Regular,
            0o100755 => Self::Executable,
            0o120000 => Self::Symlink,
            0o040000 => Self::Directory,
            0o160000 => Self::Gitlink,
            _ => return None,
        })
    }
}

impl Display for FileMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:06o}", self.as_octal())
    }
}

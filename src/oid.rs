//! Object identifiers and the content hasher (§4.1).

use crate::error::{StatusError, StatusResult};
use log::trace;
use sha1::{Digest, Sha1};
use std::fmt::{self, Debug, Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

pub const OID_SIZE: usize = 20;

/// A 20-byte content identifier. Equality and ordering are byte-wise (`oid_cmp`, §4.1).
#[derive(PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct Oid([u8; OID_SIZE]);

impl Oid {
    /// The hash git assigns to a zero-length blob; useful as a sentinel default.
    pub const UNKNOWN: Self = Self([0; OID_SIZE]);

    #[inline]
    pub fn new(bytes: [u8; OID_SIZE]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; OID_SIZE] {
        &self.0
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Splits the hex representation into the loose-object directory/file pair (`ab/cdef...`).
    pub fn split_loose_path(self) -> (String, String) {
        let hex = self.to_hex();
        (hex[..2].to_owned(), hex[2..].to_owned())
    }
}

impl FromStr for Oid {
    type Err = StatusError;

    fn from_str(s: &str) -> StatusResult<Self> {
        oid_from_hex(s)
    }
}

impl AsRef<[u8]> for Oid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for Oid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Oid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Parses exactly 40 hex characters into an [`Oid`]; any other length or non-hex byte is
/// rejected (§4.1).
pub fn oid_from_hex(s: &str) -> StatusResult<Oid> {
    if s.len() != OID_SIZE * 2 {
        return Err(StatusError::NotAnOid(s.to_owned()));
    }
    let mut bytes = [0u8; OID_SIZE];
    hex::decode_to_slice(s, &mut bytes).map_err(|_| StatusError::NotAnOid(s.to_owned()))?;
    Ok(Oid::new(bytes))
}

#[inline]
pub fn oid_cmp(a: &Oid, b: &Oid) -> std::cmp::Ordering {
    a.0.cmp(&b.0)
}

pub fn hash_bytes(bytes: impl AsRef<[u8]>) -> Oid {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    Oid::new(hasher.finalize().into())
}

/// Hashes `header || body` the same way a loose object is addressed, where `header` is
/// `"<obj_type> <decimal-len>\0"`.
pub fn hash_with_header(obj_type: &str, body: &[u8]) -> Oid {
    let header = format!("{} {}\0", obj_type, body.len());
    let mut hasher = Sha1::new();
    hasher.update(header.as_bytes());
    hasher.update(body);
    Oid::new(hasher.finalize().into())
}

/// Computes the blob oid of a working-tree file (§4.1). Probes the size once via `metadata`,
/// reads the whole file, and fails with `ObjectCorrupted` if the observed length disagrees
/// with the probe (the file changed size under us).
pub fn hash_file(path: impl AsRef<Path>) -> StatusResult<Oid> {
    let path = path.as_ref();
    trace!("hashing working file `{}`", path.display());
    let mut file = File::open(path).map_err(|e| StatusError::os_error("open", path, e))?;
    let probed_size = file
        .metadata()
        .map_err(|e| StatusError::os_error("fstat", path, e))?
        .len();

    let header = format!("blob {}\0", probed_size);
    let mut hasher = Sha1::new();
    hasher.update(header.as_bytes());

    let mut body = Vec::with_capacity(probed_size as usize);
    file.read_to_end(&mut body).map_err(|e| StatusError::os_error("read", path, e))?;
    if body.len() as u64 != probed_size {
        return Err(StatusError::object_corrupted(
            Oid::UNKNOWN,
            format!(
                "`{}` reported size {} but {} bytes were read",
                path.display(),
                probed_size,
                body.len()
            ),
        ));
    }
    hasher.update(&body);
    Ok(Oid::new(hasher.finalize().into()))
}

/// Hashes the target string of a symlink as if it were blob content (§4.6 symlink rule).
pub fn hash_symlink_target(path: impl AsRef<Path>) -> StatusResult<Oid> {
    let path = path.as_ref();
    let target = std::fs::read_link(path).map_err(|e| StatusError::os_error("readlink", path, e))?;
    let bytes = target.to_str().ok_or_else(|| {
        StatusError::object_corrupted(Oid::UNKNOWN, format!("symlink target `{}` is not utf8", path.display()))
    })?;
    Ok(hash_with_header("blob", bytes.as_bytes()))
}

//! Object Database (C8, §4.8): resolves an oid to its raw bytes. Loose objects only — packfiles
//! are out of scope (§1 Non-goals).

use crate::error::{StatusError, StatusResult};
use crate::oid::Oid;
use flate2::read::ZlibDecoder;
use log::trace;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "blob" => Self::Blob,
            "tree" => Self::Tree,
            "commit" => Self::Commit,
            "tag" => Self::Tag,
            _ => return None,
        })
    }
}

#[derive(Clone)]
pub struct RawObject {
    pub kind: ObjectKind,
    pub bytes: Vec<u8>,
}

/// A source of git objects keyed by oid. The production implementation reads loose objects
/// from a `objects/` directory; tests substitute an in-memory map (§4.13).
pub trait ObjectDatabase {
    fn read_raw(&self, oid: Oid) -> StatusResult<RawObject>;

    fn read_tree(&self, oid: Oid) -> StatusResult<Vec<u8>> {
        let raw = self.read_raw(oid)?;
        if raw.kind != ObjectKind::Tree {
            return Err(StatusError::object_corrupted(oid, format!("expected tree, found {:?}", raw.kind)));
        }
        Ok(raw.bytes)
    }

    fn read_commit(&self, oid: Oid) -> StatusResult<Vec<u8>> {
        let raw = self.read_raw(oid)?;
        if raw.kind != ObjectKind::Commit {
            return Err(StatusError::object_corrupted(oid, format!("expected commit, found {:?}", raw.kind)));
        }
        Ok(raw.bytes)
    }
}

impl<T: ObjectDatabase + ?Sized> ObjectDatabase for &T {
    fn read_raw(&self, oid: Oid) -> StatusResult<RawObject> {
        (**self).read_raw(oid)
    }
}

/// Reads loose objects the standard way: `objects/<xx>/<38 remaining hex chars>`, each file a
/// zlib stream of `"<type> <size>\0<body>"`.
pub struct LooseObjectDb {
    objects_path: PathBuf,
}

impl LooseObjectDb {
    pub fn new(objects_path: impl Into<PathBuf>) -> Self {
        Self { objects_path: objects_path.into() }
    }

    fn loose_path(&self, oid: Oid) -> PathBuf {
        let (dir, file) = oid.split_loose_path();
        self.objects_path.join(dir).join(file)
    }
}

impl ObjectDatabase for LooseObjectDb {
    fn read_raw(&self, oid: Oid) -> StatusResult<RawObject> {
        let path = self.loose_path(oid);
        trace!("reading loose object `{}` from `{}`", oid, path.display());
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StatusError::NotFound(oid.to_hex())
            } else {
                StatusError::os_error("open", &path, e)
            }
        })?;
        let mut reader = BufReader::new(ZlibDecoder::new(file));

        let mut header = Vec::new();
        reader
            .read_until(0, &mut header)
            .map_err(|e| StatusError::os_error("read", &path, e))?;
        if header.last() != Some(&0) {
            return Err(StatusError::object_corrupted(oid, "missing NUL after object header"));
        }
        header.pop();
        let header = String::from_utf8(header)
            .map_err(|_| StatusError::object_corrupted(oid, "object header is not utf8"))?;
        let (type_str, size_str) = header
            .split_once(' ')
            .ok_or_else(|| StatusError::object_corrupted(oid, "malformed object header"))?;
        let kind = ObjectKind::parse(type_str)
            .ok_or_else(|| StatusError::object_corrupted(oid, format!("unknown object type `{}`", type_str)))?;
        let declared_size: usize = size_str
            .parse()
            .map_err(|_| StatusError::object_corrupted(oid, format!("bad size `{}` in header", size_str)))?;

        let mut bytes = Vec::with_capacity(declared_size);
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| StatusError::os_error("inflate", &path, e))?;
        if bytes.len() != declared_size {
            return Err(StatusError::object_corrupted(
                oid,
                format!("header declared size {} but body is {} bytes", declared_size, bytes.len()),
            ));
        }

        Ok(RawObject { kind, bytes })
    }
}

/// Compresses and writes a loose object. Not part of the status engine's public surface — the
/// engine is read-only — but shared by tests to build realistic fixtures (§4.13).
#[cfg(test)]
pub fn write_loose_object(objects_path: &Path, kind: &str, body: &[u8]) -> StatusResult<Oid> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let oid = crate::oid::hash_with_header(kind, body);
    let (dir, file) = oid.split_loose_path();
    let dir_path = objects_path.join(dir);
    std::fs::create_dir_all(&dir_path).map_err(|e| StatusError::os_error("mkdir", &dir_path, e))?;
    let path = dir_path.join(file);

    let header = format!("{} {}\0", kind, body.len());
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(header.as_bytes()).unwrap();
    encoder.write_all(body).unwrap();
    let compressed = encoder.finish().map_err(|e| StatusError::os_error("deflate", &path, e))?;
    std::fs::write(&path, compressed).map_err(|e| StatusError::os_error("write", &path, e))?;
    Ok(oid)
}

//! Index View (C4, §4.4, §6): parses the binary staging-area file (`DIRC` version 2) into a
//! sorted, in-memory list of entries.

use crate::error::{StatusError, StatusResult};
use crate::mode::FileMode;
use crate::oid::Oid;
use std::io::Read;
use std::path::Path;

const HEADER_SIGNATURE: &[u8; 4] = b"DIRC";
const SUPPORTED_VERSION: u32 = 2;

/// Bytes per entry excluding the variable-length path and its padding: four 4-byte time fields,
/// dev/ino/mode/uid/gid/size (six 4-byte fields), a 20-byte oid, and 2-byte flags.
const ENTRY_SIZE_WITHOUT_PATH: usize = 4 * 4 + 6 * 4 + crate::oid::OID_SIZE + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatCache {
    pub ctime_sec: u32,
    pub ctime_nsec: u32,
    pub mtime_sec: u32,
    pub mtime_nsec: u32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub path: String,
    pub mode: FileMode,
    pub oid: Oid,
    pub stat: StatCache,
}

fn read_u16(r: &mut impl Read) -> StatusResult<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf).map_err(|e| StatusError::os_error("read", Path::new("<index>"), e))?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u32(r: &mut impl Read) -> StatusResult<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(|e| StatusError::os_error("read", Path::new("<index>"), e))?;
    Ok(u32::from_be_bytes(buf))
}

fn read_oid(r: &mut impl Read) -> StatusResult<Oid> {
    let mut buf = [0u8; crate::oid::OID_SIZE];
    r.read_exact(&mut buf).map_err(|e| StatusError::os_error("read", Path::new("<index>"), e))?;
    Ok(Oid::new(buf))
}

/// Reads entries until the next NUL byte (inclusive), returning the path without the terminator.
fn read_null_terminated_path(r: &mut impl Read) -> StatusResult<(String, usize)> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        r.read_exact(&mut byte).map_err(|e| StatusError::os_error("read", Path::new("<index>"), e))?;
        if byte[0] == 0 {
            break;
        }
        bytes.push(byte[0]);
    }
    let consumed = bytes.len() + 1;
    let path = String::from_utf8(bytes)
        .map_err(|_| StatusError::RefCorrupted("index entry path is not utf8".into()))?;
    Ok((path, consumed))
}

/// Parses the whole index file body into a canonically-ordered list of entries. An empty index
/// (no entries) is valid. A stored order that is not strictly ascending under
/// [`crate::path::cmp_full_paths`] fails with `RefCorrupted` (§4.4).
pub fn parse_index(mut reader: impl Read) -> StatusResult<Vec<IndexEntry>> {
    let mut signature = [0u8; 4];
    reader
        .read_exact(&mut signature)
        .map_err(|e| StatusError::os_error("read", Path::new("<index>"), e))?;
    if &signature != HEADER_SIGNATURE {
        return Err(StatusError::RefCorrupted("index header signature is not `DIRC`".into()));
    }
    let version = read_u32(&mut reader)?;
    if version != SUPPORTED_VERSION {
        return Err(StatusError::RefCorrupted(format!("unsupported index version {}", version)));
    }
    let count = read_u32(&mut reader)?;

    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let ctime_sec = read_u32(&mut reader)?;
        let ctime_nsec = read_u32(&mut reader)?;
        let mtime_sec = read_u32(&mut reader)?;
        let mtime_nsec = read_u32(&mut reader)?;
        let _device = read_u32(&mut reader)?;
        let _inode = read_u32(&mut reader)?;
        let mode_bits = read_u32(&mut reader)?;
        let _uid = read_u32(&mut reader)?;
        let _gid = read_u32(&mut reader)?;
        let size = read_u32(&mut reader)?;
        let oid = read_oid(&mut reader)?;
        let flags = read_u16(&mut reader)?;
        let declared_len = (flags & 0x0fff) as usize;

        let (path, consumed) = read_null_terminated_path(&mut reader)?;
        if declared_len != 0xfff && path.len() != declared_len {
            return Err(StatusError::RefCorrupted(format!(
                "index entry `{}` declared length {} does not match actual length {}",
                path, declared_len, path.len()
            )));
        }

        let unpadded = ENTRY_SIZE_WITHOUT_PATH + consumed;
        let padding = (8 - unpadded % 8) % 8;
        if padding > 0 {
            let mut pad = vec![0u8; padding];
            reader
                .read_exact(&mut pad)
                .map_err(|e| StatusError::os_error("read", Path::new("<index>"), e))?;
        }

        let mode = FileMode::from_octal(mode_bits)
            .ok_or_else(|| StatusError::RefCorrupted(format!("invalid index entry mode {:o}", mode_bits)))?;

        entries.push(IndexEntry {
            path,
            mode,
            oid,
            stat: StatCache { ctime_sec, ctime_nsec, mtime_sec, mtime_nsec, size },
        });
    }

    for pair in entries.windows(2) {
        if crate::path::cmp_full_paths(&pair[0].path, &pair[1].path) != std::cmp::Ordering::Less {
            return Err(StatusError::RefCorrupted(format!(
                "index entries `{}` and `{}` are out of canonical order",
                pair[0].path, pair[1].path
            )));
        }
    }

    Ok(entries)
}

/// Serializes entries back into the `DIRC` v2 binary format. Not part of the engine's public
/// surface — the engine only reads the index — but used by the test harness to build realistic
/// on-disk fixtures (§4.13).
#[cfg(test)]
pub fn serialize_index(entries: &[IndexEntry]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(HEADER_SIGNATURE);
    buf.extend_from_slice(&SUPPORTED_VERSION.to_be_bytes());
    buf.extend_from_slice(&(entries.len() as u32).to_be_bytes());

    for entry in entries {
        buf.extend_from_slice(&entry.stat.ctime_sec.to_be_bytes());
        buf.extend_from_slice(&entry.stat.ctime_nsec.to_be_bytes());
        buf.extend_from_slice(&entry.stat.mtime_sec.to_be_bytes());
        buf.extend_from_slice(&entry.stat.mtime_nsec.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes()); // device
        buf.extend_from_slice(&0u32.to_be_bytes()); // inode
        buf.extend_from_slice(&entry.mode.as_octal().to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes()); // uid
        buf.extend_from_slice(&0u32.to_be_bytes()); // gid
        buf.extend_from_slice(&entry.stat.size.to_be_bytes());
        buf.extend_from_slice(entry.oid.as_bytes());
        let flags = (entry.path.len() as u16).min(0xfff);
        buf.extend_from_slice(&flags.to_be_bytes());
        buf.extend_from_slice(entry.path.as_bytes());
        buf.push(0);
        let unpadded = ENTRY_SIZE_WITHOUT_PATH + entry.path.len() + 1;
        let padding = (8 - unpadded % 8) % 8;
        buf.extend(std::iter::repeat(0u8).take(padding));
    }

    buf
}

//! The stable, named error contract (§4.10, §6, §7 of the design doc) plus a thread-local
//! diagnostics stack that lets nested call sites attach context without changing signatures.

use crate::oid::Oid;
use std::cell::RefCell;
use std::path::PathBuf;

pub type StatusResult<T> = Result<T, StatusError>;

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("`{0}` is not a valid object id")]
    NotAnOid(String),

    #[error("path `{0}` not found in tree, index, or working tree")]
    NotFound(String),

    #[error("object `{oid}` is corrupted: {reason}")]
    ObjectCorrupted { oid: String, reason: String },

    #[error("`{0}` is not a valid path for this operation")]
    InvalidPath(String),

    #[error("{syscall} failed on `{}`: {source}", path.display())]
    OsError { syscall: &'static str, path: PathBuf, #[source] source: std::io::Error },

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("ref store data is corrupted: {0}")]
    RefCorrupted(String),

    /// Kept for contract parity with the original numeric error table (§6); Rust's global
    /// allocator aborts the process on allocation failure instead of returning an error, so
    /// this variant is never actually constructed.
    #[error("out of memory")]
    OutOfMemory,
}

impl StatusError {
    pub fn object_corrupted(oid: Oid, reason: impl Into<String>) -> Self {
        Self::ObjectCorrupted { oid: oid.to_hex(), reason: reason.into() }
    }

    pub fn os_error(syscall: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OsError { syscall, path: path.into(), source }
    }

    /// Renders this error together with the accumulated diagnostics stack, innermost context
    /// first, matching the original's rethrow-based buffer (§7, §9).
    pub fn with_trace(&self) -> String {
        let trace = take_trace();
        if trace.is_empty() {
            self.to_string()
        } else {
            let mut s = self.to_string();
            for line in trace.iter().rev() {
                s.push_str("\n  - ");
                s.push_str(line);
            }
            s
        }
    }
}

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

/// Pushes a diagnostic breadcrumb onto the current thread's context stack. Intended to be
/// called from `map_err` sites wrapping a lower-level failure with the name of the path or
/// operation that was being attempted.
pub fn push_context(msg: impl Into<String>) {
    CONTEXT_STACK.with(|stack| stack.borrow_mut().push(msg.into()));
}

/// Drains and returns the current thread's context stack.
pub fn take_trace() -> Vec<String> {
    CONTEXT_STACK.with(|stack| std::mem::take(&mut *stack.borrow_mut()))
}

/// Runs `f`, pushing `ctx` onto the diagnostics stack if it returns an error.
pub fn with_context<T>(ctx: impl Into<String>, f: impl FnOnce() -> StatusResult<T>) -> StatusResult<T> {
    f().map_err(|e| {
        push_context(ctx.into());
        e
    })
}

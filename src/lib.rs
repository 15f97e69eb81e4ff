//! A three-way working-tree status engine: merges a committed tree, the staging index, and the
//! live working directory into a single stream of per-path status flags.
//!
//! The entry points are [`repo::Repository::status_foreach`] and
//! [`repo::Repository::status_file`]. Logging is emitted through the `log` facade at `trace`/
//! `debug` level; install a backend (e.g. `env_logger`) to see it.

#![deny(rust_2018_idioms)]

pub mod error;
pub mod index;
pub mod mode;
pub mod odb;
pub mod oid;
pub mod path;
pub mod refs;
pub mod repo;
pub mod status;
pub mod tree;
pub mod workdir;

#[cfg(test)]
mod testkit;

pub use error::{StatusError, StatusResult};
pub use oid::Oid;
pub use repo::Repository;
pub use status::StatusFlags;

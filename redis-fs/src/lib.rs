//! An in-memory POSIX-like filesystem designed to live inside a single
//! key-value entry: inode store, directory index, path resolution with
//! symlink traversal, line operations, and glob search with per-file
//! q-gram indexes.
//!
//! This crate knows nothing about keys or wire replies; see
//! `redis-fs-module` for the command surface.

pub mod bloom;
pub mod error;
pub mod inode;
pub mod line;
pub mod path;
pub mod pattern;
pub mod search;
pub mod volume;

#[cfg(test)]
mod tests;

pub use error::{FsError, Result};
pub use inode::{Body, FileData, Inode, InodeId, InodeKind};
pub use search::{GrepMatch, TypeFilter};
pub use volume::{EntryInfo, Follow, StatInfo, Volume, VolumeInfo, MAX_SYMLINK_HOPS, ROOT_ID};

pub use path::MAX_PATH_DEPTH;

//! Inodes: the metadata record for a file, directory, or symlink.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bloom::ContentIndex;

pub type InodeId = u64;

/// Default mode for newly created files.
pub const FILE_MODE: u16 = 0o644;
/// Default mode for newly created directories.
pub const DIR_MODE: u16 = 0o755;
/// Default mode for newly created symlinks.
pub const SYMLINK_MODE: u16 = 0o777;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InodeKind {
    File,
    Dir,
    Symlink,
}

impl InodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InodeKind::File => "file",
            InodeKind::Dir => "dir",
            InodeKind::Symlink => "symlink",
        }
    }
}

/// Byte buffer of a regular file plus its derived content index.
///
/// The index is a cache: never persisted, dropped on every content change and
/// rebuilt on demand by the search subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileData {
    pub bytes: Vec<u8>,
    #[serde(skip)]
    pub index: Option<ContentIndex>,
}

impl FileData {
    pub fn new(bytes: Vec<u8>) -> FileData {
        FileData { bytes, index: None }
    }

    pub fn set(&mut self, bytes: Vec<u8>) {
        self.bytes = bytes;
        self.index = None;
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
        self.index = None;
    }

    pub fn resize(&mut self, len: usize) {
        self.bytes.resize(len, 0);
        self.index = None;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Body {
    File(FileData),
    /// Directory index: entry name to child inode id.
    Dir(BTreeMap<String, InodeId>),
    /// Raw target path, stored verbatim and resolved only at traversal time.
    Symlink(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inode {
    pub id: InodeId,
    /// Permission bits, octal `0` through `0o7777`. Stored, never enforced.
    pub mode: u16,
    pub uid: u32,
    pub gid: u32,
    pub ctime: i64,
    pub atime: i64,
    pub mtime: i64,
    pub body: Body,
}

impl Inode {
    pub fn new_file(id: InodeId, bytes: Vec<u8>, now: i64) -> Inode {
        Inode::new(id, FILE_MODE, Body::File(FileData::new(bytes)), now)
    }

    pub fn new_dir(id: InodeId, now: i64) -> Inode {
        Inode::new(id, DIR_MODE, Body::Dir(BTreeMap::new()), now)
    }

    pub fn new_symlink(id: InodeId, target: String, now: i64) -> Inode {
        Inode::new(id, SYMLINK_MODE, Body::Symlink(target), now)
    }

    fn new(id: InodeId, mode: u16, body: Body, now: i64) -> Inode {
        Inode {
            id,
            mode,
            uid: 0,
            gid: 0,
            ctime: now,
            atime: now,
            mtime: now,
            body,
        }
    }

    pub fn kind(&self) -> InodeKind {
        match self.body {
            Body::File(_) => InodeKind::File,
            Body::Dir(_) => InodeKind::Dir,
            Body::Symlink(_) => InodeKind::Symlink,
        }
    }

    /// Size as reported by stat: byte length for files, target length for
    /// symlinks, entry count for directories.
    pub fn size(&self) -> u64 {
        match &self.body {
            Body::File(data) => data.bytes.len() as u64,
            Body::Dir(entries) => entries.len() as u64,
            Body::Symlink(target) => target.len() as u64,
        }
    }

    /// Stamp a content change.
    pub fn touch(&mut self, now: i64) {
        self.mtime = now;
        self.ctime = now;
    }
}

//! The volume: one complete filesystem tree and every operation on it.
//!
//! The inode table owns inodes by id; directory entries hold ids, never
//! pointers, and symlinks hold raw path strings, so deleting a target can
//! never dangle anything. Operations validate first and mutate second: a
//! failed call leaves the volume exactly as it was.

use std::collections::{BTreeMap, VecDeque};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{FsError, Result};
use crate::inode::{Body, FileData, Inode, InodeId, InodeKind};
use crate::{line, path};

/// A resolution that needs this many symlink substitutions has looped.
pub const MAX_SYMLINK_HOPS: usize = 40;

pub const ROOT_ID: InodeId = 1;

/// Terminal-symlink policy for a resolution. Intermediate symlinks are
/// always followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Follow {
    Terminal,
    NoFollow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    inodes: BTreeMap<InodeId, Inode>,
    next_id: InodeId,
}

/// Result of a successful walk.
struct Walk {
    id: InodeId,
    /// Directory holding the final entry, absent only for root.
    parent: Option<(InodeId, String)>,
}

/// Where a to-be-created leaf landed.
enum Location {
    Existing(InodeId),
    Vacant { dir: InodeId, name: String },
}

/// Per-path metadata snapshot, the shape `stat` reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatInfo {
    pub kind: InodeKind,
    pub mode: u16,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub ctime: i64,
    pub atime: i64,
    pub mtime: i64,
}

/// One directory entry as `ls` in long form reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub kind: InodeKind,
    pub mode: u16,
    pub size: u64,
    pub mtime: i64,
}

/// Whole-volume tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeInfo {
    pub files: u64,
    pub directories: u64,
    pub symlinks: u64,
    pub total_data_bytes: u64,
    pub total_inodes: u64,
}

impl Volume {
    pub fn new(now: i64) -> Volume {
        let mut inodes = BTreeMap::new();
        inodes.insert(ROOT_ID, Inode::new_dir(ROOT_ID, now));
        Volume {
            inodes,
            next_id: ROOT_ID + 1,
        }
    }

    /// True when only an empty root remains; the key lifecycle reclaims such
    /// a volume.
    pub fn is_vacant(&self) -> bool {
        match &self.node(ROOT_ID).body {
            Body::Dir(entries) => entries.is_empty(),
            _ => false,
        }
    }

    /// Structural soundness check for freshly deserialized volumes.
    pub fn validate(&self) -> Result<()> {
        let root = self.inodes.get(&ROOT_ID).ok_or(FsError::Corrupted)?;
        if root.kind() != InodeKind::Dir {
            return Err(FsError::Corrupted);
        }
        for node in self.inodes.values() {
            if node.id >= self.next_id {
                return Err(FsError::Corrupted);
            }
            if let Body::Dir(entries) = &node.body {
                for child in entries.values() {
                    if !self.inodes.contains_key(child) {
                        return Err(FsError::Corrupted);
                    }
                }
            }
        }
        Ok(())
    }

    // === Reading ===

    pub fn cat(&self, raw: &[u8]) -> Result<Vec<u8>> {
        self.with_file(raw, |data| Ok(data.bytes.clone()))
    }

    pub fn lines(&self, raw: &[u8], start: i64, end: i64) -> Result<Vec<u8>> {
        if start == 0 || start < -1 {
            return Err(FsError::invalid("line numbers are 1-indexed"));
        }
        let start = if start == -1 { 1 } else { start as usize };
        if end != -1 && (end < 0 || (end as usize) < start) {
            return Err(FsError::invalid("line range end precedes start"));
        }
        let end = if end == -1 { None } else { Some(end as usize) };
        self.with_file(raw, |data| Ok(line::slice_range(&data.bytes, start, end).to_vec()))
    }

    pub fn head(&self, raw: &[u8], n: i64) -> Result<Vec<u8>> {
        if n < 0 {
            return Err(FsError::invalid("line count must not be negative"));
        }
        self.with_file(raw, |data| Ok(line::head(&data.bytes, n as usize).to_vec()))
    }

    pub fn tail(&self, raw: &[u8], n: i64) -> Result<Vec<u8>> {
        if n < 0 {
            return Err(FsError::invalid("line count must not be negative"));
        }
        self.with_file(raw, |data| Ok(line::tail(&data.bytes, n as usize).to_vec()))
    }

    pub fn wc(&self, raw: &[u8]) -> Result<(u64, u64, u64)> {
        self.with_file(raw, |data| Ok(line::counts(&data.bytes)))
    }

    pub fn stat(&self, raw: &[u8]) -> Result<StatInfo> {
        let comps = path::normalize(raw)?;
        let walk = self.walk(&comps, Follow::NoFollow)?;
        let node = self.node(walk.id);
        Ok(StatInfo {
            kind: node.kind(),
            mode: node.mode,
            uid: node.uid,
            gid: node.gid,
            size: node.size(),
            ctime: node.ctime,
            atime: node.atime,
            mtime: node.mtime,
        })
    }

    /// Resolve normalized components to an inode id.
    pub fn resolve(&self, comps: &[String], follow: Follow) -> Result<InodeId> {
        Ok(self.walk(comps, follow)?.id)
    }

    /// Existence probe; resolution failures of any flavor read as "absent".
    pub fn exists(&self, raw: &[u8]) -> Result<bool> {
        let comps = path::normalize(raw)?;
        match self.walk(&comps, Follow::NoFollow) {
            Ok(_) => Ok(true),
            Err(FsError::NotFound) | Err(FsError::NotADirectory) | Err(FsError::SymlinkLoop) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn readlink(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let comps = path::normalize(raw)?;
        let walk = self.walk(&comps, Follow::NoFollow)?;
        match &self.node(walk.id).body {
            Body::Symlink(target) => Ok(target.clone().into_bytes()),
            _ => Err(FsError::NotASymlink),
        }
    }

    pub fn ls(&self, raw: &[u8]) -> Result<Vec<String>> {
        let comps = path::normalize(raw)?;
        let walk = self.walk(&comps, Follow::Terminal)?;
        match &self.node(walk.id).body {
            Body::Dir(entries) => Ok(entries.keys().cloned().collect()),
            _ => Err(FsError::NotADirectory),
        }
    }

    pub fn ls_long(&self, raw: &[u8]) -> Result<Vec<EntryInfo>> {
        let comps = path::normalize(raw)?;
        let walk = self.walk(&comps, Follow::Terminal)?;
        let entries = match &self.node(walk.id).body {
            Body::Dir(entries) => entries,
            _ => return Err(FsError::NotADirectory),
        };
        Ok(entries
            .iter()
            .map(|(name, &id)| {
                let node = self.node(id);
                EntryInfo {
                    name: name.clone(),
                    kind: node.kind(),
                    mode: node.mode,
                    size: node.size(),
                    mtime: node.mtime,
                }
            })
            .collect())
    }

    /// Render the subtree as an indented listing. Symlinks appear with their
    /// target but are never descended; `depth` caps recursion levels.
    pub fn tree(&self, raw: &[u8], depth: Option<usize>) -> Result<String> {
        let comps = path::normalize(raw)?;
        let walk = self.walk(&comps, Follow::Terminal)?;
        if self.node(walk.id).kind() != InodeKind::Dir {
            return Err(FsError::NotADirectory);
        }
        let mut out = path::display(&comps);
        out.push('\n');
        self.render_tree(walk.id, "", depth, &mut out);
        Ok(out)
    }

    pub fn info(&self) -> VolumeInfo {
        let mut info = VolumeInfo {
            files: 0,
            directories: 0,
            symlinks: 0,
            total_data_bytes: 0,
            total_inodes: self.inodes.len() as u64,
        };
        for node in self.inodes.values() {
            match &node.body {
                Body::File(data) => {
                    info.files += 1;
                    info.total_data_bytes += data.bytes.len() as u64;
                }
                Body::Dir(_) => info.directories += 1,
                Body::Symlink(_) => info.symlinks += 1,
            }
        }
        info
    }

    // === Writing ===

    /// Overwrite or append file content, creating the file and any missing
    /// parents. Returns the resulting size in bytes.
    pub fn write(&mut self, raw: &[u8], content: &[u8], append: bool, now: i64) -> Result<u64> {
        let comps = path::normalize(raw)?;
        if comps.is_empty() {
            return Err(FsError::InvalidPath);
        }
        match self.walk_for_create(&comps, true, Follow::Terminal, now)? {
            Location::Existing(id) => {
                let node = self.node_mut(id);
                let data = match &mut node.body {
                    Body::File(data) => data,
                    _ => return Err(FsError::NotAFile),
                };
                if append {
                    data.append(content);
                } else {
                    data.set(content.to_vec());
                }
                let size = data.bytes.len() as u64;
                node.touch(now);
                Ok(size)
            }
            Location::Vacant { dir, name } => {
                let id = self.alloc_id();
                self.attach(dir, &name, Inode::new_file(id, content.to_vec(), now), now)?;
                Ok(content.len() as u64)
            }
        }
    }

    /// Create an empty file, or refresh the timestamps of whatever exists.
    pub fn touch(&mut self, raw: &[u8], now: i64) -> Result<()> {
        let comps = path::normalize(raw)?;
        if comps.is_empty() {
            return Err(FsError::InvalidPath);
        }
        match self.walk_for_create(&comps, true, Follow::Terminal, now)? {
            Location::Existing(id) => {
                self.node_mut(id).touch(now);
                Ok(())
            }
            Location::Vacant { dir, name } => {
                let id = self.alloc_id();
                self.attach(dir, &name, Inode::new_file(id, Vec::new(), now), now)?;
                Ok(())
            }
        }
    }

    /// Insert text after a 1-indexed line; `0` prepends, `-1` appends.
    /// An absent file is created first.
    pub fn insert(&mut self, raw: &[u8], after_line: i64, text: &[u8], now: i64) -> Result<()> {
        if after_line < -1 {
            return Err(FsError::invalid("line number out of range"));
        }
        let comps = path::normalize(raw)?;
        if comps.is_empty() {
            return Err(FsError::InvalidPath);
        }
        match self.walk_for_create(&comps, true, Follow::Terminal, now)? {
            Location::Existing(id) => {
                let node = self.node_mut(id);
                let data = match &mut node.body {
                    Body::File(data) => data,
                    _ => return Err(FsError::NotAFile),
                };
                let updated = line::insert(&data.bytes, after_line, text);
                data.set(updated);
                node.touch(now);
                Ok(())
            }
            Location::Vacant { dir, name } => {
                let id = self.alloc_id();
                let content = line::insert(&[], after_line, text);
                self.attach(dir, &name, Inode::new_file(id, content, now), now)?;
                Ok(())
            }
        }
    }

    pub fn delete_lines(&mut self, raw: &[u8], start: i64, end: i64, now: i64) -> Result<u64> {
        if start < 1 || end < start {
            return Err(FsError::invalid("invalid line range"));
        }
        self.update_file(raw, now, |bytes| {
            let (updated, deleted) = line::delete(bytes, start as usize, end as usize);
            (updated, deleted as u64)
        })
    }

    pub fn replace(
        &mut self,
        raw: &[u8],
        old: &[u8],
        new: &[u8],
        band: Option<(i64, i64)>,
        all: bool,
        now: i64,
    ) -> Result<u64> {
        if old.is_empty() {
            return Err(FsError::invalid("empty search string"));
        }
        let band = match band {
            None => None,
            Some((s, e)) if s >= 1 && e >= s => Some((s as usize, e as usize)),
            Some(_) => return Err(FsError::invalid("invalid line range")),
        };
        self.update_file(raw, now, |bytes| line::replace(bytes, old, new, band, all))
    }

    pub fn truncate(&mut self, raw: &[u8], len: usize, now: i64) -> Result<()> {
        let comps = path::normalize(raw)?;
        let id = self.walk(&comps, Follow::Terminal)?.id;
        let node = self.node_mut(id);
        let data = match &mut node.body {
            Body::File(data) => data,
            _ => return Err(FsError::NotAFile),
        };
        data.resize(len);
        node.touch(now);
        Ok(())
    }

    // === Organization ===

    pub fn mkdir(&mut self, raw: &[u8], parents: bool, now: i64) -> Result<()> {
        let comps = path::normalize(raw)?;
        if comps.is_empty() {
            // Root always exists.
            return if parents { Ok(()) } else { Err(FsError::Exists) };
        }
        match self.walk_for_create(&comps, parents, Follow::NoFollow, now)? {
            Location::Existing(id) => match (self.node(id).kind(), parents) {
                (InodeKind::Dir, true) => Ok(()),
                (_, false) => Err(FsError::Exists),
                (_, true) => Err(FsError::NotADirectory),
            },
            Location::Vacant { dir, name } => {
                let id = self.alloc_id();
                self.attach(dir, &name, Inode::new_dir(id, now), now)?;
                Ok(())
            }
        }
    }

    /// Remove a path; `0` when nothing was there. The terminal symlink is
    /// removed itself, never its target.
    pub fn rm(&mut self, raw: &[u8], recursive: bool, now: i64) -> Result<u64> {
        let comps = path::normalize(raw)?;
        if comps.is_empty() {
            return Err(FsError::InvalidPath);
        }
        let walk = match self.walk(&comps, Follow::NoFollow) {
            Ok(walk) => walk,
            Err(FsError::NotFound) => return Ok(0),
            Err(e) => return Err(e),
        };
        let (parent, name) = walk.parent.ok_or(FsError::InvalidPath)?;
        if let Body::Dir(entries) = &self.node(walk.id).body {
            if !entries.is_empty() && !recursive {
                return Err(FsError::NotEmpty);
            }
        }
        self.detach(parent, &name, now);
        self.drop_subtree(walk.id);
        debug!("rm {}: removed inode {}", path::display(&comps), walk.id);
        Ok(1)
    }

    /// Copy a file or symlink (or, recursively, a directory) to a fresh
    /// path, preserving every metadata field of every copied inode.
    pub fn cp(&mut self, src_raw: &[u8], dst_raw: &[u8], recursive: bool, now: i64) -> Result<()> {
        let src = path::normalize(src_raw)?;
        let dst = path::normalize(dst_raw)?;
        let src_id = self.walk(&src, Follow::NoFollow)?.id;
        if self.node(src_id).kind() == InodeKind::Dir && !recursive {
            return Err(FsError::invalid(
                "cannot copy a directory without RECURSIVE",
            ));
        }
        if dst.is_empty() {
            return Err(FsError::Exists);
        }
        match self.walk_for_create(&dst, false, Follow::NoFollow, now)? {
            Location::Existing(_) => Err(FsError::Exists),
            Location::Vacant { dir, name } => {
                let copy = self.deep_clone(src_id);
                self.attach_entry(dir, &name, copy, now)
            }
        }
    }

    /// Move a node to a fresh path. Both the lexical prefix test and the
    /// id-level subtree test run before anything is detached.
    pub fn mv(&mut self, src_raw: &[u8], dst_raw: &[u8], now: i64) -> Result<()> {
        let src = path::normalize(src_raw)?;
        let dst = path::normalize(dst_raw)?;
        if src.is_empty() {
            return Err(FsError::InvalidPath);
        }
        if dst.len() > src.len() && dst[..src.len()] == src[..] {
            return Err(FsError::invalid(
                "cannot move a directory into its own subtree",
            ));
        }
        if dst.is_empty() {
            return Err(FsError::Exists);
        }
        let walk = self.walk(&src, Follow::NoFollow)?;
        let (src_parent, src_name) = walk.parent.ok_or(FsError::InvalidPath)?;
        match self.walk_for_create(&dst, false, Follow::NoFollow, now)? {
            Location::Existing(_) => Err(FsError::Exists),
            Location::Vacant { dir, name } => {
                if self.in_subtree(walk.id, dir) {
                    return Err(FsError::invalid(
                        "cannot move a directory into its own subtree",
                    ));
                }
                self.detach(src_parent, &src_name, now);
                self.attach_entry(dir, &name, walk.id, now)?;
                self.node_mut(walk.id).ctime = now;
                Ok(())
            }
        }
    }

    /// Store a symlink. The target goes in verbatim: it may be relative,
    /// may dangle, and is only interpreted when a resolution crosses it.
    pub fn ln(&mut self, target_raw: &[u8], link_raw: &[u8], now: i64) -> Result<()> {
        let target = core::str::from_utf8(target_raw)
            .map_err(|_| FsError::InvalidPath)?
            .to_string();
        let comps = path::normalize(link_raw)?;
        if comps.is_empty() {
            return Err(FsError::InvalidPath);
        }
        match self.walk_for_create(&comps, false, Follow::NoFollow, now)? {
            Location::Existing(_) => Err(FsError::Exists),
            Location::Vacant { dir, name } => {
                let id = self.alloc_id();
                self.attach(dir, &name, Inode::new_symlink(id, target, now), now)
                    .map(|_| ())
            }
        }
    }

    // === Metadata ===

    pub fn chmod(&mut self, raw: &[u8], mode: u16, now: i64) -> Result<()> {
        let id = self.resolve_no_follow(raw)?;
        let node = self.node_mut(id);
        node.mode = mode;
        node.ctime = now;
        Ok(())
    }

    pub fn chown(&mut self, raw: &[u8], uid: u32, gid: Option<u32>, now: i64) -> Result<()> {
        let id = self.resolve_no_follow(raw)?;
        let node = self.node_mut(id);
        node.uid = uid;
        if let Some(gid) = gid {
            node.gid = gid;
        }
        node.ctime = now;
        Ok(())
    }

    /// Set atime/mtime; `-1` leaves the corresponding field untouched.
    pub fn utimens(&mut self, raw: &[u8], atime: i64, mtime: i64, now: i64) -> Result<()> {
        let id = self.resolve_no_follow(raw)?;
        let node = self.node_mut(id);
        if atime != -1 {
            node.atime = atime;
        }
        if mtime != -1 {
            node.mtime = mtime;
        }
        node.ctime = now;
        Ok(())
    }

    // === Internals ===

    pub(crate) fn node(&self, id: InodeId) -> &Inode {
        &self.inodes[&id]
    }

    pub(crate) fn node_mut(&mut self, id: InodeId) -> &mut Inode {
        self.inodes.get_mut(&id).expect("inode table entry")
    }

    fn alloc_id(&mut self) -> InodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn resolve_no_follow(&self, raw: &[u8]) -> Result<InodeId> {
        let comps = path::normalize(raw)?;
        Ok(self.walk(&comps, Follow::NoFollow)?.id)
    }

    /// Walk normalized components from root, substituting symlink targets as
    /// they are crossed. One shared hop counter catches self-loops, mutual
    /// loops, and over-long chains alike.
    fn walk(&self, comps: &[String], follow: Follow) -> Result<Walk> {
        let mut queue: VecDeque<String> = comps.iter().cloned().collect();
        let mut cur = ROOT_ID;
        let mut cur_path: Vec<String> = Vec::new();
        let mut parent = None;
        let mut hops = 0usize;
        while let Some(name) = queue.pop_front() {
            let entries = match &self.node(cur).body {
                Body::Dir(entries) => entries,
                _ => return Err(FsError::NotADirectory),
            };
            let child = *entries.get(&name).ok_or(FsError::NotFound)?;
            let terminal = queue.is_empty();
            if let Body::Symlink(target) = &self.node(child).body {
                if !terminal || follow == Follow::Terminal {
                    hops += 1;
                    if hops >= MAX_SYMLINK_HOPS {
                        return Err(FsError::SymlinkLoop);
                    }
                    let expanded = path::expand_target(&cur_path, target)?;
                    let mut next: VecDeque<String> = expanded.into_iter().collect();
                    next.extend(queue.drain(..));
                    queue = next;
                    cur = ROOT_ID;
                    cur_path.clear();
                    parent = None;
                    continue;
                }
            }
            parent = Some((cur, name.clone()));
            cur = child;
            cur_path.push(name);
        }
        Ok(Walk { id: cur, parent })
    }

    /// Walk toward a leaf that may not exist yet. Missing intermediate
    /// directories are created when `create_dirs` is set; a missing terminal
    /// component comes back as `Location::Vacant`.
    fn walk_for_create(
        &mut self,
        comps: &[String],
        create_dirs: bool,
        follow: Follow,
        now: i64,
    ) -> Result<Location> {
        let mut queue: VecDeque<String> = comps.iter().cloned().collect();
        let mut cur = ROOT_ID;
        let mut cur_path: Vec<String> = Vec::new();
        let mut hops = 0usize;
        while let Some(name) = queue.pop_front() {
            let terminal = queue.is_empty();
            let existing = match &self.node(cur).body {
                Body::Dir(entries) => entries.get(&name).copied(),
                _ => return Err(FsError::NotADirectory),
            };
            let child = match existing {
                Some(id) => id,
                None if terminal => return Ok(Location::Vacant { dir: cur, name }),
                None if create_dirs => {
                    let id = self.alloc_id();
                    self.attach(cur, &name, Inode::new_dir(id, now), now)?
                }
                None => return Err(FsError::NotFound),
            };
            if let Body::Symlink(target) = &self.node(child).body {
                if !terminal || follow == Follow::Terminal {
                    hops += 1;
                    if hops >= MAX_SYMLINK_HOPS {
                        return Err(FsError::SymlinkLoop);
                    }
                    let expanded = path::expand_target(&cur_path, target)?;
                    let mut next: VecDeque<String> = expanded.into_iter().collect();
                    next.extend(queue.drain(..));
                    queue = next;
                    cur = ROOT_ID;
                    cur_path.clear();
                    continue;
                }
            }
            cur = child;
            cur_path.push(name);
        }
        Ok(Location::Existing(cur))
    }

    /// Register a fresh inode and enter it into `dir`.
    fn attach(&mut self, dir: InodeId, name: &str, node: Inode, now: i64) -> Result<InodeId> {
        let id = node.id;
        self.inodes.insert(id, node);
        self.attach_entry(dir, name, id, now)?;
        Ok(id)
    }

    fn attach_entry(&mut self, dir: InodeId, name: &str, id: InodeId, now: i64) -> Result<()> {
        match &mut self.node_mut(dir).body {
            Body::Dir(entries) => {
                entries.insert(name.to_string(), id);
            }
            _ => return Err(FsError::NotADirectory),
        }
        self.node_mut(dir).touch(now);
        Ok(())
    }

    fn detach(&mut self, dir: InodeId, name: &str, now: i64) {
        if let Body::Dir(entries) = &mut self.node_mut(dir).body {
            entries.remove(name);
        }
        self.node_mut(dir).touch(now);
    }

    fn drop_subtree(&mut self, id: InodeId) {
        let children: Vec<InodeId> = match &self.node(id).body {
            Body::Dir(entries) => entries.values().copied().collect(),
            _ => Vec::new(),
        };
        for child in children {
            self.drop_subtree(child);
        }
        self.inodes.remove(&id);
    }

    /// Clone an inode (and, for directories, its whole subtree) under fresh
    /// ids, preserving mode, ownership and all three timestamps.
    fn deep_clone(&mut self, id: InodeId) -> InodeId {
        let src = self.node(id).clone();
        let body = match src.body {
            Body::File(data) => Body::File(FileData::new(data.bytes)),
            Body::Symlink(target) => Body::Symlink(target),
            Body::Dir(entries) => {
                let mut copies = BTreeMap::new();
                for (name, child) in entries {
                    copies.insert(name, self.deep_clone(child));
                }
                Body::Dir(copies)
            }
        };
        let copy_id = self.alloc_id();
        self.inodes.insert(
            copy_id,
            Inode {
                id: copy_id,
                mode: src.mode,
                uid: src.uid,
                gid: src.gid,
                ctime: src.ctime,
                atime: src.atime,
                mtime: src.mtime,
                body,
            },
        );
        copy_id
    }

    fn in_subtree(&self, root: InodeId, candidate: InodeId) -> bool {
        if root == candidate {
            return true;
        }
        match &self.node(root).body {
            Body::Dir(entries) => entries.values().any(|&c| self.in_subtree(c, candidate)),
            _ => false,
        }
    }

    /// Resolve to a file (following terminal symlinks) and read through `f`.
    fn with_file<T>(&self, raw: &[u8], f: impl FnOnce(&FileData) -> Result<T>) -> Result<T> {
        let comps = path::normalize(raw)?;
        let walk = self.walk(&comps, Follow::Terminal)?;
        match &self.node(walk.id).body {
            Body::File(data) => f(data),
            _ => Err(FsError::NotAFile),
        }
    }

    /// Resolve to an existing file and rewrite its content; timestamps move
    /// only when the rewrite changed something.
    fn update_file(
        &mut self,
        raw: &[u8],
        now: i64,
        f: impl FnOnce(&[u8]) -> (Vec<u8>, u64),
    ) -> Result<u64> {
        let comps = path::normalize(raw)?;
        let id = self.walk(&comps, Follow::Terminal)?.id;
        let node = self.node_mut(id);
        let data = match &mut node.body {
            Body::File(data) => data,
            _ => return Err(FsError::NotAFile),
        };
        let (updated, outcome) = f(&data.bytes);
        if updated != data.bytes {
            data.set(updated);
            node.touch(now);
        }
        Ok(outcome)
    }

    fn render_tree(&self, dir: InodeId, prefix: &str, depth: Option<usize>, out: &mut String) {
        let entries = match &self.node(dir).body {
            Body::Dir(entries) => entries,
            _ => return,
        };
        let last = entries.len().saturating_sub(1);
        for (i, (name, &id)) in entries.iter().enumerate() {
            let branch = if i == last { "`-- " } else { "|-- " };
            let node = self.node(id);
            match &node.body {
                Body::Symlink(target) => {
                    out.push_str(&format!("{}{}{} -> {}\n", prefix, branch, name, target));
                }
                Body::Dir(_) => {
                    out.push_str(&format!("{}{}{}\n", prefix, branch, name));
                    let descend = depth.map_or(true, |d| d > 1);
                    if descend {
                        let extended =
                            format!("{}{}", prefix, if i == last { "    " } else { "|   " });
                        self.render_tree(id, &extended, depth.map(|d| d - 1), out);
                    }
                }
                Body::File(_) => {
                    out.push_str(&format!("{}{}{}\n", prefix, branch, name));
                }
            }
        }
    }

    /// Walk entry used by the search subsystem.
    pub(crate) fn resolve_dirish(&self, raw: &[u8]) -> Result<(InodeId, String)> {
        let comps = path::normalize(raw)?;
        let walk = self.walk(&comps, Follow::Terminal)?;
        Ok((walk.id, path::display(&comps)))
    }
}

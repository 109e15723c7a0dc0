//! Recursive search: name globs over the tree and content globs over file
//! data, the latter pre-filtered by each file's q-gram index.

use log::trace;

use crate::bloom::{ContentIndex, GRAM_LEN};
use crate::error::{FsError, Result};
use crate::inode::{Body, InodeId, InodeKind};
use crate::path;
use crate::pattern::Glob;
use crate::volume::Volume;

/// Inode-kind filter accepted by name search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    File,
    Dir,
    Link,
}

impl TypeFilter {
    pub fn parse(raw: &[u8]) -> Result<TypeFilter> {
        if raw.eq_ignore_ascii_case(b"file") {
            Ok(TypeFilter::File)
        } else if raw.eq_ignore_ascii_case(b"dir") {
            Ok(TypeFilter::Dir)
        } else if raw.eq_ignore_ascii_case(b"link") {
            Ok(TypeFilter::Link)
        } else {
            Err(FsError::invalid("TYPE must be file, dir or link"))
        }
    }

    fn accepts(self, kind: InodeKind) -> bool {
        match self {
            TypeFilter::File => kind == InodeKind::File,
            TypeFilter::Dir => kind == InodeKind::Dir,
            TypeFilter::Link => kind == InodeKind::Symlink,
        }
    }
}

/// One content-search hit. Binary files collapse into a single pseudo-line
/// numbered 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrepMatch {
    pub path: String,
    pub line: u64,
    pub text: Vec<u8>,
}

const BINARY_NOTICE: &[u8] = b"Binary file matches";

impl Volume {
    /// Glob-match the basename of every descendant, depth-first. Symlinks
    /// show up as candidates but are never descended.
    pub fn find(
        &self,
        raw: &[u8],
        pattern: &[u8],
        filter: Option<TypeFilter>,
    ) -> Result<Vec<String>> {
        let glob = Glob::compile(pattern, false)?;
        let (start, base) = self.resolve_dirish(raw)?;
        if self.node(start).kind() != InodeKind::Dir {
            return Err(FsError::NotADirectory);
        }
        let mut out = Vec::new();
        self.find_walk(start, &base, &glob, filter, &mut out);
        Ok(out)
    }

    fn find_walk(
        &self,
        dir: InodeId,
        base: &str,
        glob: &Glob,
        filter: Option<TypeFilter>,
        out: &mut Vec<String>,
    ) {
        let entries = match &self.node(dir).body {
            Body::Dir(entries) => entries,
            _ => return,
        };
        for (name, &id) in entries {
            let here = path::child(base, name);
            let kind = self.node(id).kind();
            if filter.map_or(true, |f| f.accepts(kind)) && glob.matches(name) {
                out.push(here.clone());
            }
            if kind == InodeKind::Dir {
                self.find_walk(id, &here, glob, filter, out);
            }
        }
    }

    /// Glob-match every line of every file under the start path. A file's
    /// q-gram index is consulted (and built, if missing) before its lines
    /// are scanned; a pattern without usable literals scans everything.
    pub fn grep(&mut self, raw: &[u8], pattern: &[u8], nocase: bool) -> Result<Vec<GrepMatch>> {
        let glob = Glob::compile(pattern, nocase)?;
        let grams = glob.literal_grams();
        let (start, base) = self.resolve_dirish(raw)?;
        let mut out = Vec::new();
        match self.node(start).kind() {
            InodeKind::Dir => self.grep_walk(start, &base, &glob, &grams, &mut out),
            InodeKind::File => self.grep_file(start, &base, &glob, &grams, &mut out),
            InodeKind::Symlink => {}
        }
        Ok(out)
    }

    fn grep_walk(
        &mut self,
        dir: InodeId,
        base: &str,
        glob: &Glob,
        grams: &[Vec<u8>],
        out: &mut Vec<GrepMatch>,
    ) {
        let entries: Vec<(String, InodeId)> = match &self.node(dir).body {
            Body::Dir(entries) => entries.iter().map(|(n, &id)| (n.clone(), id)).collect(),
            _ => return,
        };
        for (name, id) in entries {
            let here = path::child(base, &name);
            match self.node(id).kind() {
                InodeKind::File => self.grep_file(id, &here, glob, grams, out),
                InodeKind::Dir => self.grep_walk(id, &here, glob, grams, out),
                InodeKind::Symlink => {}
            }
        }
    }

    fn grep_file(
        &mut self,
        id: InodeId,
        here: &str,
        glob: &Glob,
        grams: &[Vec<u8>],
        out: &mut Vec<GrepMatch>,
    ) {
        let data = match &mut self.node_mut(id).body {
            Body::File(data) => data,
            _ => return,
        };
        if data.index.is_none() {
            data.index = Some(ContentIndex::build(&data.bytes));
        }
        if let Some(index) = &data.index {
            if grams.iter().any(|g| g.len() == GRAM_LEN && !index.may_contain(g)) {
                trace!("grep: index skips {}", here);
                return;
            }
        }
        let bytes = &data.bytes;
        if bytes.contains(&0) {
            let hit = split_lines(bytes).any(|l| glob.matches(&String::from_utf8_lossy(l)));
            if hit {
                out.push(GrepMatch {
                    path: here.to_string(),
                    line: 0,
                    text: BINARY_NOTICE.to_vec(),
                });
            }
            return;
        }
        for (i, l) in split_lines(bytes).enumerate() {
            if glob.matches(&String::from_utf8_lossy(l)) {
                out.push(GrepMatch {
                    path: here.to_string(),
                    line: i as u64 + 1,
                    text: l.to_vec(),
                });
            }
        }
    }
}

/// Lines for content search; a trailing newline does not produce a final
/// empty line.
fn split_lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = match content.split_last() {
        Some((&b'\n', body)) => body,
        _ => content,
    };
    let empty = content.is_empty();
    body.split(move |&b| b == b'\n').filter(move |_| !empty)
}

//! Path lexing and normalization.

use crate::error::{FsError, Result};

/// Maximum number of components in a normalized path.
pub const MAX_PATH_DEPTH: usize = 256;

/// Canonicalize an absolute path into its component list.
///
/// Runs of `/` collapse, `.` drops out, `..` resolves lexically (and stays at
/// root when there is nothing left to pop), a trailing `/` is discarded.
/// The root itself normalizes to an empty component list.
pub fn normalize(raw: &[u8]) -> Result<Vec<String>> {
    let s = core::str::from_utf8(raw).map_err(|_| FsError::InvalidPath)?;
    if !s.starts_with('/') {
        return Err(FsError::InvalidPath);
    }
    let mut parts = Vec::new();
    push_components(&mut parts, s);
    if parts.len() > MAX_PATH_DEPTH {
        return Err(FsError::DepthExceeded);
    }
    Ok(parts)
}

/// Expand a symlink target against the components of the directory that
/// contains the link. Absolute targets restart at root.
pub fn expand_target(base: &[String], target: &str) -> Result<Vec<String>> {
    let mut parts = if target.starts_with('/') {
        Vec::new()
    } else {
        base.to_vec()
    };
    push_components(&mut parts, target);
    if parts.len() > MAX_PATH_DEPTH {
        return Err(FsError::DepthExceeded);
    }
    Ok(parts)
}

/// Render a component list back into an absolute path.
pub fn display(parts: &[String]) -> String {
    if parts.is_empty() {
        String::from("/")
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Join a child name onto an already-rendered directory path.
pub fn child(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

fn push_components(parts: &mut Vec<String>, s: &str) {
    for comp in s.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name.to_string()),
        }
    }
}

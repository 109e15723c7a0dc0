use core::result;
use thiserror::Error;

/// Error taxonomy shared by every layer.
///
/// `Display` output is the client-visible message; clients pattern-match on a
/// stable lowercase substring rather than the exact wording, so messages here
/// must keep those substrings intact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("no such file or directory")]
    NotFound,
    #[error("not a file")]
    NotAFile,
    #[error("not a directory")]
    NotADirectory,
    #[error("not a symlink")]
    NotASymlink,
    #[error("file exists")]
    Exists,
    #[error("directory not empty")]
    NotEmpty,
    #[error("invalid path")]
    InvalidPath,
    #[error("{0}")]
    InvalidArgument(String),
    #[error("path exceeds maximum depth")]
    DepthExceeded,
    #[error("too many levels of symbolic links")]
    SymlinkLoop,
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(String),
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("bad filesystem payload")]
    Corrupted,
}

impl FsError {
    pub fn invalid(msg: impl Into<String>) -> FsError {
        FsError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = result::Result<T, FsError>;

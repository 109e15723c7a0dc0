//! Volume persistence payloads.
//!
//! The encoding is private to the module: a host binding hands the bytes to
//! its RDB/AOF stream and back. Every observable inode field round-trips —
//! ids, kinds, modes, ownership, all three timestamps, raw file bytes and
//! stored symlink targets. Content indexes are derived state and are never
//! written; they reappear lazily on the first search after a load.

use log::debug;

use redis_fs::{FsError, Result, Volume};

pub fn save(volume: &Volume) -> Result<Vec<u8>> {
    bincode::serialize(volume).map_err(|_| FsError::Corrupted)
}

pub fn load(payload: &[u8]) -> Result<Volume> {
    let volume: Volume = bincode::deserialize(payload).map_err(|_| FsError::Corrupted)?;
    volume.validate()?;
    debug!(
        "loaded volume: {} inodes, {} data bytes",
        volume.info().total_inodes,
        volume.info().total_data_bytes
    );
    Ok(volume)
}

//! The `FS.*` command surface over `redis-fs` volumes.
//!
//! One key holds one volume. The keyspace here models exactly the slice of
//! host state the module touches: value lookup with the WRONGTYPE
//! discipline, lazy volume creation on the first mutation, and automatic
//! key deletion once only an empty root remains. A host binding forwards
//! its raw argv to [`Keyspace::execute`] and maps [`Reply`] onto its wire
//! protocol.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use redis_fs::{FsError, Result, Volume};

pub mod command;
pub mod rdb;
pub mod reply;


pub use reply::Reply;

/// Timestamp source handed to volume operations. Pluggable so tests can
/// drive the clock instead of sleeping.
pub trait Clock {
    fn now(&self) -> i64;
}

/// Wall-clock seconds since the epoch.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(_) => 0,
        }
    }
}

/// What a key may hold: a filesystem volume, or some foreign value type
/// (standing in for the host's other types, so WRONGTYPE paths are
/// exercisable without a host).
pub enum Value {
    Fs(Volume),
    Other(&'static str),
}

pub struct Keyspace {
    keys: HashMap<String, Value>,
    clock: Box<dyn Clock>,
}

impl Default for Keyspace {
    fn default() -> Self {
        Keyspace::new()
    }
}

impl Keyspace {
    pub fn new() -> Keyspace {
        Keyspace::with_clock(Box::new(SystemClock))
    }

    pub fn with_clock(clock: Box<dyn Clock>) -> Keyspace {
        Keyspace {
            keys: HashMap::new(),
            clock,
        }
    }

    /// Dispatch one command, argv exactly as the host delivers it.
    pub fn execute(&mut self, argv: &[&[u8]]) -> Result<Reply> {
        command::execute(self, argv)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Plant a foreign value under `key`, as `SET`/`HSET`/… would.
    pub fn set_other(&mut self, key: &str, kind: &'static str) {
        self.keys.insert(key.to_string(), Value::Other(kind));
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.keys.remove(key).is_some()
    }

    /// Re-encode and reload every volume in place, the way the host's
    /// `DEBUG RELOAD` exercises the persistence callbacks.
    pub fn debug_reload(&mut self) -> Result<()> {
        let names: Vec<String> = self.keys.keys().cloned().collect();
        for name in names {
            if let Some(Value::Fs(volume)) = self.keys.get(&name) {
                let payload = rdb::save(volume)?;
                let reloaded = rdb::load(&payload)?;
                self.keys.insert(name, Value::Fs(reloaded));
            }
        }
        Ok(())
    }

    pub(crate) fn volume_mut(&mut self, key: &str) -> Result<Option<&mut Volume>> {
        match self.keys.get_mut(key) {
            Some(Value::Fs(volume)) => Ok(Some(volume)),
            Some(Value::Other(_)) => Err(FsError::WrongType),
            None => Ok(None),
        }
    }

    /// Run a mutation against the key's volume, materializing a fresh one
    /// for an absent key and reclaiming the key when the volume comes out
    /// vacant. A failed mutation against an absent key leaves no key.
    pub(crate) fn mutate<R>(
        &mut self,
        key: &str,
        f: impl FnOnce(&mut Volume, i64) -> Result<R>,
    ) -> Result<R> {
        let now = self.clock.now();
        let existing = match self.keys.remove(key) {
            Some(Value::Other(kind)) => {
                self.keys.insert(key.to_string(), Value::Other(kind));
                return Err(FsError::WrongType);
            }
            Some(Value::Fs(volume)) => Some(volume),
            None => None,
        };
        let preexisting = existing.is_some();
        let mut volume = existing.unwrap_or_else(|| Volume::new(now));
        let result = f(&mut volume, now);
        let keep = match &result {
            Ok(_) => !volume.is_vacant(),
            Err(_) => preexisting,
        };
        if keep {
            self.keys.insert(key.to_string(), Value::Fs(volume));
        } else if preexisting {
            debug!("key '{}' reclaimed: volume is vacant", key);
        }
        result
    }
}

//! JSON file store with atomic replace.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use watcher_core::StateError;

/// Reads and writes one serialized `T` at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict load: `Ok(None)` when no state exists yet.
    pub fn try_load(&self) -> Result<Option<T>, StateError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StateError::io(&self.path, e)),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StateError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    /// Lenient load used by the bots.
    ///
    /// Missing state is a first run. Unreadable or corrupt state is logged
    /// and treated as empty, accepting one possible re-alert.
    pub fn load(&self) -> T {
        match self.try_load() {
            Ok(Some(state)) => state,
            Ok(None) => {
                debug!(path = %self.path.display(), "No prior state, starting empty");
                T::default()
            }
            Err(e) => {
                warn!(error = %e, "State unreadable, starting empty");
                T::default()
            }
        }
    }

    /// Write the full state through a temp file in the same directory.
    pub fn save(&self, state: &T) -> Result<(), StateError> {
        let mut body = serde_json::to_string_pretty(state).map_err(|source| StateError::Serialize {
            path: self.path.clone(),
            source,
        })?;
        body.push('\n');

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| StateError::io(&dir, e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| StateError::io(&dir, e))?;
        tmp.write_all(body.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StateError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| StateError::io(&self.path, e.error))?;

        debug!(path = %self.path.display(), bytes = body.len(), "State saved");
        Ok(())
    }
}

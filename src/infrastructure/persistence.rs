use crate::domain::StoreError;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type StoreErrorCallback = Arc<dyn Fn(&StoreError) + Send + Sync>;

/// Key-value store keeping one pretty-printed JSON file per key.
///
/// Reads never fail from the caller's point of view: anything missing or
/// unreadable yields the supplied default. Writes replace the whole file
/// through a rename and report failures to the error callback only.
pub struct JsonStore {
    dir: PathBuf,
    on_error: StoreErrorCallback,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            on_error: Arc::new(|error| tracing::warn!(%error, "state write failed")),
        }
    }

    pub fn with_error_callback(
        mut self,
        on_error: impl Fn(&StoreError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Arc::new(on_error);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.read(key) {
            Ok(Some(value)) => value,
            Ok(None) => {
                tracing::debug!(key, "no stored value, using default");
                default
            }
            Err(error) => {
                tracing::warn!(key, %error, "discarding unreadable stored value");
                default
            }
        }
    }

    /// `Ok(None)` when nothing has been stored under `key` yet.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.path_for(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Deserialization { path, source })
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(error) = self.write(key, value) {
            (self.on_error)(&error);
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value).map_err(|source| {
            StoreError::Serialization {
                key: key.to_string(),
                source,
            }
        })?;

        let path = self.path_for(key);
        let staging = self.dir.join(format!("{key}.json.tmp"));
        let write_err = |source| StoreError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;
        fs::write(&staging, json).map_err(write_err)?;
        fs::rename(&staging, &path).map_err(write_err)?;
        Ok(())
    }
}

impl fmt::Debug for JsonStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonStore").field("dir", &self.dir).finish()
    }
}

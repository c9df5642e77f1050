//! Durable key-value storage for the editor's persisted state.
//!
//! A single key holds a versioned envelope with the templates, fonts and grid
//! settings. Runtime fields (current template, selection, variable values, zoom)
//! are never written.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::fonts::FontRegistry;
use crate::grid::GridSettings;
use crate::Template;

/// Key under which the editor state is stored.
pub const STORAGE_KEY: &str = "og-generator-storage";

/// Version written into the envelope.
pub const STATE_VERSION: u32 = 0;

/// A durable string key-value store.
pub trait Storage: Send + Sync + fmt::Debug {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage backed by one JSON file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    /// Open a data directory, creating it if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// The data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", sanitize_filename(key)))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// In-memory storage, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self
            .values
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self
            .values
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self
            .values
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// The persisted subset of editor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Every template.
    pub templates: Vec<Template>,
    /// Font registry.
    pub fonts: FontRegistry,
    /// Snap-to-grid toggle.
    pub grid_enabled: bool,
    /// Grid spacing.
    pub grid_size: u32,
    /// Grid overlay toggle.
    pub show_grid: bool,
}

impl PersistedState {
    /// Grid settings carried by this state, clamped into range.
    #[must_use]
    pub fn grid(&self) -> GridSettings {
        GridSettings::new(self.grid_enabled, self.grid_size, self.show_grid)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<S> {
    state: S,
    version: u32,
}

/// Read the persisted state, if any has been written.
///
/// # Errors
///
/// Returns [`StorageError`] if the backend fails or the stored value is not valid state JSON.
pub fn load_state(storage: &dyn Storage) -> Result<Option<PersistedState>, StorageError> {
    let Some(raw) = storage.get(STORAGE_KEY)? else {
        return Ok(None);
    };
    let envelope: Envelope<PersistedState> = serde_json::from_str(&raw)?;
    if envelope.version != STATE_VERSION {
        tracing::warn!(
            "Persisted state has version {}, expected {STATE_VERSION}",
            envelope.version
        );
    }
    Ok(Some(envelope.state))
}

/// Write the persisted state, replacing the previous snapshot.
///
/// # Errors
///
/// Returns [`StorageError`] if serialization or the backend write fails.
pub fn save_state(storage: &dyn Storage, state: &PersistedState) -> Result<(), StorageError> {
    let json = serde_json::to_string(&Envelope {
        state,
        version: STATE_VERSION,
    })?;
    storage.set(STORAGE_KEY, &json)
}

/// Sanitize a key for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

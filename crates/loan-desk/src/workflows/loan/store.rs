use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, error, warn};

use super::domain::{DraftFields, LoanApplication};

/// Key holding the snapshot of an unfinished application.
pub const DRAFT_KEY: &str = "loanApplicationData";
/// Key holding the list of submitted applications.
pub const APPLICATIONS_KEY: &str = "loanApplications";

/// Error enumeration for key-value backend failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to encode value for {key}: {source}")]
    Encode {
        key: &'static str,
        source: serde_json::Error,
    },
    #[error("stored value for {key} is not valid JSON: {source}")]
    Corrupt {
        key: &'static str,
        source: serde_json::Error,
    },
    #[error("invalid store key '{0}'")]
    InvalidKey(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Minimal persisted medium: serialized values addressed by string keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn with_entry(key: &str, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.into());
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed store keeping each key in its own `<key>.json` file.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }
}

/// Append-only history of submitted applications plus the draft snapshot.
///
/// Appends are read-modify-write on the backend. They are serialized through this
/// handle, so every writer sharing one backend must share one `ApplicationStore`.
pub struct ApplicationStore<S> {
    backend: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S> ApplicationStore<S>
where
    S: KeyValueStore,
{
    pub fn new(backend: Arc<S>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &Arc<S> {
        &self.backend
    }

    /// Append a record, returning the collection size after the write.
    ///
    /// Existing entries are kept verbatim even when they no longer decode. A missing
    /// or non-list collection is replaced by a fresh one. A collection that is not
    /// valid JSON at all is left in place and the append fails.
    pub fn append(&self, application: &LoanApplication) -> Result<usize, StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("application store lock poisoned".to_string()))?;

        let mut entries = self.raw_entries()?;
        let encoded = serde_json::to_value(application).map_err(|source| StoreError::Encode {
            key: APPLICATIONS_KEY,
            source,
        })?;
        entries.push(encoded);

        let serialized =
            serde_json::to_string(&entries).map_err(|source| StoreError::Encode {
                key: APPLICATIONS_KEY,
                source,
            })?;
        self.backend.set(APPLICATIONS_KEY, &serialized)?;
        debug!(count = entries.len(), "application history written");
        Ok(entries.len())
    }

    /// Submitted applications in insertion order. Undecodable entries are skipped.
    pub fn list(&self) -> Result<Vec<LoanApplication>, StoreError> {
        let entries = self.raw_entries()?;
        let mut applications = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<LoanApplication>(entry) {
                Ok(application) => applications.push(application),
                Err(err) => warn!(index, error = %err, "skipping unreadable application entry"),
            }
        }
        Ok(applications)
    }

    pub fn load_draft(&self) -> Result<Option<DraftFields>, StoreError> {
        let Some(raw) = self.backend.get(DRAFT_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<DraftFields>(&raw) {
            Ok(fields) if fields.is_empty() => Ok(None),
            Ok(fields) => Ok(Some(fields)),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable draft snapshot");
                Ok(None)
            }
        }
    }

    pub fn save_draft(&self, fields: &DraftFields) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(fields).map_err(|source| StoreError::Encode {
            key: DRAFT_KEY,
            source,
        })?;
        self.backend.set(DRAFT_KEY, &serialized)
    }

    pub fn clear_draft(&self) -> Result<(), StoreError> {
        self.save_draft(&DraftFields::default())
    }

    fn raw_entries(&self) -> Result<Vec<Value>, StoreError> {
        let Some(raw) = self.backend.get(APPLICATIONS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => Ok(entries),
            Ok(_) => {
                warn!("application history is not a list, starting a new one");
                Ok(Vec::new())
            }
            Err(source) => {
                error!(error = %source, "application history is not valid JSON");
                Err(StoreError::Corrupt {
                    key: APPLICATIONS_KEY,
                    source,
                })
            }
        }
    }
}

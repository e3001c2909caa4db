//! Persistent configuration store.
//!
//! [`ConfigStore`] owns the live [`Configuration`] and writes the full record
//! through a [`ConfigPersistence`] backend after every update. Reading never
//! fails the caller: an absent, unreadable or malformed record yields the
//! defaults. Writing never fails the caller either: the error is logged and
//! the in-memory value stays authoritative for the running process.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::config::{ConfigPatch, Configuration};
use super::data_dir;
use crate::error::{ConfigError, Result, ValidationError};

/// Well-known key the configuration record is stored under.
pub const CONFIG_KEY: &str = "pomodoroConfig";

/// Durable storage for the single configuration record.
pub trait ConfigPersistence {
    /// Raw record, or `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>>;

    /// Replace the stored record.
    fn write(&self, record: &str) -> Result<()>;
}

/// JSON file at `<data_dir>/pomodoroConfig.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store in the default data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn open() -> Result<Self> {
        Ok(Self::at(data_dir()?.join(format!("{CONFIG_KEY}.json"))))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPersistence for JsonFileStore {
    fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::LoadFailed {
                path: self.path.clone(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    fn write(&self, record: &str) -> Result<()> {
        let save_failed = |e: std::io::Error| ConfigError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(save_failed)?;
        }
        std::fs::write(&self.path, record).map_err(save_failed)?;
        Ok(())
    }
}

/// In-process record. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    record: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: impl Into<String>) -> Self {
        Self {
            record: Arc::new(Mutex::new(Some(record.into()))),
        }
    }

    /// Current raw record.
    pub fn record(&self) -> Option<String> {
        self.record
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ConfigPersistence for MemoryStore {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.record())
    }

    fn write(&self, record: &str) -> Result<()> {
        let mut guard = self
            .record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(record.to_string());
        Ok(())
    }
}

/// Owner of the live configuration.
#[derive(Debug)]
pub struct ConfigStore<P> {
    persistence: P,
    current: Configuration,
}

impl<P: ConfigPersistence> ConfigStore<P> {
    /// Load the persisted record merged over defaults.
    pub fn load(persistence: P) -> Self {
        let current = read_persisted(&persistence);
        Self {
            persistence,
            current,
        }
    }

    /// In-memory value; storage is not touched.
    pub fn current(&self) -> Configuration {
        self.current
    }

    /// Merge `patch` over the current value and persist the result.
    ///
    /// An empty patch changes nothing and is not written.
    ///
    /// # Errors
    ///
    /// Rejects the whole patch if any field is zero; the current value and
    /// the stored record are untouched.
    pub fn update(&mut self, patch: &ConfigPatch) -> Result<Configuration, ValidationError> {
        if let Err(e) = patch.validate() {
            tracing::warn!(error = %e, "rejected configuration update");
            return Err(e);
        }
        if patch.is_empty() {
            return Ok(self.current);
        }
        self.current = self.current.merged(patch);
        self.persist();
        Ok(self.current)
    }

    /// Restore and persist the defaults.
    pub fn reset(&mut self) -> Configuration {
        self.current = Configuration::default();
        self.persist();
        self.current
    }

    fn persist(&self) {
        let record = match serde_json::to_string(&self.current) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize configuration");
                return;
            }
        };
        if let Err(e) = self.persistence.write(&record) {
            tracing::error!(error = %e, "failed to persist configuration; keeping in-memory value");
        }
    }
}

fn read_persisted<P: ConfigPersistence>(persistence: &P) -> Configuration {
    let raw = match persistence.read() {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!("no persisted configuration, using defaults");
            return Configuration::default();
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not read persisted configuration, using defaults");
            return Configuration::default();
        }
    };

    match serde_json::from_str::<Configuration>(&raw) {
        Ok(mut cfg) => {
            let replaced = cfg.sanitize();
            if !replaced.is_empty() {
                tracing::warn!(?replaced, "persisted configuration had non-positive fields");
            }
            cfg
        }
        Err(e) => {
            tracing::warn!(error = %e, "persisted configuration is malformed, using defaults");
            Configuration::default()
        }
    }
}

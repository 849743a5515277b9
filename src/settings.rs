//! Boolean settings store and the onboarding flag.
//!
//! Settings are plain `key -> bool` flags. Unknown keys read as `false`.
//! Every key can be observed through a `watch` channel that receives each
//! new value written through the same store.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;

/// Name of the settings file, without extension
pub const USER_SETTINGS: &str = "user_settings";

/// Flag set once onboarding has been completed
pub const APP_ENTRY: &str = "app_entry";

/// Settings store errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to replace settings file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// A key-value store of boolean flags.
pub trait SettingsStore: Send + Sync {
    /// Current value of `key`, `false` when never set
    fn get(&self, key: &str) -> bool;

    /// Receiver of the current and every future value of `key`
    fn observe(&self, key: &str) -> watch::Receiver<bool>;

    /// Write `key`; durable stores persist before returning
    fn set(&self, key: &str, value: bool) -> Result<(), SettingsError>;
}

#[derive(Debug, Default)]
struct Flags {
    values: BTreeMap<String, bool>,
    watchers: HashMap<String, watch::Sender<bool>>,
}

impl Flags {
    fn from_values(values: BTreeMap<String, bool>) -> Self {
        Self {
            values,
            watchers: HashMap::new(),
        }
    }

    fn get(&self, key: &str) -> bool {
        self.values.get(key).copied().unwrap_or(false)
    }

    fn observe(&mut self, key: &str) -> watch::Receiver<bool> {
        let current = self.get(key);
        self.watchers
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(current).0)
            .subscribe()
    }

    fn notify(&self, key: &str, value: bool) {
        if let Some(tx) = self.watchers.get(key) {
            tx.send_replace(value);
        }
    }
}

fn lock(flags: &Mutex<Flags>) -> MutexGuard<'_, Flags> {
    flags.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Settings kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    flags: Mutex<Flags>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> bool {
        lock(&self.flags).get(key)
    }

    fn observe(&self, key: &str) -> watch::Receiver<bool> {
        lock(&self.flags).observe(key)
    }

    fn set(&self, key: &str, value: bool) -> Result<(), SettingsError> {
        let mut flags = lock(&self.flags);
        flags.values.insert(key.to_string(), value);
        flags.notify(key, value);
        Ok(())
    }
}

/// Settings persisted as a JSON object in one file.
///
/// Each write replaces the file atomically, so a crash mid-write leaves the
/// previous contents intact.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    flags: Mutex<Flags>,
}

impl FileSettingsStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "Opened settings store");

        Ok(Self {
            path,
            flags: Mutex::new(Flags::from_values(values)),
        })
    }

    /// `user_settings.json` in the user config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("news-pager").join(format!("{}.json", USER_SETTINGS)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, bool>) -> Result<(), SettingsError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, values)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(&self.path)?;
        Ok(())
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> bool {
        lock(&self.flags).get(key)
    }

    fn observe(&self, key: &str) -> watch::Receiver<bool> {
        lock(&self.flags).observe(key)
    }

    fn set(&self, key: &str, value: bool) -> Result<(), SettingsError> {
        let mut flags = lock(&self.flags);
        let mut values = flags.values.clone();
        values.insert(key.to_string(), value);
        self.persist(&values)?;

        flags.values = values;
        flags.notify(key, value);
        Ok(())
    }
}

/// The first screen to show on startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDestination {
    Onboarding,
    Home,
}

impl std::fmt::Display for StartDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartDestination::Onboarding => f.write_str("onboarding"),
            StartDestination::Home => f.write_str("home"),
        }
    }
}

/// Onboarding state backed by the [`APP_ENTRY`] flag.
#[derive(Clone)]
pub struct AppEntry {
    store: Arc<dyn SettingsStore>,
}

impl std::fmt::Debug for AppEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppEntry")
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl AppEntry {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Record that onboarding has been completed
    pub fn save_app_entry(&self) -> Result<(), SettingsError> {
        self.store.set(APP_ENTRY, true)
    }

    /// Live onboarding flag
    pub fn read_app_entry(&self) -> watch::Receiver<bool> {
        self.store.observe(APP_ENTRY)
    }

    pub fn is_completed(&self) -> bool {
        self.store.get(APP_ENTRY)
    }

    /// Forget onboarding so it is shown again
    pub fn reset(&self) -> Result<(), SettingsError> {
        self.store.set(APP_ENTRY, false)
    }

    pub fn start_destination(&self) -> StartDestination {
        if self.is_completed() {
            StartDestination::Home
        } else {
            StartDestination::Onboarding
        }
    }
}

//! Storage capability behind the cart store.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// A string key-value medium the cart is persisted into.
///
/// Implementations deal in raw JSON text; encoding and decoding happen in
/// [`CartStore`](super::CartStore). All methods take `&self` so backends
/// can use internal locking.
pub trait CartPersistence {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the value stored under `key`, or `None` if absent.
    fn load(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replaces the value stored under `key`.
    fn save(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Deletes `key`. Deleting an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

impl<T: CartPersistence + ?Sized> CartPersistence for &T {
    type Error = T::Error;

    fn load(&self, key: &str) -> Result<Option<String>, Self::Error> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        (**self).save(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        (**self).remove(key)
    }
}

// =============================================================================
// MemoryPersistence
// =============================================================================

/// In-memory persistence backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `value` stored under `key`, or empty when `value` is `None`.
    ///
    /// Used to lift a value held elsewhere (e.g., a web session) into a
    /// store for the duration of one operation.
    #[must_use]
    pub fn seeded(key: &str, value: Option<String>) -> Self {
        let mut entries = HashMap::new();
        if let Some(value) = value {
            entries.insert(key.to_owned(), value);
        }
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Current raw value under `key`.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Whether `key` is present at all (an empty array still counts).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl CartPersistence for MemoryPersistence {
    type Error = Infallible;

    fn load(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entry(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// =============================================================================
// UnavailablePersistence
// =============================================================================

/// Persistence for contexts with no storage medium.
///
/// Every load is empty and every write is discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailablePersistence;

impl CartPersistence for UnavailablePersistence {
    type Error = Infallible;

    fn load(&self, _key: &str) -> Result<Option<String>, Self::Error> {
        Ok(None)
    }

    fn save(&self, _key: &str, _value: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}

// =============================================================================
// FilePersistence
// =============================================================================

/// Directory-backed persistence: one file per key.
///
/// Saves write a sibling temp file and rename it over the target, so a
/// crash mid-write leaves either the old or the new cart, never half of one.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    /// Open (creating if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key: {key:?}"),
            ));
        }
        Ok(self.dir.join(key))
    }
}

impl CartPersistence for FilePersistence {
    type Error = io::Error;

    fn load(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        match fs::remove_file(self.path_for(key)?) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

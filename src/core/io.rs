use crate::core::error::PortalError;
use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

#[cfg(target_arch = "wasm32")]
pub trait StoreBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> StoreBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub trait StoreBounds: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> StoreBounds for T {}

/// Durable origin-scoped key-value store holding UTF-8 text blobs.
pub trait KeyValueStore: StoreBounds {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Reads a JSON entry. Absent, `"undefined"`, `"null"` and unparsable values
/// all read as `None`; the bad ones are removed from the store.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Failed to read '{}' from storage: {:#}", key, e);
            return None;
        }
    };

    let corrupt = || PortalError::StorageCorrupt { key: key.to_string() };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "undefined" || trimmed == "null" {
        log::warn!("{} (empty), clearing it", corrupt());
        discard(store, key);
        return None;
    }

    match serde_json::from_str(trimmed) {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("{}, clearing it: {}", corrupt(), e);
            discard(store, key);
            None
        }
    }
}

pub fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let content = serde_json::to_string(value)?;
    store.set(key, &content)
}

fn discard(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        log::warn!("Failed to clear '{}': {:#}", key, e);
    }
}

// --- In-memory Implementation ---

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

// --- Native Implementation ---

#[cfg(not(target_arch = "wasm32"))]
pub use native::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use super::KeyValueStore;
    use anyhow::{Context, Result};
    use std::path::{Path, PathBuf};

    /// One file per key under a data folder.
    pub struct FileStore {
        root: PathBuf,
    }

    impl FileStore {
        pub fn new(root: impl AsRef<Path>) -> Result<Self> {
            let root = root.as_ref().to_path_buf();
            std::fs::create_dir_all(&root)
                .with_context(|| format!("Failed to create storage folder {:?}", root))?;
            Ok(Self { root })
        }

        fn path_for(&self, key: &str) -> PathBuf {
            let safe: String = key
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
                .collect();
            self.root.join(format!("{}.json", safe))
        }
    }

    impl KeyValueStore for FileStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            let path = self.path_for(key);
            if !path.exists() {
                return Ok(None);
            }
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            Ok(Some(content))
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            let path = self.path_for(key);
            std::fs::write(&path, value).with_context(|| format!("Failed to write {:?}", path))?;
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<()> {
            let path = self.path_for(key);
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {:?}", path))?;
            }
            Ok(())
        }
    }
}

// --- Web Implementation ---

#[cfg(target_arch = "wasm32")]
pub use web::WebStore;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::KeyValueStore;
    use anyhow::{anyhow, Result};

    /// `window.localStorage`.
    pub struct WebStore {
        storage: web_sys::Storage,
    }

    impl WebStore {
        pub fn new() -> Result<Self> {
            let window = web_sys::window().ok_or_else(|| anyhow!("No window available"))?;
            let storage = window
                .local_storage()
                .map_err(|e| anyhow!("localStorage error: {:?}", e))?
                .ok_or_else(|| anyhow!("localStorage unavailable"))?;
            Ok(Self { storage })
        }
    }

    impl KeyValueStore for WebStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.storage
                .get_item(key)
                .map_err(|e| anyhow!("Get error: {:?}", e))
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.storage
                .set_item(key, value)
                .map_err(|e| anyhow!("Set error: {:?}", e))
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.storage
                .remove_item(key)
                .map_err(|e| anyhow!("Remove error: {:?}", e))
        }
    }
}

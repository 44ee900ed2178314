use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use crate::error::ViewerError;

/// Key/value storage that lives as long as the browser tab.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ViewerError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ViewerError>;
    fn remove(&self, key: &str) -> Result<(), ViewerError>;
}

/// Session store used by the running app.
#[derive(Resource)]
pub struct SessionStorage(pub Box<dyn SessionStore>);

impl Default for SessionStorage {
    fn default() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            Self(Box::new(BrowserSessionStore))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Self(Box::new(MemorySessionStore::default()))
        }
    }
}

/// In-process store for native builds and tests. Clones share entries.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessionStore {
    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, ViewerError> {
        self.entries
            .lock()
            .map_err(|_| ViewerError::Storage("session store lock poisoned".to_string()))
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, ViewerError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ViewerError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ViewerError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// `window.sessionStorage`, looked up per call so the store stays `Send`.
#[cfg(target_arch = "wasm32")]
pub struct BrowserSessionStore;

#[cfg(target_arch = "wasm32")]
impl BrowserSessionStore {
    fn storage() -> Result<web_sys::Storage, ViewerError> {
        web_sys::window()
            .ok_or_else(|| ViewerError::Storage("window object not available".to_string()))?
            .session_storage()
            .map_err(|e| ViewerError::Storage(format!("{:?}", e)))?
            .ok_or_else(|| ViewerError::Storage("session storage disabled".to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
impl SessionStore for BrowserSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, ViewerError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| ViewerError::Storage(format!("{:?}", e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ViewerError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| ViewerError::Storage(format!("{:?}", e)))
    }

    fn remove(&self, key: &str) -> Result<(), ViewerError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| ViewerError::Storage(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let store = MemorySessionStore::default();
        let other = store.clone();
        store.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));

        other.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}

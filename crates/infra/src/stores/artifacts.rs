use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::StoreError;

/// Bytes of a rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Blob storage for rendered invoices, addressed by locator.
pub trait ArtifactStore: Send + Sync {
    fn put(&self, locator: &str, content_type: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    fn get(&self, locator: &str) -> Result<Option<StoredArtifact>, StoreError>;
}

impl<S> ArtifactStore for Arc<S>
where
    S: ArtifactStore + ?Sized,
{
    fn put(&self, locator: &str, content_type: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        (**self).put(locator, content_type, bytes)
    }

    fn get(&self, locator: &str) -> Result<Option<StoredArtifact>, StoreError> {
        (**self).get(locator)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    blobs: RwLock<HashMap<String, StoredArtifact>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a blob, as an expired bucket object would be.
    pub fn evict(&self, locator: &str) -> Result<bool, StoreError> {
        let mut blobs = self.blobs.write().map_err(|_| StoreError::Poisoned)?;
        Ok(blobs.remove(locator).is_some())
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn put(&self, locator: &str, content_type: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let mut blobs = self.blobs.write().map_err(|_| StoreError::Poisoned)?;
        blobs.insert(
            locator.to_string(),
            StoredArtifact {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(())
    }

    fn get(&self, locator: &str) -> Result<Option<StoredArtifact>, StoreError> {
        let blobs = self.blobs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(blobs.get(locator).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_evict() {
        let store = InMemoryArtifactStore::new();
        store.put("invoices/a.txt", "text/plain", b"hello".to_vec()).unwrap();

        let got = store.get("invoices/a.txt").unwrap().unwrap();
        assert_eq!(got.bytes, b"hello");
        assert_eq!(got.content_type, "text/plain");

        assert!(store.evict("invoices/a.txt").unwrap());
        assert_eq!(store.get("invoices/a.txt").unwrap(), None);
    }
}

//! In-memory store of encoded images addressed by `blob:` locators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Scheme prefix of every locator issued by a [`BlobStore`].
pub const BLOB_SCHEME: &str = "blob:palette-filter/";

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Encoded image bytes keyed by locator.
///
/// Locators embed a per-store id, so two stores in one process never
/// issue the same locator.
#[derive(Debug)]
pub struct BlobStore {
    id: u64,
    next_seq: AtomicU64,
    blobs: Mutex<HashMap<String, Arc<[u8]>>>,
}

impl Default for BlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore {
    pub fn new() -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            next_seq: AtomicU64::new(1),
            blobs: Mutex::new(HashMap::new()),
        }
    }

    /// Store `bytes` and return a fresh locator for them.
    pub fn create_object_url(&self, bytes: Vec<u8>) -> String {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let url = format!("{}{}/{}", BLOB_SCHEME, self.id, seq);
        self.lock().insert(url.clone(), Arc::from(bytes));
        url
    }

    /// Bytes for `url`, if it was issued here and not revoked.
    pub fn get(&self, url: &str) -> Option<Arc<[u8]>> {
        self.lock().get(url).cloned()
    }

    /// Drop the bytes for `url`. Returns whether anything was removed.
    pub fn revoke(&self, url: &str) -> bool {
        self.lock().remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<[u8]>>> {
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

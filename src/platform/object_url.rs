use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

const SCHEME_PREFIX: &str = "blob:reel-saver/";

/// In-memory stand-in for `URL.createObjectURL`: hands out short-lived
/// references to fetched bytes until they are revoked.
#[derive(Clone, Default)]
pub struct ObjectUrlRegistry {
    inner: Arc<Mutex<Objects>>,
}

#[derive(Default)]
struct Objects {
    next_id: u64,
    entries: HashMap<String, Bytes>,
}

impl ObjectUrlRegistry {
    pub fn create(&self, bytes: Bytes) -> String {
        let mut objects = self.lock();
        objects.next_id += 1;
        let url = format!("{}{}", SCHEME_PREFIX, objects.next_id);
        objects.entries.insert(url.clone(), bytes);
        url
    }

    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        self.lock().entries.get(url).cloned()
    }

    /// Returns false if the URL was unknown or already revoked.
    pub fn revoke(&self, url: &str) -> bool {
        self.lock().entries.remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Objects> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

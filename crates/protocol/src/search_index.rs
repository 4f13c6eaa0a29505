//! Accumulated search results (`username -> {content_hash_hex -> filename_hash_hex}`).
//!
//! Handler tasks merge incoming Search-results(8) replies into this map
//! concurrently while the driver reads it; a search round ends by atomically
//! swapping in a fresh empty map, so a driver read never observes a mix of
//! two rounds.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

pub type SearchResults = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    inner: Arc<Mutex<SearchResults>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        SearchIndex::default()
    }

    /// Merges one peer's reply for `username` into the accumulated map.
    /// Last-writer-wins on any key collision.
    pub async fn merge(&self, username: String, files: HashMap<String, String>) {
        let mut guard = self.inner.lock().await;
        guard.entry(username).or_default().extend(files);
    }

    /// Atomically takes the accumulated results, leaving an empty map behind.
    pub async fn take(&self) -> SearchResults {
        let mut guard = self.inner.lock().await;
        std::mem::take(&mut *guard)
    }
}

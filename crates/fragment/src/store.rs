//! On-disk fragment layout (component D).
//!
//! Four distinct areas under one base directory:
//!  - `<uploader>/<content_hash><filename_hash>` — fragments this node hosts
//!    permanently for files it originally split.
//!  - `cache/save/<content_hash>/<x>` — fragments fetched on behalf of a
//!    download and cached for redistribution.
//!  - `cache/upload/<filename_hash[:14]><x>` — locally computed fragments
//!    staged before they're sent out to peers.
//!  - `download/<filename>` — finished, fully reconstructed downloads.

use std::path::{Path, PathBuf};

use shared::{CoreError, CoreResult};
use tracing::debug;

/// Root of a node's fragment storage tree.
#[derive(Debug, Clone)]
pub struct FragmentStore {
    base_dir: PathBuf,
}

impl FragmentStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FragmentStore {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Persists a fragment this node hosts as the original uploader.
    pub fn save_hosted(
        &self,
        uploader: &str,
        content_hash: &str,
        filename_hash: &str,
        bytes: &[u8],
    ) -> CoreResult<PathBuf> {
        let dir = self.base_dir.join(uploader);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{content_hash}{filename_hash}"));
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Finds and reads the single fragment this node hosts for `content_hash`
    /// under `uploader`. Fails unless exactly one file matches.
    pub fn fetch_hosted(&self, uploader: &str, content_hash: &str) -> CoreResult<Vec<u8>> {
        let dir = self.base_dir.join(uploader);
        let path = single_match_by_prefix(&dir, content_hash).map_err(|err| {
            debug!(uploader, content_hash, "no hosted fragment found");
            err
        })?;
        Ok(std::fs::read(path)?)
    }

    /// Lists the hosted fragment filenames (`<content_hash><filename_hash>`)
    /// for `uploader`.
    pub fn list_uploader(&self, uploader: &str) -> CoreResult<Vec<String>> {
        let dir = self.base_dir.join(uploader);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Caches a fragment fetched from a remote peer while assembling a
    /// download.
    pub fn save_cached(&self, content_hash: &str, x: u64, bytes: &[u8]) -> CoreResult<PathBuf> {
        let dir = self.base_dir.join("cache").join("save").join(content_hash);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(x.to_string());
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    pub fn fetch_cached(&self, content_hash: &str, x: u64) -> CoreResult<Vec<u8>> {
        let path = self
            .base_dir
            .join("cache")
            .join("save")
            .join(content_hash)
            .join(x.to_string());
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                debug!(content_hash, x, "cached fragment not found");
                CoreError::FragmentNotFound(format!("{content_hash}/{x}"))
            } else {
                CoreError::from(e)
            }
        })
    }

    /// How many fragments are currently cached for `content_hash`.
    pub fn cached_fragment_count(&self, content_hash: &str) -> CoreResult<usize> {
        let dir = self.base_dir.join("cache").join("save").join(content_hash);
        if !dir.exists() {
            return Ok(0);
        }
        Ok(std::fs::read_dir(&dir)?.count())
    }

    /// Reads every fragment cached for `content_hash`, in no particular order.
    pub fn load_cached_fragments(&self, content_hash: &str) -> CoreResult<Vec<Vec<u8>>> {
        let dir = self.base_dir.join("cache").join("save").join(content_hash);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut fragments = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fragments.push(std::fs::read(entry.path())?);
            }
        }
        Ok(fragments)
    }

    /// Stages a locally split fragment before it's handed to a peer.
    pub fn save_staged(&self, filename_hash: &str, x: u64, bytes: &[u8]) -> CoreResult<PathBuf> {
        let dir = self.base_dir.join("cache").join("upload");
        std::fs::create_dir_all(&dir)?;
        let prefix: String = filename_hash.chars().take(14).collect();
        let path = dir.join(format!("{prefix}{x}"));
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Writes a fully reconstructed download to `download/<filename>`.
    pub fn save_download(&self, filename: &str, bytes: &[u8]) -> CoreResult<PathBuf> {
        let dir = self.base_dir.join("download");
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(filename);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Finds the single file directly under `dir` whose name starts with
/// `prefix` and has at least one character after it, matching the
/// `<hash>?*` glob rule hosted fragment lookups use.
fn single_match_by_prefix(dir: &Path, prefix: &str) -> CoreResult<PathBuf> {
    let mut matches = Vec::new();
    if dir.exists() {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if name.len() > prefix.len() && name.starts_with(prefix) {
                    matches.push(entry.path());
                }
            }
        }
    }
    match matches.len() {
        1 => Ok(matches.remove(0)),
        _ => Err(CoreError::FragmentNotFound(prefix.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn hosted_round_trip() {
        let dir = tempdir().unwrap();
        let store = FragmentStore::new(dir.path());
        store.save_hosted("alice", "deadbeef", "cafef00d", b"payload").unwrap();
        let found = store.fetch_hosted("alice", "deadbeef").unwrap();
        assert_eq!(found, b"payload");
    }

    #[test]
    fn hosted_lookup_requires_unique_match() {
        let dir = tempdir().unwrap();
        let store = FragmentStore::new(dir.path());
        store.save_hosted("alice", "deadbeef", "aaaa", b"one").unwrap();
        store.save_hosted("alice", "deadbeef", "bbbb", b"two").unwrap();
        let err = store.fetch_hosted("alice", "deadbeef").unwrap_err();
        assert!(matches!(err, CoreError::FragmentNotFound(_)));
    }

    #[test]
    fn cached_round_trip() {
        let dir = tempdir().unwrap();
        let store = FragmentStore::new(dir.path());
        store.save_cached("deadbeef", 12345, b"fragment bytes").unwrap();
        assert_eq!(store.fetch_cached("deadbeef", 12345).unwrap(), b"fragment bytes");
    }

    #[test]
    fn missing_cached_fragment_errors() {
        let dir = tempdir().unwrap();
        let store = FragmentStore::new(dir.path());
        let err = store.fetch_cached("deadbeef", 1).unwrap_err();
        assert!(matches!(err, CoreError::FragmentNotFound(_)));
    }

    #[test]
    fn cached_fragments_are_listed_and_counted() {
        let dir = tempdir().unwrap();
        let store = FragmentStore::new(dir.path());
        store.save_cached("deadbeef", 1, b"one").unwrap();
        store.save_cached("deadbeef", 2, b"two").unwrap();
        assert_eq!(store.cached_fragment_count("deadbeef").unwrap(), 2);
        let loaded = store.load_cached_fragments("deadbeef").unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn staged_uses_truncated_filename_hash_prefix() {
        let dir = tempdir().unwrap();
        let store = FragmentStore::new(dir.path());
        let long_hash = "a".repeat(64);
        let path = store.save_staged(&long_hash, 99, b"x").unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, format!("{}99", "a".repeat(14)));
    }
}

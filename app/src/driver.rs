//! The command surface a shell or embedding application drives the node
//! through (spec.md §6): join, leave, upload, download, search, list_peers.

use std::path::PathBuf;

use fragment::ContentCipher;
use protocol::outbound::{join_outbound, leave_outbound, request_fragment_outbound};
use protocol::{NodeContext, Peer};
use rand::seq::SliceRandom;
use shared::{CoreError, CoreResult};

use crate::cipher::Aes256CbcCipher;

/// One match from a search round: a peer hosting a fragment set, and the
/// two hashes identifying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub username: String,
    pub content_hash: String,
    pub filename_hash: String,
}

pub struct Driver {
    ctx: NodeContext,
}

impl Driver {
    pub fn new(ctx: NodeContext) -> Self {
        Driver { ctx }
    }

    /// Connects to `peer`, joins, and (if `want_peers`) merges in its peer list.
    pub async fn join(&self, peer: Peer, want_peers: bool) -> CoreResult<()> {
        join_outbound(&self.ctx, peer, want_peers).await
    }

    /// Best-effort broadcast of Leave(1) to every known peer.
    pub async fn leave(&self) {
        leave_outbound(&self.ctx).await;
    }

    pub async fn list_peers(&self) -> Vec<Peer> {
        self.ctx.peers.snapshot().await
    }

    /// Splits `path` into a fragment count sized from the current peer
    /// count (spec.md §4.8) and distributes one fragment per sampled peer.
    /// Returns the number of peers that stored their fragment successfully;
    /// the upload is a failure overall if fewer than
    /// [`fragment::MIN_FRAGMENTS`] were stored.
    pub async fn upload(&self, path: &std::path::Path, uploader: &str, private: bool) -> CoreResult<usize> {
        let peer_count = self.ctx.peers.len().await;
        let n = plan_fragment_count(peer_count)?;

        let content = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        let content = if private {
            let password = std::env::var("CIRROLUS_PASSWORD")
                .map_err(|_| CoreError::Cipher("CIRROLUS_PASSWORD not set for private upload".into()))?;
            let salt = shared::hashing::sha256_bytes(filename.as_bytes());
            Aes256CbcCipher.encrypt(&content, &password, &salt)?
        } else {
            content
        };

        let split = fragment::split_bytes(&content, &filename, n, uploader, private)?;

        let mut peers = self.ctx.peers.snapshot().await;
        peers.shuffle(&mut rand::thread_rng());
        peers.truncate(n);

        let mut successes = 0usize;
        for (peer, fragment_bytes) in peers.iter().zip(split.fragments.iter()) {
            match protocol::outbound::upload_fragment_outbound(&self.ctx, *peer, fragment_bytes).await {
                Ok(true) => successes += 1,
                Ok(false) | Err(_) => {}
            }
        }

        if successes < fragment::MIN_FRAGMENTS {
            return Err(CoreError::InsufficientFragments);
        }
        Ok(successes)
    }

    /// Broadcasts a Search(7) for `filename` (or everything, if `None`) and
    /// returns every match accumulated across peers.
    pub async fn search(&self, filename: Option<&str>, username: &str) -> CoreResult<Vec<SearchMatch>> {
        let hashfilename = filename.map(|f| shared::hashing::sha256_bytes(f.as_bytes()));
        protocol::outbound::search_outbound(&self.ctx, hashfilename, username).await?;

        let results = self.ctx.search_index.take().await;
        let mut matches = Vec::new();
        for (user, files) in results {
            for (content_hash, filename_hash) in files {
                matches.push(SearchMatch {
                    username: user.clone(),
                    content_hash,
                    filename_hash,
                });
            }
        }
        Ok(matches)
    }

    /// Runs a Search for `filename` (spec.md §4.9 step 1), lets `select` pick
    /// one of the resulting matches by index, then requests fragments for
    /// that match from known peers until at least [`fragment::MIN_FRAGMENTS`]
    /// are cached (stopping early), and reconstructs and writes the result to
    /// `download/<filename>`.
    pub async fn download(
        &self,
        filename: &str,
        username: &str,
        select: impl Fn(&[SearchMatch]) -> usize,
    ) -> CoreResult<PathBuf> {
        let matches = self.search(Some(filename), username).await?;
        if matches.is_empty() {
            return Err(CoreError::FragmentNotFound(filename.to_string()));
        }
        let chosen = matches
            .get(select(&matches))
            .ok_or_else(|| CoreError::FragmentNotFound(filename.to_string()))?;
        let content_hash = chosen.content_hash.clone();
        let uploader = chosen.username.clone();

        let hash_bytes = decode_hash(&content_hash)?;

        for peer in self.ctx.peers.snapshot().await {
            let _ = request_fragment_outbound(&self.ctx, peer, &hash_bytes, &uploader).await;
            if self.ctx.store.cached_fragment_count(&content_hash)? >= fragment::MIN_FRAGMENTS {
                break;
            }
        }

        let cached = self.ctx.store.load_cached_fragments(&content_hash)?;
        if cached.len() < fragment::MIN_FRAGMENTS {
            return Err(CoreError::InsufficientFragments);
        }

        let combined = fragment::combine_fragments(&cached)?;
        let content = if combined.private {
            let password = std::env::var("CIRROLUS_PASSWORD")
                .map_err(|_| CoreError::Cipher("CIRROLUS_PASSWORD not set for private download".into()))?;
            let salt = shared::hashing::sha256_bytes(filename.as_bytes());
            Aes256CbcCipher.decrypt(&combined.content, &password, &salt)?
        } else {
            combined.content
        };

        self.ctx.store.save_download(filename, &content)
    }
}

/// Upload fragment-count planner (spec.md §4.8).
fn plan_fragment_count(peer_count: usize) -> CoreResult<usize> {
    if peer_count < fragment::MIN_FRAGMENTS {
        return Err(CoreError::InsufficientPeers);
    }
    if peer_count < 20 {
        Ok(peer_count)
    } else {
        Ok((peer_count * 4) / 5) // floor(0.8 * peer_count)
    }
}

fn decode_hash(hex_str: &str) -> CoreResult<[u8; 32]> {
    let bytes = hex::decode(hex_str).map_err(|_| CoreError::ProtocolMalformed)?;
    if bytes.len() != 32 {
        return Err(CoreError::ProtocolMalformed);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plans_exact_peer_count_below_twenty() {
        assert_eq!(plan_fragment_count(19).unwrap(), 19);
    }

    #[test]
    fn plans_eighty_percent_at_or_above_twenty() {
        assert_eq!(plan_fragment_count(25).unwrap(), 20);
    }

    #[test]
    fn refuses_below_minimum_peers() {
        assert!(matches!(plan_fragment_count(3), Err(CoreError::InsufficientPeers)));
    }
}

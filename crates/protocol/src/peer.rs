//! Peer membership (component G).
//!
//! The peer set is the only piece of shared mutable state touched by both
//! inbound connection workers and the outbound driver. All mutation goes
//! through a single mutex; readers that need a stable view for an outbound
//! sweep take a snapshot first so concurrent removals mid-iteration can't
//! invalidate it.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

use tokio::sync::Mutex;

/// A reachable node, identified by its listening address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Peer {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Peer {
    pub fn new(host: Ipv4Addr, port: u16) -> Self {
        Peer { host, port }
    }
}

/// The shared, mutex-guarded peer set.
#[derive(Debug, Clone)]
pub struct PeerSet {
    self_addr: Peer,
    inner: Arc<Mutex<HashSet<Peer>>>,
}

impl PeerSet {
    /// Creates an empty peer set. `self_addr` is never allowed to be added,
    /// even if offered by a remote peer list or join.
    pub fn new(self_addr: Peer) -> Self {
        PeerSet {
            self_addr,
            inner: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn self_addr(&self) -> Peer {
        self.self_addr
    }

    /// Adds `peer` unless it's this node's own address. Returns whether it
    /// was newly inserted.
    pub async fn add(&self, peer: Peer) -> bool {
        if peer == self.self_addr {
            return false;
        }
        self.inner.lock().await.insert(peer)
    }

    /// Removes `peer`. Returns whether it was present.
    pub async fn remove(&self, peer: &Peer) -> bool {
        self.inner.lock().await.remove(peer)
    }

    pub async fn contains(&self, peer: &Peer) -> bool {
        self.inner.lock().await.contains(peer)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// A stable snapshot to iterate over during an outbound sweep.
    pub async fn snapshot(&self) -> Vec<Peer> {
        self.inner.lock().await.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(port: u16) -> Peer {
        Peer::new(Ipv4Addr::new(127, 0, 0, 1), port)
    }

    #[tokio::test]
    async fn self_address_never_added() {
        let set = PeerSet::new(peer(50000));
        assert!(!set.add(peer(50000)).await);
        assert_eq!(set.len().await, 0);
    }

    #[tokio::test]
    async fn add_remove_round_trip() {
        let set = PeerSet::new(peer(50000));
        assert!(set.add(peer(50001)).await);
        assert!(set.contains(&peer(50001)).await);
        assert!(set.remove(&peer(50001)).await);
        assert!(!set.contains(&peer(50001)).await);
    }

    #[tokio::test]
    async fn snapshot_is_stable_under_concurrent_removal() {
        let set = PeerSet::new(peer(50000));
        set.add(peer(50001)).await;
        set.add(peer(50002)).await;
        let snapshot = set.snapshot().await;
        set.remove(&peer(50001)).await;
        assert_eq!(snapshot.len(), 2);
    }
}

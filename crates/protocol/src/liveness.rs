//! Periodic peer-liveness sweep (component G).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::context::NodeContext;
use crate::outbound::ping_outbound;

/// Spawns a task that pings every known peer every `interval`, evicting any
/// that don't answer. Stops once `running` is cleared.
pub fn spawn(ctx: NodeContext, interval: Duration, running: Arc<AtomicBool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        while running.load(Ordering::SeqCst) {
            ticker.tick().await;
            if !running.load(Ordering::SeqCst) {
                break;
            }
            for peer in ctx.peers.snapshot().await {
                if !ping_outbound(&ctx, peer).await {
                    debug!(host = %peer.host, port = peer.port, "evicted unresponsive peer");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProtocolConfig;
    use crate::peer::{Peer, PeerSet};
    use fragment::FragmentStore;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn sweep_evicts_unreachable_peer() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = NodeContext::new(
            PeerSet::new(Peer::new(Ipv4Addr::LOCALHOST, 50300)),
            FragmentStore::new(dir.path()),
            ProtocolConfig::default(),
        );
        let dead_peer = Peer::new(Ipv4Addr::LOCALHOST, 50301);
        ctx.peers.add(dead_peer).await;

        let running = Arc::new(AtomicBool::new(true));
        let handle = spawn(ctx.clone(), Duration::from_millis(20), running.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;
        running.store(false, Ordering::SeqCst);
        let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;

        assert!(!ctx.peers.contains(&dead_peer).await);
    }
}

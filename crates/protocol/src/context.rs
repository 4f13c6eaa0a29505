//! Shared state handed to every inbound handler and outbound flow.

use std::time::Duration;

use fragment::FragmentStore;

use crate::peer::PeerSet;
use crate::search_index::SearchIndex;

/// Socket timeouts governing the receive policy (spec §5).
#[derive(Debug, Clone, Copy)]
pub struct ProtocolConfig {
    /// Default read timeout for a single message.
    pub read_timeout: Duration,
    /// Timeout for replies that matter to an outbound caller (upload report, ping).
    pub reply_timeout: Duration,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            read_timeout: Duration::from_secs(4),
            reply_timeout: Duration::from_secs(10),
        }
    }
}

/// State shared across all connection workers and the outbound driver.
#[derive(Clone)]
pub struct NodeContext {
    pub peers: PeerSet,
    pub search_index: SearchIndex,
    pub store: FragmentStore,
    pub config: ProtocolConfig,
}

impl NodeContext {
    pub fn new(peers: PeerSet, store: FragmentStore, config: ProtocolConfig) -> Self {
        NodeContext {
            peers,
            search_index: SearchIndex::new(),
            store,
            config,
        }
    }
}

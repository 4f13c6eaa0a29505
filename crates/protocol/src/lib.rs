//! The peer protocol engine: wire framing, the version/id dispatcher, the
//! nine message flows, peer membership, and the liveness sweep.
//!
//! This crate depends on [`fragment`] for the fragment store and fragment
//! file parsing, but has no opinion on the node's lifecycle or command
//! surface — that's the application crate's job.

pub mod context;
pub mod dispatch;
pub mod handlers;
pub mod liveness;
pub mod message;
pub mod outbound;
pub mod peer;
pub mod search_index;
pub mod wire;

pub use context::{NodeContext, ProtocolConfig};
pub use message::{Message, MessageId};
pub use peer::{Peer, PeerSet};
pub use search_index::SearchIndex;

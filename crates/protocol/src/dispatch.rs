//! Inbound dispatch: `(version, id) -> handler` (component F).
//!
//! Re-expressed as a closed match over [`MessageId`] rather than a runtime
//! table of function pointers — the message-id space is fixed and small, so
//! the compiler can enforce the "every id handled, unknown ids ignored" rule
//! directly. Any error a handler returns is local and recoverable (spec §7),
//! so it's logged and swallowed here rather than propagated.

use std::net::Ipv4Addr;

use tracing::warn;

use crate::context::NodeContext;
use crate::handlers;
use crate::message::{Message, MessageId};

/// Dispatches `msg` to its handler. If `expected_id` is set and doesn't
/// match `msg.id`, the message is ignored (used when an outbound flow is
/// waiting for one specific reply id). Only protocol version 0 is defined;
/// any other version, or an unrecognized id, is a silent no-op.
pub async fn dispatch(
    ctx: &NodeContext,
    remote_ip: Ipv4Addr,
    msg: &Message,
    expected_id: Option<u8>,
) -> Option<Message> {
    if let Some(expected) = expected_id {
        if msg.id != expected {
            return None;
        }
    }
    if msg.version != 0 {
        return None;
    }
    let Some(id) = MessageId::from_u8(msg.id) else {
        return None;
    };

    let result = match id {
        MessageId::Join => handlers::handle_join(ctx, remote_ip, &msg.payload).await,
        MessageId::Leave => handlers::handle_leave(ctx, remote_ip, &msg.payload).await,
        MessageId::PeerList => handlers::handle_peer_list(ctx, &msg.payload).await,
        MessageId::UploadFragment => handlers::handle_upload_fragment(ctx, &msg.payload).await,
        MessageId::UploadReport => Ok(None),
        MessageId::RequestFragment => handlers::handle_request_fragment(ctx, &msg.payload).await,
        MessageId::SendFragment => handlers::handle_send_fragment(ctx, &msg.payload).await,
        MessageId::Search => handlers::handle_search(ctx, &msg.payload).await,
        MessageId::SearchResults => handlers::handle_search_results(ctx, &msg.payload).await,
        MessageId::Ping => handlers::handle_ping(ctx, &msg.payload).await,
    };

    match result {
        Ok(reply) => reply,
        Err(err) => {
            warn!(id = msg.id, error = %err, "handler error, dropping message");
            None
        }
    }
}

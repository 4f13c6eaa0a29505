//! Inbound handler contracts for protocol version 0 (spec §4.6).
//!
//! Every handler takes the shared node context, the remote peer's observed
//! IP, and the inbound payload, and returns the reply to write back on the
//! same connection (or `None` if the contract calls for silence).

use std::net::Ipv4Addr;

use shared::{CoreError, CoreResult};
use tracing::debug;

use crate::context::NodeContext;
use crate::message::{self, Message, MessageId, SearchResultsBody};
use crate::peer::Peer;

pub async fn handle_join(ctx: &NodeContext, remote_ip: Ipv4Addr, payload: &[u8]) -> CoreResult<Option<Message>> {
    let (listen_port, want_peers) = message::decode_join(payload)?;
    let remote = Peer::new(remote_ip, listen_port);

    let reply = if want_peers {
        let peers: Vec<_> = ctx
            .peers
            .snapshot()
            .await
            .into_iter()
            .map(|p| (p.host, p.port))
            .collect();
        let payload = message::encode_peer_list(&peers)?;
        Some(Message::new(0, MessageId::PeerList, payload))
    } else {
        None
    };

    ctx.peers.add(remote).await;
    Ok(reply)
}

pub async fn handle_leave(ctx: &NodeContext, remote_ip: Ipv4Addr, payload: &[u8]) -> CoreResult<Option<Message>> {
    let listen_port = message::decode_leave(payload)?;
    ctx.peers.remove(&Peer::new(remote_ip, listen_port)).await;
    Ok(None)
}

/// One-hop gossip: join every peer in the list we don't already know,
/// without requesting their peer lists in turn.
pub async fn handle_peer_list(ctx: &NodeContext, payload: &[u8]) -> CoreResult<Option<Message>> {
    let peers = message::decode_peer_list(payload)?;
    for (host, port) in peers {
        let candidate = Peer::new(host, port);
        if candidate != ctx.peers.self_addr() && !ctx.peers.contains(&candidate).await {
            if let Err(err) = crate::outbound::join_outbound(ctx, candidate, false).await {
                debug!(host = %host, port, error = %err, "gossip join failed");
            }
        }
    }
    Ok(None)
}

pub async fn handle_upload_fragment(ctx: &NodeContext, payload: &[u8]) -> CoreResult<Option<Message>> {
    let bytes = message::decode_len_prefixed(payload)?;
    let ok = match fragment::wire::decode_fragment(&bytes) {
        Ok((meta, _)) => ctx
            .store
            .save_hosted(&meta.uploader, &meta.hash, &meta.filename, &bytes)
            .is_ok(),
        Err(_) => false,
    };
    Ok(Some(Message::new(0, MessageId::UploadReport, message::encode_upload_report(ok))))
}

pub async fn handle_request_fragment(ctx: &NodeContext, payload: &[u8]) -> CoreResult<Option<Message>> {
    let (hash, username) = message::decode_hash_and_username(payload)?;
    let content_hash = hex::encode(hash);
    let reply_payload = match ctx.store.fetch_hosted(&username, &content_hash) {
        Ok(bytes) => message::encode_len_prefixed(&bytes),
        Err(_) => message::encode_send_fragment_miss(),
    };
    Ok(Some(Message::new(0, MessageId::SendFragment, reply_payload)))
}

pub async fn handle_send_fragment(ctx: &NodeContext, payload: &[u8]) -> CoreResult<Option<Message>> {
    match message::decode_send_fragment(payload)? {
        None => {
            debug!("send-fragment reply was a miss");
            Ok(None)
        }
        Some(bytes) => {
            let (meta, _) = fragment::wire::decode_fragment(&bytes)
                .map_err(|_| CoreError::ProtocolMalformed)?;
            ctx.store.save_cached(&meta.hash, meta.x, &bytes)?;
            Ok(None)
        }
    }
}

pub async fn handle_search(ctx: &NodeContext, payload: &[u8]) -> CoreResult<Option<Message>> {
    let (hash, username) = message::decode_hash_and_username(payload)?;
    let hashfilename = if hash == [0u8; 32] { None } else { Some(hex::encode(hash)) };

    let names = ctx.store.list_uploader(&username)?;
    let mut files = std::collections::HashMap::new();
    for name in names {
        if name.len() != 128 {
            continue;
        }
        let (content_hash, filename_hash) = name.split_at(64);
        if let Some(wanted) = &hashfilename {
            if filename_hash != wanted {
                continue;
            }
        }
        files.insert(content_hash.to_string(), filename_hash.to_string());
    }

    let body = SearchResultsBody { username, files };
    let reply_payload = message::encode_search_results(&body)?;
    Ok(Some(Message::new(0, MessageId::SearchResults, reply_payload)))
}

pub async fn handle_search_results(ctx: &NodeContext, payload: &[u8]) -> CoreResult<Option<Message>> {
    let body = message::decode_search_results(payload)?;
    ctx.search_index.merge(body.username, body.files).await;
    Ok(None)
}

pub async fn handle_ping(_ctx: &NodeContext, _payload: &[u8]) -> CoreResult<Option<Message>> {
    Ok(Some(Message::new(0, MessageId::Ping, Vec::new())))
}

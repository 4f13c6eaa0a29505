//! Outbound flows the driver (or handlers, for gossip) initiate (spec §4.7).

use std::io;

use shared::{CoreError, CoreResult};
use tokio::net::TcpStream;
use tracing::warn;

use crate::context::NodeContext;
use crate::dispatch::dispatch;
use crate::message::{self, Message, MessageId};
use crate::peer::Peer;
use crate::wire::{read_message, write_message};

async fn connect(peer: Peer) -> CoreResult<TcpStream> {
    TcpStream::connect((peer.host, peer.port)).await.map_err(|e| {
        if e.kind() == io::ErrorKind::ConnectionRefused {
            CoreError::RemoteUnavailable(format!("{}:{} refused", peer.host, peer.port))
        } else {
            CoreError::Io(e)
        }
    })
}

/// Connects to `peer`, sends Join(0), and (if `want_peers`) waits for and
/// dispatches the Peer-list(2) reply before adding the peer.
pub async fn join_outbound(ctx: &NodeContext, peer: Peer, want_peers: bool) -> CoreResult<()> {
    let mut stream = connect(peer).await?;
    let payload = message::encode_join(ctx.peers.self_addr().port, want_peers);
    write_message(&mut stream, &Message::new(0, MessageId::Join, payload)).await?;

    if want_peers {
        match read_message(&mut stream, ctx.config.reply_timeout).await {
            Ok(reply) => {
                dispatch(ctx, peer.host, &reply, Some(MessageId::PeerList.as_u8())).await;
            }
            Err(err) => warn!(host = %peer.host, port = peer.port, error = %err, "join reply not received"),
        }
    }

    ctx.peers.add(peer).await;
    Ok(())
}

/// Broadcasts Leave(1) to every known peer, best-effort.
pub async fn leave_outbound(ctx: &NodeContext) {
    let self_port = ctx.peers.self_addr().port;
    for peer in ctx.peers.snapshot().await {
        if let Ok(mut stream) = connect(peer).await {
            let payload = message::encode_leave(self_port);
            let _ = write_message(&mut stream, &Message::new(0, MessageId::Leave, payload)).await;
        }
    }
}

/// Sends one fragment to `peer`; `true` iff the remote's Upload-report was ok.
/// Removes `peer` on connection refusal.
pub async fn upload_fragment_outbound(ctx: &NodeContext, peer: Peer, fragment_bytes: &[u8]) -> CoreResult<bool> {
    let mut stream = match connect(peer).await {
        Ok(s) => s,
        Err(err) => {
            ctx.peers.remove(&peer).await;
            return Err(err);
        }
    };
    let payload = message::encode_len_prefixed(fragment_bytes);
    write_message(&mut stream, &Message::new(0, MessageId::UploadFragment, payload)).await?;
    let reply = read_message(&mut stream, ctx.config.reply_timeout).await?;
    if reply.id != MessageId::UploadReport.as_u8() {
        return Ok(false);
    }
    message::decode_upload_report(&reply.payload)
}

/// Requests one fragment from `peer`; the Send-fragment reply is dispatched
/// so a hit gets persisted into the download cache as a side effect.
/// Removes `peer` on connection refusal.
pub async fn request_fragment_outbound(
    ctx: &NodeContext,
    peer: Peer,
    content_hash: &[u8; 32],
    username: &str,
) -> CoreResult<bool> {
    let mut stream = match connect(peer).await {
        Ok(s) => s,
        Err(err) => {
            ctx.peers.remove(&peer).await;
            return Err(err);
        }
    };
    let payload = message::encode_hash_and_username(content_hash, username)?;
    write_message(&mut stream, &Message::new(0, MessageId::RequestFragment, payload)).await?;
    let reply = read_message(&mut stream, ctx.config.reply_timeout).await?;
    let hit = message::decode_send_fragment(&reply.payload)?.is_some();
    dispatch(ctx, peer.host, &reply, Some(MessageId::SendFragment.as_u8())).await;
    Ok(hit)
}

/// Broadcasts Search(7) to every known peer and dispatches each reply into
/// the shared search index. Peers refused during the sweep are collected and
/// removed afterward.
pub async fn search_outbound(ctx: &NodeContext, hashfilename: Option<[u8; 32]>, username: &str) -> CoreResult<()> {
    let hash = hashfilename.unwrap_or([0u8; 32]);
    let payload = message::encode_hash_and_username(&hash, username)?;

    let mut refused = Vec::new();
    for peer in ctx.peers.snapshot().await {
        let mut stream = match connect(peer).await {
            Ok(s) => s,
            Err(_) => {
                refused.push(peer);
                continue;
            }
        };
        if write_message(&mut stream, &Message::new(0, MessageId::Search, payload.clone())).await.is_err() {
            continue;
        }
        if let Ok(reply) = read_message(&mut stream, ctx.config.read_timeout).await {
            dispatch(ctx, peer.host, &reply, Some(MessageId::SearchResults.as_u8())).await;
        }
    }
    for peer in refused {
        ctx.peers.remove(&peer).await;
    }
    Ok(())
}

/// Pings `peer`; removes it from the peer set and returns `false` if it
/// doesn't answer with a well-formed message within the reply timeout.
pub async fn ping_outbound(ctx: &NodeContext, peer: Peer) -> bool {
    let mut stream = match connect(peer).await {
        Ok(s) => s,
        Err(_) => {
            ctx.peers.remove(&peer).await;
            return false;
        }
    };
    if write_message(&mut stream, &Message::new(0, MessageId::Ping, Vec::new())).await.is_err() {
        ctx.peers.remove(&peer).await;
        return false;
    }
    match read_message(&mut stream, ctx.config.reply_timeout).await {
        Ok(reply) if reply.id == MessageId::Ping.as_u8() => true,
        _ => {
            ctx.peers.remove(&peer).await;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProtocolConfig;
    use fragment::FragmentStore;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    fn ctx_for(port: u16, base_dir: &std::path::Path) -> NodeContext {
        NodeContext::new(
            crate::peer::PeerSet::new(Peer::new(Ipv4Addr::LOCALHOST, port)),
            FragmentStore::new(base_dir),
            ProtocolConfig::default(),
        )
    }

    async fn spawn_node(port: u16, base_dir: &std::path::Path) -> NodeContext {
        let ctx = ctx_for(port, base_dir);
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await.unwrap();
        let worker_ctx = ctx.clone();
        tokio::spawn(async move {
            loop {
                let (mut stream, addr) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => break,
                };
                let ctx = worker_ctx.clone();
                tokio::spawn(async move {
                    if let Ok(msg) = read_message(&mut stream, ctx.config.read_timeout).await {
                        let remote_ip = match addr.ip() {
                            std::net::IpAddr::V4(ip) => ip,
                            _ => Ipv4Addr::LOCALHOST,
                        };
                        if let Some(reply) = dispatch(&ctx, remote_ip, &msg, None).await {
                            let _ = write_message(&mut stream, &reply).await;
                        }
                    }
                });
            }
        });
        ctx
    }

    #[tokio::test]
    async fn join_handshake_adds_both_peers() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let ctx_a = spawn_node(50100, dir_a.path()).await;
        let ctx_b = spawn_node(50101, dir_b.path()).await;

        join_outbound(&ctx_b, Peer::new(Ipv4Addr::LOCALHOST, 50100), true)
            .await
            .unwrap();

        // give the accept-side worker a moment to process the join
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert!(ctx_a.peers.contains(&Peer::new(Ipv4Addr::LOCALHOST, 50101)).await);
        assert!(ctx_b.peers.contains(&Peer::new(Ipv4Addr::LOCALHOST, 50100)).await);
    }

    #[tokio::test]
    async fn ping_evicts_unreachable_peer() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_for(50200, dir.path());
        let dead_peer = Peer::new(Ipv4Addr::LOCALHOST, 50201);
        ctx.peers.add(dead_peer).await;

        assert!(!ping_outbound(&ctx, dead_peer).await);
        assert!(!ctx.peers.contains(&dead_peer).await);
    }
}

//! Cross-node scenarios that unit tests inside individual modules can't
//! exercise on their own: gossip across more than two nodes, and the exact
//! reply shape a search round produces.

use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use fragment::FragmentStore;
use protocol::outbound::{join_outbound, search_outbound};
use protocol::{NodeContext, Peer, ProtocolConfig};
use tokio::net::TcpListener;

fn ctx_for(port: u16, base_dir: &Path) -> NodeContext {
    NodeContext::new(
        protocol::PeerSet::new(Peer::new(Ipv4Addr::LOCALHOST, port)),
        FragmentStore::new(base_dir),
        ProtocolConfig::default(),
    )
}

/// Binds `port` and starts a one-message-per-connection worker loop, mirroring
/// the application crate's accept loop closely enough to drive gossip and
/// search end to end.
async fn spawn_node(port: u16, base_dir: &Path) -> NodeContext {
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
                if let Ok(msg) = protocol::wire::read_message(&mut stream, ctx.config.read_timeout).await {
                    let remote_ip = match addr.ip() {
                        std::net::IpAddr::V4(ip) => ip,
                        _ => Ipv4Addr::LOCALHOST,
                    };
                    if let Some(reply) = protocol::dispatch::dispatch(&ctx, remote_ip, &msg, None).await {
                        let _ = protocol::wire::write_message(&mut stream, &reply).await;
                    }
                }
            });
        }
    });
    ctx
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(80)).await;
}

/// Scenario 4 (spec §8): A, B, C, D each already know one other peer; a
/// fifth node E joins A with `want_peers`, and after one gossip round E has
/// transitively joined every peer A knew about.
#[tokio::test]
async fn gossip_reaches_peers_one_hop_transitively() {
    let dirs: Vec<_> = (0..5).map(|_| tempfile::tempdir().unwrap()).collect();
    let ports = [50400u16, 50401, 50402, 50403, 50404];
    let mut ctxs = Vec::new();
    for (port, dir) in ports.iter().zip(dirs.iter()) {
        ctxs.push(spawn_node(*port, dir.path()).await);
    }
    let [a, b, c, d, e] = [0, 1, 2, 3, 4].map(|i| ctxs[i].clone());
    let peer = |i: usize| Peer::new(Ipv4Addr::LOCALHOST, ports[i]);

    // A, B, C, D already know one other peer each before E shows up.
    a.peers.add(peer(1)).await;
    b.peers.add(peer(0)).await;
    c.peers.add(peer(3)).await;
    d.peers.add(peer(2)).await;
    let _ = (c, d);

    join_outbound(&e, peer(0), true).await.unwrap();
    settle().await;

    // E received A's peer list (which included B) and joined it one hop.
    assert!(e.peers.contains(&peer(0)).await);
    assert!(e.peers.contains(&peer(1)).await);
    // E never saw C or D; A only told it about B.
    assert!(!e.peers.contains(&peer(2)).await);
    assert!(!e.peers.contains(&peer(3)).await);
}

/// Scenario 5 (spec §8): A hosts a fragment for user "u" with content-hash H
/// and filename-hash N; B searches A for H and gets back the exact reply
/// shape `{"username":"u","files":{hex(H):hex(N)}}`.
#[tokio::test]
async fn search_returns_exact_match_shape() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let ctx_a = spawn_node(50410, dir_a.path()).await;
    let ctx_b = spawn_node(50411, dir_b.path()).await;
    ctx_b.peers.add(Peer::new(Ipv4Addr::LOCALHOST, 50410)).await;

    let content_hash = "a".repeat(64);
    let filename_hash = "b".repeat(64);
    ctx_a
        .store
        .save_hosted("u", &content_hash, &filename_hash, b"fragment bytes")
        .unwrap();

    // Search(7) carries SHA256(filename), i.e. the filename hash, not the content hash.
    let mut wanted = [0u8; 32];
    wanted.copy_from_slice(&hex::decode(&filename_hash).unwrap());

    search_outbound(&ctx_b, Some(wanted), "u").await.unwrap();
    settle().await;

    let results = ctx_b.search_index.take().await;
    assert_eq!(results.len(), 1);
    let files = results.get("u").expect("username key present");
    assert_eq!(files.len(), 1);
    assert_eq!(files.get(&content_hash), Some(&filename_hash));
}

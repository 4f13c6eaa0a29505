mod cipher;
mod config;
mod driver;
mod node;
mod shutdown;
mod telemetry;

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fragment::FragmentStore;
use protocol::{NodeContext, Peer, ProtocolConfig};
use tokio::net::TcpListener;

use crate::config::NodeConfig;
use crate::driver::Driver;
use crate::node::Node;

#[derive(Parser)]
#[command(name = "cirrolus", about = "A peer-to-peer fragment-sharing node")]
struct Cli {
    /// Username this invocation acts as.
    #[arg(long, global = true, default_value = "anonymous")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the node indefinitely: accept loop + liveness sweep, until SIGINT/SIGTERM.
    Serve,
    /// Join a remote peer's network.
    Join {
        /// Remote peer to connect to, `host:port`.
        peer: SocketAddr,
        /// Also request and merge the remote's own peer list.
        #[arg(long)]
        want_peers: bool,
    },
    /// Broadcast Leave to every known peer, then exit.
    Leave,
    /// List currently known peers.
    ListPeers,
    /// Split a file into fragments and distribute them to peers.
    Upload {
        path: PathBuf,
        #[arg(long)]
        private: bool,
    },
    /// Search the network for a file by name (omit to list everything).
    Search { filename: Option<String> },
    /// Search for a file by name and reconstruct it from the first match.
    Download { filename: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::load().context("failed to load configuration")?;
    telemetry::init_telemetry(&config.telemetry).context("failed to initialize telemetry")?;

    let cli = Cli::parse();

    let addr: SocketAddr = (config.node.host.parse::<Ipv4Addr>().context("invalid node.host")?, config.node.port).into();
    let listener = TcpListener::bind(addr).await.context("failed to bind listen address")?;
    tracing::info!(%addr, "listening");

    let self_host = match addr.ip() {
        std::net::IpAddr::V4(ip) => ip,
        std::net::IpAddr::V6(_) => Ipv4Addr::UNSPECIFIED,
    };
    let ctx = NodeContext::new(
        protocol::PeerSet::new(Peer::new(self_host, config.node.port)),
        FragmentStore::new(&config.storage.data_dir),
        ProtocolConfig {
            read_timeout: config.read_timeout(),
            reply_timeout: config.reply_timeout(),
        },
    );

    let node = Node::start(ctx.clone(), listener, config.liveness_interval()).await;
    let driver = Driver::new(ctx);

    match cli.command {
        Command::Serve => {
            tracing::info!("node started, waiting for shutdown signal");
            shutdown::shutdown_on_signal(node.running.clone()).await;
        }
        Command::Join { peer, want_peers } => {
            let peer = Peer::new(match peer.ip() {
                std::net::IpAddr::V4(ip) => ip,
                std::net::IpAddr::V6(_) => anyhow::bail!("only IPv4 peers are supported"),
            }, peer.port());
            driver.join(peer, want_peers).await.context("join failed")?;
            println!("joined {peer:?}");
        }
        Command::Leave => {
            driver.leave().await;
            println!("left the network");
        }
        Command::ListPeers => {
            for peer in driver.list_peers().await {
                println!("{}:{}", peer.host, peer.port);
            }
        }
        Command::Upload { path, private } => {
            let private = private || config.storage.default_private;
            let stored = driver.upload(&path, &cli.user, private).await.context("upload failed")?;
            println!("stored on {stored} peers");
        }
        Command::Search { filename } => {
            let matches = driver.search(filename.as_deref(), &cli.user).await.context("search failed")?;
            for m in matches {
                println!("{}\t{}\t{}", m.username, m.content_hash, m.filename_hash);
            }
        }
        Command::Download { filename } => {
            let path = driver
                .download(&filename, &cli.user, |_matches| 0)
                .await
                .context("download failed")?;
            println!("saved to {}", path.display());
        }
    }

    node.shutdown().await;
    Ok(())
}

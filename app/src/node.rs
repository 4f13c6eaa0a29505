//! Node lifecycle (component H): accept loop, per-connection workers, and
//! wiring for the liveness sweep. One message per connection, no pipelining
//! (spec.md §9 "Per-connection thread-per-message").

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use protocol::dispatch::dispatch;
use protocol::wire::{read_message, write_message};
use protocol::NodeContext;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A short poll timeout on the accept socket lets the `running` flag make
/// progress even with no inbound connections (spec.md §5).
const ACCEPT_POLL_TIMEOUT: Duration = Duration::from_secs(2);

/// A running node: its accept loop and liveness sweep, plus the flag both
/// observe to know when to stop.
pub struct Node {
    pub ctx: NodeContext,
    pub running: Arc<AtomicBool>,
    accept_handle: JoinHandle<()>,
    liveness_handle: JoinHandle<()>,
}

impl Node {
    /// Binds `listener` and starts the accept loop and liveness sweep.
    pub async fn start(ctx: NodeContext, listener: TcpListener, liveness_interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));

        let accept_handle = tokio::spawn(accept_loop(ctx.clone(), listener, running.clone()));
        let liveness_handle = protocol::liveness::spawn(ctx.clone(), liveness_interval, running.clone());

        Node {
            ctx,
            running,
            accept_handle,
            liveness_handle,
        }
    }

    /// Clears `running` and waits for both background loops to exit.
    pub async fn shutdown(self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.accept_handle.await;
        let _ = self.liveness_handle.await;
    }
}

async fn accept_loop(ctx: NodeContext, listener: TcpListener, running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        let accepted = tokio::time::timeout(ACCEPT_POLL_TIMEOUT, listener.accept()).await;
        let (stream, addr) = match accepted {
            Ok(Ok(pair)) => pair,
            Ok(Err(err)) => {
                warn!(error = %err, "accept failed");
                continue;
            }
            Err(_) => continue, // poll timeout; re-check `running`
        };

        let worker_ctx = ctx.clone();
        tokio::spawn(async move {
            handle_connection(worker_ctx, stream, addr).await;
        });
    }
}

async fn handle_connection(ctx: NodeContext, mut stream: tokio::net::TcpStream, addr: std::net::SocketAddr) {
    let remote_ip = match addr.ip() {
        std::net::IpAddr::V4(ip) => ip,
        std::net::IpAddr::V6(_) => Ipv4Addr::UNSPECIFIED,
    };

    let msg = match read_message(&mut stream, ctx.config.read_timeout).await {
        Ok(msg) => msg,
        Err(err) => {
            debug!(peer = %addr, error = %err, "dropping connection: read failed");
            return;
        }
    };

    if let Some(reply) = dispatch(&ctx, remote_ip, &msg, None).await {
        if let Err(err) = write_message(&mut stream, &reply).await {
            debug!(peer = %addr, error = %err, "failed to write reply");
        }
    }
}

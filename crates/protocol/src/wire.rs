//! Socket-level read/write helpers (component E, receive policy).
//!
//! A single read is taken from the socket under a timeout. Length-prefixed
//! payloads (ids carrying a 4-byte length at payload offset 0) may not
//! arrive whole in one read once they cross ~1KB, so once that's detected
//! more reads are pulled until the declared length is satisfied.

use std::time::Duration;

use shared::codec::bytes_to_u32;
use shared::{CoreError, CoreResult};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::message::Message;

const READ_BUF_SIZE: usize = 8192;
/// Reads above this many bytes in one shot are treated as a large-payload
/// message whose declared length may still be incomplete.
const LARGE_PAYLOAD_THRESHOLD: usize = 1024;

/// Reads one message off `stream`, honoring `timeout` for every underlying read.
pub async fn read_message(stream: &mut TcpStream, timeout: Duration) -> CoreResult<Message> {
    let mut buf = vec![0u8; READ_BUF_SIZE];
    let n = timeout_read(stream, &mut buf, timeout).await?;
    if n == 0 {
        return Err(CoreError::ProtocolMalformed);
    }
    buf.truncate(n);
    let mut msg = Message::parse(&buf)?;

    if n > LARGE_PAYLOAD_THRESHOLD && msg.payload.len() >= 4 {
        if let Some(declared) = bytes_to_u32(&msg.payload[..4]) {
            let want = 4 + declared as usize;
            while msg.payload.len() < want {
                let mut more = vec![0u8; READ_BUF_SIZE];
                let got = timeout_read(stream, &mut more, timeout).await?;
                if got == 0 {
                    break;
                }
                msg.payload.extend_from_slice(&more[..got]);
            }
            if msg.payload.len() >= want {
                msg.payload.truncate(want);
            }
        }
    }

    Ok(msg)
}

/// Writes `msg`'s packed bytes to `stream`.
pub async fn write_message(stream: &mut TcpStream, msg: &Message) -> CoreResult<()> {
    stream.write_all(&msg.pack()).await.map_err(CoreError::Io)
}

async fn timeout_read(stream: &mut TcpStream, buf: &mut [u8], timeout: Duration) -> CoreResult<usize> {
    tokio::time::timeout(timeout, stream.read(buf))
        .await
        .map_err(|_| CoreError::RemoteUnavailable("socket read timed out".into()))?
        .map_err(CoreError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageId;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn round_trips_a_small_message() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_message(&mut stream, Duration::from_secs(1)).await.unwrap()
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        let msg = Message::new(0, MessageId::Ping, vec![]);
        write_message(&mut client, &msg).await.unwrap();

        let received = server.await.unwrap();
        assert_eq!(received.id, MessageId::Ping.as_u8());
    }

    #[tokio::test]
    async fn read_times_out_with_no_data() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_message(&mut stream, Duration::from_millis(50)).await
        });

        let _client = TcpStream::connect(addr).await.unwrap();
        let result = server.await.unwrap();
        assert!(matches!(result, Err(CoreError::RemoteUnavailable(_))));
    }
}

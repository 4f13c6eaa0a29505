//! Wire message framing and payload sub-codecs (component E).
//!
//! Every message is `"CL" | version(1B) | message_id(1B) | payload`. The
//! payload layout depends on the message id; the sub-codecs below pack and
//! unpack each one, preserving the one-byte gap in ids 5 and 7 verbatim.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use shared::codec::{bytes_to_u32, u32_to_bytes};
use shared::{CoreError, CoreResult};

/// The two magic bytes identifying a Cirrolus message.
pub const MAGIC: &[u8; 2] = b"CL";

/// Known message ids for protocol version 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageId {
    Join = 0,
    Leave = 1,
    PeerList = 2,
    UploadFragment = 3,
    UploadReport = 4,
    RequestFragment = 5,
    SendFragment = 6,
    Search = 7,
    SearchResults = 8,
    Ping = 255,
}

impl MessageId {
    pub fn from_u8(b: u8) -> Option<Self> {
        Some(match b {
            0 => MessageId::Join,
            1 => MessageId::Leave,
            2 => MessageId::PeerList,
            3 => MessageId::UploadFragment,
            4 => MessageId::UploadReport,
            5 => MessageId::RequestFragment,
            6 => MessageId::SendFragment,
            7 => MessageId::Search,
            8 => MessageId::SearchResults,
            255 => MessageId::Ping,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A framed protocol message: version, id, and raw payload bytes.
#[derive(Debug, Clone)]
pub struct Message {
    pub version: u8,
    pub id: u8,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(version: u8, id: MessageId, payload: Vec<u8>) -> Self {
        Message {
            version,
            id: id.as_u8(),
            payload,
        }
    }

    /// Packs this message into its on-wire byte layout.
    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.payload.len());
        out.extend_from_slice(MAGIC);
        out.push(self.version);
        out.push(self.id);
        out.extend_from_slice(&self.payload);
        out
    }

    /// True iff `bytes` is at least 4 bytes long and starts with the `"CL"` magic.
    pub fn is_cirrolus(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && &bytes[..2] == MAGIC
    }

    /// Parses a raw frame; fails if too short or missing the magic.
    pub fn parse(bytes: &[u8]) -> CoreResult<Message> {
        if !Message::is_cirrolus(bytes) {
            return Err(CoreError::ProtocolMalformed);
        }
        Ok(Message {
            version: bytes[2],
            id: bytes[3],
            payload: bytes[4..].to_vec(),
        })
    }
}

/// Join(0) payload: `listen_port(2B) | want_peers(0 or 1B)`.
pub fn encode_join(listen_port: u16, want_peers: bool) -> Vec<u8> {
    let mut out = listen_port.to_be_bytes().to_vec();
    if want_peers {
        out.push(0xFF);
    }
    out
}

pub fn decode_join(payload: &[u8]) -> CoreResult<(u16, bool)> {
    if payload.len() < 2 {
        return Err(CoreError::ProtocolMalformed);
    }
    let port = u16::from_be_bytes([payload[0], payload[1]]);
    let want_peers = payload.len() > 2 && payload[2] != 0;
    Ok((port, want_peers))
}

/// Leave(1) payload: `listen_port(2B)`.
pub fn encode_leave(listen_port: u16) -> Vec<u8> {
    listen_port.to_be_bytes().to_vec()
}

pub fn decode_leave(payload: &[u8]) -> CoreResult<u16> {
    if payload.len() < 2 {
        return Err(CoreError::ProtocolMalformed);
    }
    Ok(u16::from_be_bytes([payload[0], payload[1]]))
}

/// Peer-list(2) payload: `n(1B) | n x (ip(4B), port(2B))`.
pub fn encode_peer_list(peers: &[(Ipv4Addr, u16)]) -> CoreResult<Vec<u8>> {
    if peers.len() > u8::MAX as usize {
        return Err(CoreError::ProtocolMalformed);
    }
    let mut out = Vec::with_capacity(1 + peers.len() * 6);
    out.push(peers.len() as u8);
    for (ip, port) in peers {
        out.extend_from_slice(&ip.octets());
        out.extend_from_slice(&port.to_be_bytes());
    }
    Ok(out)
}

pub fn decode_peer_list(payload: &[u8]) -> CoreResult<Vec<(Ipv4Addr, u16)>> {
    if payload.is_empty() {
        return Err(CoreError::ProtocolMalformed);
    }
    let n = payload[0] as usize;
    if payload.len() < 1 + n * 6 {
        return Err(CoreError::ProtocolMalformed);
    }
    let mut peers = Vec::with_capacity(n);
    for i in 0..n {
        let offset = 1 + i * 6;
        let ip = Ipv4Addr::new(
            payload[offset],
            payload[offset + 1],
            payload[offset + 2],
            payload[offset + 3],
        );
        let port = u16::from_be_bytes([payload[offset + 4], payload[offset + 5]]);
        peers.push((ip, port));
    }
    Ok(peers)
}

/// Length-prefixed payload used by ids 3, 6 (non-miss), and 8: `len(4B) | bytes`.
pub fn encode_len_prefixed(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + bytes.len());
    out.extend_from_slice(&u32_to_bytes(bytes.len() as u32));
    out.extend_from_slice(bytes);
    out
}

pub fn decode_len_prefixed(payload: &[u8]) -> CoreResult<Vec<u8>> {
    if payload.len() < 4 {
        return Err(CoreError::ProtocolMalformed);
    }
    let len = bytes_to_u32(&payload[..4]).ok_or(CoreError::ProtocolMalformed)? as usize;
    if payload.len() < 4 + len {
        return Err(CoreError::ProtocolMalformed);
    }
    Ok(payload[4..4 + len].to_vec())
}

/// Upload-report(4) payload: `0x00` fail, `0xFF` ok.
pub fn encode_upload_report(ok: bool) -> Vec<u8> {
    vec![if ok { 0xFF } else { 0x00 }]
}

pub fn decode_upload_report(payload: &[u8]) -> CoreResult<bool> {
    Ok(payload.first().map(|b| *b != 0).unwrap_or(false))
}

/// Encodes the shared `hash(32B) | <gap byte> | ulen(1B) | username` layout
/// used by both Request-fragment(5) and Search(7). `hash` is all-zero when
/// Search means "list everything".
///
/// The gap byte at offset 32 is unused and always written as `0x00`; the
/// `ulen` length byte lives at offset 33, one past where it would sit if the
/// hash were immediately followed by the length. This is preserved exactly
/// as the original protocol defines it.
pub fn encode_hash_and_username(hash: &[u8; 32], username: &str) -> CoreResult<Vec<u8>> {
    if username.len() > u8::MAX as usize {
        return Err(CoreError::ProtocolMalformed);
    }
    let mut out = Vec::with_capacity(34 + username.len());
    out.extend_from_slice(hash);
    out.push(0); // unused gap byte at offset 32
    out.push(username.len() as u8);
    out.extend_from_slice(username.as_bytes());
    Ok(out)
}

pub fn decode_hash_and_username(payload: &[u8]) -> CoreResult<([u8; 32], String)> {
    if payload.len() < 34 {
        return Err(CoreError::ProtocolMalformed);
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&payload[..32]);
    let ulen = payload[33] as usize;
    if payload.len() < 34 + ulen {
        return Err(CoreError::ProtocolMalformed);
    }
    let username = String::from_utf8(payload[34..34 + ulen].to_vec())
        .map_err(|_| CoreError::ProtocolMalformed)?;
    Ok((hash, username))
}

/// Send-fragment(6) miss payload: a single `0x00` byte.
pub fn encode_send_fragment_miss() -> Vec<u8> {
    vec![0x00]
}

/// Decodes Send-fragment(6): `None` on a miss (empty or single zero byte
/// payload), `Some(bytes)` for a length-prefixed fragment.
pub fn decode_send_fragment(payload: &[u8]) -> CoreResult<Option<Vec<u8>>> {
    if payload.is_empty() || (payload.len() == 1 && payload[0] == 0) {
        return Ok(None);
    }
    Ok(Some(decode_len_prefixed(payload)?))
}

/// The JSON body of a Search-results(8) reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResultsBody {
    pub username: String,
    pub files: std::collections::HashMap<String, String>,
}

pub fn encode_search_results(body: &SearchResultsBody) -> CoreResult<Vec<u8>> {
    let json = serde_json::to_vec(body)?;
    Ok(encode_len_prefixed(&json))
}

pub fn decode_search_results(payload: &[u8]) -> CoreResult<SearchResultsBody> {
    let json = decode_len_prefixed(payload)?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_always_self_identifies() {
        for version in [0u8, 1, 255] {
            for id in [0u8, 5, 255] {
                let msg = Message {
                    version,
                    id,
                    payload: vec![1, 2, 3],
                };
                assert!(Message::is_cirrolus(&msg.pack()));
            }
        }
    }

    #[test]
    fn parse_round_trips_pack() {
        let msg = Message::new(0, MessageId::Ping, vec![]);
        let packed = msg.pack();
        let parsed = Message::parse(&packed).unwrap();
        assert_eq!(parsed.version, 0);
        assert_eq!(parsed.id, MessageId::Ping.as_u8());
    }

    #[test]
    fn rejects_missing_magic() {
        assert!(Message::parse(b"XXhello").is_err());
    }

    #[test]
    fn join_round_trip() {
        let payload = encode_join(50666, true);
        assert_eq!(decode_join(&payload).unwrap(), (50666, true));
        let payload = encode_join(50666, false);
        assert_eq!(decode_join(&payload).unwrap(), (50666, false));
    }

    #[test]
    fn peer_list_round_trip() {
        let peers = vec![
            (Ipv4Addr::new(127, 0, 0, 1), 50000),
            (Ipv4Addr::new(192, 168, 1, 5), 50001),
        ];
        let payload = encode_peer_list(&peers).unwrap();
        assert_eq!(decode_peer_list(&payload).unwrap(), peers);
    }

    #[test]
    fn hash_and_username_preserves_offset_33_gap() {
        let hash = [0xAB; 32];
        let payload = encode_hash_and_username(&hash, "alice").unwrap();
        assert_eq!(payload.len(), 34 + 5);
        assert_eq!(payload[32], 0); // the unused gap byte
        assert_eq!(payload[33], 5); // ulen lives one byte past the gap
        let (decoded_hash, decoded_user) = decode_hash_and_username(&payload).unwrap();
        assert_eq!(decoded_hash, hash);
        assert_eq!(decoded_user, "alice");
    }

    #[test]
    fn send_fragment_miss_round_trip() {
        let payload = encode_send_fragment_miss();
        assert_eq!(decode_send_fragment(&payload).unwrap(), None);
    }

    #[test]
    fn send_fragment_hit_round_trip() {
        let payload = encode_len_prefixed(b"fragment bytes");
        assert_eq!(
            decode_send_fragment(&payload).unwrap(),
            Some(b"fragment bytes".to_vec())
        );
    }

    #[test]
    fn search_results_round_trip() {
        let mut files = std::collections::HashMap::new();
        files.insert("a".repeat(64), "b".repeat(64));
        let body = SearchResultsBody {
            username: "alice".to_string(),
            files,
        };
        let payload = encode_search_results(&body).unwrap();
        assert_eq!(decode_search_results(&payload).unwrap(), body);
    }
}

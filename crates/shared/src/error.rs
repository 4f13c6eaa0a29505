//! Crate-wide error taxonomy for the Cirrolus node.
//!
//! Local recoverable events (malformed frames, unknown ids, a refused
//! connection) are meant to be logged and swallowed by the caller; only
//! reconstruction-level and precondition-level failures are meant to reach
//! the driver/CLI boundary.

use std::io;

use tracing::debug;

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Application-wide error type shared by the fragmentation engine, the
/// peer protocol engine, and the node driver.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The frame didn't start with the `"CL"` magic, or was truncated.
    #[error("malformed protocol frame")]
    ProtocolMalformed,

    /// The `(version, message_id)` pair has no registered handler.
    #[error("unknown protocol version or message id")]
    UnknownVersionOrId,

    /// A peer refused the connection, or a ping timed out.
    #[error("remote peer unavailable: {0}")]
    RemoteUnavailable(String),

    /// A remote's upload report came back as a failure byte.
    #[error("upload rejected by remote")]
    UploadRejected,

    /// A remote reported it did not have the requested fragment.
    #[error("fragment missing at remote")]
    FragmentMissing,

    /// Fragments collected for a reconstruction do not share a `hash` field.
    #[error("fragment set is inconsistent: {0}")]
    FragmentInconsistent(String),

    /// Fewer than four peers were known when an upload was attempted.
    #[error("not enough peers to upload (need at least 4)")]
    InsufficientPeers,

    /// Fewer than four fragments were collected when a download was attempted.
    #[error("not enough fragments collected to reconstruct the file")]
    InsufficientFragments,

    /// A fragment file did not begin with the `#CL\0` magic.
    #[error("not a Cirrolus fragment")]
    NotAFragment,

    /// A split/combine operation was asked to work with fewer than 4 fragments.
    #[error("fragment count must be at least 4, got {0}")]
    InvalidFragmentCount(usize),

    /// Requested fragment was not found (zero or multiple store matches).
    #[error("fragment not found: {0}")]
    FragmentNotFound(String),

    /// Content-cipher encrypt/decrypt failed.
    #[error("content cipher error: {0}")]
    Cipher(String),

    /// Wraps filesystem I/O errors encountered while reading/writing fragments.
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// Wraps fragment metadata (de)serialization errors.
    #[error("fragment metadata error: {0}")]
    Metadata(serde_json::Error),
}

impl From<io::Error> for CoreError {
    fn from(err: io::Error) -> Self {
        debug!(error = %err, "I/O error");
        CoreError::Io(err)
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        debug!(error = %err, "fragment metadata (de)serialization error");
        CoreError::Metadata(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            CoreError::InsufficientPeers.to_string(),
            "not enough peers to upload (need at least 4)"
        );
        assert_eq!(
            CoreError::FragmentInconsistent("hash mismatch".into()).to_string(),
            "fragment set is inconsistent: hash mismatch"
        );
    }
}

//! The JSON metadata header embedded in every fragment file.

use serde::{Deserialize, Serialize};

/// Metadata describing one fragment: which file it belongs to, who uploaded
/// it, and which `x` coordinate it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentMeta {
    /// Lowercase hex SHA-256 of the original filename.
    pub filename: String,
    /// Username of the peer that uploaded this fragment.
    pub uploader: String,
    /// Lowercase hex SHA-256 of the (unpadded) original content.
    pub hash: String,
    /// The x-coordinate this fragment's y-values were evaluated at.
    pub x: u64,
    /// Random padding length appended to the content before chunking.
    pub added_bytes: u8,
    /// Whether the uploader asked for this content to stay unlisted.
    #[serde(default)]
    pub private: bool,
}

//! Splitting a file into `n` fragments (component C, upload side).
//!
//! A file is padded to a multiple of [`CHUNK_SIZE`] bytes with random
//! padding, cut into `CHUNK_SIZE`-byte chunks, and each chunk is read as
//! [`COEFFS_PER_CHUNK`] big-endian [`BLOCK_SIZE`]-byte coefficients of one
//! polynomial per chunk. Each of the `n` fragments holds every polynomial's
//! value at one `x`, so any [`MIN_FRAGMENTS`] of them reconstruct the file.

use std::collections::HashSet;
use std::path::Path;

use num_bigint::BigInt;
use rand::RngCore;
use shared::{CoreError, CoreResult};

use crate::meta::FragmentMeta;
use crate::polynomial::{prime, Polynomial};
use crate::wire::encode_fragment;

/// Bytes of source content folded into one polynomial.
pub const CHUNK_SIZE: usize = 128;
/// Width of one coefficient block within a chunk.
pub const BLOCK_SIZE: usize = 32;
/// Coefficients per chunk (`CHUNK_SIZE / BLOCK_SIZE`).
pub const COEFFS_PER_CHUNK: usize = CHUNK_SIZE / BLOCK_SIZE;
/// Minimum number of fragments a split/combine operates on.
pub const MIN_FRAGMENTS: usize = 4;

const X_MIN: u64 = 1;
const X_MAX_EXCLUSIVE: u64 = 1_000_000_000_000_000_000;

/// Result of splitting one file into fragments.
pub struct SplitOutput {
    /// Encoded fragment bytes, one per sampled `x`.
    pub fragments: Vec<Vec<u8>>,
    /// `x` value each entry of `fragments` corresponds to.
    pub xs: Vec<u64>,
    /// Lowercase hex SHA-256 of the original (pre-padding) content.
    pub content_hash: String,
    /// Lowercase hex SHA-256 of the filename.
    pub filename_hash: String,
    /// Random padding length appended before chunking, 1..=128.
    pub added_bytes: u8,
}

/// Splits `content` into `n` fragments.
///
/// `filename` is hashed to become both the on-wire fragment identifier and
/// the salt a content cipher would use; it need not be a filesystem path.
pub fn split_bytes(
    content: &[u8],
    filename: &str,
    n: usize,
    uploader: &str,
    private: bool,
) -> CoreResult<SplitOutput> {
    if n < MIN_FRAGMENTS {
        return Err(CoreError::InvalidFragmentCount(n));
    }

    let content_hash = shared::hashing::sha256_hex(content);
    let filename_hash = shared::hashing::sha256_hex(filename.as_bytes());

    let added_bytes = padding_len(content.len());
    let mut padded = Vec::with_capacity(content.len() + added_bytes as usize);
    padded.extend_from_slice(content);
    let mut pad = vec![0u8; added_bytes as usize];
    rand::thread_rng().fill_bytes(&mut pad);
    padded.extend_from_slice(&pad);
    debug_assert_eq!(padded.len() % CHUNK_SIZE, 0);

    let polynomials = build_polynomials(&padded);
    let xs = sample_distinct_xs(n);
    let p = prime();

    let mut fragments = Vec::with_capacity(n);
    for &x in &xs {
        let x_big = BigInt::from(x);
        let y_values: Vec<BigInt> = polynomials.iter().map(|poly| poly.eval(&x_big, &p)).collect();
        let meta = FragmentMeta {
            filename: filename_hash.clone(),
            uploader: uploader.to_string(),
            hash: content_hash.clone(),
            x,
            added_bytes,
            private,
        };
        fragments.push(encode_fragment(&meta, &y_values)?);
    }

    Ok(SplitOutput {
        fragments,
        xs,
        content_hash,
        filename_hash,
        added_bytes,
    })
}

/// Splits the file at `path`; see [`split_bytes`].
pub fn split_file(path: &Path, n: usize, uploader: &str, private: bool) -> CoreResult<SplitOutput> {
    let content = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    split_bytes(&content, &filename, n, uploader, private)
}

/// How many random padding bytes must follow `len` bytes of content to make
/// the total a multiple of [`CHUNK_SIZE`]. Always in `1..=CHUNK_SIZE`, even
/// when `len` is already a multiple (a full extra chunk is added), matching
/// the original implementation's "always pad" behavior.
fn padding_len(len: usize) -> u8 {
    let remainder = len % CHUNK_SIZE;
    if remainder == 0 {
        CHUNK_SIZE as u8
    } else {
        (CHUNK_SIZE - remainder) as u8
    }
}

fn build_polynomials(padded: &[u8]) -> Vec<Polynomial> {
    padded
        .chunks(CHUNK_SIZE)
        .map(|chunk| {
            let coefficients = chunk
                .chunks(BLOCK_SIZE)
                .map(|block| BigInt::from_bytes_be(num_bigint::Sign::Plus, block))
                .collect();
            Polynomial::new(coefficients)
        })
        .collect()
}

fn sample_distinct_xs(n: usize) -> Vec<u64> {
    let mut seen = HashSet::with_capacity(n);
    let mut rng = rand::thread_rng();
    while seen.len() < n {
        let x = X_MIN + rng.next_u64() % (X_MAX_EXCLUSIVE - X_MIN);
        seen.insert(x);
    }
    seen.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_few_fragments() {
        let err = split_bytes(b"hello", "f.txt", 3, "alice", false).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFragmentCount(3)));
    }

    #[test]
    fn produces_n_distinct_fragments() {
        let out = split_bytes(b"hello world, this is some content", "f.txt", 5, "alice", false).unwrap();
        assert_eq!(out.fragments.len(), 5);
        assert_eq!(out.xs.len(), 5);
        let unique: HashSet<_> = out.xs.iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn padding_always_added() {
        assert_eq!(padding_len(0), 128);
        assert_eq!(padding_len(128), 128);
        assert_eq!(padding_len(1), 127);
        assert_eq!(padding_len(127), 1);
    }

    #[test]
    fn xs_within_bounds() {
        for x in sample_distinct_xs(20) {
            assert!(x >= X_MIN && x < X_MAX_EXCLUSIVE);
        }
    }
}

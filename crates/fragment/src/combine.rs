//! Reconstructing a file from a set of fragments (component C, download side).
//!
//! Each polynomial's `x, y` pairs across the supplied fragments are run
//! through Lagrange interpolation to recover its coefficients directly —
//! the coefficients *are* the original 32-byte data blocks, not a single
//! shared secret, so the full polynomial must be recovered, not just its
//! value at zero.

use num_bigint::BigInt;
use shared::codec::int_to_bytes;
use shared::{CoreError, CoreResult};

use crate::polynomial::{mod_inverse, prime, Polynomial};
use crate::split::MIN_FRAGMENTS;
use crate::wire::decode_fragment;

/// Result of a successful reconstruction.
pub struct CombineOutput {
    pub content: Vec<u8>,
    pub private: bool,
    pub content_hash: String,
}

/// Reconstructs a file from its encoded fragment bytes.
pub fn combine_fragments(fragment_bytes: &[Vec<u8>]) -> CoreResult<CombineOutput> {
    if fragment_bytes.len() < MIN_FRAGMENTS {
        return Err(CoreError::InvalidFragmentCount(fragment_bytes.len()));
    }

    let parsed: Vec<_> = fragment_bytes
        .iter()
        .map(|bytes| decode_fragment(bytes))
        .collect::<CoreResult<Vec<_>>>()?;

    let first = &parsed[0].0;
    for (meta, _) in &parsed[1..] {
        if meta.hash != first.hash {
            return Err(CoreError::FragmentInconsistent(format!(
                "hash mismatch: {} vs {}",
                first.hash, meta.hash
            )));
        }
        if meta.added_bytes != first.added_bytes {
            return Err(CoreError::FragmentInconsistent(
                "added_bytes mismatch across fragments".into(),
            ));
        }
    }
    let chunk_count = parsed[0].1.len();
    if parsed.iter().any(|(_, ys)| ys.len() != chunk_count) {
        return Err(CoreError::FragmentInconsistent(
            "fragments carry a different number of polynomials".into(),
        ));
    }

    let modulus = prime();
    let mut padded = Vec::with_capacity(chunk_count * crate::split::CHUNK_SIZE);
    for k in 0..chunk_count {
        let coordinates: Vec<(BigInt, BigInt)> = parsed
            .iter()
            .map(|(meta, ys)| (BigInt::from(meta.x), ys[k].clone()))
            .collect();
        let poly = lagrange(&coordinates, &modulus);
        for coeff in poly.coefficients() {
            let as_biguint = coeff.to_biguint().ok_or_else(|| {
                CoreError::FragmentInconsistent("reconstructed coefficient was negative".into())
            })?;
            padded.extend_from_slice(&int_to_bytes(&as_biguint, crate::split::BLOCK_SIZE));
        }
        // A chunk with a zero-valued high block trims away in Polynomial::new;
        // pad back out to a full chunk's worth of coefficients.
        let produced_this_chunk = crate::split::COEFFS_PER_CHUNK;
        let missing = produced_this_chunk.saturating_sub(poly.coefficients().len());
        for _ in 0..missing {
            padded.extend_from_slice(&[0u8; crate::split::BLOCK_SIZE]);
        }
    }

    let added_bytes = first.added_bytes as usize;
    if added_bytes > padded.len() {
        return Err(CoreError::FragmentInconsistent(
            "added_bytes exceeds reconstructed length".into(),
        ));
    }
    let content = padded[..padded.len() - added_bytes].to_vec();

    let content_hash = shared::hashing::sha256_hex(&content);
    if content_hash != first.hash {
        return Err(CoreError::FragmentInconsistent(format!(
            "reconstructed content hash {content_hash} does not match declared {}",
            first.hash
        )));
    }

    Ok(CombineOutput {
        content,
        private: first.private,
        content_hash,
    })
}

/// Lagrange-interpolates the unique polynomial through `coordinates`,
/// reducing modulo `modulus` after every accumulated term.
fn lagrange(coordinates: &[(BigInt, BigInt)], modulus: &BigInt) -> Polynomial {
    let mut sum = Polynomial::zero();
    for (xi, yi) in coordinates {
        let mut term = Polynomial::constant(yi.clone());
        for (xj, _) in coordinates {
            if xj != xi {
                let factor = Polynomial::new(vec![-xj.clone(), BigInt::from(1)]);
                term = term.mul(&factor);
                let diff = xi - xj;
                let inv = mod_inverse(&diff, modulus);
                term = term.mul_scalar(&inv);
            }
        }
        sum = sum.add(&term).modulo(modulus);
    }
    sum
}

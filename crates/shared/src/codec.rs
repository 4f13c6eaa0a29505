//! Big-endian integer packing of arbitrary width.
//!
//! The wire format and the fragment format both lean on fixed-width
//! big-endian integers (2, 4, and 33 bytes for ports, lengths, and
//! polynomial y-values respectively). [`num_bigint::BigUint`] already knows
//! how to go to/from big-endian bytes; this module only adds the
//! fixed-width, zero-padded framing the protocol needs on top of it.

use num_bigint::BigUint;

/// Encodes `n` as a big-endian unsigned integer padded/truncated to exactly
/// `width` bytes.
///
/// # Panics
///
/// Panics if `n` does not fit in `width` bytes — callers own the invariant
/// that coefficients and y-values fit their declared width.
pub fn int_to_bytes(n: &BigUint, width: usize) -> Vec<u8> {
    let raw = n.to_bytes_be();
    assert!(
        raw.len() <= width,
        "value does not fit in {width} bytes (needs {})",
        raw.len()
    );
    let mut out = vec![0u8; width - raw.len()];
    out.extend_from_slice(&raw);
    out
}

/// Decodes a big-endian unsigned integer from exactly `bytes.len()` bytes.
pub fn bytes_to_int(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Encodes a `u16` as 2 big-endian bytes.
pub fn u16_to_bytes(n: u16) -> [u8; 2] {
    n.to_be_bytes()
}

/// Decodes 2 big-endian bytes as a `u16`.
pub fn bytes_to_u16(bytes: &[u8]) -> Option<u16> {
    Some(u16::from_be_bytes(bytes.try_into().ok()?))
}

/// Encodes a `u32` as 4 big-endian bytes.
pub fn u32_to_bytes(n: u32) -> [u8; 4] {
    n.to_be_bytes()
}

/// Decodes 4 big-endian bytes as a `u32`.
pub fn bytes_to_u32(bytes: &[u8]) -> Option<u32> {
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_fixed_width() {
        let n = BigUint::from(1234567890u64);
        let bytes = int_to_bytes(&n, 32);
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes_to_int(&bytes), n);
    }

    #[test]
    fn zero_pads_small_values() {
        let n = BigUint::from(1u32);
        let bytes = int_to_bytes(&n, 4);
        assert_eq!(bytes, vec![0, 0, 0, 1]);
    }

    #[test]
    fn u16_round_trip() {
        let bytes = u16_to_bytes(50666);
        assert_eq!(bytes_to_u16(&bytes), Some(50666));
    }

    #[test]
    fn u32_round_trip() {
        let bytes = u32_to_bytes(70000);
        assert_eq!(bytes_to_u32(&bytes), Some(70000));
    }
}

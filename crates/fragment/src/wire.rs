//! On-disk fragment file framing: `"#CL\0" | meta_len(4B BE) | meta_json | y_values`.

use num_bigint::BigInt;
use shared::codec::{bytes_to_int, bytes_to_u32, int_to_bytes, u32_to_bytes};
use shared::{CoreError, CoreResult};

use crate::meta::FragmentMeta;

/// Fragment file magic, identifying the format before the metadata length.
pub const MAGIC: &[u8; 4] = b"#CL\0";
/// Width of one encoded y-value.
pub const Y_VALUE_WIDTH: usize = 33;

/// Encodes a fragment's metadata and y-values into its on-disk byte layout.
pub fn encode_fragment(meta: &FragmentMeta, y_values: &[BigInt]) -> CoreResult<Vec<u8>> {
    let meta_json = serde_json::to_vec(meta)?;
    let mut out = Vec::with_capacity(MAGIC.len() + 4 + meta_json.len() + y_values.len() * Y_VALUE_WIDTH);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&u32_to_bytes(meta_json.len() as u32));
    out.extend_from_slice(&meta_json);
    for y in y_values {
        let y = y
            .to_biguint()
            .ok_or_else(|| CoreError::Cipher("negative y-value, not a reduced field element".into()))?;
        out.extend_from_slice(&int_to_bytes(&y, Y_VALUE_WIDTH));
    }
    Ok(out)
}

/// Parses a fragment file's bytes back into its metadata and y-values.
pub fn decode_fragment(data: &[u8]) -> CoreResult<(FragmentMeta, Vec<BigInt>)> {
    if data.len() < MAGIC.len() + 4 || &data[..MAGIC.len()] != MAGIC {
        return Err(CoreError::NotAFragment);
    }
    let mut offset = MAGIC.len();
    let meta_len = bytes_to_u32(&data[offset..offset + 4]).ok_or(CoreError::NotAFragment)? as usize;
    offset += 4;
    if data.len() < offset + meta_len {
        return Err(CoreError::NotAFragment);
    }
    let meta: FragmentMeta = serde_json::from_slice(&data[offset..offset + meta_len])?;
    offset += meta_len;

    let remaining = &data[offset..];
    if remaining.len() % Y_VALUE_WIDTH != 0 {
        return Err(CoreError::NotAFragment);
    }
    let y_values = remaining
        .chunks(Y_VALUE_WIDTH)
        .map(|chunk| bytes_to_int(chunk).into())
        .collect();
    Ok((meta, y_values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meta() -> FragmentMeta {
        FragmentMeta {
            filename: "a".repeat(64),
            uploader: "alice".into(),
            hash: "b".repeat(64),
            x: 42,
            added_bytes: 13,
            private: false,
        }
    }

    #[test]
    fn round_trips() {
        let meta = sample_meta();
        let y_values = vec![BigInt::from(1), BigInt::from(2), BigInt::from(3)];
        let encoded = encode_fragment(&meta, &y_values).unwrap();
        let (decoded_meta, decoded_ys) = decode_fragment(&encoded).unwrap();
        assert_eq!(decoded_meta, meta);
        assert_eq!(decoded_ys, y_values);
    }

    #[test]
    fn rejects_missing_magic() {
        let err = decode_fragment(b"not a fragment at all").unwrap_err();
        assert!(matches!(err, CoreError::NotAFragment));
    }

    #[test]
    fn self_identifies_within_larger_buffer_prefix() {
        let meta = sample_meta();
        let encoded = encode_fragment(&meta, &[BigInt::from(7)]).unwrap();
        assert_eq!(&encoded[..4], MAGIC);
    }
}

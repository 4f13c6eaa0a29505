//! Reference content cipher: PBKDF2-SHA1 key derivation feeding AES-256-CBC,
//! padded to 32-byte blocks rather than AES's native 16 (see spec note on
//! the mismatch — preserved here rather than "fixed", since interop with
//! this exact byte layout is the point).

use aes::Aes256;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use fragment::ContentCipher;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha1::Sha1;
use shared::{CoreError, CoreResult};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const KEY_LEN: usize = 32;
const PBKDF2_ITERATIONS: u32 = 12_000;
const PAD_BLOCK_SIZE: usize = 32;
const IV_LEN: usize = 16; // AES's own block size, used only for the IV

fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha1>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

fn pad(data: &[u8]) -> Vec<u8> {
    let pad_len = PAD_BLOCK_SIZE - (data.len() % PAD_BLOCK_SIZE);
    let mut out = data.to_vec();
    out.extend(std::iter::repeat(pad_len as u8).take(pad_len));
    out
}

fn unpad(data: &[u8]) -> CoreResult<Vec<u8>> {
    let pad_len = *data
        .last()
        .ok_or_else(|| CoreError::Cipher("empty ciphertext".into()))? as usize;
    if pad_len == 0 || pad_len > data.len() {
        return Err(CoreError::Cipher("invalid padding".into()));
    }
    Ok(data[..data.len() - pad_len].to_vec())
}

pub struct Aes256CbcCipher;

impl ContentCipher for Aes256CbcCipher {
    fn encrypt(&self, plaintext: &[u8], password: &str, salt: &[u8]) -> CoreResult<Vec<u8>> {
        let key = derive_key(password, salt);
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        let padded = pad(plaintext);
        let ciphertext = Aes256CbcEnc::new(&key.into(), &iv.into())
            .encrypt_padded_vec_mut::<NoPadding>(&padded);
        let mut out = Vec::with_capacity(IV_LEN + ciphertext.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8], password: &str, salt: &[u8]) -> CoreResult<Vec<u8>> {
        if ciphertext.len() < IV_LEN {
            return Err(CoreError::Cipher("ciphertext shorter than IV".into()));
        }
        let key = derive_key(password, salt);
        let (iv, body) = ciphertext.split_at(IV_LEN);
        let padded = Aes256CbcDec::new(&key.into(), iv.into())
            .decrypt_padded_vec_mut::<NoPadding>(body)
            .map_err(|e| CoreError::Cipher(format!("CBC decrypt failed: {e}")))?;
        unpad(&padded)
    }
}

/// Cryptographic primitives for the carrier payload
///
/// AES-256-CBC/PKCS#7 for confidentiality, HMAC-SHA256 for integrity,
/// PBKDF2-HMAC-SHA256 for the key and SHA-256 for digests and the placement seed.
///
/// **Key provenance**: the AES key is derived from the carrier salt alone, and the
/// salt is stored in the carrier. Anyone who knows the layout can rebuild the key.
/// Confidentiality rests on the placement being unknown, not on a held secret.

use crate::error::{Result, StegoError};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::{CryptoRng, Rng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;
pub const SALT_LEN: usize = 16;
pub const MAC_LEN: usize = 32;
pub const BLOCK_LEN: usize = 16;
/// Hex characters of the plaintext digest stored in the carrier
pub const DIGEST_CHARS: usize = 32;

/// PBKDF2-HMAC-SHA256 with `salt_like` as both password and salt.
///
/// The codec calls this with the carrier salt, so the key depends on nothing else.
pub fn derive_key(salt_like: &[u8], length: usize, iterations: u32) -> Result<Zeroizing<Vec<u8>>> {
    if length == 0 {
        return Err(StegoError::KeyDerivation("requested key length is zero".into()));
    }
    if iterations == 0 {
        return Err(StegoError::KeyDerivation("iteration count is zero".into()));
    }
    let mut key = Zeroizing::new(vec![0u8; length]);
    pbkdf2::pbkdf2::<HmacSha256>(salt_like, salt_like, iterations, &mut key)
        .map_err(|e| StegoError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

/// Lowercase hex SHA-256 (64 characters)
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// AES-256-CBC with PKCS#7 padding. Output is always a whole number of
/// blocks, with at least one byte of padding.
pub fn aes_encrypt(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| {
        StegoError::Cipher(format!(
            "expected {KEY_LEN}-byte key and {IV_LEN}-byte IV, got {} and {}",
            key.len(),
            iv.len()
        ))
    })?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Inverse of [`aes_encrypt`]. Fails on empty input, partial blocks or bad padding.
pub fn aes_decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.is_empty() {
        return Err(StegoError::Decryption("empty ciphertext".into()));
    }
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(StegoError::Decryption(format!(
            "ciphertext length {} is not a multiple of {BLOCK_LEN}",
            ciphertext.len()
        )));
    }
    let cipher = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| StegoError::Cipher("invalid key or IV length".into()))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| StegoError::Decryption("invalid padding (corrupted data or wrong key/IV)".into()))
}

/// True when every byte is printable ASCII or ASCII whitespace.
///
/// Advisory only: a `false` result hints at corruption but never rejects plaintext.
pub fn is_printable_text(data: &[u8]) -> bool {
    data.iter()
        .all(|&b| (0x20..=0x7e).contains(&b) || matches!(b, b'\t' | b'\n' | 0x0b | 0x0c | b'\r'))
}

/// HMAC-SHA256 tag over `data`
pub fn generate_hmac(data: &[u8], key: &[u8]) -> Result<[u8; MAC_LEN]> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| StegoError::Mac(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

/// Constant-time check of `tag` against the HMAC-SHA256 of `data`
pub fn verify_hmac(data: &[u8], tag: &[u8], key: &[u8]) -> bool {
    let Ok(mut mac) = <HmacSha256 as Mac>::new_from_slice(key) else {
        return false;
    };
    mac.update(data);
    mac.verify_slice(tag).is_ok()
}

/// Placement seed: first 4 bytes of SHA256(key || salt), little-endian.
pub fn derive_seed(key: &[u8], salt: &[u8]) -> u32 {
    let hash: [u8; 32] = Sha256::new()
        .chain_update(key)
        .chain_update(salt)
        .finalize()
        .into();
    u32::from_le_bytes([hash[0], hash[1], hash[2], hash[3]])
}

/// Uniform string over `[0-9A-Za-z]`
pub fn random_alnum<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Fresh carrier salt
pub fn random_salt<R: RngCore + CryptoRng>(rng: &mut R) -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    for (dst, ch) in salt.iter_mut().zip(random_alnum(rng, SALT_LEN).bytes()) {
        *dst = ch;
    }
    salt
}

/// Fresh CBC IV
pub fn random_iv<R: RngCore + CryptoRng>(rng: &mut R) -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    rng.fill_bytes(&mut iv);
    iv
}

//! Manifest decryption.
//!
//! The first 16 bytes of a raw manifest are the CBC initialization vector;
//! everything between the IV and the trailing MAC is AES-256-CBC ciphertext
//! with PKCS#7 padding. Callers verify the MAC first; this module performs
//! no authentication of its own.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use aes::Aes256;

use crate::error::{PackdexError, PackdexResult};
use crate::types::{IV_LEN, MAC_LEN, MIN_MANIFEST_LEN};

type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Decrypt `raw[16..len-32]` with AES-256-CBC using the embedded IV.
///
/// Returns the unpadded plaintext. Ciphertext that is empty, not
/// block-aligned, or carries invalid padding fails with a decryption
/// error, distinct from MAC failure.
pub fn decrypt_manifest(raw: &[u8], cipher_key: &[u8; 32]) -> PackdexResult<Vec<u8>> {
    if raw.len() < MIN_MANIFEST_LEN {
        return Err(PackdexError::MalformedManifest { len: raw.len() });
    }
    let iv = &raw[..IV_LEN];
    let ciphertext = &raw[IV_LEN..raw.len() - MAC_LEN];

    if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
        return Err(PackdexError::DecryptionFailed {
            message: format!(
                "ciphertext length {} is not a positive multiple of the block size",
                ciphertext.len()
            ),
        });
    }

    let decryptor =
        Aes256CbcDec::new_from_slices(cipher_key, iv).map_err(|e| PackdexError::DecryptionFailed {
            message: format!("cipher init failed: {}", e),
        })?;

    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| PackdexError::DecryptionFailed {
            message: "PKCS#7 padding is invalid".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::verify_manifest;

    use aes::cipher::BlockEncryptMut;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type Aes256CbcEnc = cbc::Encryptor<Aes256>;

    const TEST_IV: [u8; 16] = [0x07; 16];

    fn test_cipher_key() -> [u8; 32] {
        [0x51; 32]
    }

    fn test_mac_key() -> [u8; 32] {
        [0x6E; 32]
    }

    /// IV || AES-256-CBC(plaintext) || HMAC-SHA256(IV || ciphertext).
    fn sealed_manifest(plaintext: &[u8]) -> Vec<u8> {
        let ciphertext = Aes256CbcEnc::new_from_slices(&test_cipher_key(), &TEST_IV)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut raw = TEST_IV.to_vec();
        raw.extend_from_slice(&ciphertext);

        let mut mac = Hmac::<Sha256>::new_from_slice(&test_mac_key()).unwrap();
        mac.update(&raw);
        let tag = mac.finalize().into_bytes();
        raw.extend_from_slice(&tag);
        raw
    }

    #[test]
    fn test_round_trip_recovers_plaintext() {
        let plaintext = b"the quick brown fox jumps over the lazy dog";
        let raw = sealed_manifest(plaintext);

        let decrypted = decrypt_manifest(&raw, &test_cipher_key()).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_authenticate_then_decrypt_round_trip() {
        let plaintext = b"pipeline ordering: authenticate before decrypt";
        let raw = sealed_manifest(plaintext);

        verify_manifest(&raw, &test_mac_key()).unwrap();
        let decrypted = decrypt_manifest(&raw, &test_cipher_key()).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_block_aligned_plaintext_round_trips() {
        // Exactly one block; PKCS#7 adds a full padding block.
        let plaintext = [0xC3; 16];
        let raw = sealed_manifest(&plaintext);

        let decrypted = decrypt_manifest(&raw, &test_cipher_key()).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_key_fails_padding() {
        let raw = sealed_manifest(b"some plaintext body");

        let err = decrypt_manifest(&raw, &[0x52; 32]).unwrap_err();
        assert!(matches!(err, PackdexError::DecryptionFailed { .. }));
    }

    #[test]
    fn test_unaligned_ciphertext_fails() {
        // 16-byte IV, 17 bytes of "ciphertext", 32-byte MAC region.
        let raw = vec![0u8; 16 + 17 + 32];

        let err = decrypt_manifest(&raw, &test_cipher_key()).unwrap_err();
        assert!(matches!(err, PackdexError::DecryptionFailed { .. }));
    }

    #[test]
    fn test_empty_ciphertext_fails() {
        // Shape-valid 48 bytes but nothing to decrypt.
        let raw = vec![0u8; MIN_MANIFEST_LEN];

        let err = decrypt_manifest(&raw, &test_cipher_key()).unwrap_err();
        assert!(matches!(err, PackdexError::DecryptionFailed { .. }));
    }

    #[test]
    fn test_short_input_is_malformed() {
        let err = decrypt_manifest(&[0u8; 20], &test_cipher_key()).unwrap_err();
        assert!(matches!(err, PackdexError::MalformedManifest { len: 20 }));
    }
}

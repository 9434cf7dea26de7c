//! Key derivation for sticker pack master keys.
//!
//! Each bundle's 256-bit master key expands into two independent subkeys:
//! an AES-256 cipher key and an HMAC-SHA256 authentication key. Derivation
//! is deterministic and recomputed per fetch; derived keys are never
//! cached or persisted.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{PackdexError, PackdexResult};

/// HKDF info string fixed by the sticker pack format.
const HKDF_INFO: &[u8] = b"Sticker Pack";

/// HKDF salt fixed by the sticker pack format: 32 zero bytes.
const HKDF_SALT: [u8; 32] = [0u8; 32];

/// Cipher and MAC subkeys derived from one master key.
#[derive(Debug, Clone)]
pub struct DerivedKeys {
    /// AES-256 key for manifest decryption.
    pub cipher_key: [u8; 32],

    /// HMAC-SHA256 key for manifest authentication.
    pub mac_key: [u8; 32],
}

/// Expand a hex-encoded 256-bit master key into cipher and MAC subkeys.
///
/// HKDF-SHA256 over the decoded master key with the zero salt and the
/// `"Sticker Pack"` info string, producing 64 bytes of output material:
/// bytes [0, 32) become the cipher key, bytes [32, 64) the MAC key.
pub fn derive_keys(master_key_hex: &str) -> PackdexResult<DerivedKeys> {
    let master_key =
        hex::decode(master_key_hex).map_err(|e| PackdexError::InvalidKeyMaterial {
            message: format!("master key is not valid hex: {}", e),
        })?;
    if master_key.len() != 32 {
        return Err(PackdexError::InvalidKeyMaterial {
            message: format!("master key must be 32 bytes, got {}", master_key.len()),
        });
    }

    let hkdf = Hkdf::<Sha256>::new(Some(&HKDF_SALT), &master_key);
    let mut okm = [0u8; 64];
    hkdf.expand(HKDF_INFO, &mut okm)
        .map_err(|e| PackdexError::InvalidKeyMaterial {
            message: format!("HKDF expansion failed: {:?}", e),
        })?;

    let mut cipher_key = [0u8; 32];
    let mut mac_key = [0u8; 32];
    cipher_key.copy_from_slice(&okm[0..32]);
    mac_key.copy_from_slice(&okm[32..64]);

    Ok(DerivedKeys {
        cipher_key,
        mac_key,
    })
}

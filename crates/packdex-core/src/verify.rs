//! Manifest authentication.
//!
//! The trailing 32 bytes of a raw manifest are an HMAC-SHA256 tag over
//! everything before them, IV included. Verification runs before any
//! decryption; a manifest that fails here never reaches the cipher.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{PackdexError, PackdexResult};
use crate::types::{MAC_LEN, MIN_MANIFEST_LEN};

type HmacSha256 = Hmac<Sha256>;

/// Verify the MAC over `raw[..len-32]` against the trailing 32 bytes.
///
/// The tag comparison is constant time with respect to the tag bytes.
/// Inputs shorter than 48 bytes fail the shape check before any slicing.
pub fn verify_manifest(raw: &[u8], mac_key: &[u8; 32]) -> PackdexResult<()> {
    if raw.len() < MIN_MANIFEST_LEN {
        return Err(PackdexError::MalformedManifest { len: raw.len() });
    }
    let (signed, their_mac) = raw.split_at(raw.len() - MAC_LEN);

    let mut mac = HmacSha256::new_from_slice(mac_key).map_err(|e| PackdexError::Internal {
        message: format!("HMAC key rejected: {}", e),
    })?;
    mac.update(signed);
    mac.verify_slice(their_mac)
        .map_err(|_| PackdexError::MacVerificationFailed)
}

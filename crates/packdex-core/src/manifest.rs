//! Decoded manifest model and protobuf wire schema.
//!
//! The decrypted manifest plaintext is a protobuf `Pack` message. The wire
//! structs stay private to this module; callers see only [`Manifest`] and
//! [`Sticker`].

use prost::Message;
use serde::Serialize;

use crate::error::{PackdexError, PackdexResult};
use crate::types::ManifestSummary;

/// Wire form of the `Pack` message.
#[derive(Clone, PartialEq, Message)]
pub(crate) struct PackProto {
    #[prost(string, tag = "1")]
    pub title: String,
    #[prost(string, tag = "2")]
    pub author: String,
    #[prost(uint32, tag = "3")]
    pub cover: u32,
    #[prost(message, repeated, tag = "4")]
    pub stickers: Vec<StickerProto>,
}

/// Wire form of a single sticker entry.
#[derive(Clone, PartialEq, Message)]
pub(crate) struct StickerProto {
    #[prost(uint32, tag = "1")]
    pub id: u32,
    #[prost(string, tag = "2")]
    pub emoji: String,
}

/// A fully decoded sticker pack manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub title: String,
    pub author: String,
    /// Sticker id used as the pack's cover image.
    pub cover: u32,
    pub stickers: Vec<Sticker>,
}

/// One sticker inside a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sticker {
    pub id: u32,
    pub emoji: String,
}

impl Manifest {
    fn from_proto(proto: PackProto) -> Self {
        Self {
            title: proto.title,
            author: proto.author,
            cover: proto.cover,
            stickers: proto
                .stickers
                .into_iter()
                .map(|s| Sticker {
                    id: s.id,
                    emoji: s.emoji,
                })
                .collect(),
        }
    }

    /// The title/author/cover triple reported in the aggregated index.
    pub fn summary(&self) -> ManifestSummary {
        ManifestSummary {
            title: self.title.clone(),
            author: self.author.clone(),
            cover: self.cover,
        }
    }
}

/// Decode a decrypted manifest body into a [`Manifest`].
pub fn decode_manifest(plaintext: &[u8]) -> PackdexResult<Manifest> {
    let proto = PackProto::decode(plaintext).map_err(|e| PackdexError::ManifestParse {
        message: e.to_string(),
    })?;
    Ok(Manifest::from_proto(proto))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_proto() -> PackProto {
        PackProto {
            title: "Bandit the Cat".to_string(),
            author: "Signal".to_string(),
            cover: 5,
            stickers: vec![
                StickerProto {
                    id: 0,
                    emoji: "\u{1F600}".to_string(),
                },
                StickerProto {
                    id: 1,
                    emoji: "\u{1F63B}".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_decode_full_pack() {
        let encoded = sample_proto().encode_to_vec();

        let manifest = decode_manifest(&encoded).unwrap();
        assert_eq!(manifest.title, "Bandit the Cat");
        assert_eq!(manifest.author, "Signal");
        assert_eq!(manifest.cover, 5);
        assert_eq!(manifest.stickers.len(), 2);
        assert_eq!(manifest.stickers[1].id, 1);
        assert_eq!(manifest.stickers[1].emoji, "\u{1F63B}");
    }

    #[test]
    fn test_decode_empty_message() {
        // Proto3 scalars all default; an empty buffer is a valid Pack.
        let manifest = decode_manifest(&[]).unwrap();
        assert_eq!(manifest.title, "");
        assert_eq!(manifest.author, "");
        assert_eq!(manifest.cover, 0);
        assert!(manifest.stickers.is_empty());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_manifest(&[0xFF, 0xFF, 0xFF, 0xFF]).unwrap_err();
        assert!(matches!(err, PackdexError::ManifestParse { .. }));
    }

    #[test]
    fn test_truncated_message_fails() {
        let mut encoded = sample_proto().encode_to_vec();
        encoded.truncate(encoded.len() - 3);

        let err = decode_manifest(&encoded).unwrap_err();
        assert!(matches!(err, PackdexError::ManifestParse { .. }));
    }

    #[test]
    fn test_summary_projects_header_fields() {
        let encoded = sample_proto().encode_to_vec();
        let manifest = decode_manifest(&encoded).unwrap();

        let summary = manifest.summary();
        assert_eq!(summary.title, "Bandit the Cat");
        assert_eq!(summary.author, "Signal");
        assert_eq!(summary.cover, 5);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let mut encoded = sample_proto().encode_to_vec();
        // Field 9, varint 7: a future addition the decoder should skip.
        encoded.extend_from_slice(&[0x48, 0x07]);

        let manifest = decode_manifest(&encoded).unwrap();
        assert_eq!(manifest.title, "Bandit the Cat");
    }
}

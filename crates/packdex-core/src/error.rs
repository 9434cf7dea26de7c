//! Error types for the manifest pipeline.

/// Pipeline stage a bundle failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Network retrieval of the raw manifest.
    Fetch,
    /// Master key expansion into cipher and MAC subkeys.
    DeriveKeys,
    /// Shape check and MAC verification.
    Authenticate,
    /// AES-CBC decryption and padding removal.
    Decrypt,
    /// Protobuf decoding of the plaintext.
    Decode,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::DeriveKeys => "derive-keys",
            Self::Authenticate => "authenticate",
            Self::Decrypt => "decrypt",
            Self::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// Classification of a network failure, used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The request or response body read timed out.
    Timeout,
    /// The connection could not be established.
    Connect,
    /// The server answered with a non-success status.
    Status(u16),
    /// Any other transport failure.
    Other,
}

impl FetchErrorKind {
    /// Classify a transport error. Status errors are constructed at the
    /// status check instead, so this only distinguishes timeouts and
    /// connection failures.
    pub(crate) fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::Connect => f.write_str("connect"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Other => f.write_str("transport"),
        }
    }
}

/// Pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PackdexError {
    /// Master key is not valid hex or does not decode to 32 bytes.
    #[error("invalid key material: {message}")]
    InvalidKeyMaterial { message: String },

    /// Raw manifest is too short to contain an IV and a MAC.
    #[error("malformed manifest: {len} bytes, need at least 48")]
    MalformedManifest { len: usize },

    /// Manifest MAC did not verify against the derived mac key.
    #[error("MAC verification failed")]
    MacVerificationFailed,

    /// AES-CBC decryption or padding removal failed.
    #[error("decryption failed: {message}")]
    DecryptionFailed { message: String },

    /// Decrypted bytes are not a well-formed Pack message.
    #[error("manifest parse failed: {message}")]
    ManifestParse { message: String },

    /// Network retrieval failed.
    #[error("fetch failed for {bundle_id}: {kind}: {message}")]
    Fetch {
        bundle_id: String,
        kind: FetchErrorKind,
        message: String,
    },

    /// A bundle's pipeline failed, annotated with the bundle id and stage.
    #[error("bundle {bundle_id} failed at {stage}: {source}")]
    Bundle {
        bundle_id: String,
        stage: Stage,
        #[source]
        source: Box<PackdexError>,
    },

    /// Bundle catalog could not be read or parsed.
    #[error("catalog error: {message}")]
    Catalog { message: String },

    /// Client construction or task plumbing failed.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl PackdexError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Input issues
            Self::InvalidKeyMaterial { .. } => 1,
            Self::Catalog { .. } => 1,

            // Integrity failures (higher priority)
            Self::MalformedManifest { .. } => 3,
            Self::MacVerificationFailed => 4,
            Self::DecryptionFailed { .. } => 4,

            // Network/transient
            Self::Fetch { .. } => 5,

            // Other
            Self::ManifestParse { .. } => 6,
            Self::Internal { .. } => 6,

            // Wrapper defers to its cause
            Self::Bundle { source, .. } => source.exit_code(),
        }
    }

    /// Whether the error is retryable. Only timed-out fetches qualify;
    /// every other failure, including other transport errors, is final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Fetch {
                kind: FetchErrorKind::Timeout,
                ..
            }
        )
    }

    /// Wrap a pipeline error with the bundle it belongs to and the stage
    /// that produced it. Already-wrapped and non-pipeline errors are
    /// returned unchanged.
    pub fn into_bundle(self, bundle_id: impl Into<String>) -> Self {
        let stage = match &self {
            Self::Fetch { .. } => Stage::Fetch,
            Self::InvalidKeyMaterial { .. } => Stage::DeriveKeys,
            Self::MalformedManifest { .. } | Self::MacVerificationFailed => Stage::Authenticate,
            Self::DecryptionFailed { .. } => Stage::Decrypt,
            Self::ManifestParse { .. } => Stage::Decode,
            Self::Bundle { .. } | Self::Catalog { .. } | Self::Internal { .. } => return self,
        };
        Self::Bundle {
            bundle_id: bundle_id.into(),
            stage,
            source: Box::new(self),
        }
    }
}

/// Result type for pipeline operations.
pub type PackdexResult<T> = Result<T, PackdexError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout_error() -> PackdexError {
        PackdexError::Fetch {
            bundle_id: "pack1".to_string(),
            kind: FetchErrorKind::Timeout,
            message: "deadline elapsed".to_string(),
        }
    }

    #[test]
    fn test_only_timeouts_are_retryable() {
        assert!(timeout_error().is_retryable());

        let connect = PackdexError::Fetch {
            bundle_id: "pack1".to_string(),
            kind: FetchErrorKind::Connect,
            message: "refused".to_string(),
        };
        assert!(!connect.is_retryable());

        let status = PackdexError::Fetch {
            bundle_id: "pack1".to_string(),
            kind: FetchErrorKind::Status(429),
            message: "HTTP 429".to_string(),
        };
        assert!(!status.is_retryable());

        assert!(!PackdexError::MacVerificationFailed.is_retryable());
        assert!(!timeout_error().into_bundle("pack1").is_retryable());
    }

    #[test]
    fn test_into_bundle_attributes_stage() {
        let err = PackdexError::MacVerificationFailed.into_bundle("pack1");
        match err {
            PackdexError::Bundle {
                bundle_id,
                stage,
                source,
            } => {
                assert_eq!(bundle_id, "pack1");
                assert_eq!(stage, Stage::Authenticate);
                assert!(matches!(*source, PackdexError::MacVerificationFailed));
            }
            other => panic!("expected Bundle, got {other:?}"),
        }

        let err = PackdexError::ManifestParse {
            message: "truncated".to_string(),
        }
        .into_bundle("pack2");
        assert!(matches!(
            err,
            PackdexError::Bundle {
                stage: Stage::Decode,
                ..
            }
        ));
    }

    #[test]
    fn test_into_bundle_does_not_double_wrap() {
        let wrapped = timeout_error().into_bundle("pack1");
        let again = wrapped.into_bundle("pack1");
        match again {
            PackdexError::Bundle { source, .. } => {
                assert!(matches!(*source, PackdexError::Fetch { .. }));
            }
            other => panic!("expected single Bundle wrapper, got {other:?}"),
        }
    }

    #[test]
    fn test_bundle_exit_code_defers_to_cause() {
        let err = PackdexError::MacVerificationFailed.into_bundle("pack1");
        assert_eq!(err.exit_code(), PackdexError::MacVerificationFailed.exit_code());
    }

    #[test]
    fn test_bundle_display_names_bundle_and_stage() {
        let err = PackdexError::MacVerificationFailed.into_bundle("pack1");
        let message = err.to_string();
        assert!(message.contains("pack1"));
        assert!(message.contains("authenticate"));
    }
}

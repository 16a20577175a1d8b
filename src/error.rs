//! Error taxonomy for URL construction and edge request handling
//!
//! Validation problems are turned into structured 4xx responses at the edge
//! boundary. Configuration and adapter failures surface to the caller building
//! the URL; no partial URL is ever returned.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    // === Edge request validation ===
    #[error("A path is required")]
    MissingPath,

    #[error("Not an allowed file extension")]
    DisallowedExtension,

    #[error("Cannot use fp-x and fp-y with gravity set to a value other than auto")]
    ConflictingFocalPointGravity,

    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Signatures ===
    #[error("URLs must have a valid {param} parameter")]
    MissingSignature { param: String },

    #[error("Invalid URL signature")]
    InvalidSignature,

    // === URL construction ===
    #[error("Asset is not in an AWS S3 filesystem")]
    UnsupportedStorageBackend,

    #[error("Transformer '{transformer}' does not support '{extension}' assets")]
    UnsupportedAssetKind {
        extension: String,
        transformer: String,
    },

    #[error("No image transformer settings found")]
    NoTransformerConfigured,

    #[error("No transformer configured for volume '{volume}' and no '*' entry")]
    VolumeNotConfigured { volume: String },

    #[error("Failed to serialize transform: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TransformError {
    /// Maps errors to HTTP status codes
    ///
    /// Signature failures answer 400 unless `strict_signatures` is set, in
    /// which case they are hard 403 rejections.
    pub fn to_http_status(&self, strict_signatures: bool) -> u16 {
        match self {
            TransformError::MissingPath
            | TransformError::DisallowedExtension
            | TransformError::ConflictingFocalPointGravity
            | TransformError::InvalidParameter { .. } => 400,

            TransformError::MissingSignature { .. } | TransformError::InvalidSignature => {
                if strict_signatures {
                    403
                } else {
                    400
                }
            }

            TransformError::UnsupportedStorageBackend
            | TransformError::UnsupportedAssetKind { .. }
            | TransformError::NoTransformerConfigured
            | TransformError::VolumeNotConfigured { .. }
            | TransformError::Serialization(_) => 500,
        }
    }

    /// Whether the error comes from signature verification
    pub fn is_signature_failure(&self) -> bool {
        matches!(
            self,
            TransformError::MissingSignature { .. } | TransformError::InvalidSignature
        )
    }

    pub fn invalid_param(param: impl Into<String>, message: impl Into<String>) -> Self {
        TransformError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn missing_signature(param: impl Into<String>) -> Self {
        TransformError::MissingSignature {
            param: param.into(),
        }
    }
}

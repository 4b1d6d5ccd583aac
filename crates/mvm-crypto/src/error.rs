use thiserror::Error;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CryptoError {
    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Signature verification failed")]
    VerificationFailed,

    #[error("Credential [{index}]: {source}")]
    Credential {
        index: usize,
        #[source]
        source: Box<CryptoError>,
    },
}

impl From<ed25519_dalek::SignatureError> for CryptoError {
    fn from(_: ed25519_dalek::SignatureError) -> Self {
        CryptoError::VerificationFailed
    }
}

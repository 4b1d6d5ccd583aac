//! MVM Crypto - ed25519 signing for M-chain transactions.
//!
//! Keys sign the blake3 hash of the unsigned transaction; every attached
//! credential must verify against that hash.

pub mod ed25519;
pub mod error;

pub use ed25519::{sign_transaction, verify, verify_credential, verify_credentials, Keypair};
pub use error::CryptoError;

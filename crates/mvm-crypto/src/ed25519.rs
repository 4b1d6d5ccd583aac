use crate::error::CryptoError;
use ed25519_dalek::{Signer, Verifier};
use mvm_types::{Address, Credential, Transaction, UnsignedTx};
use rand::rngs::OsRng;
use std::fmt;
use zeroize::Zeroize;

/// Ed25519 keypair for transaction signing.
pub struct Keypair {
    signing_key: ed25519_dalek::SigningKey,
}

impl Keypair {
    pub fn generate() -> Self {
        let signing_key = ed25519_dalek::SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Move address owned by this key.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Credential over the transaction's signing hash.
    pub fn credential(&self, unsigned: &UnsignedTx) -> Credential {
        let hash = unsigned.signing_hash();
        Credential {
            public_key: self.public_key(),
            signature: self.sign(hash.as_bytes()),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", self.address())
    }
}

impl Drop for Keypair {
    fn drop(&mut self) {
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}

/// Signs `unsigned` with every key, in order.
pub fn sign_transaction(unsigned: UnsignedTx, keys: &[&Keypair]) -> Transaction {
    let credentials = keys.iter().map(|k| k.credential(&unsigned)).collect();
    Transaction::new(unsigned, credentials)
}

pub fn verify(public_key: &[u8; 32], message: &[u8], signature: &[u8; 64]) -> Result<(), CryptoError> {
    let pk = ed25519_dalek::VerifyingKey::from_bytes(public_key)
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    let sig = ed25519_dalek::Signature::from_bytes(signature);
    pk.verify(message, &sig)?;
    Ok(())
}

/// Checks one credential against the transaction's signing hash.
pub fn verify_credential(unsigned: &UnsignedTx, credential: &Credential) -> Result<(), CryptoError> {
    let hash = unsigned.signing_hash();
    verify(&credential.public_key, hash.as_bytes(), &credential.signature)
}

/// Checks every attached credential. Fails on the first bad one.
pub fn verify_credentials(tx: &Transaction) -> Result<(), CryptoError> {
    for (index, credential) in tx.credentials.iter().enumerate() {
        verify_credential(&tx.unsigned, credential).map_err(|e| CryptoError::Credential {
            index,
            source: Box::new(e),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvm_types::{Hash, TxPayload, ValidationContext};

    fn unsigned(sender: Address) -> UnsignedTx {
        let ctx = ValidationContext {
            network_id: 1,
            chain_id: Hash::compute(b"m"),
        };
        UnsignedTx::new(
            &ctx,
            sender,
            TxPayload::DeployModule {
                modules: vec![vec![0xde, 0xad]],
            },
        )
    }

    #[test]
    fn test_keypair_from_seed() {
        let kp1 = Keypair::from_seed(&[42u8; 32]);
        let kp2 = Keypair::from_seed(&[42u8; 32]);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.address(), kp2.address());
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = Keypair::generate();
        let signature = keypair.sign(b"m-chain");
        assert!(verify(&keypair.public_key(), b"m-chain", &signature).is_ok());
        assert_eq!(
            verify(&keypair.public_key(), b"other", &signature),
            Err(CryptoError::VerificationFailed)
        );
    }

    #[test]
    fn test_signed_transaction_verifies() {
        let alice = Keypair::from_seed(&[1u8; 32]);
        let bob = Keypair::from_seed(&[2u8; 32]);
        let tx = sign_transaction(unsigned(alice.address()), &[&alice, &bob]);
        assert_eq!(tx.credentials.len(), 2);
        assert!(verify_credentials(&tx).is_ok());
    }

    #[test]
    fn test_tampered_transaction_fails() {
        let alice = Keypair::from_seed(&[1u8; 32]);
        let mut tx = sign_transaction(unsigned(alice.address()), &[&alice]);
        tx.unsigned.network_id = 2;
        let err = verify_credentials(&tx).unwrap_err();
        assert!(matches!(err, CryptoError::Credential { index: 0, .. }));
    }

    #[test]
    fn test_unsigned_transaction_has_nothing_to_verify() {
        let tx = Transaction::new(unsigned(Address::ZERO), Vec::new());
        assert!(verify_credentials(&tx).is_ok());
    }
}

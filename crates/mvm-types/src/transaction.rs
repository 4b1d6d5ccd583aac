use crate::address::Address;
use crate::error::TypesError;
use crate::hash::Hash;
use crate::serialization::{decode, digest, encode};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction identifier: blake3 over the signed transaction bytes.
pub type TxId = Hash;

/// Argument type tags understood by the execution engine.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VmTypeTag {
    Bool,
    U64,
    Vector,
    Address,
    U8,
    U128,
}

impl fmt::Display for VmTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VmTypeTag::Bool => "Bool",
            VmTypeTag::U64 => "U64",
            VmTypeTag::Vector => "Vector",
            VmTypeTag::Address => "Address",
            VmTypeTag::U8 => "U8",
            VmTypeTag::U128 => "U128",
        };
        f.write_str(s)
    }
}

/// Typed script argument.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ScriptArg {
    Address(Address),
    U8(u8),
    U64(u64),
    U128(u128),
    Bool(bool),
    Vector(#[serde(with = "hex")] Vec<u8>),
}

impl ScriptArg {
    pub fn type_tag(&self) -> VmTypeTag {
        match self {
            ScriptArg::Address(_) => VmTypeTag::Address,
            ScriptArg::U8(_) => VmTypeTag::U8,
            ScriptArg::U64(_) => VmTypeTag::U64,
            ScriptArg::U128(_) => VmTypeTag::U128,
            ScriptArg::Bool(_) => VmTypeTag::Bool,
            ScriptArg::Vector(_) => VmTypeTag::Vector,
        }
    }

    /// Engine wire encoding of the argument value.
    ///
    /// Integers are little-endian at their full width (`u128` is 16 bytes,
    /// zero-padded), booleans are a single `0`/`1` byte, vectors and
    /// addresses are passed through as-is.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ScriptArg::Address(addr) => addr.as_bytes().to_vec(),
            ScriptArg::U8(v) => vec![*v],
            ScriptArg::U64(v) => v.to_le_bytes().to_vec(),
            ScriptArg::U128(v) => v.to_le_bytes().to_vec(),
            ScriptArg::Bool(v) => vec![u8::from(*v)],
            ScriptArg::Vector(bytes) => bytes.clone(),
        }
    }
}

/// Transaction payload. New kinds must be handled everywhere payloads are matched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxPayload {
    /// Publish one or more Move modules.
    DeployModule { modules: Vec<Vec<u8>> },
    /// Run a one-shot Move script.
    ExecuteScript {
        script: Vec<u8>,
        args: Vec<ScriptArg>,
    },
    /// Marker transaction of the genesis block.
    GenesisInit,
}

impl TxPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            TxPayload::DeployModule { .. } => "deploy_module",
            TxPayload::ExecuteScript { .. } => "execute_script",
            TxPayload::GenesisInit => "genesis_init",
        }
    }
}

/// Context a transaction is validated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationContext {
    pub network_id: u32,
    pub chain_id: Hash,
}

/// Unsigned part of a transaction: what credentials sign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct UnsignedTx {
    pub network_id: u32,
    pub chain_id: Hash,
    pub sender: Address,
    pub payload: TxPayload,
}

impl UnsignedTx {
    pub fn new(ctx: &ValidationContext, sender: Address, payload: TxPayload) -> Self {
        Self {
            network_id: ctx.network_id,
            chain_id: ctx.chain_id,
            sender,
            payload,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TypesError> {
        encode(self)
    }

    /// Message signed by every credential.
    pub fn signing_hash(&self) -> Hash {
        digest(self)
    }
}

/// Ed25519 credential over the unsigned transaction.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Credential {
    #[serde(with = "hex")]
    pub public_key: [u8; 32],
    #[serde(with = "hex")]
    pub signature: [u8; 64],
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Credential(pk=0x{}.., sig=0x{}..)",
            hex::encode(&self.public_key[..8]),
            hex::encode(&self.signature[..8])
        )
    }
}

/// Signed transaction. Immutable once signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Transaction {
    pub unsigned: UnsignedTx,
    pub credentials: Vec<Credential>,
}

impl Transaction {
    pub fn new(unsigned: UnsignedTx, credentials: Vec<Credential>) -> Self {
        Self {
            unsigned,
            credentials,
        }
    }

    /// The single, unsigned transaction carried by the genesis block.
    pub fn genesis(ctx: &ValidationContext) -> Self {
        Self::new(
            UnsignedTx::new(ctx, Address::ZERO, TxPayload::GenesisInit),
            Vec::new(),
        )
    }

    pub fn id(&self) -> TxId {
        digest(self)
    }

    pub fn sender(&self) -> Address {
        self.unsigned.sender
    }

    pub fn payload(&self) -> &TxPayload {
        &self.unsigned.payload
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TypesError> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        decode(bytes)
    }

    /// Structural validation. Credentials are checked separately.
    pub fn validate(&self, ctx: &ValidationContext) -> Result<(), TypesError> {
        let utx = &self.unsigned;
        if utx.network_id != ctx.network_id {
            return Err(TypesError::WrongNetwork {
                expected: ctx.network_id,
                actual: utx.network_id,
            });
        }
        if utx.chain_id != ctx.chain_id {
            return Err(TypesError::WrongChain {
                expected: ctx.chain_id.to_string(),
                actual: utx.chain_id.to_string(),
            });
        }

        match &utx.payload {
            TxPayload::DeployModule { modules } => {
                if modules.is_empty() {
                    return Err(TypesError::EmptyModules);
                }
                if let Some(idx) = modules.iter().position(|m| m.is_empty()) {
                    return Err(TypesError::EmptyModule(idx));
                }
            }
            TxPayload::ExecuteScript { script, args } => {
                if script.is_empty() {
                    return Err(TypesError::EmptyScript);
                }
                if let Some(idx) = args.iter().position(|a| a.encode().is_empty()) {
                    return Err(TypesError::EmptyScriptArg(idx));
                }
            }
            TxPayload::GenesisInit => {}
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = match self.payload() {
            TxPayload::DeployModule { modules } => format!("{} module(s)", modules.len()),
            TxPayload::ExecuteScript { script, args } => {
                format!("script {} bytes, {} arg(s)", script.len(), args.len())
            }
            TxPayload::GenesisInit => "genesis".to_string(),
        };
        write!(
            f,
            "{} ({}): sender {}, {}",
            self.id(),
            self.payload().kind(),
            self.sender(),
            summary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ValidationContext {
        ValidationContext {
            network_id: 7,
            chain_id: Hash::compute(b"m-chain"),
        }
    }

    fn script_tx(args: Vec<ScriptArg>) -> Transaction {
        Transaction::new(
            UnsignedTx::new(
                &ctx(),
                Address::from_bytes([1; 20]),
                TxPayload::ExecuteScript {
                    script: vec![0xa1, 0x1c],
                    args,
                },
            ),
            Vec::new(),
        )
    }

    #[test]
    fn test_script_arg_encoding() {
        assert_eq!(ScriptArg::U64(1).encode(), vec![1, 0, 0, 0, 0, 0, 0, 0]);
        let u128 = ScriptArg::U128(0x0102).encode();
        assert_eq!(u128.len(), 16);
        assert_eq!(&u128[..2], &[0x02, 0x01]);
        assert!(u128[2..].iter().all(|&b| b == 0));
        assert_eq!(ScriptArg::Bool(true).encode(), vec![1]);
        assert_eq!(ScriptArg::Bool(false).encode(), vec![0]);
        assert_eq!(ScriptArg::U8(9).encode(), vec![9]);
        assert_eq!(
            ScriptArg::Address(Address::STDLIB).encode(),
            Address::STDLIB.as_bytes().to_vec()
        );
    }

    #[test]
    fn test_script_arg_type_tags() {
        assert_eq!(ScriptArg::Vector(vec![1]).type_tag(), VmTypeTag::Vector);
        assert_eq!(ScriptArg::U128(0).type_tag(), VmTypeTag::U128);
    }

    #[test]
    fn test_validate_ok() {
        let tx = script_tx(vec![ScriptArg::U64(10), ScriptArg::Vector(vec![1, 2])]);
        assert!(tx.validate(&ctx()).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_vector_arg() {
        let tx = script_tx(vec![ScriptArg::U8(1), ScriptArg::Vector(vec![])]);
        assert_eq!(tx.validate(&ctx()), Err(TypesError::EmptyScriptArg(1)));
    }

    #[test]
    fn test_validate_rejects_wrong_network() {
        let tx = script_tx(vec![]);
        let other = ValidationContext {
            network_id: 8,
            ..ctx()
        };
        assert!(matches!(
            tx.validate(&other),
            Err(TypesError::WrongNetwork { expected: 8, actual: 7 })
        ));
    }

    #[test]
    fn test_validate_deploy() {
        let deploy = |modules: Vec<Vec<u8>>| {
            Transaction::new(
                UnsignedTx::new(
                    &ctx(),
                    Address::from_bytes([1; 20]),
                    TxPayload::DeployModule { modules },
                ),
                Vec::new(),
            )
        };
        assert_eq!(deploy(vec![]).validate(&ctx()), Err(TypesError::EmptyModules));
        assert_eq!(
            deploy(vec![vec![1], vec![]]).validate(&ctx()),
            Err(TypesError::EmptyModule(1))
        );
        assert!(deploy(vec![vec![1], vec![2]]).validate(&ctx()).is_ok());
    }

    #[test]
    fn test_empty_script_rejected() {
        let tx = Transaction::new(
            UnsignedTx::new(
                &ctx(),
                Address::ZERO,
                TxPayload::ExecuteScript {
                    script: vec![],
                    args: vec![],
                },
            ),
            Vec::new(),
        );
        assert_eq!(tx.validate(&ctx()), Err(TypesError::EmptyScript));
    }

    #[test]
    fn test_id_changes_with_credentials() {
        let unsigned = script_tx(vec![]).unsigned;
        let bare = Transaction::new(unsigned.clone(), Vec::new());
        let signed = Transaction::new(
            unsigned,
            vec![Credential {
                public_key: [1; 32],
                signature: [2; 64],
            }],
        );
        assert_ne!(bare.id(), signed.id());
        assert_eq!(bare.unsigned.signing_hash(), signed.unsigned.signing_hash());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let tx = script_tx(vec![ScriptArg::Bool(true)]);
        let back = Transaction::from_bytes(&tx.to_bytes().unwrap()).unwrap();
        assert_eq!(back, tx);
        assert_eq!(back.id(), tx.id());
    }

    #[test]
    fn test_genesis_tx_is_valid() {
        let tx = Transaction::genesis(&ctx());
        assert!(tx.validate(&ctx()).is_ok());
        assert!(tx.credentials.is_empty());
    }
}

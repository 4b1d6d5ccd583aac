use crate::error::TypesError;
use borsh::{BorshDeserialize, BorshSerialize};
use std::fmt;
use std::str::FromStr;

/// 20-byte Move account address.
///
/// Displayed as `0x`-prefixed hex. The standard library account
/// (`0x00..01`) is displayed in its short form `0x1`.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, BorshSerialize, BorshDeserialize,
)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);
    pub const LEN: usize = 20;

    /// Move standard library account.
    pub const STDLIB: Self = {
        let mut bytes = [0u8; 20];
        bytes[19] = 1;
        Self(bytes)
    };

    pub const STDLIB_SHORT: &'static str = "0x1";

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, TypesError> {
        let bytes: [u8; 20] = slice
            .try_into()
            .map_err(|_| TypesError::InvalidAddressLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Derive an address from an ed25519 public key: `blake3(pubkey)[0..20]`.
    pub fn from_public_key(pubkey: &[u8; 32]) -> Self {
        let hash = blake3::hash(pubkey);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&hash.as_bytes()[..20]);
        Self(addr)
    }

    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Renders raw engine address bytes: `0x1` for the stdlib account, bare hex otherwise.
pub fn stringify_sender_address(addr: &[u8]) -> String {
    if addr == Address::STDLIB.as_bytes() {
        Address::STDLIB_SHORT.to_string()
    } else {
        hex::encode(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::STDLIB {
            return f.write_str(Self::STDLIB_SHORT);
        }
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::STDLIB_SHORT {
            return Ok(Self::STDLIB);
        }
        let hex_part = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if hex_part.is_empty() {
            return Err(TypesError::InvalidAddressFormat(s.to_string()));
        }
        let bytes = hex::decode(hex_part)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

//! Serde and borsh helpers for mvm-types.
//!
//! Identifiers and addresses serialize as hex strings so JSON documents and
//! RPC payloads stay human readable; the binary encoding is borsh.

use crate::{Address, Hash, TypesError};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

pub(crate) fn encode<T: BorshSerialize>(value: &T) -> Result<Vec<u8>, TypesError> {
    borsh::to_vec(value).map_err(TypesError::from)
}

/// blake3 over the borsh encoding of `value`, streamed into the hasher.
///
/// A collection longer than `u32::MAX` cannot be encoded; such a value
/// hashes to the digest of nothing and `encode` refuses it, so it never
/// reaches storage.
pub(crate) fn digest<T: BorshSerialize>(value: &T) -> Hash {
    let mut hasher = blake3::Hasher::new();
    if BorshSerialize::serialize(value, &mut hasher).is_err() {
        hasher = blake3::Hasher::new();
    }
    Hash::from_bytes(*hasher.finalize().as_bytes())
}

pub(crate) fn decode<T: BorshDeserialize>(bytes: &[u8]) -> Result<T, TypesError> {
    borsh::from_slice(bytes).map_err(TypesError::from)
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Serialize::serialize(&self.to_string(), serializer)
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        Hash::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Serialize::serialize(&format!("0x{}", self.to_hex()), serializer)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_json() {
        let hash = Hash::compute(b"x");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"0x{}\"", hash.to_hex()));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn test_address_json_uses_full_hex() {
        let json = serde_json::to_string(&Address::STDLIB).unwrap();
        assert_eq!(json, format!("\"0x{}01\"", "00".repeat(19)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Address::STDLIB);
    }

    #[test]
    fn test_digest_matches_hash_of_encoding() {
        let value = (Hash::compute(b"y"), vec![1u8, 2, 3], String::from("z"));
        let bytes = encode(&value).unwrap();
        assert_eq!(digest(&value), Hash::compute(&bytes));
    }

    #[test]
    fn test_address_rejects_non_string_json() {
        assert!(serde_json::from_str::<Address>("42").is_err());
        assert!(serde_json::from_str::<Hash>("[1, 2]").is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode::<Hash>(&[1, 2, 3]).is_err());
    }
}

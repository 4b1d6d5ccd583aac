use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the address and path parts of a write-set key.
pub const KEY_DELIMITER: &[u8] = b":";

/// Location of a single value in the write-set store.
#[derive(
    Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct AccessPath {
    #[serde(with = "hex")]
    pub address: Vec<u8>,
    #[serde(with = "hex")]
    pub path: Vec<u8>,
}

impl AccessPath {
    pub fn new(address: impl Into<Vec<u8>>, path: impl Into<Vec<u8>>) -> Self {
        Self {
            address: address.into(),
            path: path.into(),
        }
    }

    /// Storage key: `address ‖ ":" ‖ path`.
    pub fn storage_key(&self) -> Vec<u8> {
        let mut key =
            Vec::with_capacity(self.address.len() + KEY_DELIMITER.len() + self.path.len());
        key.extend_from_slice(&self.address);
        key.extend_from_slice(KEY_DELIMITER);
        key.extend_from_slice(&self.path);
        key
    }
}

/// Storage key for an optional path. A missing path has no key.
pub fn write_set_key(path: Option<&AccessPath>) -> Option<Vec<u8>> {
    path.map(AccessPath::storage_key)
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(&self.address), hex::encode(&self.path))
    }
}

impl fmt::Debug for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessPath({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_storage_key_layout() {
        let path = AccessPath::new(vec![0x01, 0x02], vec![0xff]);
        assert_eq!(path.storage_key(), vec![0x01, 0x02, b':', 0xff]);
        assert_eq!(path.to_string(), "0102:ff");
    }

    #[test]
    fn test_missing_path_has_no_key() {
        assert_eq!(write_set_key(None), None);
        assert_eq!(write_set_key(None), write_set_key(None));
    }

    #[test]
    fn test_json_uses_hex() {
        let path = AccessPath::new(vec![0xab], vec![0xcd, 0xef]);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#"{"address":"ab","path":"cdef"}"#);
        let back: AccessPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }

    proptest! {
        #[test]
        fn prop_storage_key_is_deterministic(
            address in proptest::collection::vec(any::<u8>(), 0..32),
            path in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let a = AccessPath::new(address.clone(), path.clone());
            let b = AccessPath::new(address, path);
            prop_assert_eq!(a.storage_key(), b.storage_key());
            prop_assert_eq!(write_set_key(Some(&a)), Some(b.storage_key()));
        }
    }
}

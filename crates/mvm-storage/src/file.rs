//! Durable backend: a single JSON file of hex-encoded keys and values.

use crate::error::StorageError;
use crate::kv::{BatchOp, KeyValueStore};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const DATA_FILE: &str = "data.json";

/// JSON file-backed store. Every write rewrites the file through a
/// temporary file and rename, so the on-disk image is always complete.
pub struct FileDb {
    path: PathBuf,
    data: RwLock<BTreeMap<String, String>>,
}

impl FileDb {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(path)?;

        let data_file = path.join(DATA_FILE);
        let data = if data_file.exists() {
            let content = fs::read_to_string(&data_file)?;
            serde_json::from_str(&content)
                .map_err(|e| StorageError::Deserialization(e.to_string()))?
        } else {
            BTreeMap::new()
        };

        tracing::debug!("Opened file store at {} ({} keys)", path.display(), data.len());

        Ok(Self {
            path: path.to_path_buf(),
            data: RwLock::new(data),
        })
    }

    fn persist(&self, data: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let tmp_file = self.path.join(format!("{}.tmp", DATA_FILE));
        fs::write(&tmp_file, content)?;
        fs::rename(&tmp_file, self.path.join(DATA_FILE))?;
        Ok(())
    }

    fn mutate<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut data = self.data.write();
        let mut next = data.clone();
        f(&mut next);
        self.persist(&next)?;
        *data = next;
        Ok(())
    }
}

impl KeyValueStore for FileDb {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let data = self.data.read();
        match data.get(&hex::encode(key)) {
            Some(value) => Ok(Some(
                hex::decode(value).map_err(|e| StorageError::Deserialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let (key, value) = (hex::encode(key), hex::encode(value));
        self.mutate(|data| {
            data.insert(key, value);
        })
    }

    fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        let key = hex::encode(key);
        self.mutate(|data| {
            data.remove(&key);
        })
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError> {
        self.mutate(|data| {
            for op in ops {
                match op {
                    BatchOp::Put { key, value } => {
                        data.insert(hex::encode(key), hex::encode(value));
                    }
                    BatchOp::Delete { key } => {
                        data.remove(&hex::encode(key));
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_db_put_get_delete() {
        let temp_dir = TempDir::new().unwrap();
        let db = FileDb::open(temp_dir.path()).unwrap();

        db.put(b"key", b"value").unwrap();
        assert_eq!(db.get(b"key").unwrap(), Some(b"value".to_vec()));

        db.delete(b"key").unwrap();
        assert_eq!(db.get(b"key").unwrap(), None);
    }

    #[test]
    fn test_file_db_persistence() {
        let temp_dir = TempDir::new().unwrap();
        {
            let db = FileDb::open(temp_dir.path()).unwrap();
            db.write_batch(vec![
                BatchOp::Put {
                    key: b"a".to_vec(),
                    value: b"1".to_vec(),
                },
                BatchOp::Put {
                    key: b"b".to_vec(),
                    value: b"2".to_vec(),
                },
            ])
            .unwrap();
        }

        let db = FileDb::open(temp_dir.path()).unwrap();
        assert_eq!(db.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(db.get(b"b").unwrap(), Some(b"2".to_vec()));
        assert!(!temp_dir.path().join("data.json.tmp").exists());
    }

    #[test]
    fn test_file_db_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(DATA_FILE), "not json").unwrap();
        assert!(matches!(
            FileDb::open(temp_dir.path()),
            Err(StorageError::Deserialization(_))
        ));
    }
}

//! MVM Storage - versioned key-value storage for the M-chain.
//!
//! All chain state lives in one shared [`VersionDb`] overlay on top of a
//! durable [`KeyValueStore`]. Components get isolated namespaces via
//! [`PrefixDb`], named by a [`StoreLayout`].

pub mod block_store;
pub mod error;
pub mod file;
pub mod kv;
pub mod layout;
pub mod memory;
pub mod prefix;
pub mod singleton;
pub mod versioned;
pub mod write_set;

pub use block_store::BlockStore;
pub use error::StorageError;
pub use file::FileDb;
pub use kv::{BatchOp, KeyValueStore};
pub use layout::StoreLayout;
pub use memory::MemoryDb;
pub use prefix::PrefixDb;
pub use singleton::SingletonStore;
pub use versioned::VersionDb;
pub use write_set::StateStore;

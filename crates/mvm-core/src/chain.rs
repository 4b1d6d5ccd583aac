//! In-memory view of known blocks: ancestry, status and preference.

use crate::error::CoreError;
use mvm_types::{Block, BlockHeader, BlockId, BlockStatus, Hash};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Entry {
    header: BlockHeader,
    status: BlockStatus,
}

/// Block tree rooted at the last accepted block.
pub struct Chain {
    /// Last accepted block
    last_accepted: BlockId,
    /// Block new blocks get built on
    preferred: BlockId,
    /// Known blocks by id
    blocks: HashMap<BlockId, Entry>,
    /// Children by parent id
    children: HashMap<BlockId, Vec<BlockId>>,
}

impl Chain {
    /// Creates a chain whose root is an already accepted block.
    pub fn new(root: &Block) -> Self {
        let id = root.id();
        let mut chain = Self {
            last_accepted: id,
            preferred: id,
            blocks: HashMap::new(),
            children: HashMap::new(),
        };
        chain.insert(id, root.header.clone(), BlockStatus::Accepted);
        chain
    }

    pub fn last_accepted(&self) -> BlockId {
        self.last_accepted
    }

    pub fn preferred(&self) -> BlockId {
        self.preferred
    }

    pub fn status(&self, id: &BlockId) -> Option<BlockStatus> {
        self.blocks.get(id).map(|e| e.status)
    }

    pub fn height(&self, id: &BlockId) -> Option<u64> {
        self.blocks.get(id).map(|e| e.header.height)
    }

    pub fn get_children(&self, id: &BlockId) -> &[BlockId] {
        self.children.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Ancestry and height checks for a block about to be verified.
    pub fn check_block(&self, block: &Block) -> Result<(), CoreError> {
        let id = block.id();
        if let Some(status) = self.status(&id) {
            if status.is_decided() {
                return Err(CoreError::BlockDecided(id));
            }
        }

        let parent = block.parent();
        let parent_entry = self
            .blocks
            .get(&parent)
            .ok_or(CoreError::ParentBlockNotFound(parent))?;
        if parent_entry.status == BlockStatus::Rejected {
            return Err(CoreError::InvalidBlock(format!(
                "parent {} was rejected",
                parent
            )));
        }

        let expected = parent_entry.header.height + 1;
        if block.height() != expected {
            return Err(CoreError::InvalidHeight {
                expected,
                actual: block.height(),
            });
        }
        Ok(())
    }

    /// Records a verified block as processing.
    pub fn add_verified(&mut self, block: &Block) {
        self.insert(block.id(), block.header.clone(), BlockStatus::Processing);
    }

    pub fn set_preference(&mut self, id: BlockId) -> Result<(), CoreError> {
        if !self.blocks.contains_key(&id) {
            return Err(CoreError::BlockNotFound(id));
        }
        self.preferred = id;
        Ok(())
    }

    pub fn accept(&mut self, id: BlockId) -> Result<(), CoreError> {
        let entry = self.blocks.get_mut(&id).ok_or(CoreError::BlockNotFound(id))?;
        entry.status = BlockStatus::Accepted;
        self.last_accepted = id;
        if !self.is_ancestor(&id, &self.preferred) {
            self.preferred = id;
        }
        Ok(())
    }

    /// Marks a block rejected. Unknown blocks are ignored; they were never
    /// added as verified.
    pub fn reject(&mut self, id: BlockId) {
        if let Some(entry) = self.blocks.get_mut(&id) {
            entry.status = BlockStatus::Rejected;
        }
        if self.preferred == id {
            self.preferred = self.last_accepted;
        }
    }

    /// Whether `ancestor` is `descendant` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: &BlockId, descendant: &BlockId) -> bool {
        let mut current = *descendant;

        while current != *ancestor {
            match self.blocks.get(&current) {
                Some(entry) if entry.header.parent != Hash::ZERO => {
                    current = entry.header.parent;
                }
                _ => return false,
            }
        }

        true
    }

    fn insert(&mut self, id: BlockId, header: BlockHeader, status: BlockStatus) {
        let parent = header.parent;
        if self.blocks.insert(id, Entry { header, status }).is_none() {
            self.children.entry(parent).or_default().push(id);
        }
    }
}

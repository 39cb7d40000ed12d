// src/miner/memory.rs
//! Per-worker Argon2 working memory
//!
//! Every worker owns one [`WorkingMemoryPool`]. The scratch blocks are
//! allocated on the first hash and reused by every following hash on that
//! worker; they go back to the allocator only at worker teardown. The
//! allocator is injected so the hash primitive never allocates itself.

use argon2::Block;
use std::sync::Arc;

/// Scratch blocks handed to the keyed hash
#[derive(Debug)]
pub struct WorkingMemory {
    blocks: Vec<Block>,
}

impl WorkingMemory {
    /// Wraps already allocated blocks
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        WorkingMemory { blocks }
    }

    /// Number of 1 KiB blocks
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Size in bytes
    pub fn size_bytes(&self) -> usize {
        self.blocks.len() * Block::SIZE
    }

    /// Gives the blocks back to the allocator that made them
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
}

impl AsMut<[Block]> for WorkingMemory {
    fn as_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }
}

/// Allocate/release capability pair for working memory
pub trait MemoryAllocator: Send + Sync {
    /// Allocates `block_count` zeroed blocks
    fn allocate(&self, block_count: usize) -> WorkingMemory;

    /// Takes back memory previously returned by [`allocate`](Self::allocate)
    fn release(&self, memory: WorkingMemory);
}

/// Plain heap allocator
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl MemoryAllocator for HeapAllocator {
    fn allocate(&self, block_count: usize) -> WorkingMemory {
        WorkingMemory::from_blocks(vec![Block::default(); block_count])
    }

    fn release(&self, memory: WorkingMemory) {
        drop(memory);
    }
}

/// Lazily allocated scratch memory owned by one worker
pub struct WorkingMemoryPool {
    allocator: Arc<dyn MemoryAllocator>,
    block_count: usize,
    memory: Option<WorkingMemory>,
}

impl WorkingMemoryPool {
    /// Creates an empty pool that will hold `block_count` blocks once used
    pub fn new(allocator: Arc<dyn MemoryAllocator>, block_count: usize) -> Self {
        WorkingMemoryPool {
            allocator,
            block_count,
            memory: None,
        }
    }

    /// Returns the worker's scratch memory, allocating it on first use
    pub fn acquire(&mut self) -> &mut WorkingMemory {
        let allocator = &self.allocator;
        let block_count = self.block_count;
        self.memory.get_or_insert_with(|| {
            log::debug!(
                "allocating {} KiB of hashing memory",
                block_count * Block::SIZE / 1024
            );
            allocator.allocate(block_count)
        })
    }

    /// True once the first hash has run
    pub fn is_allocated(&self) -> bool {
        self.memory.is_some()
    }

    /// Returns the memory to the allocator; a later acquire allocates again
    pub fn release(&mut self) {
        if let Some(memory) = self.memory.take() {
            self.allocator.release(memory);
        }
    }
}

impl Drop for WorkingMemoryPool {
    fn drop(&mut self) {
        self.release();
    }
}

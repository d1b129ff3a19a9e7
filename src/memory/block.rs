//! Block store: logical and concrete memory blocks
//!
//! This module provides the dual block representation:
//! - [`LogicalBlock`]: a sized sparse byte buffer addressed by
//!   `(block, offset)` pairs; the form every allocation starts in
//! - [`ConcreteBlock`]: a contiguous integer address range shadowing a
//!   logical block, created lazily the first time an address is cast to an
//!   integer
//! - [`Memory`]: the two id-keyed maps plus fresh-key computation
//!
//! Byte maps are sparse: indices that were never written read back as
//! [`SByte::Undef`]. A block's declared `size` is advisory — out-of-range
//! reads yield undef bytes rather than failing, and out-of-range writes
//! extend the sparse map without growing `size`.
//!
//! Both maps are ordered. Key order is load-bearing: fresh logical ids come
//! from the maximum existing key, and fresh concrete bases are placed past
//! the end of the highest existing region, which is what keeps concrete
//! regions disjoint.

use std::collections::BTreeMap;

use crate::memory::bytes::SByte;
use crate::memory::value::BlockId;

/// A logical memory block: a named, sized, sparse byte buffer
#[derive(Debug, Clone)]
pub struct LogicalBlock {
    /// Byte size chosen at allocation
    pub size: i64,
    /// Sparse contents; missing indices are undef
    bytes: BTreeMap<i64, SByte>,
    /// Base address of the concrete region shadowing this block, if any
    pub concrete_id: Option<i64>,
}

impl LogicalBlock {
    /// Create a block of the given size with every byte undef
    pub fn new(size: i64) -> Self {
        let mut bytes = BTreeMap::new();
        for i in 0..size.max(0) {
            bytes.insert(i, SByte::Undef);
        }
        LogicalBlock {
            size,
            bytes,
            concrete_id: None,
        }
    }

    /// Read `len` bytes starting at `offset`; missing indices read as undef
    pub fn read_range(&self, offset: i64, len: i64) -> Vec<SByte> {
        (0..len.max(0))
            .map(|i| {
                self.bytes
                    .get(&(offset + i))
                    .copied()
                    .unwrap_or(SByte::Undef)
            })
            .collect()
    }

    /// Write bytes starting at `offset`, shadowing prior contents
    ///
    /// Writes past `size` extend the sparse map; the declared size is not
    /// updated.
    pub fn write_range(&mut self, offset: i64, data: &[SByte]) {
        for (i, sbyte) in data.iter().enumerate() {
            self.bytes.insert(offset + i as i64, *sbyte);
        }
    }
}

/// A concrete block: the integer address range `[base, base + size)` bound
/// to a logical block
#[derive(Debug, Clone, Copy)]
pub struct ConcreteBlock {
    pub size: i64,
    pub logical_id: BlockId,
}

/// The block store
#[derive(Debug, Clone, Default)]
pub struct Memory {
    /// Logical blocks keyed by block id
    logical: BTreeMap<BlockId, LogicalBlock>,
    /// Concrete blocks keyed by base address
    concrete: BTreeMap<i64, ConcreteBlock>,
}

impl Memory {
    pub fn new() -> Self {
        Memory::default()
    }

    /// Look up a logical block
    pub fn logical(&self, id: BlockId) -> Option<&LogicalBlock> {
        self.logical.get(&id)
    }

    /// Look up a logical block for mutation
    pub fn logical_mut(&mut self, id: BlockId) -> Option<&mut LogicalBlock> {
        self.logical.get_mut(&id)
    }

    /// Look up a concrete block by base address
    pub fn concrete(&self, base: i64) -> Option<&ConcreteBlock> {
        self.concrete.get(&base)
    }

    /// Insert a logical block, overwriting any existing binding
    pub fn insert_logical(&mut self, id: BlockId, block: LogicalBlock) {
        self.logical.insert(id, block);
    }

    /// Insert a concrete block, overwriting any existing binding
    pub fn insert_concrete(&mut self, base: i64, block: ConcreteBlock) {
        self.concrete.insert(base, block);
    }

    /// Remove a logical block and the concrete region shadowing it, if any
    pub fn remove_block(&mut self, id: BlockId) {
        if let Some(block) = self.logical.remove(&id) {
            if let Some(base) = block.concrete_id {
                self.concrete.remove(&base);
            }
        }
    }

    /// The next unused logical block id
    ///
    /// Deterministic and monotonically increasing within a memory.
    pub fn next_logical_key(&self) -> BlockId {
        match self.logical.last_key_value() {
            Some((max, _)) => max + 1,
            None => 0,
        }
    }

    /// The next concrete base address, placed past the end of the highest
    /// existing region so regions never overlap
    pub fn next_concrete_key(&self) -> i64 {
        match self.concrete.last_key_value() {
            Some((base, block)) => base + block.size + 1,
            None => 1,
        }
    }

    /// Bind a logical block to a concrete address region, creating the
    /// region on first use. Returns the region's base address.
    ///
    /// A missing logical block is a no-op that returns the id unchanged.
    pub fn concretize_block(&mut self, id: BlockId) -> i64 {
        let size = match self.logical.get(&id) {
            None => return id,
            Some(block) => match block.concrete_id {
                Some(base) => return base,
                None => block.size,
            },
        };
        let base = self.next_concrete_key();
        self.concrete.insert(
            base,
            ConcreteBlock {
                size,
                logical_id: id,
            },
        );
        if let Some(block) = self.logical.get_mut(&id) {
            block.concrete_id = Some(base);
        }
        base
    }

    /// Resolve an integer address back to `(logical id, offset)`
    ///
    /// Returns None if the address lies in no concrete region.
    pub fn resolve_concrete(&self, address: i64) -> Option<(BlockId, i64)> {
        let (base, block) = self.concrete.range(..=address).next_back()?;
        if address < base + block.size {
            Some((block.logical_id, address - base))
        } else {
            None
        }
    }

    /// Number of live logical blocks
    pub fn logical_count(&self) -> usize {
        self.logical.len()
    }

    /// Iterate over concrete regions in base-address order
    pub fn concrete_regions(&self) -> impl Iterator<Item = (&i64, &ConcreteBlock)> {
        self.concrete.iter()
    }
}

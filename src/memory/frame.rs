//! Frame stack and combined memory state
//!
//! Every logical block is owned by exactly one frame. Pushing a frame on
//! function entry gives the activation an empty ownership list; popping it
//! frees every block the frame recorded, together with any concrete region
//! shadowing one of them. Addresses into a popped frame stay structurally
//! valid but dereferencing them fails.

use crate::interpreter::errors::MemoryError;
use crate::memory::block::{LogicalBlock, Memory};
use crate::memory::sizeof_dtyp;
use crate::memory::value::{BlockId, DTyp};

/// The stack of per-activation block ownership lists
#[derive(Debug, Clone)]
pub struct FrameStack {
    frames: Vec<Vec<BlockId>>,
}

impl FrameStack {
    /// A stack holding a single empty frame
    pub fn new() -> Self {
        FrameStack {
            frames: vec![Vec::new()],
        }
    }

    /// Push an empty frame for a new activation
    pub fn push_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Pop the top frame, yielding the block ids it owned
    pub fn pop_frame(&mut self) -> Result<Vec<BlockId>, MemoryError> {
        self.frames.pop().ok_or(MemoryError::EmptyFrameStack)
    }

    /// Record a block id as owned by the top frame
    pub fn record(&mut self, id: BlockId) -> Result<(), MemoryError> {
        self.frames
            .last_mut()
            .ok_or(MemoryError::EmptyFrameStack)?
            .push(id);
        Ok(())
    }

    /// All frames, bottom first (for inspection)
    pub fn frames(&self) -> &[Vec<BlockId>] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Default for FrameStack {
    fn default() -> Self {
        Self::new()
    }
}

/// The complete mutable memory state: block store plus frame stack
#[derive(Debug, Clone, Default)]
pub struct MemState {
    pub memory: Memory,
    pub frames: FrameStack,
}

impl MemState {
    /// Empty memory with a single empty frame
    pub fn new() -> Self {
        MemState::default()
    }

    /// Allocate a fresh logical block sized for `t`, owned by the top frame
    ///
    /// Every byte of the new block is undef. Returns the new block id.
    pub fn allocate(&mut self, t: &DTyp) -> Result<BlockId, MemoryError> {
        let size = sizeof_dtyp(t);
        let id = self.memory.next_logical_key();
        self.frames.record(id)?;
        self.memory.insert_logical(id, LogicalBlock::new(size));
        Ok(id)
    }

    /// Pop the top frame and free every block it owned
    pub fn free_top_frame(&mut self) -> Result<(), MemoryError> {
        let owned = self.frames.pop_frame()?;
        for id in owned {
            self.memory.remove_block(id);
        }
        Ok(())
    }
}

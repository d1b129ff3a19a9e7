//! Error types for the memory handler
//!
//! This module defines [`MemoryError`], which represents everything that can
//! go wrong while handling a memory event, and [`MemoryFault`], which routes
//! a failed event onto one of two disjoint channels:
//!
//! - **Fatal**: type errors, empty-frame-stack operations, GEP misuse,
//!   unknown intrinsics, writes to unallocated blocks. The embedding
//!   interpreter typically aborts execution.
//! - **Undefined behavior**: loads from unallocated blocks and
//!   integer-to-pointer casts of addresses outside every concrete region.
//!   A non-strict interpreter may continue with a poison value; a strict one
//!   treats UB as fatal. The memory state observed after a UB fault is the
//!   pre-event state.

use std::fmt;

use crate::memory::value::{BlockId, DTyp};

/// Errors raised by memory operations
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryError {
    /// A frame operation found no frame to act on
    EmptyFrameStack,

    /// Load from a block id with no live logical block
    ReadUnallocated { block: BlockId },

    /// Store to a block id with no live logical block
    WriteUnallocated { block: BlockId },

    /// GEP descended into a type that has no elements
    NonIndexableType { typ: DTyp },

    /// GEP struct index past the last field
    GepIndexOutOfRange { index: u64, field_count: usize },

    /// GEP index of a non-integer or unsupported integer width
    NonIntegerIndex { got: String },

    /// Integer-to-pointer cast of an address in no concrete region
    InvalidConcreteAddress { address: u64 },

    /// An operand or result type did not have the expected shape
    TypeError { expected: String, got: String },

    /// Intrinsic call to a name absent from the registry
    UnknownIntrinsic { name: String },

    /// Intrinsic call with the wrong number of arguments
    ArgumentCountMismatch {
        intrinsic: String,
        expected: usize,
        got: usize,
    },

    /// An intrinsic implementation rejected its arguments
    IntrinsicFailed { name: String, message: String },

    /// memcpy referenced a block id with no live logical block
    MissingBlock { block: BlockId },
}

/// Routing of a failed memory event onto one of the two error channels
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryFault {
    /// Caller-visible failure, fatal to the current event
    Fatal(MemoryError),
    /// Undefined behavior; a non-strict interpreter may continue
    Ub(MemoryError),
}

impl MemoryFault {
    pub fn is_undefined_behavior(&self) -> bool {
        matches!(self, MemoryFault::Ub(_))
    }

    /// The underlying error, regardless of channel
    pub fn error(&self) -> &MemoryError {
        match self {
            MemoryFault::Fatal(e) | MemoryFault::Ub(e) => e,
        }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::EmptyFrameStack => {
                write!(f, "No frame available on the frame stack")
            }
            MemoryError::ReadUnallocated { block } => {
                write!(f, "Read from unallocated block {}", block)
            }
            MemoryError::WriteUnallocated { block } => {
                write!(f, "Write to unallocated block {}", block)
            }
            MemoryError::NonIndexableType { typ } => {
                write!(f, "GEP into non-indexable type {:?}", typ)
            }
            MemoryError::GepIndexOutOfRange { index, field_count } => {
                write!(
                    f,
                    "GEP struct index {} out of range for {} field{}",
                    index,
                    field_count,
                    if *field_count == 1 { "" } else { "s" }
                )
            }
            MemoryError::NonIntegerIndex { got } => {
                write!(f, "GEP index must be an integer, got {}", got)
            }
            MemoryError::InvalidConcreteAddress { address } => {
                write!(
                    f,
                    "Address 0x{:x} does not lie in any concrete region",
                    address
                )
            }
            MemoryError::TypeError { expected, got } => {
                write!(f, "Type error: expected {}, got {}", expected, got)
            }
            MemoryError::UnknownIntrinsic { name } => {
                write!(f, "Unknown intrinsic: '{}'", name)
            }
            MemoryError::ArgumentCountMismatch {
                intrinsic,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Intrinsic '{}' expects {} argument{}, got {}",
                    intrinsic,
                    expected,
                    if *expected == 1 { "" } else { "s" },
                    got
                )
            }
            MemoryError::IntrinsicFailed { name, message } => {
                write!(f, "Intrinsic '{}' failed: {}", name, message)
            }
            MemoryError::MissingBlock { block } => {
                write!(f, "memcpy references missing block {}", block)
            }
        }
    }
}

impl fmt::Display for MemoryFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryFault::Fatal(e) => write!(f, "Memory error: {}", e),
            MemoryFault::Ub(e) => write!(f, "Undefined behavior: {}", e),
        }
    }
}

impl std::error::Error for MemoryError {}
impl std::error::Error for MemoryFault {}

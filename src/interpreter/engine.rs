// Event dispatch for the memory model

use log::{debug, trace};

use crate::interpreter::errors::{MemoryError, MemoryFault};
use crate::interpreter::intrinsics::{IntrinsicTable, MEMCPY_32};
use crate::memory::bytes::{deserialize_value, serialize_value};
use crate::memory::frame::MemState;
use crate::memory::gep::gep_address;
use crate::memory::sizeof_dtyp;
use crate::memory::value::{Addr, DTyp, DValue, UValue};

/// A memory event raised by the interpreter collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryEvent {
    /// Push an empty frame on function entry
    MemPush,
    /// Pop the top frame and free its allocations
    MemPop,
    /// Allocate a block sized for the type; yields its address
    Alloca(DTyp),
    /// Read a typed value through a pointer
    Load(DTyp, DValue),
    /// Write a value through a pointer
    Store(DValue, DValue),
    /// Address arithmetic: base type, base pointer, index list
    Gep(DTyp, DValue, Vec<DValue>),
    /// Integer-to-pointer cast
    ItoP(DValue),
    /// Pointer-to-integer cast at the given integer type
    PtoI(DTyp, DValue),
    /// Call a declared intrinsic: return type, symbol name, arguments
    Intrinsic(DTyp, String, Vec<DValue>),
}

/// The memory handler: owns the memory state and consumes memory events
///
/// Each event is processed to completion before the next begins; the state
/// is single-threaded and never shared. Callers wanting a snapshot clone the
/// handler before mutating.
pub struct MemoryHandler {
    state: MemState,
    intrinsics: IntrinsicTable,
}

impl MemoryHandler {
    /// A handler over empty memory with the built-in intrinsics
    pub fn new() -> Self {
        MemoryHandler {
            state: MemState::new(),
            intrinsics: IntrinsicTable::with_builtins(),
        }
    }

    /// A handler with a client-provided intrinsic table
    pub fn with_intrinsics(intrinsics: IntrinsicTable) -> Self {
        MemoryHandler {
            state: MemState::new(),
            intrinsics,
        }
    }

    /// The current memory state (for inspection and invariant checks)
    pub fn state(&self) -> &MemState {
        &self.state
    }

    /// The intrinsic registry in use
    pub fn intrinsics(&self) -> &IntrinsicTable {
        &self.intrinsics
    }

    /// Handle one memory event
    ///
    /// On `Err` the state is unchanged for undefined-behavior faults; fatal
    /// faults abort the event with no observable partial write.
    pub fn handle_event(&mut self, event: MemoryEvent) -> Result<UValue, MemoryFault> {
        trace!("memory event: {:?}", event);
        match event {
            MemoryEvent::MemPush => {
                self.state.frames.push_frame();
                Ok(UValue::Unit)
            }
            MemoryEvent::MemPop => self
                .state
                .free_top_frame()
                .map(|()| UValue::Unit)
                .map_err(MemoryFault::Fatal),
            MemoryEvent::Alloca(t) => self.alloca(&t).map_err(MemoryFault::Fatal),
            MemoryEvent::Load(t, ptr) => {
                let addr = expect_addr(&ptr).map_err(MemoryFault::Fatal)?;
                self.read(addr, &t).map_err(|e| match e {
                    MemoryError::ReadUnallocated { .. } => MemoryFault::Ub(e),
                    other => MemoryFault::Fatal(other),
                })
            }
            MemoryEvent::Store(ptr, value) => {
                let addr = expect_addr(&ptr).map_err(MemoryFault::Fatal)?;
                self.write(addr, &value)
                    .map(|()| UValue::Unit)
                    .map_err(MemoryFault::Fatal)
            }
            MemoryEvent::Gep(t, base, indices) => {
                let addr = expect_addr(&base).map_err(MemoryFault::Fatal)?;
                gep_address(&t, addr, &indices)
                    .map(UValue::Addr)
                    .map_err(MemoryFault::Fatal)
            }
            MemoryEvent::ItoP(value) => self.int_to_ptr(&value).map_err(|e| match e {
                MemoryError::InvalidConcreteAddress { .. } => MemoryFault::Ub(e),
                other => MemoryFault::Fatal(other),
            }),
            MemoryEvent::PtoI(t, value) => {
                self.ptr_to_int(&t, &value).map_err(MemoryFault::Fatal)
            }
            MemoryEvent::Intrinsic(_ret, name, args) => self
                .call_intrinsic(&name, &args)
                .map_err(MemoryFault::Fatal),
        }
    }

    /// Read a value of type `t` through `addr`
    pub fn read(&self, addr: Addr, t: &DTyp) -> Result<UValue, MemoryError> {
        let block = self
            .state
            .memory
            .logical(addr.block)
            .ok_or(MemoryError::ReadUnallocated { block: addr.block })?;
        let bytes = block.read_range(addr.offset, sizeof_dtyp(t));
        Ok(deserialize_value(&bytes, t))
    }

    /// Write `value` through `addr`
    pub fn write(&mut self, addr: Addr, value: &DValue) -> Result<(), MemoryError> {
        let block = self
            .state
            .memory
            .logical_mut(addr.block)
            .ok_or(MemoryError::WriteUnallocated { block: addr.block })?;
        block.write_range(addr.offset, &serialize_value(value));
        Ok(())
    }

    /// Read `len` consecutive elements of type `t` starting at element
    /// index `from` relative to `addr`
    pub fn get_array(
        &self,
        addr: Addr,
        from: u64,
        len: u64,
        t: &DTyp,
    ) -> Result<Vec<UValue>, MemoryError> {
        let block = self
            .state
            .memory
            .logical(addr.block)
            .ok_or(MemoryError::ReadUnallocated { block: addr.block })?;
        let elem_size = sizeof_dtyp(t);
        let mut out = Vec::with_capacity(len as usize);
        for i in from..from + len {
            let offset = addr.offset.wrapping_add(elem_size.wrapping_mul(i as i64));
            let bytes = block.read_range(offset, elem_size);
            out.push(deserialize_value(&bytes, t));
        }
        Ok(out)
    }

    fn alloca(&mut self, t: &DTyp) -> Result<UValue, MemoryError> {
        let id = self.state.allocate(t)?;
        debug!("alloca: block {} ({} bytes)", id, sizeof_dtyp(t));
        Ok(UValue::Addr(Addr::new(id, 0)))
    }

    /// Cast an address to an integer of type `t`, concretizing the block on
    /// first use
    fn ptr_to_int(&mut self, t: &DTyp, value: &DValue) -> Result<UValue, MemoryError> {
        let width = match t {
            DTyp::I(w) => *w,
            other => {
                return Err(MemoryError::TypeError {
                    expected: "integer type".to_string(),
                    got: format!("{:?}", other),
                })
            }
        };
        // The width is validated before concretization: a rejected cast
        // leaves the memory untouched.
        if DValue::int_of_width(width, 0).is_none() {
            return Err(MemoryError::TypeError {
                expected: "integer type of width 1, 8, 32, or 64".to_string(),
                got: format!("{:?}", t),
            });
        }
        let addr = value.as_addr().ok_or_else(|| MemoryError::TypeError {
            expected: "address".to_string(),
            got: value.kind().to_string(),
        })?;
        let base = self.state.memory.concretize_block(addr.block);
        let bits = base.wrapping_add(addr.offset) as u64;
        let int = DValue::int_of_width(width, bits).ok_or_else(|| MemoryError::TypeError {
            expected: "integer type of width 1, 8, 32, or 64".to_string(),
            got: format!("{:?}", t),
        })?;
        debug!(
            "ptoi: block {} offset {} -> 0x{:x}",
            addr.block, addr.offset, bits
        );
        Ok(UValue::from(int))
    }

    /// Cast an integer back to the symbolic address it concretizes
    fn int_to_ptr(&self, value: &DValue) -> Result<UValue, MemoryError> {
        let bits = value.as_unsigned().ok_or_else(|| MemoryError::TypeError {
            expected: "integer".to_string(),
            got: value.kind().to_string(),
        })?;
        match self.state.memory.resolve_concrete(bits as i64) {
            Some((block, offset)) => Ok(UValue::Addr(Addr::new(block, offset))),
            None => Err(MemoryError::InvalidConcreteAddress { address: bits }),
        }
    }

    fn call_intrinsic(&mut self, name: &str, args: &[DValue]) -> Result<UValue, MemoryError> {
        if name == MEMCPY_32 {
            return self.memcpy_32(args);
        }
        match self.intrinsics.lookup(name) {
            Some(f) => f(args)
                .map(UValue::from)
                .map_err(|message| MemoryError::IntrinsicFailed {
                    name: name.to_string(),
                    message,
                }),
            None => Err(MemoryError::UnknownIntrinsic {
                name: name.to_string(),
            }),
        }
    }

    /// Copy bytes between logical blocks; alignment and volatile flags are
    /// accepted and ignored
    fn memcpy_32(&mut self, args: &[DValue]) -> Result<UValue, MemoryError> {
        let (dst, src, len) = match args {
            [dst, src, len, _align, _volatile] => (dst, src, len),
            _ => {
                return Err(MemoryError::ArgumentCountMismatch {
                    intrinsic: MEMCPY_32.to_string(),
                    expected: 5,
                    got: args.len(),
                })
            }
        };
        let dst = expect_addr(dst)?;
        let src = expect_addr(src)?;
        let len = match len {
            DValue::I32(n) => *n as i64,
            other => {
                return Err(MemoryError::TypeError {
                    expected: "i32 length".to_string(),
                    got: other.kind().to_string(),
                })
            }
        };
        let data = self
            .state
            .memory
            .logical(src.block)
            .ok_or(MemoryError::MissingBlock { block: src.block })?
            .read_range(src.offset, len);
        let dst_block = self
            .state
            .memory
            .logical_mut(dst.block)
            .ok_or(MemoryError::MissingBlock { block: dst.block })?;
        dst_block.write_range(dst.offset, &data);
        debug!(
            "memcpy: {} bytes, block {} -> block {}",
            len, src.block, dst.block
        );
        Ok(UValue::Unit)
    }
}

impl Default for MemoryHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn expect_addr(value: &DValue) -> Result<Addr, MemoryError> {
    value.as_addr().ok_or_else(|| MemoryError::TypeError {
        expected: "address".to_string(),
        got: value.kind().to_string(),
    })
}

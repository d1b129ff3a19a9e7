//! Symbolic bytes and the typed value codec
//!
//! Memory contents are sequences of [`SByte`]s rather than raw `u8`s. A
//! stored pointer occupies one [`SByte::Ptr`] byte carrying the whole
//! address, followed by seven [`SByte::PtrFrag`] fillers. This is how
//! provenance survives memory traffic: a pointer-typed load recovers the
//! exact address that was stored instead of reconstructing it from integer
//! bytes, while an integer-typed load of the same slot is undefined.
//!
//! # Serialization Layout
//!
//! - integers: the unsigned bit pattern, little-endian over a full 8-byte
//!   slot (upper bytes zero for narrow widths)
//! - floats: the IEEE-754 bit pattern, little-endian, 4 or 8 bytes
//! - addresses: `Ptr` + 7 × `PtrFrag`
//! - structs and arrays: fields/elements concatenated in order, index 0 at
//!   the lowest offset, no padding

use crate::interpreter::constants::{F32_BYTES, F64_BYTES, INT_SLOT_BYTES, PTR_BYTES};
use crate::memory::sizeof_dtyp;
use crate::memory::value::{Addr, DTyp, DValue, UValue};

/// A single symbolic byte of memory
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SByte {
    /// A concrete byte value
    Byte(u8),
    /// The head byte of a serialized pointer, carrying the whole address
    Ptr(Addr),
    /// Filler marking bytes 1..7 of a serialized pointer slot
    PtrFrag,
    /// A byte that was never written
    Undef,
}

impl SByte {
    /// Get the concrete byte value, returns None for pointer or undef bytes
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            SByte::Byte(b) => Some(*b),
            _ => None,
        }
    }
}

/// Serialize a value into its symbolic byte representation
///
/// Unit serializes to the empty sequence; producers must not store it.
pub fn serialize_value(v: &DValue) -> Vec<SByte> {
    match v {
        DValue::Addr(a) => {
            let mut out = Vec::with_capacity(PTR_BYTES as usize);
            out.push(SByte::Ptr(*a));
            out.resize(PTR_BYTES as usize, SByte::PtrFrag);
            out
        }
        DValue::I1(b) => int_slot(*b as u64),
        DValue::I8(n) => int_slot(*n as u64),
        DValue::I32(n) => int_slot(*n as u64),
        DValue::I64(n) => int_slot(*n),
        DValue::F32(x) => x.to_le_bytes().iter().map(|&b| SByte::Byte(b)).collect(),
        DValue::F64(x) => x.to_le_bytes().iter().map(|&b| SByte::Byte(b)).collect(),
        DValue::Struct(fields) => fields.iter().flat_map(serialize_value).collect(),
        DValue::Array(elems) => elems.iter().flat_map(serialize_value).collect(),
        DValue::Unit => Vec::new(),
    }
}

/// One full little-endian integer slot
fn int_slot(bits: u64) -> Vec<SByte> {
    bits.to_le_bytes().iter().map(|&b| SByte::Byte(b)).collect()
}

/// Deserialize symbolic bytes at the given type
///
/// An undef byte anywhere in the consumed range makes the whole result
/// `Undef` — a partially-written aggregate loads as one undefined value.
/// Pointer bytes taint more locally: a pointer head or filler byte makes any
/// non-pointer *scalar* consuming it `Undef`, while aggregates recurse
/// element-wise past them. The pointer type itself succeeds exactly when the
/// first byte is a `Ptr` head; the trailing filler bytes are not inspected.
pub fn deserialize_value(bytes: &[SByte], t: &DTyp) -> UValue {
    match t {
        DTyp::Pointer => match bytes.first() {
            Some(SByte::Ptr(a)) => UValue::Addr(*a),
            _ => UValue::Undef(DTyp::Pointer),
        },
        _ if bytes.iter().any(|b| matches!(b, SByte::Undef)) => UValue::Undef(t.clone()),
        DTyp::I(w) => match concrete_range(bytes, INT_SLOT_BYTES as usize) {
            Some(raw) => {
                let mut slot = [0u8; 8];
                slot.copy_from_slice(&raw);
                let bits = u64::from_le_bytes(slot);
                match DValue::int_of_width(*w, bits) {
                    Some(v) => UValue::from(v),
                    None => UValue::Undef(t.clone()),
                }
            }
            None => UValue::Undef(t.clone()),
        },
        DTyp::Float => match concrete_range(bytes, F32_BYTES as usize) {
            Some(raw) => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(&raw);
                UValue::F32(f32::from_le_bytes(buf))
            }
            None => UValue::Undef(DTyp::Float),
        },
        DTyp::Double => match concrete_range(bytes, F64_BYTES as usize) {
            Some(raw) => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&raw);
                UValue::F64(f64::from_le_bytes(buf))
            }
            None => UValue::Undef(DTyp::Double),
        },
        DTyp::Array(n, elem) | DTyp::Vector(n, elem) => {
            let elem_size = sizeof_dtyp(elem) as usize;
            let mut out = Vec::with_capacity(*n as usize);
            for i in 0..*n as usize {
                out.push(deserialize_value(chunk(bytes, i * elem_size, elem_size), elem));
            }
            UValue::Array(out)
        }
        DTyp::Struct(fields) | DTyp::PackedStruct(fields) => {
            let mut out = Vec::with_capacity(fields.len());
            let mut offset = 0usize;
            for field in fields {
                let size = sizeof_dtyp(field) as usize;
                out.push(deserialize_value(chunk(bytes, offset, size), field));
                offset += size;
            }
            UValue::Struct(out)
        }
        DTyp::Void => UValue::Undef(DTyp::Void),
    }
}

/// The first `len` bytes as concrete values, or None if the range is short
/// or contains a pointer/undef byte
fn concrete_range(bytes: &[SByte], len: usize) -> Option<Vec<u8>> {
    if bytes.len() < len {
        return None;
    }
    bytes[..len].iter().map(SByte::as_byte).collect()
}

/// A sub-range of `bytes`, truncated at the end of the input
fn chunk(bytes: &[SByte], start: usize, len: usize) -> &[SByte] {
    let start = start.min(bytes.len());
    let end = (start + len).min(bytes.len());
    &bytes[start..end]
}

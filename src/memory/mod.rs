//! Memory model for the LLVM-IR interpreter
//!
//! This module provides the core memory abstractions:
//! - [`value`]: Runtime value representation ([`value::DValue`],
//!   [`value::UValue`], symbolic addresses, dynamic types)
//! - [`bytes`]: Symbolic bytes and the typed value codec
//! - [`block`]: Logical and concrete blocks, and the block store
//! - [`frame`]: The frame stack tying allocations to activations
//! - [`gep`]: Address arithmetic over aggregate types
//!
//! # Type Sizes
//!
//! The model uses fixed, platform-independent sizes:
//! - integers: 8 bytes regardless of bit width (padded slots)
//! - pointers: 8 bytes
//! - `float`: 4 bytes, `double`: 8 bytes
//! - arrays and vectors: element size times length
//! - structs: sum of field sizes (no padding or alignment)
//!
//! Padding every integer to a full slot wastes space for `i1` and `i8` but
//! keeps sizing monotone and keeps GEP stride computation uniform.

pub mod block;
pub mod bytes;
pub mod frame;
pub mod gep;
pub mod value;

use crate::interpreter::constants::{F32_BYTES, F64_BYTES, INT_SLOT_BYTES, PTR_BYTES};
use value::DTyp;

/// Calculate the serialized size of a type in bytes
pub fn sizeof_dtyp(t: &DTyp) -> i64 {
    match t {
        DTyp::I(w) if *w <= 64 => INT_SLOT_BYTES,
        DTyp::I(_) => 0,
        DTyp::Pointer => PTR_BYTES,
        DTyp::Float => F32_BYTES,
        DTyp::Double => F64_BYTES,
        DTyp::Array(n, elem) | DTyp::Vector(n, elem) => (*n as i64) * sizeof_dtyp(elem),
        DTyp::Struct(fields) | DTyp::PackedStruct(fields) => {
            fields.iter().map(sizeof_dtyp).sum()
        }
        DTyp::Void => 0,
    }
}

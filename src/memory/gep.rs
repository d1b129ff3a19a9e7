//! GEP: address arithmetic over aggregate types
//!
//! `getelementptr` computes a sub-object's address from a base pointer, a
//! static type, and a list of indices. The first index strides over whole
//! values of the base type; each subsequent index descends one level into
//! the current type. All indices are interpreted as unsigned, and the
//! computation never touches memory — it is pure offset arithmetic.
//!
//! Struct indices must be statically in range. Array and vector indices are
//! not bounds-checked: an out-of-range element index produces an address
//! past the block's declared size, and the load/store that uses it sees
//! undef bytes or extends the sparse byte map.

use crate::interpreter::errors::MemoryError;
use crate::memory::sizeof_dtyp;
use crate::memory::value::{Addr, DTyp, DValue};

/// Compute the address `base` moved by the GEP indices over type `t`
pub fn gep_address(t: &DTyp, base: Addr, indices: &[DValue]) -> Result<Addr, MemoryError> {
    let (first, rest) = match indices.split_first() {
        Some(split) => split,
        None => return Ok(base),
    };
    // The top-level index strides over whole values of the base type.
    let stride = top_level_index(first)?;
    let offset = base
        .offset
        .wrapping_add(sizeof_dtyp(t).wrapping_mul(stride as i64));
    let offset = gep_into(t, offset, rest)?;
    Ok(Addr::new(base.block, offset))
}

/// Descend into `t`, consuming one index per aggregate level
fn gep_into(t: &DTyp, offset: i64, indices: &[DValue]) -> Result<i64, MemoryError> {
    let (index, rest) = match indices.split_first() {
        Some(split) => split,
        None => return Ok(offset),
    };
    match t {
        DTyp::Array(_, elem) | DTyp::Vector(_, elem) => {
            let k = inner_index(index)?;
            let offset = offset.wrapping_add(sizeof_dtyp(elem).wrapping_mul(k as i64));
            gep_into(elem, offset, rest)
        }
        DTyp::Struct(fields) | DTyp::PackedStruct(fields) => {
            let k = inner_index(index)? as usize;
            if k >= fields.len() {
                return Err(MemoryError::GepIndexOutOfRange {
                    index: k as u64,
                    field_count: fields.len(),
                });
            }
            let offset = offset + fields[..k].iter().map(sizeof_dtyp).sum::<i64>();
            gep_into(&fields[k], offset, rest)
        }
        _ => Err(MemoryError::NonIndexableType { typ: t.clone() }),
    }
}

/// The top-level index must be i32 or i64
fn top_level_index(v: &DValue) -> Result<u64, MemoryError> {
    match v {
        DValue::I32(n) => Ok(*n as u64),
        DValue::I64(n) => Ok(*n),
        other => Err(MemoryError::NonIntegerIndex {
            got: other.kind().to_string(),
        }),
    }
}

/// Indices below the top level may also be i8
fn inner_index(v: &DValue) -> Result<u64, MemoryError> {
    match v {
        DValue::I8(n) => Ok(*n as u64),
        DValue::I32(n) => Ok(*n as u64),
        DValue::I64(n) => Ok(*n),
        other => Err(MemoryError::NonIntegerIndex {
            got: other.kind().to_string(),
        }),
    }
}

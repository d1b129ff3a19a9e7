//! Property-based tests for the memory model
//!
//! These tests use proptest to generate random values, offsets, and event
//! sequences and verify that:
//! 1. Stored values survive a load at the same type, bit for bit
//! 2. GEP agrees with plain offset arithmetic on arrays
//! 3. Byte-level shadowing composes the way a flat byte buffer would
//! 4. Allocation always hands out fresh block ids

use irmem::interpreter::engine::{MemoryEvent, MemoryHandler};
use irmem::memory::value::{Addr, DTyp, DValue, UValue};
use proptest::prelude::*;

fn alloca(handler: &mut MemoryHandler, t: DTyp) -> Addr {
    match handler
        .handle_event(MemoryEvent::Alloca(t))
        .expect("alloca failed")
    {
        UValue::Addr(a) => a,
        other => panic!("alloca returned {:?}", other),
    }
}

fn store(handler: &mut MemoryHandler, addr: Addr, value: DValue) {
    handler
        .handle_event(MemoryEvent::Store(DValue::Addr(addr), value))
        .expect("store failed");
}

fn load(handler: &mut MemoryHandler, t: DTyp, addr: Addr) -> UValue {
    handler
        .handle_event(MemoryEvent::Load(t, DValue::Addr(addr)))
        .expect("load failed")
}

proptest! {
    #[test]
    fn store_load_roundtrip_i64(bits in any::<u64>()) {
        let mut handler = MemoryHandler::new();
        let addr = alloca(&mut handler, DTyp::I(64));
        store(&mut handler, addr, DValue::I64(bits));
        prop_assert_eq!(load(&mut handler, DTyp::I(64), addr), UValue::I64(bits));
    }

    #[test]
    fn store_load_roundtrip_i32(bits in any::<u32>()) {
        let mut handler = MemoryHandler::new();
        let addr = alloca(&mut handler, DTyp::I(32));
        store(&mut handler, addr, DValue::I32(bits));
        prop_assert_eq!(load(&mut handler, DTyp::I(32), addr), UValue::I32(bits));
    }

    #[test]
    fn store_load_roundtrip_f64_bits(bits in any::<u64>()) {
        let mut handler = MemoryHandler::new();
        let addr = alloca(&mut handler, DTyp::Double);
        store(&mut handler, addr, DValue::F64(f64::from_bits(bits)));
        // Compare bit patterns: NaN payloads must survive the byte trip
        match load(&mut handler, DTyp::Double, addr) {
            UValue::F64(x) => prop_assert_eq!(x.to_bits(), bits),
            other => prop_assert!(false, "load returned {:?}", other),
        }
    }

    #[test]
    fn store_load_roundtrip_at_offset(bits in any::<u64>(), offset in 0i64..256) {
        let mut handler = MemoryHandler::new();
        let addr = alloca(&mut handler, DTyp::I(64));
        store(&mut handler, addr.with_offset(offset), DValue::I64(bits));
        prop_assert_eq!(
            load(&mut handler, DTyp::I(64), addr.with_offset(offset)),
            UValue::I64(bits)
        );
    }

    #[test]
    fn gep_matches_offset_arithmetic(index in 0u64..1024) {
        let mut handler = MemoryHandler::new();
        let arr_t = DTyp::array(1024, DTyp::I(64));
        let base = alloca(&mut handler, arr_t.clone());
        let gep = handler
            .handle_event(MemoryEvent::Gep(
                arr_t,
                DValue::Addr(base),
                vec![DValue::I64(0), DValue::I64(index)],
            ))
            .expect("gep failed");
        prop_assert_eq!(gep, UValue::Addr(base.with_offset(index as i64 * 8)));
    }

    #[test]
    fn overlapping_stores_compose_like_flat_bytes(
        first in any::<u64>(),
        second in any::<u64>(),
        delta in 0i64..=8,
    ) {
        let mut handler = MemoryHandler::new();
        let addr = alloca(&mut handler, DTyp::I(64));
        store(&mut handler, addr, DValue::I64(first));
        store(&mut handler, addr.with_offset(delta), DValue::I64(second));

        // Reference model: the same two writes into a flat byte buffer
        let mut flat = [0u8; 16];
        flat[..8].copy_from_slice(&first.to_le_bytes());
        flat[delta as usize..delta as usize + 8].copy_from_slice(&second.to_le_bytes());
        let expected = u64::from_le_bytes(flat[..8].try_into().unwrap());

        prop_assert_eq!(load(&mut handler, DTyp::I(64), addr), UValue::I64(expected));
    }

    #[test]
    fn alloca_ids_are_fresh(count in 1usize..32) {
        let mut handler = MemoryHandler::new();
        let mut ids = Vec::new();
        for _ in 0..count {
            let next = handler.state().memory.next_logical_key();
            prop_assert!(handler.state().memory.logical(next).is_none());
            let addr = alloca(&mut handler, DTyp::I(64));
            prop_assert_eq!(addr.block, next);
            ids.push(addr.block);
        }
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), count);
    }

    #[test]
    fn ptoi_itop_roundtrip_interior(offset in 0i64..24) {
        let mut handler = MemoryHandler::new();
        let addr = alloca(&mut handler, DTyp::array(3, DTyp::I(64)));
        let bits = match handler
            .handle_event(MemoryEvent::PtoI(DTyp::I(64), DValue::Addr(addr)))
            .expect("ptoi failed")
        {
            UValue::I64(n) => n,
            other => panic!("ptoi returned {:?}", other),
        };
        let back = handler
            .handle_event(MemoryEvent::ItoP(DValue::I64(bits + offset as u64)))
            .expect("itop failed");
        prop_assert_eq!(back, UValue::Addr(addr.with_offset(offset)));
    }
}

//! Intrinsic declarations and built-in implementations
//!
//! Pure intrinsics live in an [`IntrinsicTable`]: a registry from the exact
//! LLVM symbol name to a pure function over dynamic values, together with an
//! ordered list of [`IntrinsicDecl`]s carrying the LLVM-level signatures.
//! Clients may extend the built-ins with [`IntrinsicTable::register`].
//!
//! `llvm.memcpy.p0i8.p0i8.i32` is declared here but implemented inside the
//! memory handler, since it moves bytes between blocks rather than computing
//! a value.
//!
//! # NaN Handling
//!
//! For the binary float intrinsics, a NaN operand is returned as-is (the
//! left operand's payload wins when both are NaN); otherwise the result is
//! picked by a single IEEE `<` comparison.

use rustc_hash::FxHashMap;

use crate::memory::value::{DTyp, DValue};

/// Symbol handled by the memory core itself rather than a pure function
pub const MEMCPY_32: &str = "llvm.memcpy.p0i8.p0i8.i32";

/// A pure intrinsic implementation
pub type IntrinsicFn = fn(&[DValue]) -> Result<DValue, String>;

/// An LLVM-level intrinsic signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrinsicDecl {
    /// Exact LLVM symbol, e.g. `"llvm.fabs.f32"`
    pub name: String,
    pub ret: DTyp,
    pub params: Vec<DTyp>,
}

impl IntrinsicDecl {
    pub fn new(name: &str, ret: DTyp, params: Vec<DTyp>) -> Self {
        IntrinsicDecl {
            name: name.to_string(),
            ret,
            params,
        }
    }
}

/// Registry of declared intrinsics
#[derive(Debug, Clone, Default)]
pub struct IntrinsicTable {
    index: FxHashMap<String, IntrinsicFn>,
    decls: Vec<IntrinsicDecl>,
}

impl IntrinsicTable {
    /// An empty table with no declarations
    pub fn new() -> Self {
        IntrinsicTable::default()
    }

    /// The built-in catalogue: float abs/maxnum/minimum plus the memcpy
    /// declaration
    pub fn with_builtins() -> Self {
        let mut table = IntrinsicTable::new();
        table.register(
            IntrinsicDecl::new("llvm.fabs.f32", DTyp::Float, vec![DTyp::Float]),
            fabs_f32,
        );
        table.register(
            IntrinsicDecl::new("llvm.fabs.f64", DTyp::Double, vec![DTyp::Double]),
            fabs_f64,
        );
        table.register(
            IntrinsicDecl::new(
                "llvm.maxnum.f32",
                DTyp::Float,
                vec![DTyp::Float, DTyp::Float],
            ),
            maxnum_f32,
        );
        table.register(
            IntrinsicDecl::new(
                "llvm.maxnum.f64",
                DTyp::Double,
                vec![DTyp::Double, DTyp::Double],
            ),
            maxnum_f64,
        );
        // note: registered without the "llvm." prefix
        table.register(
            IntrinsicDecl::new("minimum.f32", DTyp::Float, vec![DTyp::Float, DTyp::Float]),
            minimum_f32,
        );
        table.register(
            IntrinsicDecl::new(
                "llvm.minimum.f64",
                DTyp::Double,
                vec![DTyp::Double, DTyp::Double],
            ),
            minimum_f64,
        );
        table.declare(IntrinsicDecl::new(
            MEMCPY_32,
            DTyp::Void,
            vec![
                DTyp::Pointer,
                DTyp::Pointer,
                DTyp::I(32),
                DTyp::I(32),
                DTyp::I(1),
            ],
        ));
        table
    }

    /// Register an implementation under its declared name, shadowing any
    /// previous binding
    pub fn register(&mut self, decl: IntrinsicDecl, f: IntrinsicFn) {
        self.index.insert(decl.name.clone(), f);
        self.decls.push(decl);
    }

    /// Record a signature whose implementation lives elsewhere
    pub fn declare(&mut self, decl: IntrinsicDecl) {
        self.decls.push(decl);
    }

    /// Look up an implementation by exact symbol name
    pub fn lookup(&self, name: &str) -> Option<IntrinsicFn> {
        self.index.get(name).copied()
    }

    /// The declared signatures, in registration order
    pub fn declarations(&self) -> &[IntrinsicDecl] {
        &self.decls
    }
}

fn fabs_f32(args: &[DValue]) -> Result<DValue, String> {
    match args {
        [DValue::F32(x)] => Ok(DValue::F32(x.abs())),
        _ => Err(format!("expected (f32), got {:?}", args)),
    }
}

fn fabs_f64(args: &[DValue]) -> Result<DValue, String> {
    match args {
        [DValue::F64(x)] => Ok(DValue::F64(x.abs())),
        _ => Err(format!("expected (f64), got {:?}", args)),
    }
}

fn maxnum_f32(args: &[DValue]) -> Result<DValue, String> {
    match args {
        [DValue::F32(a), DValue::F32(b)] => Ok(DValue::F32(if a.is_nan() {
            *a
        } else if b.is_nan() {
            *b
        } else if a < b {
            *b
        } else {
            *a
        })),
        _ => Err(format!("expected (f32, f32), got {:?}", args)),
    }
}

fn maxnum_f64(args: &[DValue]) -> Result<DValue, String> {
    match args {
        [DValue::F64(a), DValue::F64(b)] => Ok(DValue::F64(if a.is_nan() {
            *a
        } else if b.is_nan() {
            *b
        } else if a < b {
            *b
        } else {
            *a
        })),
        _ => Err(format!("expected (f64, f64), got {:?}", args)),
    }
}

fn minimum_f32(args: &[DValue]) -> Result<DValue, String> {
    match args {
        [DValue::F32(a), DValue::F32(b)] => Ok(DValue::F32(if a.is_nan() {
            *a
        } else if b.is_nan() {
            *b
        } else if a < b {
            *a
        } else {
            *b
        })),
        _ => Err(format!("expected (f32, f32), got {:?}", args)),
    }
}

fn minimum_f64(args: &[DValue]) -> Result<DValue, String> {
    match args {
        [DValue::F64(a), DValue::F64(b)] => Ok(DValue::F64(if a.is_nan() {
            *a
        } else if b.is_nan() {
            *b
        } else if a < b {
            *a
        } else {
            *b
        })),
        _ => Err(format!("expected (f64, f64), got {:?}", args)),
    }
}

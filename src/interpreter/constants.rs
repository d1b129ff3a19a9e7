// Layout constants for the memory model

/// Serialized size of a pointer, in bytes
pub const PTR_BYTES: i64 = 8;

/// Serialized size of an integer of any width, in bytes
/// Integers are always padded to a full 8-byte slot
pub const INT_SLOT_BYTES: i64 = 8;

/// Serialized size of a 32-bit float, in bytes
pub const F32_BYTES: i64 = 4;

/// Serialized size of a 64-bit float, in bytes
pub const F64_BYTES: i64 = 8;

//! Value types recognized by the IR.
//!
//! Types matter to this crate mainly because the memory-ordering transform
//! must mint a deterministic, per-element-type intrinsic declaration
//! (`load[T]`/`store[T]`, see [`crate::mem_order`]), and the naming scheme in
//! the system spec (`<prefix>.load.<type>`) is spelled out in terms of these
//! names.

use std::fmt;

/// A primitive value type.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Type {
    /// The one-bit memory token / boolean type.
    I1,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// An opaque pointer/address.
    Ptr,
}

impl Type {
    /// The short name used in intrinsic declarations and in the printer.
    pub fn name(self) -> &'static str {
        match self {
            Type::I1 => "i1",
            Type::I8 => "i8",
            Type::I16 => "i16",
            Type::I32 => "i32",
            Type::I64 => "i64",
            Type::F32 => "f32",
            Type::F64 => "f64",
            Type::Ptr => "ptr",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! Opaque entity references into a [`Function`](super::function::Function).
//!
//! Values, instructions, blocks and declared intrinsics are never addressed by
//! Rust references. Instead each is a small `u32`-backed index into a table
//! owned by the function, following the same entity-reference discipline
//! `cranelift-entity` was built for: compact, `Copy`, and distinct types per
//! entity kind so a `Value` can never be confused with an `Inst`.

use cranelift_entity::entity_impl;
use std::fmt;

/// An opaque reference to a basic block.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block(u32);
entity_impl!(Block, "block");

/// An opaque reference to an SSA value: a function argument, a constant, or
/// the single result of an instruction.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value(u32);
entity_impl!(Value, "v");

/// An opaque reference to an instruction.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Inst(u32);
entity_impl!(Inst, "inst");

/// An opaque reference to a declared external symbol: an ordinary call
/// target, or one of the memory-token intrinsics minted by the
/// memory-ordering transform.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncRef(u32);
entity_impl!(FuncRef, "fn");

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Debug for Inst {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

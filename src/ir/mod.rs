//! The IR model adapter (§4.1).
//!
//! This crate owns its own minimal SSA IR rather than binding to an external
//! front-end: `Function` (this module), [`DataFlowGraph`](dfg::DataFlowGraph)
//! and [`Layout`](layout::Layout) together play the role of an IR model
//! adapter — a read-only view over blocks, instructions, operands, users and
//! terminators, mutable only for the memory-ordering rewrite. A real
//! deployment would implement the same queries (`analyze_branch`,
//! `InstructionData::family`, `DataFlowGraph::users`, ...) as a thin
//! translation layer over its own optimizer's IR instead.

pub mod constant;
pub mod dfg;
pub mod entities;
pub mod function;
pub mod instruction;
pub mod layout;
pub mod types;

pub use constant::ConstantValue;
pub use dfg::{DataFlowGraph, ValueDef};
pub use entities::{Block, FuncRef, Inst, Value};
pub use function::{BranchInfo, Function, Signature};
pub use instruction::{
    AtomicRmwOp, BinOp, Callee, CastKind, FloatCC, InstructionData, IntCC, IntrinsicKind,
    OpcodeFamily,
};
pub use layout::Layout;
pub use types::Type;

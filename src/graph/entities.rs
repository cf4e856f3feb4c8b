//! Opaque references into a [`CustomDataflowGraph`](super::CustomDataflowGraph).

use cranelift_entity::entity_impl;

/// An opaque reference to a [`DataflowNode`](super::DataflowNode).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(u32);
entity_impl!(NodeRef, "n");

/// An opaque reference to a [`DataflowEdge`](super::DataflowEdge).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeRef(u32);
entity_impl!(EdgeRef, "e");

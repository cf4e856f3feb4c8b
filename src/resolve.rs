//! The pass-through resolver (§4.4): `wire_value_to_node` is the single
//! primitive the builder uses to connect a producing value to a consumer,
//! transparently skipping address arithmetic, casts, and nodes still typed
//! `Unknown`. Every wiring decision in the builder goes through this
//! function rather than through ad-hoc unwrapping (§9: "pass-through as a
//! primitive").

use crate::graph::{CustomDataflowGraph, DataflowOperatorType, NodeRef};
use crate::ir::{Function, InstructionData, Value, ValueDef};

/// Connects the producer of `value` to `dst`, recursing through plumbing
/// instructions. A no-op if either argument is `None`, or if the recursion
/// bottoms out without finding a materialized node (§7: "unresolved
/// pass-through ... silent by design").
pub fn wire_value_to_node(
    func: &Function,
    graph: &mut CustomDataflowGraph,
    value: Option<Value>,
    dst: Option<NodeRef>,
) {
    let (Some(value), Some(dst)) = (value, dst) else {
        return;
    };

    if let ValueDef::Result(inst) = func.dfg.value_def(value) {
        match func.dfg.inst(inst) {
            InstructionData::AddrArith { base, indices } => {
                wire_value_to_node(func, graph, Some(*base), Some(dst));
                for &idx in indices {
                    wire_value_to_node(func, graph, Some(idx), Some(dst));
                }
                return;
            }
            InstructionData::Cast { arg, .. } => {
                wire_value_to_node(func, graph, Some(*arg), Some(dst));
                return;
            }
            _ => {}
        }
    }

    if let Some(node) = graph.find_node(value) {
        if graph.node(node).kind != DataflowOperatorType::Unknown {
            graph.add_edge(Some(node), Some(dst));
            return;
        }
    }

    if let ValueDef::Result(inst) = func.dfg.value_def(value) {
        for arg in func.dfg.inst(inst).args() {
            wire_value_to_node(func, graph, Some(arg), Some(dst));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CastKind, ConstantValue, Type};

    #[test]
    fn sees_through_cast_and_addr_arith() {
        let mut func = Function::new(
            "f",
            crate::ir::Signature {
                params: vec![Type::Ptr, Type::I32],
                returns: vec![],
            },
        );
        let entry = func.make_block();
        func.append_block(entry);
        let base = func.params()[0];
        let idx = func.params()[1];
        let (_, addr) = func.ins(
            entry,
            InstructionData::AddrArith {
                base,
                indices: smallvec::smallvec![idx],
            },
            Type::Ptr,
        );
        let (_, casted) = func.ins(
            entry,
            InstructionData::Cast {
                kind: CastKind::Bitcast,
                arg: addr,
            },
            Type::Ptr,
        );

        let mut graph = CustomDataflowGraph::new();
        let dst = graph.add_node(DataflowOperatorType::Load, None, None);
        wire_value_to_node(&func, &mut graph, Some(casted), Some(dst));

        // base and idx are function inputs: no node exists for them yet, so
        // the recursion bottoms out silently (they get materialized by
        // Phase A before Phase D actually calls this).
        assert_eq!(graph.node(dst).inputs().len(), 0);

        let base_node = graph.get_or_add(base);
        graph.set_kind(base_node, DataflowOperatorType::FunctionInput, None, None);
        let idx_node = graph.get_or_add(idx);
        graph.set_kind(idx_node, DataflowOperatorType::FunctionInput, None, None);

        wire_value_to_node(&func, &mut graph, Some(casted), Some(dst));
        assert_eq!(graph.node(dst).inputs().len(), 2);
    }

    #[test]
    fn stops_at_a_materialized_node() {
        let mut func = Function::new(
            "f",
            crate::ir::Signature {
                params: vec![],
                returns: vec![],
            },
        );
        let entry = func.make_block();
        func.append_block(entry);
        let c = func.dfg.make_const(Type::I32, ConstantValue::Int(1));

        let mut graph = CustomDataflowGraph::new();
        let const_node = graph.get_or_add(c);
        graph.set_kind(const_node, DataflowOperatorType::Constant, None, None);
        let dst = graph.add_node(DataflowOperatorType::BasicBinaryOp, None, None);

        wire_value_to_node(&func, &mut graph, Some(c), Some(dst));
        assert_eq!(graph.node(dst).inputs().len(), 1);
    }
}

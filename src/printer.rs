//! The graph printer (§4.6): emits a DOT file, choosing node shape by
//! operator kind and suppressing output-less nodes except for the ones a
//! reader most needs to see (`FunctionInput`/`FunctionOutput`/`Merge`
//! sinks). Output order follows the graph store's insertion order, so two
//! builds of the same function print identically.

use crate::graph::{CustomDataflowGraph, DataflowOperatorType, NodeRef};
use std::io::{self, Write};

fn shape(kind: DataflowOperatorType) -> &'static str {
    match kind {
        DataflowOperatorType::FunctionInput | DataflowOperatorType::FunctionOutput => "ellipse",
        DataflowOperatorType::Load | DataflowOperatorType::Store => "ellipse",
        DataflowOperatorType::BasicBinaryOp | DataflowOperatorType::Constant | DataflowOperatorType::Call => "box",
        DataflowOperatorType::TrueSteer => "triangle",
        DataflowOperatorType::FalseSteer => "invtriangle",
        DataflowOperatorType::Merge | DataflowOperatorType::Carry | DataflowOperatorType::Invariant => "octagon",
        DataflowOperatorType::Order => "diamond",
        DataflowOperatorType::Stream => "circle",
        DataflowOperatorType::Unknown => "plaintext",
    }
}

/// A node's label: its explicit label, then its operator symbol, then a
/// synthesized fallback naming the kind and (if any) the IR value it came
/// from.
fn label(graph: &CustomDataflowGraph, node: NodeRef) -> String {
    let n = graph.node(node);
    if let Some(label) = &n.label {
        return label.clone();
    }
    if let Some(symbol) = n.symbol {
        return symbol.to_string();
    }
    match n.origin {
        Some(v) => format!("{}({v})", n.kind.short_name()),
        None => n.kind.short_name().to_string(),
    }
}

/// A node is suppressed from the output if it has no outgoing edges, unless
/// it is one of the kinds §4.6 calls out as worth keeping for clarity.
fn should_emit(graph: &CustomDataflowGraph, node: NodeRef) -> bool {
    let n = graph.node(node);
    if !n.outputs().is_empty() {
        return true;
    }
    matches!(
        n.kind,
        DataflowOperatorType::FunctionInput | DataflowOperatorType::FunctionOutput | DataflowOperatorType::Merge
    )
}

/// Writes `graph` as a DOT digraph to `w`.
pub fn write_dot<W: Write>(graph: &CustomDataflowGraph, mut w: W) -> io::Result<()> {
    writeln!(w, "digraph dfg {{")?;
    for (node, data) in graph.nodes() {
        if !should_emit(graph, node) {
            continue;
        }
        writeln!(
            w,
            "  {} [shape={}, label=\"{}\"];",
            node,
            shape(data.kind),
            label(graph, node).replace('"', "\\\"")
        )?;
    }
    for (_, edge) in graph.edges() {
        if !should_emit(graph, edge.src) || !should_emit(graph, edge.dst) {
            continue;
        }
        writeln!(w, "  {} -> {};", edge.src, edge.dst)?;
    }
    writeln!(w, "}}")?;
    Ok(())
}

/// Writes `graph` to `dfg.dot` in the current working directory (§6 output
/// 2). I/O failures are logged, not propagated: the printer is
/// diagnostic-only and its failure must not fail the surrounding pass (§7).
pub fn write_dot_file(graph: &CustomDataflowGraph) {
    match std::fs::File::create("dfg.dot") {
        Ok(file) => {
            if let Err(e) = write_dot(graph, file) {
                log::error!("failed to write dfg.dot: {e}");
            }
        }
        Err(e) => log::error!("failed to open dfg.dot: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DataflowOperatorType as Op;

    #[test]
    fn suppresses_sinkless_binary_op_but_keeps_function_output() {
        let mut g = CustomDataflowGraph::new();
        let a = g.add_node(Op::Constant, None, Some("1".to_string()));
        let b = g.add_node(Op::BasicBinaryOp, None, Some("+".to_string()));
        let out = g.add_node(Op::FunctionOutput, None, None);
        g.add_edge(Some(a), Some(b));
        g.add_edge(Some(b), Some(out));

        let mut buf = Vec::new();
        write_dot(&g, &mut buf).unwrap();
        let dot = String::from_utf8(buf).unwrap();
        assert!(dot.contains("digraph dfg"));
        assert!(dot.contains(&out.to_string()));
    }

    #[test]
    fn orphan_constant_is_suppressed() {
        let mut g = CustomDataflowGraph::new();
        let orphan = g.add_node(Op::Constant, None, Some("0".to_string()));
        let mut buf = Vec::new();
        write_dot(&g, &mut buf).unwrap();
        let dot = String::from_utf8(buf).unwrap();
        assert!(!dot.contains(&format!("{orphan} [")));
    }
}

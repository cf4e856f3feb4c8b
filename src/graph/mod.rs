//! The graph store (§4.3): the typed operator graph the DFG builder writes
//! into. Arena-owned, deterministic iteration order, no owning cycles even
//! though the graph itself is cyclic (§9) — nodes and edges live in
//! `PrimaryMap`s addressed by [`NodeRef`]/[`EdgeRef`], never by pointer.

mod entities;
mod operator;

pub use entities::{EdgeRef, NodeRef};
pub use operator::DataflowOperatorType;

use crate::ir::Value;
use cranelift_entity::{PrimaryMap, SecondaryMap};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// A key in the value → node index: either an IR value, or one of the
/// synthesized sentinels the builder needs a stable identity for (today,
/// only the function-entry [`Stream`](DataflowOperatorType::Stream) token).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum GraphKey {
    Value(Value),
    EntryStream,
}

pub struct DataflowNode {
    pub kind: DataflowOperatorType,
    /// Weak back-reference to the IR value this node was built from, if any
    /// (synthesized steers/merges/streams have none).
    pub origin: Option<Value>,
    pub label: Option<String>,
    pub symbol: Option<&'static str>,
    inputs: Vec<EdgeRef>,
    outputs: Vec<EdgeRef>,
}

impl DataflowNode {
    pub fn inputs(&self) -> &[EdgeRef] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[EdgeRef] {
        &self.outputs
    }
}

#[derive(Copy, Clone)]
pub struct DataflowEdge {
    pub src: NodeRef,
    pub dst: NodeRef,
}

/// Owns all nodes and edges for one function's build. Invariants (§4.3/I1-I4)
/// are maintained by construction: `add_edge` only ever links nodes already
/// present in `nodes`; `remove_node` keeps input/output lists in sync;
/// `get_or_add`/`set_kind` are the only ways a value-map entry or a node's
/// kind is written.
pub struct CustomDataflowGraph {
    nodes: PrimaryMap<NodeRef, Option<DataflowNode>>,
    edges: PrimaryMap<EdgeRef, Option<DataflowEdge>>,
    value_map: FxHashMap<GraphKey, NodeRef>,
    key_of: SecondaryMap<NodeRef, Option<GraphKey>>,
    node_order: Vec<NodeRef>,
    edge_order: Vec<EdgeRef>,
}

impl CustomDataflowGraph {
    pub fn new() -> Self {
        Self {
            nodes: PrimaryMap::new(),
            edges: PrimaryMap::new(),
            value_map: FxHashMap::default(),
            key_of: SecondaryMap::new(),
            node_order: Vec::new(),
            edge_order: Vec::new(),
        }
    }

    /// Always creates a fresh node. If `key` is given, binds it in the
    /// value-map (§4.3: `add_node`).
    pub fn add_node(
        &mut self,
        kind: DataflowOperatorType,
        origin: Option<Value>,
        label: Option<String>,
    ) -> NodeRef {
        self.add_node_keyed(kind, origin, label, None)
    }

    fn add_node_keyed(
        &mut self,
        kind: DataflowOperatorType,
        origin: Option<Value>,
        label: Option<String>,
        key: Option<GraphKey>,
    ) -> NodeRef {
        let node = self.nodes.push(Some(DataflowNode {
            kind,
            origin,
            label,
            symbol: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }));
        self.node_order.push(node);
        if let Some(key) = key {
            self.value_map.insert(key, node);
            self.key_of[node] = Some(key);
        }
        node
    }

    /// Returns the existing node for `key`/`value`, or creates a fresh
    /// `Unknown`-tagged one via [`Self::get_or_add_keyed`]. Phase A
    /// immediately refines the tag with [`Self::set_kind`].
    pub fn get_or_add(&mut self, value: Value) -> NodeRef {
        self.get_or_add_keyed(GraphKey::Value(value), Some(value))
    }

    pub fn get_or_add_keyed(&mut self, key: GraphKey, origin: Option<Value>) -> NodeRef {
        if let Some(&node) = self.value_map.get(&key) {
            return node;
        }
        self.add_node_keyed(DataflowOperatorType::Unknown, origin, None, Some(key))
    }

    pub fn find_node(&self, value: Value) -> Option<NodeRef> {
        self.value_map.get(&GraphKey::Value(value)).copied()
    }

    pub fn find_keyed(&self, key: GraphKey) -> Option<NodeRef> {
        self.value_map.get(&key).copied()
    }

    /// Refines `node`'s kind. Per I4, a node may move off `Unknown` at most
    /// once; refining an already-concrete node (re-tagging a `Merge` as a
    /// `Carry` in Phase E) is allowed since it still only ever leaves
    /// `Unknown` a single time.
    pub fn set_kind(
        &mut self,
        node: NodeRef,
        kind: DataflowOperatorType,
        label: Option<String>,
        symbol: Option<&'static str>,
    ) {
        let n = self.nodes[node].as_mut().expect("node is not removed");
        n.kind = kind;
        if label.is_some() {
            n.label = label;
        }
        if symbol.is_some() {
            n.symbol = symbol;
        }
    }

    pub fn node(&self, node: NodeRef) -> &DataflowNode {
        self.nodes[node].as_ref().expect("node is not removed")
    }

    /// Idempotent: null endpoints are logged and treated as a no-op (§7:
    /// "graph-store misuse"). Duplicate edges between the same endpoints are
    /// silently skipped.
    pub fn add_edge(&mut self, src: Option<NodeRef>, dst: Option<NodeRef>) -> Option<EdgeRef> {
        let (src, dst) = match (src, dst) {
            (Some(s), Some(d)) => (s, d),
            _ => {
                log::warn!("add_edge called with a null endpoint; ignoring");
                return None;
            }
        };
        let existing = self.node(src).outputs.iter().find(|&&e| {
            self.edges[e].as_ref().map(|edge| edge.dst) == Some(dst)
        });
        if let Some(&e) = existing {
            return Some(e);
        }

        let edge = self.edges.push(Some(DataflowEdge { src, dst }));
        self.edge_order.push(edge);
        self.nodes[src].as_mut().unwrap().outputs.push(edge);
        self.nodes[dst].as_mut().unwrap().inputs.push(edge);
        Some(edge)
    }

    /// Unlinks every adjacent edge from both endpoints' lists, removes them
    /// from the edge set, removes the node, and erases its value-map entry.
    pub fn remove_node(&mut self, node: NodeRef) {
        let Some(n) = self.nodes[node].take() else {
            log::warn!("remove_node called on an already-removed node");
            return;
        };
        let adjacent: SmallVec<[EdgeRef; 8]> = n
            .inputs
            .iter()
            .chain(n.outputs.iter())
            .copied()
            .collect();
        for edge in adjacent {
            if let Some(e) = self.edges[edge].take() {
                if e.src != node {
                    if let Some(src_node) = self.nodes[e.src].as_mut() {
                        src_node.outputs.retain(|&x| x != edge);
                    }
                }
                if e.dst != node {
                    if let Some(dst_node) = self.nodes[e.dst].as_mut() {
                        dst_node.inputs.retain(|&x| x != edge);
                    }
                }
            }
        }
        if let Some(key) = self.key_of[node].take() {
            self.value_map.remove(&key);
        }
    }

    /// All live nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeRef, &DataflowNode)> + '_ {
        self.node_order
            .iter()
            .filter_map(move |&n| self.nodes[n].as_ref().map(|data| (n, data)))
    }

    /// All live edges, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeRef, &DataflowEdge)> + '_ {
        self.edge_order
            .iter()
            .filter_map(move |&e| self.edges[e].as_ref().map(|data| (e, data)))
    }
}

impl Default for CustomDataflowGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::entities::Value as IrValue;

    fn fake_value(n: u32) -> IrValue {
        // Values are only ever constructed by a DataFlowGraph in real code;
        // tests here only need distinct keys, not a real producer.
        cranelift_entity::EntityRef::new(n as usize)
    }

    #[test]
    fn get_or_add_is_idempotent() {
        let mut g = CustomDataflowGraph::new();
        let v = fake_value(0);
        let n1 = g.get_or_add(v);
        let n2 = g.get_or_add(v);
        assert_eq!(n1, n2);
    }

    #[test]
    fn add_edge_suppresses_duplicates() {
        let mut g = CustomDataflowGraph::new();
        let a = g.add_node(DataflowOperatorType::Constant, None, None);
        let b = g.add_node(DataflowOperatorType::BasicBinaryOp, None, None);
        let e1 = g.add_edge(Some(a), Some(b));
        let e2 = g.add_edge(Some(a), Some(b));
        assert_eq!(e1, e2);
        assert_eq!(g.node(a).outputs().len(), 1);
        assert_eq!(g.node(b).inputs().len(), 1);
    }

    #[test]
    fn add_edge_null_endpoint_is_noop() {
        let mut g = CustomDataflowGraph::new();
        let a = g.add_node(DataflowOperatorType::Constant, None, None);
        assert!(g.add_edge(Some(a), None).is_none());
        assert_eq!(g.node(a).outputs().len(), 0);
    }

    #[test]
    fn remove_node_unlinks_edges() {
        let mut g = CustomDataflowGraph::new();
        let a = g.add_node(DataflowOperatorType::Constant, None, None);
        let b = g.add_node(DataflowOperatorType::BasicBinaryOp, None, None);
        let c = g.add_node(DataflowOperatorType::BasicBinaryOp, None, None);
        g.add_edge(Some(a), Some(b));
        g.add_edge(Some(b), Some(c));
        g.remove_node(b);

        assert_eq!(g.node(a).outputs().len(), 0);
        assert_eq!(g.node(c).inputs().len(), 0);
        assert_eq!(g.edges().count(), 0);
        assert_eq!(g.nodes().count(), 2);
    }
}

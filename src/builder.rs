//! The DFG builder (§4.5): the main algorithm, run as an ordered sequence of
//! phases A through G. Each phase establishes invariants the next one relies
//! on; see the per-phase doc comments below for what each one assumes and
//! produces.

use crate::dominator_tree::DominatorTree;
use crate::error::{BuildError, MalformedIrError};
use crate::flowgraph::ControlFlowGraph;
use crate::graph::{CustomDataflowGraph, DataflowOperatorType as Op, GraphKey, NodeRef};
use crate::ir::{
    Block, Callee, Function, Inst, InstructionData, IntrinsicKind, OpcodeFamily, Value, ValueDef,
};
use crate::loop_analysis::{Loop, LoopAnalysis};
use crate::resolve::wire_value_to_node;
use rustc_hash::FxHashMap;

/// Node/edge counts from a completed build, broken down by the operator
/// kinds a caller is most likely to want to assert on in tests or report in
/// diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub nodes: usize,
    pub edges: usize,
    pub steers: usize,
    pub merges: usize,
    pub carries: usize,
}

/// Runs the full build over `func`, returning the populated graph store and
/// build statistics. `func` must already be past the memory-ordering
/// transform and must have an up-to-date use-list index
/// (`func.dfg.compute_uses()`); both the transform and the test-building DSL
/// maintain this.
pub fn build(func: &Function) -> Result<(CustomDataflowGraph, Stats), BuildError> {
    if func.is_declaration() {
        return Err(MalformedIrError::DeclarationPassedToBuilder.into());
    }
    validate_terminators(func)?;

    let cfg = ControlFlowGraph::with_function(func);
    let domtree = DominatorTree::with_function(func, &cfg);
    let loops = LoopAnalysis::with_function(func, &cfg, &domtree);

    let mut b = DfgBuilder {
        func,
        cfg,
        loops,
        graph: CustomDataflowGraph::new(),
        entry_stream: None,
        branch_steers: FxHashMap::default(),
        return_sinks: FxHashMap::default(),
        stats: Stats::default(),
    };

    b.phase_a_classification()?;
    b.phase_b_conditional_branches();
    b.phase_c_selects();
    b.phase_d_data_dependencies();
    b.phase_e_phi_nodes();
    b.phase_f_argument_fanout();
    b.phase_g_return();

    Ok(b.finish())
}

/// Every block must end with a terminator-shaped instruction
/// (`Brif`/`Jump`/`Return`). Checked up front because the CFG/dominator-tree/
/// loop analyses the builder relies on assume this and panic on a block
/// whose last instruction is something else.
fn validate_terminators(func: &Function) -> Result<(), BuildError> {
    for block in func.layout.blocks() {
        let Some(inst) = func.layout.terminator(block) else {
            return Err(MalformedIrError::MissingTerminator(block).into());
        };
        let family = func.dfg.inst(inst).family();
        if !matches!(family, OpcodeFamily::Brif | OpcodeFamily::Jump | OpcodeFamily::Return) {
            return Err(MalformedIrError::UnexpectedOpcode {
                inst,
                opcode: family.name(),
            }
            .into());
        }
    }
    Ok(())
}

struct DfgBuilder<'f> {
    func: &'f Function,
    cfg: ControlFlowGraph,
    loops: LoopAnalysis,
    graph: CustomDataflowGraph,
    entry_stream: Option<NodeRef>,
    /// `Brif` instruction -> (TrueSteer, FalseSteer), recorded in Phase B and
    /// consulted in Phase E when wiring a `Merge`'s steered incoming edges.
    branch_steers: FxHashMap<Inst, (NodeRef, NodeRef)>,
    /// `(Return instruction, operand index)` -> its `FunctionOutput` sink,
    /// created in Phase A and wired in Phase G.
    return_sinks: FxHashMap<(Inst, usize), NodeRef>,
    stats: Stats,
}

impl<'f> DfgBuilder<'f> {
    fn entry_stream(&mut self) -> NodeRef {
        if let Some(n) = self.entry_stream {
            return n;
        }
        let n = self.graph.get_or_add_keyed(GraphKey::EntryStream, None);
        self.graph.set_kind(n, Op::Stream, Some("entry".to_string()), None);
        self.entry_stream = Some(n);
        n
    }

    /// A user instruction that never becomes a node of its own: a φ (its
    /// wiring is deferred to Phase E), a select (Phase C already wired its
    /// users directly from the steer pair), or plumbing (cast/address
    /// arithmetic, resolved transparently from whatever node really
    /// consumes it). Direct "self -> node(U)" fanout loops must skip these;
    /// materializing a node for one here would leave it permanently
    /// `Unknown`.
    fn is_non_materializing_user(&self, inst: Inst) -> bool {
        matches!(
            self.func.dfg.inst(inst).family(),
            OpcodeFamily::Phi | OpcodeFamily::Select | OpcodeFamily::Cast | OpcodeFamily::AddrArith
        )
    }

    /// The first instruction of `block` that is not a φ, cast, or
    /// address-arithmetic operation (§4.5 Phase B step 4).
    fn first_meaningful_inst(&self, block: Block) -> Option<Inst> {
        self.func.layout.block_insts(block).iter().copied().find(|&inst| {
            !matches!(
                self.func.dfg.inst(inst).family(),
                OpcodeFamily::Phi | OpcodeFamily::Cast | OpcodeFamily::AddrArith
            )
        })
    }

    /// **Phase A — Classification.** Tags every instruction result with its
    /// operator kind, adds `FunctionOutput` sinks for return operands,
    /// materializes a node for every function argument, and materializes a
    /// `Constant` node for every constant operand anywhere in the function
    /// (the resolver only ever wires to a node that already exists). Does no
    /// other wiring.
    fn phase_a_classification(&mut self) -> Result<(), BuildError> {
        let blocks: Vec<Block> = self.func.layout.blocks().collect();
        for block in blocks {
            let Some(terminator) = self.func.layout.terminator(block) else {
                return Err(MalformedIrError::MissingTerminator(block).into());
            };
            let insts: Vec<Inst> = self.func.layout.block_insts(block).to_vec();
            for inst in insts {
                let data = self.func.dfg.inst(inst).clone();

                for arg in data.args() {
                    if let ValueDef::Const(_) = self.func.dfg.value_def(arg) {
                        let node = self.graph.get_or_add(arg);
                        self.graph.set_kind(node, Op::Constant, None, None);
                    }
                }

                match data.family() {
                    OpcodeFamily::Select
                    | OpcodeFamily::AddrArith
                    | OpcodeFamily::Cast
                    | OpcodeFamily::Brif
                    | OpcodeFamily::Jump => {}
                    OpcodeFamily::BinaryOp => {
                        if let InstructionData::BinaryOp { op, .. } = data {
                            let result = self.func.dfg.inst_result(inst).expect("binop has a result");
                            let node = self.graph.get_or_add(result);
                            self.graph
                                .set_kind(node, Op::BasicBinaryOp, Some(op.mnemonic().to_string()), Some(op.symbol()));
                        }
                    }
                    OpcodeFamily::Compare => {
                        let result = self.func.dfg.inst_result(inst).expect("compare has a result");
                        let node = self.graph.get_or_add(result);
                        let symbol = match data {
                            InstructionData::IntCompare { cond, .. } => cond.symbol(),
                            InstructionData::FloatCompare { cond, .. } => cond.symbol(),
                            _ => unreachable!(),
                        };
                        self.graph.set_kind(node, Op::BasicBinaryOp, Some("cmp".to_string()), Some(symbol));
                    }
                    OpcodeFamily::AtomicRmw | OpcodeFamily::AtomicCas => {
                        let result = self.func.dfg.inst_result(inst).expect("atomic op has a result");
                        let node = self.graph.get_or_add(result);
                        self.graph.set_kind(node, Op::BasicBinaryOp, Some("atomic".to_string()), None);
                    }
                    OpcodeFamily::Load => {
                        let result = self.func.dfg.inst_result(inst).expect("load has a result");
                        let node = self.graph.get_or_add(result);
                        self.graph.set_kind(node, Op::Load, Some("ld".to_string()), None);
                    }
                    OpcodeFamily::Store => {
                        // By construction the memory-ordering transform has
                        // already rewritten every store into a token-producing
                        // call; a bare `Store` reaching the builder means it
                        // was never run, which Phase D has nothing to wire.
                    }
                    OpcodeFamily::Phi => {
                        if let InstructionData::Phi { incoming } = &data {
                            let pred_count = self.cfg.pred_count(block);
                            if incoming.len() != pred_count {
                                return Err(MalformedIrError::PhiArityMismatch {
                                    block,
                                    expected: pred_count,
                                    got: incoming.len(),
                                }
                                .into());
                            }
                        }
                        let result = self.func.dfg.inst_result(inst).expect("phi has a result");
                        let node = self.graph.get_or_add(result);
                        self.graph.set_kind(node, Op::Merge, Some("M".to_string()), None);
                    }
                    OpcodeFamily::Call => {
                        if let InstructionData::Call { callee, .. } = data {
                            let result = self.func.dfg.inst_result(inst).expect("call has a result");
                            let node = self.graph.get_or_add(result);
                            match &self.func.dfg.ext_func(callee).callee {
                                Callee::Intrinsic(IntrinsicKind::Load, _) => {
                                    self.graph.set_kind(node, Op::Load, Some("ld".to_string()), None)
                                }
                                Callee::Intrinsic(IntrinsicKind::Store, _) => {
                                    self.graph.set_kind(node, Op::Store, Some("st".to_string()), None)
                                }
                                Callee::Intrinsic(IntrinsicKind::EntryToken, _) => {
                                    self.graph.set_kind(node, Op::Stream, Some("entry.token".to_string()), None)
                                }
                                Callee::External(_) => {
                                    self.graph.set_kind(node, Op::Call, Some("call".to_string()), None)
                                }
                            }
                        }
                    }
                    OpcodeFamily::Return => {
                        if let InstructionData::Return { args } = data {
                            for (i, _) in args.iter().enumerate() {
                                let sink = self.graph.add_node(Op::FunctionOutput, None, Some(format!("out{i}")));
                                self.return_sinks.insert((inst, i), sink);
                            }
                        }
                    }
                }
            }
            debug_assert_eq!(
                self.func.layout.terminator(block),
                Some(terminator),
                "Phase A must not mutate layout"
            );
        }

        for &param in self.func.params() {
            let node = self.graph.get_or_add(param);
            self.graph.set_kind(node, Op::FunctionInput, None, None);
        }

        Ok(())
    }

    /// **Phase B — Conditional branches.** Materializes a TrueSteer/FalseSteer
    /// pair per `brif`, gates them on the condition and the function-entry
    /// stream, and links each steer to its successor's first meaningful
    /// instruction.
    fn phase_b_conditional_branches(&mut self) {
        let blocks: Vec<Block> = self.func.layout.blocks().collect();
        for block in blocks {
            let Some(terminator) = self.func.layout.terminator(block) else {
                continue;
            };
            let InstructionData::Brif {
                cond,
                then_block,
                else_block,
            } = self.func.dfg.inst(terminator).clone()
            else {
                continue;
            };

            let true_steer = self.graph.add_node(Op::TrueSteer, None, Some("T".to_string()));
            let false_steer = self.graph.add_node(Op::FalseSteer, None, Some("F".to_string()));
            wire_value_to_node(self.func, &mut self.graph, Some(cond), Some(true_steer));
            wire_value_to_node(self.func, &mut self.graph, Some(cond), Some(false_steer));

            let stream = self.entry_stream();
            self.graph.add_edge(Some(stream), Some(true_steer));
            self.graph.add_edge(Some(stream), Some(false_steer));

            for (steer, succ) in [(true_steer, then_block), (false_steer, else_block)] {
                if let Some(target_inst) = self.first_meaningful_inst(succ) {
                    if let Some(target_value) = self.func.dfg.inst_result(target_inst) {
                        let target_node = self.graph.get_or_add(target_value);
                        self.graph.add_edge(Some(steer), Some(target_node));
                    }
                }
            }

            self.branch_steers.insert(terminator, (true_steer, false_steer));
            self.stats.steers += 2;
        }
    }

    /// **Phase C — Selects.** A select never becomes a node; its users are
    /// wired directly from both of a fresh steer pair.
    fn phase_c_selects(&mut self) {
        for block in self.func.layout.blocks().collect::<Vec<_>>() {
            for inst in self.func.layout.block_insts(block).to_vec() {
                let InstructionData::Select {
                    cond,
                    if_true,
                    if_false,
                } = self.func.dfg.inst(inst).clone()
                else {
                    continue;
                };

                let true_steer = self.graph.add_node(Op::TrueSteer, None, Some("T".to_string()));
                let false_steer = self.graph.add_node(Op::FalseSteer, None, Some("F".to_string()));
                wire_value_to_node(self.func, &mut self.graph, Some(cond), Some(true_steer));
                wire_value_to_node(self.func, &mut self.graph, Some(cond), Some(false_steer));
                wire_value_to_node(self.func, &mut self.graph, Some(if_true), Some(true_steer));
                wire_value_to_node(self.func, &mut self.graph, Some(if_false), Some(false_steer));

                let select_value = self.func.dfg.inst_result(inst).expect("select has a result");
                for &user_inst in self.func.dfg.users(select_value) {
                    if self.is_non_materializing_user(user_inst) {
                        continue;
                    }
                    // A select can feed a `Return` directly; `Return` has no
                    // result of its own, so it is never reached through the
                    // `inst_result` branch below. Route it to the
                    // `FunctionOutput` sink Phase A already created instead.
                    if let InstructionData::Return { args } = self.func.dfg.inst(user_inst) {
                        for (i, &arg) in args.iter().enumerate() {
                            if arg == select_value {
                                if let Some(&sink) = self.return_sinks.get(&(user_inst, i)) {
                                    self.graph.add_edge(Some(true_steer), Some(sink));
                                    self.graph.add_edge(Some(false_steer), Some(sink));
                                }
                            }
                        }
                        continue;
                    }
                    if let Some(user_value) = self.func.dfg.inst_result(user_inst) {
                        let user_node = self.graph.get_or_add(user_value);
                        self.graph.add_edge(Some(true_steer), Some(user_node));
                        self.graph.add_edge(Some(false_steer), Some(user_node));
                    }
                }
                self.stats.steers += 2;
            }
        }
    }

    /// **Phase D — Data dependencies.** Wires loads, stores, and pure
    /// operators. Argument fanout is left to Phase F; constants are wired
    /// here since Phase A has already materialized a node for every one.
    fn phase_d_data_dependencies(&mut self) {
        for block in self.func.layout.blocks().collect::<Vec<_>>() {
            for inst in self.func.layout.block_insts(block).to_vec() {
                let data = self.func.dfg.inst(inst).clone();
                match data.family() {
                    OpcodeFamily::Load => {
                        if let InstructionData::Load { ptr } = data {
                            let result = self.func.dfg.inst_result(inst).expect("load has a result");
                            let node = self.graph.get_or_add(result);
                            wire_value_to_node(self.func, &mut self.graph, Some(ptr), Some(node));
                        }
                    }
                    OpcodeFamily::Call => {
                        // Covers both loads and stores (already rewritten
                        // into intrinsic calls by the memory-ordering
                        // transform) and ordinary external calls; all three
                        // wire every operand into their own node the same
                        // way. Stores get no further wiring to their users
                        // here (§4.5 Phase D) — their token output reaches
                        // its users only through the φ a Merge/Carry builds
                        // in Phase E.
                        if let InstructionData::Call { args, .. } = data {
                            let result = self.func.dfg.inst_result(inst).expect("call has a result");
                            let node = self.graph.get_or_add(result);
                            for arg in args {
                                wire_value_to_node(self.func, &mut self.graph, Some(arg), Some(node));
                            }
                        }
                    }
                    OpcodeFamily::BinaryOp
                    | OpcodeFamily::Compare
                    | OpcodeFamily::AtomicRmw
                    | OpcodeFamily::AtomicCas => {
                        let result = self.func.dfg.inst_result(inst).expect("has a result");
                        let self_node = self.graph.get_or_add(result);
                        for arg in data.args() {
                            if let ValueDef::Const(_) = self.func.dfg.value_def(arg) {
                                let c = self.graph.get_or_add(arg);
                                self.graph.add_edge(Some(c), Some(self_node));
                            }
                        }
                        for &user_inst in self.func.dfg.users(result) {
                            if self.is_non_materializing_user(user_inst) {
                                continue;
                            }
                            if let Some(user_value) = self.func.dfg.inst_result(user_inst) {
                                let user_node = self.graph.get_or_add(user_value);
                                self.graph.add_edge(Some(self_node), Some(user_node));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    /// Finds the decider for a `Carry`: the condition of the preheader's
    /// entering branch, falling back to an in-loop block whose branch exits
    /// the loop (§4.5 Phase E, Carry case).
    fn loop_exit_decider(&self, lp: Loop) -> Option<Value> {
        if let Some(preheader) = self.loops.preheader(lp, &self.cfg) {
            if let Some(term) = self.func.layout.terminator(preheader) {
                if let InstructionData::Brif { cond, .. } = self.func.dfg.inst(term) {
                    return Some(*cond);
                }
            }
        }
        for block in self.func.layout.blocks() {
            if !self.loops.contains(lp, block) {
                continue;
            }
            let Some(term) = self.func.layout.terminator(block) else {
                continue;
            };
            let InstructionData::Brif { cond, .. } = self.func.dfg.inst(term) else {
                continue;
            };
            if self.cfg.succ_iter(block).any(|s| !self.loops.contains(lp, s)) {
                return Some(*cond);
            }
        }
        None
    }

    /// **Phase E — φ-nodes.** Re-tags a loop header's φ as `Carry` and wires
    /// its decider; everything else stays `Merge`, steered through the
    /// branch that produced each incoming value.
    fn phase_e_phi_nodes(&mut self) {
        for block in self.func.layout.blocks().collect::<Vec<_>>() {
            for inst in self.func.layout.block_insts(block).to_vec() {
                let InstructionData::Phi { incoming } = self.func.dfg.inst(inst).clone() else {
                    continue;
                };
                let result = self.func.dfg.inst_result(inst).expect("phi has a result");
                let node = self.graph.get_or_add(result);

                let carry_loop = self.loops.loop_of(block).filter(|&lp| {
                    self.loops.is_header(lp, block)
                        && incoming.iter().any(|&(pred, _)| self.loops.contains(lp, pred))
                });

                if let Some(lp) = carry_loop {
                    self.graph.set_kind(node, Op::Carry, Some("C".to_string()), None);
                    self.stats.carries += 1;

                    let decider = self.loop_exit_decider(lp);
                    if let Some(decider) = decider {
                        wire_value_to_node(self.func, &mut self.graph, Some(decider), Some(node));
                    }
                    for &(_, v) in &incoming {
                        wire_value_to_node(self.func, &mut self.graph, Some(v), Some(node));
                    }

                    // A constant incoming value equal to the decider
                    // comparison's own constant operand is redundant (§9
                    // Open Question (b)): the comparison already captures
                    // the literal, so drop the duplicate node.
                    if let Some(decider_const) = decider.and_then(|d| self.decider_literal(d)) {
                        for &(_, v) in &incoming {
                            if let ValueDef::Const(vc) = self.func.dfg.value_def(v) {
                                if vc == decider_const {
                                    if let Some(n) = self.graph.find_node(v) {
                                        self.graph.remove_node(n);
                                    }
                                }
                            }
                        }
                    }
                } else {
                    self.graph.set_kind(node, Op::Merge, Some("M".to_string()), None);
                    self.stats.merges += 1;

                    for &(pred, v) in &incoming {
                        let steer = self.func.layout.terminator(pred).and_then(|term| {
                            let &(ts, fs) = self.branch_steers.get(&term)?;
                            match self.func.dfg.inst(term) {
                                InstructionData::Brif { then_block, .. } => {
                                    Some(if block == *then_block { ts } else { fs })
                                }
                                _ => None,
                            }
                        });

                        match steer {
                            Some(steer) => {
                                wire_value_to_node(self.func, &mut self.graph, Some(v), Some(steer));
                                self.graph.add_edge(Some(steer), Some(node));
                                if let Some(term) = self.func.layout.terminator(pred) {
                                    if let InstructionData::Brif { cond, .. } = self.func.dfg.inst(term) {
                                        let cond = *cond;
                                        wire_value_to_node(self.func, &mut self.graph, Some(cond), Some(node));
                                    }
                                }
                            }
                            None => {
                                wire_value_to_node(self.func, &mut self.graph, Some(v), Some(node));
                            }
                        }
                    }
                }

                for &user_inst in self.func.dfg.users(result) {
                    if self.is_non_materializing_user(user_inst) {
                        continue;
                    }
                    if let Some(user_value) = self.func.dfg.inst_result(user_inst) {
                        let user_node = self.graph.get_or_add(user_value);
                        self.graph.add_edge(Some(node), Some(user_node));
                    }
                }
            }
        }
    }

    /// The constant operand of a comparison, if it has exactly one.
    fn decider_literal(&self, decider: Value) -> Option<crate::ir::ConstantValue> {
        let ValueDef::Result(inst) = self.func.dfg.value_def(decider) else {
            return None;
        };
        let args = match self.func.dfg.inst(inst) {
            InstructionData::IntCompare { args, .. } => *args,
            InstructionData::FloatCompare { args, .. } => *args,
            _ => return None,
        };
        args.iter().find_map(|&a| match self.func.dfg.value_def(a) {
            ValueDef::Const(c) => Some(c),
            _ => None,
        })
    }

    /// **Phase F — Argument fanout.** Wires every function argument into
    /// each of its users. The memory-dependency fanout this phase also names
    /// is left unimplemented per §9 Open Question (a): a conservative
    /// builder adds no such edges and relies solely on the token chain.
    fn phase_f_argument_fanout(&mut self) {
        let params: Vec<Value> = self.func.params().to_vec();
        for param in params {
            for &user_inst in self.func.dfg.users(param) {
                if self.is_non_materializing_user(user_inst) {
                    continue;
                }
                if let Some(user_value) = self.func.dfg.inst_result(user_inst) {
                    let user_node = self.graph.get_or_add(user_value);
                    wire_value_to_node(self.func, &mut self.graph, Some(param), Some(user_node));
                }
            }
        }
    }

    /// **Phase G — Return.** Wires every return operand into its sink. The
    /// builder performs no further IR mutation; the memory-ordering
    /// transform already did its rewriting in an earlier pass.
    fn phase_g_return(&mut self) {
        let sinks: Vec<((Inst, usize), NodeRef)> =
            self.return_sinks.iter().map(|(&k, &v)| (k, v)).collect();
        for ((inst, index), sink) in sinks {
            if let InstructionData::Return { args } = self.func.dfg.inst(inst) {
                if let Some(&arg) = args.get(index) {
                    // A select-valued operand was already wired straight from
                    // its steer pair in Phase C; running it through the
                    // resolver here too would recurse past the steers into
                    // the select's raw operands (the resolver has no
                    // "select" case, so it falls back to generic recursion).
                    if matches!(self.func.dfg.value_def(arg), ValueDef::Result(i) if matches!(self.func.dfg.inst(i).family(), OpcodeFamily::Select))
                    {
                        continue;
                    }
                    wire_value_to_node(self.func, &mut self.graph, Some(arg), Some(sink));
                }
            }
        }
    }

    fn finish(self) -> (CustomDataflowGraph, Stats) {
        let mut stats = self.stats;
        stats.nodes = self.graph.nodes().count();
        stats.edges = self.graph.edges().count();
        (self.graph, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Type;
    use crate::testutil::FunctionBuilder;

    #[test]
    fn straight_line_add_has_no_steers_or_merges() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block();
        b.switch_to_block(entry);
        let a = b.param(0);
        let bb = b.param(1);
        let sum = b.iadd(a, bb, Type::I32);
        b.ret(&[sum]);
        let func = b.finish();

        let (graph, stats) = build(&func).unwrap();
        assert_eq!(stats.steers, 0);
        assert_eq!(stats.merges, 0);
        assert_eq!(stats.carries, 0);

        let sum_node = graph.find_node(sum).expect("sum has a node");
        assert_eq!(graph.node(sum_node).kind, Op::BasicBinaryOp);
        assert_eq!(graph.node(sum_node).inputs().len(), 2);
    }

    #[test]
    fn diamond_if_else_produces_a_merge() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block();
        let then_blk = b.create_block();
        let else_blk = b.create_block();
        let join = b.create_block();
        b.switch_to_block(entry);
        let c = b.param(0);
        let cond = b.icmp(crate::ir::IntCC::Ne, c, {
            let zero = b.int_const(Type::I32, 0);
            zero
        });
        b.brif(cond, then_blk, else_blk);

        b.switch_to_block(then_blk);
        let x = b.param(1);
        let one = b.int_const(Type::I32, 1);
        let x1 = b.iadd(x, one, Type::I32);
        b.jump(join);

        b.switch_to_block(else_blk);
        let y = b.param(2);
        let one2 = b.int_const(Type::I32, 1);
        let y1 = b.iadd(y, one2, Type::I32);
        b.jump(join);

        b.switch_to_block(join);
        let merged = b.phi(&[(then_blk, x1), (else_blk, y1)], Type::I32);
        b.ret(&[merged]);
        let func = b.finish();

        let (graph, stats) = build(&func).unwrap();
        assert_eq!(stats.steers, 2);
        assert_eq!(stats.merges, 1);
        assert_eq!(stats.carries, 0);

        let merge_node = graph.find_node(merged).expect("phi has a node");
        assert_eq!(graph.node(merge_node).kind, Op::Merge);
    }

    #[test]
    fn loop_header_phi_becomes_a_carry() {
        let mut b = FunctionBuilder::with_signature(
            "f",
            crate::ir::Signature {
                params: vec![Type::Ptr, Type::I32],
                returns: vec![],
            },
        );
        let entry = b.create_block();
        let header = b.create_block();
        let body = b.create_block();
        let exit = b.create_block();

        b.switch_to_block(entry);
        let zero = b.int_const(Type::I32, 0);
        b.jump(header);

        b.switch_to_block(header);
        let placeholder = b.int_const(Type::I32, 0);
        let i = b.phi(&[(entry, zero), (body, placeholder)], Type::I32);
        let n = b.param(1);
        let cond = b.icmp(crate::ir::IntCC::Slt, i, n);
        b.brif(cond, body, exit);

        b.switch_to_block(body);
        let one = b.int_const(Type::I32, 1);
        let next_i = b.iadd(i, one, Type::I32);
        b.jump(header);

        b.switch_to_block(exit);
        b.ret(&[]);
        let mut func = b.finish();

        // Patch the placeholder back-edge value now that `next_i` exists.
        patch_phi_incoming(&mut func, header, body, next_i);

        // No memory ops here, so the memory-ordering transform is skipped:
        // running it would insert a token phi at every block (including
        // `header`), which would itself become a second `Carry` and muddy
        // the count this test is checking.
        let (_graph, stats) = build(&func).unwrap();
        assert_eq!(stats.carries, 1);
    }

    /// Test-only helper: rewrites one incoming edge of the phi at the head
    /// of `block` to `new_value`, matched by predecessor. Needed because a
    /// loop-carried phi's back-edge value does not exist yet when the phi
    /// itself is built.
    fn patch_phi_incoming(func: &mut Function, block: Block, pred: Block, new_value: Value) {
        let phi_inst = func.layout.block_insts(block)[0];
        if let InstructionData::Phi { incoming } = func.dfg.inst(phi_inst).clone() {
            let incoming = incoming
                .into_iter()
                .map(|(p, v)| if p == pred { (p, new_value) } else { (p, v) })
                .collect();
            func.dfg.replace_inst(phi_inst, InstructionData::Phi { incoming });
            func.dfg.compute_uses();
        }
    }
}

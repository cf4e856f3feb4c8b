//! Lowers a single function's SSA IR into a RipTide-style dataflow graph
//! suitable for mapping onto a coarse-grained reconfigurable array.
//!
//! The pipeline, leaves first: the [`ir`] model → [`mem_order`] (rewrites
//! loads/stores into a token-passing form) → [`builder`] (the main
//! multi-phase algorithm, backed by [`flowgraph`], [`dominator_tree`],
//! [`loop_analysis`], [`graph`] and [`resolve`]) → [`printer`] (DOT output).
//! [`build_and_print`] runs the whole thing for a function that already has
//! a home on disk for its `dfg.dot`; callers that want the graph without the
//! side effect should call [`mem_order::run`] and [`builder::build`]
//! directly.

pub mod builder;
pub mod dominator_tree;
pub mod error;
pub mod flowgraph;
pub mod graph;
pub mod ir;
pub mod loop_analysis;
pub mod mem_order;
pub mod printer;
pub mod resolve;

#[cfg(any(test, feature = "testing_hooks"))]
pub mod testutil;

pub use builder::{build, Stats};
pub use error::{BuildError, MalformedIrError};
pub use graph::{CustomDataflowGraph, DataflowOperatorType};
pub use ir::Function;

/// Runs the memory-ordering transform and the builder over `func`, then
/// writes `dfg.dot` to the current working directory. `func` must not be a
/// declaration.
pub fn build_and_print(
    func: &mut Function,
    cache: &mut mem_order::IntrinsicCache,
) -> Result<Stats, BuildError> {
    mem_order::run(func, cache)?;
    let (graph, stats) = build(func)?;
    printer::write_dot_file(&graph);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IntCC, Signature, Type};
    use crate::testutil::FunctionBuilder;

    /// `int f(int a, int b) { return a + b; }` (§8 scenario 1): two
    /// `FunctionInput`s feed one `BasicBinaryOp`, no steers or merges.
    #[test]
    fn scenario_straight_line_add() {
        let mut b = FunctionBuilder::with_signature(
            "f",
            Signature {
                params: vec![Type::I32, Type::I32],
                returns: vec![Type::I32],
            },
        );
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
        assert!(graph.nodes().any(|(_, n)| n.kind == DataflowOperatorType::BasicBinaryOp));
        assert!(
            graph
                .nodes()
                .filter(|(_, n)| n.kind == DataflowOperatorType::FunctionInput)
                .count()
                >= 2
        );
    }

    /// `void f(int* a, int m) { a[m] = 1; }` (§8 scenario 5): a single
    /// `Store` fed by the address, the value, and the entry token; no
    /// steers, no merges.
    #[test]
    fn scenario_single_store() {
        let mut b = FunctionBuilder::with_signature(
            "f",
            Signature {
                params: vec![Type::Ptr, Type::I32],
                returns: vec![],
            },
        );
        let entry = b.create_block();
        b.switch_to_block(entry);
        let base = b.param(0);
        let m = b.param(1);
        let addr = b.addr_arith(base, &[m]);
        let one = b.int_const(Type::I32, 1);
        b.store(addr, one);
        b.ret(&[]);
        let mut func = b.finish();

        let mut cache = mem_order::IntrinsicCache::new();
        mem_order::run(&mut func, &mut cache).unwrap();
        let (graph, stats) = build(&func).unwrap();

        assert_eq!(stats.steers, 0);
        assert_eq!(stats.merges, 0);
        let stores: Vec<_> = graph
            .nodes()
            .filter(|(_, n)| n.kind == DataflowOperatorType::Store)
            .collect();
        assert_eq!(stores.len(), 1);

        let store_inputs = graph.node(stores[0].0).inputs();
        let sources: Vec<_> = store_inputs
            .iter()
            .map(|&e| graph.edges().find(|(r, _)| *r == e).unwrap().1.src)
            .map(|n| graph.node(n).kind)
            .collect();
        assert!(
            sources.contains(&DataflowOperatorType::Constant),
            "the stored literal 1 must reach the store as a data edge, not be dropped"
        );
    }

    /// `int f(int c, int x, int y) { if (c) return x+1; else return y+1; }`
    /// (§8 scenario 4): two `BasicBinaryOp`s gated by a steer pair, merged at
    /// the return join with `c` as decider.
    #[test]
    fn scenario_if_else_merge() {
        let mut b = FunctionBuilder::with_signature(
            "f",
            Signature {
                params: vec![Type::I32, Type::I32, Type::I32],
                returns: vec![Type::I32],
            },
        );
        let entry = b.create_block();
        let then_blk = b.create_block();
        let else_blk = b.create_block();
        let join = b.create_block();

        b.switch_to_block(entry);
        let c = b.param(0);
        let zero = b.int_const(Type::I32, 0);
        let cond = b.icmp(IntCC::Ne, c, zero);
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

        // No memory ops here, so the memory-ordering transform is skipped:
        // it would otherwise insert a token phi at `then_blk`/`else_blk`/
        // `join` and inflate the merge count below.
        let (graph, stats) = build(&func).unwrap();

        assert_eq!(stats.steers, 2);
        assert_eq!(stats.merges, 1);
        let binops = graph
            .nodes()
            .filter(|(_, n)| n.kind == DataflowOperatorType::BasicBinaryOp)
            .count();
        assert_eq!(binops, 2);
    }

    #[test]
    fn declaration_passed_to_builder_is_an_error() {
        let func = FunctionBuilder::new("decl").finish_empty();
        assert!(matches!(build(&func), Err(BuildError::MalformedIr(MalformedIrError::DeclarationPassedToBuilder))));
    }
}

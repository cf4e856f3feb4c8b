//! Integration coverage for the concrete scenarios not already exercised by
//! the unit tests embedded in `lib.rs`/`builder.rs`: a select, a loop with
//! memory operations, and nested loops. These are the scenarios that need
//! both `mem_order::run` and `builder::build` working together.

use riptide_dfg::testutil::FunctionBuilder;
use riptide_dfg::{build, mem_order, DataflowOperatorType as Op};

use riptide_dfg::ir::{Block, Function, InstructionData, IntCC, Signature, Type, Value};

/// Rewrites one incoming edge of the phi at the head of `block` to
/// `new_value`, matched by predecessor. A loop-carried phi's back-edge value
/// does not exist yet when the phi itself is built, so tests patch it in
/// after the fact.
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

/// `int f(int a){ return (a>0)? a : -a; }` (§8 scenario 2): the select
/// becomes a steer pair on `a>0`, each steer feeding the return sink
/// directly; no `Merge` (a select is selection, not a φ).
#[test]
fn scenario_select_feeds_return() {
    let mut b = FunctionBuilder::with_signature(
        "f",
        Signature {
            params: vec![Type::I32],
            returns: vec![Type::I32],
        },
    );
    let entry = b.create_block();
    b.switch_to_block(entry);
    let a = b.param(0);
    let zero = b.int_const(Type::I32, 0);
    let cond = b.icmp(IntCC::Sgt, a, zero);
    let neg_a = b.binop(riptide_dfg::ir::BinOp::Sub, zero, a, Type::I32);
    let sel = b.select(cond, a, neg_a, Type::I32);
    b.ret(&[sel]);
    let func = b.finish();

    let (graph, stats) = build(&func).unwrap();

    assert_eq!(stats.merges, 0);
    assert_eq!(stats.steers, 2);
    // The select itself never becomes a node.
    assert!(graph.find_node(sel).is_none());

    let outputs: Vec<_> = graph.nodes().filter(|(_, n)| n.kind == Op::FunctionOutput).collect();
    assert_eq!(outputs.len(), 1);
    let (sink, sink_data) = outputs[0];
    assert_eq!(sink_data.inputs().len(), 2, "both steers feed the one return sink");

    let steer_kinds: Vec<_> = sink_data
        .inputs()
        .iter()
        .map(|&e| graph.edges().find(|(r, _)| *r == e).unwrap().1.src)
        .map(|n| graph.node(n).kind)
        .collect();
    assert!(steer_kinds.contains(&Op::TrueSteer));
    assert!(steer_kinds.contains(&Op::FalseSteer));
    let _ = sink;
}

/// `void f(int*A,int n){ for(int i=0;i<n;i++) A[i]=A[i]+i; }` (§8 scenario
/// 3): the induction φ becomes a `Carry`, address arithmetic stays nodeless,
/// and the in-loop load/store are connected through the memory-token chain.
#[test]
fn scenario_loop_with_memory_ops() {
    let mut b = FunctionBuilder::with_signature(
        "f",
        Signature {
            params: vec![Type::Ptr, Type::I32],
            returns: vec![],
        },
    );
    let entry = b.create_block();
    let header = b.create_block();
    let body = b.create_block();
    let exit = b.create_block();

    b.switch_to_block(entry);
    let array = b.param(0);
    let n = b.param(1);
    let zero = b.int_const(Type::I32, 0);
    b.jump(header);

    b.switch_to_block(header);
    let i_placeholder = b.int_const(Type::I32, 0);
    let i = b.phi(&[(entry, zero), (body, i_placeholder)], Type::I32);
    let cond = b.icmp(IntCC::Slt, i, n);
    b.brif(cond, body, exit);

    b.switch_to_block(body);
    let addr = b.addr_arith(array, &[i]);
    let loaded = b.load(addr, Type::I32);
    let sum = b.iadd(loaded, i, Type::I32);
    b.store(addr, sum);
    let one = b.int_const(Type::I32, 1);
    let next_i = b.iadd(i, one, Type::I32);
    b.jump(header);

    b.switch_to_block(exit);
    b.ret(&[]);
    let mut func = b.finish();
    patch_phi_incoming(&mut func, header, body, next_i);

    let mut cache = mem_order::IntrinsicCache::new();
    mem_order::run(&mut func, &mut cache).unwrap();
    let (graph, stats) = build(&func).unwrap();

    assert!(stats.carries >= 1, "the induction phi must become a Carry");
    let i_node = graph.find_node(i).expect("induction variable has a node");
    assert_eq!(graph.node(i_node).kind, Op::Carry);
    // The decider plus both incoming values (the initial `0` and the
    // back-edge `next_i`) must each be a data edge into the Carry.
    assert_eq!(
        graph.node(i_node).inputs().len(),
        3,
        "the Carry must carry its initial value, not just its back-edge"
    );

    // Address arithmetic is plumbing: it never gets a node of its own.
    assert!(graph.find_node(addr).is_none());

    let loads: Vec<_> = graph.nodes().filter(|(_, n)| n.kind == Op::Load).collect();
    let stores: Vec<_> = graph.nodes().filter(|(_, n)| n.kind == Op::Store).collect();
    assert_eq!(loads.len(), 1);
    assert_eq!(stores.len(), 1);
    assert!(!graph.node(loads[0].0).inputs().is_empty(), "load is fed by address and token");
    assert!(!graph.node(stores[0].0).inputs().is_empty(), "store is fed by address, value, and token");
}

/// Nested loops with an inner-loop counter φ (§8 scenario 6): the inner φ
/// becomes a `Carry` with its own decider, and the outer φ becomes a
/// separate `Carry` with the outer decider.
#[test]
fn scenario_nested_loops() {
    let mut b = FunctionBuilder::with_signature(
        "f",
        Signature {
            params: vec![Type::I32, Type::I32],
            returns: vec![],
        },
    );
    let outer_entry = b.create_block();
    let outer_header = b.create_block();
    let outer_body = b.create_block();
    let inner_header = b.create_block();
    let inner_body = b.create_block();
    let inner_exit = b.create_block();
    let outer_exit = b.create_block();

    b.switch_to_block(outer_entry);
    let n = b.param(0);
    let m = b.param(1);
    let zero_i = b.int_const(Type::I32, 0);
    b.jump(outer_header);

    b.switch_to_block(outer_header);
    let i_placeholder = b.int_const(Type::I32, 0);
    let i = b.phi(&[(outer_entry, zero_i), (inner_exit, i_placeholder)], Type::I32);
    let cond_outer = b.icmp(IntCC::Slt, i, n);
    b.brif(cond_outer, outer_body, outer_exit);

    b.switch_to_block(outer_body);
    b.jump(inner_header);

    b.switch_to_block(inner_header);
    let zero_j = b.int_const(Type::I32, 0);
    let j_placeholder = b.int_const(Type::I32, 0);
    let j = b.phi(&[(outer_body, zero_j), (inner_body, j_placeholder)], Type::I32);
    let cond_inner = b.icmp(IntCC::Slt, j, m);
    b.brif(cond_inner, inner_body, inner_exit);

    b.switch_to_block(inner_body);
    let one_j = b.int_const(Type::I32, 1);
    let next_j = b.iadd(j, one_j, Type::I32);
    b.jump(inner_header);

    b.switch_to_block(inner_exit);
    let one_i = b.int_const(Type::I32, 1);
    let next_i = b.iadd(i, one_i, Type::I32);
    b.jump(outer_header);

    b.switch_to_block(outer_exit);
    b.ret(&[]);
    let mut func = b.finish();
    patch_phi_incoming(&mut func, inner_header, inner_body, next_j);
    patch_phi_incoming(&mut func, outer_header, inner_exit, next_i);

    let (graph, stats) = build(&func).unwrap();

    assert!(stats.carries >= 2, "both the inner and outer induction phis become Carries");

    let i_node = graph.find_node(i).expect("outer induction variable has a node");
    let j_node = graph.find_node(j).expect("inner induction variable has a node");
    assert_eq!(graph.node(i_node).kind, Op::Carry);
    assert_eq!(graph.node(j_node).kind, Op::Carry);
    assert_ne!(i_node, j_node);

    // Each Carry is wired to its own loop's decider, not the other one's.
    let cond_outer_node = graph.find_node(cond_outer).expect("outer decider has a node");
    let cond_inner_node = graph.find_node(cond_inner).expect("inner decider has a node");
    assert_ne!(cond_outer_node, cond_inner_node);
}

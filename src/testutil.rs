//! A small function-building DSL for unit tests, gated behind the
//! `testing_hooks` feature: no SSA variable tracking, no block parameters,
//! just "append this instruction to the block I'm switched to".

use crate::ir::{
    Block, BinOp, Callee, CastKind, ConstantValue, Function, FuncRef, Inst, InstructionData,
    IntCC, Signature, Type, Value,
};
use smallvec::SmallVec;
use std::collections::HashSet;

pub struct FunctionBuilder {
    func: Function,
    current: Option<Block>,
    appended: HashSet<Block>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_signature(name, Signature::default())
    }

    pub fn with_signature(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            func: Function::new(name, signature),
            current: None,
            appended: HashSet::new(),
        }
    }

    /// A function with no blocks at all: a declaration.
    pub fn finish_empty(self) -> Function {
        self.func
    }

    pub fn create_block(&mut self) -> Block {
        self.func.make_block()
    }

    /// Switches the insertion point to `block`, appending it to the layout
    /// the first time it is visited.
    pub fn switch_to_block(&mut self, block: Block) -> &mut Self {
        if self.appended.insert(block) {
            self.func.append_block(block);
        }
        self.current = Some(block);
        self
    }

    fn cur(&self) -> Block {
        self.current.expect("switch_to_block must be called first")
    }

    pub fn param(&self, index: usize) -> Value {
        self.func.params()[index]
    }

    pub fn bool_const(&mut self, value: bool) -> Value {
        self.func.dfg.make_const(Type::I1, ConstantValue::Bool(value))
    }

    pub fn int_const(&mut self, ty: Type, value: i64) -> Value {
        self.func.dfg.make_const(ty, ConstantValue::Int(value))
    }

    pub fn iadd(&mut self, a: Value, b: Value, ty: Type) -> Value {
        self.binop(BinOp::Add, a, b, ty)
    }

    pub fn addr_arith(&mut self, base: Value, indices: &[Value]) -> Value {
        let block = self.cur();
        let (_, v) = self.func.ins(
            block,
            InstructionData::AddrArith {
                base,
                indices: indices.iter().copied().collect(),
            },
            Type::Ptr,
        );
        v
    }

    pub fn binop(&mut self, op: BinOp, a: Value, b: Value, ty: Type) -> Value {
        let block = self.cur();
        let (_, v) = self
            .func
            .ins(block, InstructionData::BinaryOp { op, args: [a, b] }, ty);
        v
    }

    pub fn icmp(&mut self, cond: IntCC, a: Value, b: Value) -> Value {
        let block = self.cur();
        let (_, v) = self.func.ins(
            block,
            InstructionData::IntCompare { cond, args: [a, b] },
            Type::I1,
        );
        v
    }

    pub fn load(&mut self, ptr: Value, ty: Type) -> Value {
        let block = self.cur();
        let (_, v) = self.func.ins(block, InstructionData::Load { ptr }, ty);
        v
    }

    pub fn store(&mut self, ptr: Value, val: Value) -> Inst {
        let block = self.cur();
        self.func.ins_no_result(block, InstructionData::Store { ptr, val })
    }

    pub fn cast(&mut self, kind: CastKind, arg: Value, ty: Type) -> Value {
        let block = self.cur();
        let (_, v) = self.func.ins(block, InstructionData::Cast { kind, arg }, ty);
        v
    }

    pub fn select(&mut self, cond: Value, if_true: Value, if_false: Value, ty: Type) -> Value {
        let block = self.cur();
        let (_, v) = self.func.ins(
            block,
            InstructionData::Select {
                cond,
                if_true,
                if_false,
            },
            ty,
        );
        v
    }

    pub fn phi(&mut self, incoming: &[(Block, Value)], ty: Type) -> Value {
        let block = self.cur();
        let (_, v) = self.func.ins(
            block,
            InstructionData::Phi {
                incoming: incoming.iter().copied().collect(),
            },
            ty,
        );
        v
    }

    pub fn declare_func(&mut self, callee: Callee) -> FuncRef {
        self.func.dfg.declare_func(callee)
    }

    pub fn call(&mut self, func_ref: FuncRef, args: &[Value], ty: Type) -> Value {
        let block = self.cur();
        let (_, v) = self.func.ins(
            block,
            InstructionData::Call {
                callee: func_ref,
                args: args.iter().copied().collect(),
            },
            ty,
        );
        v
    }

    pub fn brif(&mut self, cond: Value, then_block: Block, else_block: Block) -> Inst {
        let block = self.cur();
        self.func.ins_no_result(
            block,
            InstructionData::Brif {
                cond,
                then_block,
                else_block,
            },
        )
    }

    pub fn jump(&mut self, dest: Block) -> Inst {
        let block = self.cur();
        self.func.ins_no_result(block, InstructionData::Jump { dest })
    }

    pub fn ret(&mut self, args: &[Value]) -> Inst {
        let block = self.cur();
        let args: SmallVec<[Value; 1]> = args.iter().copied().collect();
        self.func.ins_no_result(block, InstructionData::Return { args })
    }

    /// Finishes the function, computing the use-list index the resolver and
    /// builder expect to already be populated.
    pub fn finish(mut self) -> Function {
        self.func.dfg.compute_uses();
        self.func
    }
}

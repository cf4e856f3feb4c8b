//! The data-flow side of a [`Function`](super::function::Function): value and
//! instruction storage, independent of block layout.
//!
//! A `Function` owns one of these and one [`Layout`](super::layout::Layout);
//! the split lets the builder reorder or rewrite instructions (as the
//! memory-ordering transform does) without touching value identity.

use crate::ir::constant::ConstantValue;
use crate::ir::entities::{FuncRef, Inst, Value};
use crate::ir::instruction::{Callee, InstructionData};
use crate::ir::types::Type;
use cranelift_entity::{PrimaryMap, SecondaryMap};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// How a [`Value`] came to exist.
#[derive(Copy, Clone, Debug)]
pub enum ValueDef {
    /// The `index`-th formal parameter of the function.
    Param(u32),
    /// The single result of an instruction.
    Result(Inst),
    /// A literal.
    Const(ConstantValue),
}

/// External declarations: ordinary call targets and memory-token intrinsics.
#[derive(Clone, Debug)]
pub struct ExtFuncData {
    pub callee: Callee,
}

#[derive(Default)]
pub struct DataFlowGraph {
    values: PrimaryMap<Value, (ValueDef, Type)>,
    insts: PrimaryMap<Inst, InstructionData>,
    results: SecondaryMap<Inst, Option<Value>>,
    ext_funcs: PrimaryMap<FuncRef, ExtFuncData>,
    params: Vec<Value>,
    /// Populated on demand by [`DataFlowGraph::compute_uses`]; instructions
    /// that read a value. Kept separate from `values`/`insts` because it is
    /// not maintained incrementally (§4.1: "read-only except where noted").
    uses: FxHashMap<Value, SmallVec<[Inst; 4]>>,
}

impl DataFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_param(&mut self, ty: Type) -> Value {
        let index = self.params.len() as u32;
        let v = self.values.push((ValueDef::Param(index), ty));
        self.params.push(v);
        v
    }

    pub fn make_const(&mut self, ty: Type, value: ConstantValue) -> Value {
        self.values.push((ValueDef::Const(value), ty))
    }

    /// Appends an instruction with no result yet assigned; the caller fills
    /// in `set_result` if `data.has_result()`.
    pub fn make_inst(&mut self, data: InstructionData) -> Inst {
        self.insts.push(data)
    }

    pub fn make_inst_result(&mut self, inst: Inst, ty: Type) -> Value {
        let v = self.values.push((ValueDef::Result(inst), ty));
        self.results[inst] = Some(v);
        v
    }

    pub fn replace_inst(&mut self, inst: Inst, data: InstructionData) {
        self.insts[inst] = data;
    }

    pub fn inst(&self, inst: Inst) -> &InstructionData {
        &self.insts[inst]
    }

    pub fn inst_result(&self, inst: Inst) -> Option<Value> {
        self.results[inst]
    }

    pub fn value_def(&self, value: Value) -> ValueDef {
        self.values[value].0
    }

    pub fn value_type(&self, value: Value) -> Type {
        self.values[value].1
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn declare_func(&mut self, callee: Callee) -> FuncRef {
        self.ext_funcs.push(ExtFuncData { callee })
    }

    pub fn ext_func(&self, func_ref: FuncRef) -> &ExtFuncData {
        &self.ext_funcs[func_ref]
    }

    /// Rebuilds the use-list index from scratch. Must be called (once) after
    /// the IR is done being edited and before the pass-through resolver or
    /// builder Phase D/F look up users of a value.
    pub fn compute_uses(&mut self) {
        self.uses.clear();
        for (inst, data) in self.insts.iter() {
            for arg in data.args() {
                self.uses.entry(arg).or_default().push(inst);
            }
        }
    }

    pub fn users(&self, value: Value) -> &[Inst] {
        self.uses.get(&value).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

//! A function: the top-level input to the DFG builder.

use crate::ir::dfg::DataFlowGraph;
use crate::ir::entities::{Block, Inst, Value};
use crate::ir::instruction::{InstructionData, OpcodeFamily};
use crate::ir::layout::Layout;
use crate::ir::types::Type;
use std::fmt;

/// A function's formal parameter/return types. Bodies are the only thing
/// this crate cares about; declarations (no body) are skipped by the
/// memory-ordering transform per §4.2's contract and rejected by the builder
/// per §7 ("declaration passed to the builder" is a malformed-IR error).
#[derive(Clone, Debug, Default)]
pub struct Signature {
    pub params: Vec<Type>,
    pub returns: Vec<Type>,
}

/// The result of inspecting a block terminator, used by the CFG, dominator
/// tree, and loop analysis.
pub enum BranchInfo {
    Brif {
        cond: Value,
        then_block: Block,
        else_block: Block,
    },
    Jump(Block),
    /// `return`: no successors.
    NotABranch,
}

pub struct Function {
    pub name: String,
    pub signature: Signature,
    pub dfg: DataFlowGraph,
    pub layout: Layout,
    /// `None` for a declaration (no body). The memory-order transform and
    /// the DFG builder both treat a function with no blocks as a no-op input
    /// to leave unchanged, per §4.2's contract ("declarations are skipped").
    has_body: bool,
}

impl Function {
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        let mut f = Self {
            name: name.into(),
            signature,
            dfg: DataFlowGraph::new(),
            layout: Layout::new(),
            has_body: false,
        };
        for &ty in &f.signature.params.clone() {
            f.dfg.make_param(ty);
        }
        f
    }

    /// A declaration: a signature with no body.
    pub fn declaration(name: impl Into<String>, signature: Signature) -> Self {
        Self::new(name, signature)
    }

    pub fn is_declaration(&self) -> bool {
        !self.has_body
    }

    pub fn make_block(&mut self) -> Block {
        self.layout.make_block()
    }

    pub fn append_block(&mut self, block: Block) {
        self.has_body = true;
        self.layout.append_block(block);
    }

    /// Function arguments, in declaration order.
    pub fn params(&self) -> &[Value] {
        self.dfg.params()
    }

    /// Appends an instruction with no result to the end of `block`.
    pub fn ins_no_result(&mut self, block: Block, data: InstructionData) -> Inst {
        debug_assert!(!data.has_result());
        let inst = self.dfg.make_inst(data);
        self.layout.append_inst(block, inst);
        inst
    }

    /// Appends a single-result instruction to the end of `block`.
    pub fn ins(&mut self, block: Block, data: InstructionData, ty: Type) -> (Inst, Value) {
        debug_assert!(data.has_result());
        let inst = self.dfg.make_inst(data);
        self.layout.append_inst(block, inst);
        let v = self.dfg.make_inst_result(inst, ty);
        (inst, v)
    }

    /// Inspects `inst`'s terminator shape. Panics if `inst` is not a
    /// terminator-shaped instruction; callers only call this on a block's
    /// last instruction, which §6 guarantees is always a terminator.
    pub fn analyze_branch(&self, inst: Inst) -> BranchInfo {
        match self.dfg.inst(inst) {
            InstructionData::Brif {
                cond,
                then_block,
                else_block,
            } => BranchInfo::Brif {
                cond: *cond,
                then_block: *then_block,
                else_block: *else_block,
            },
            InstructionData::Jump { dest } => BranchInfo::Jump(*dest),
            InstructionData::Return { .. } => BranchInfo::NotABranch,
            other => panic!("{:?} is not a terminator", other.family()),
        }
    }

    pub fn is_conditional_branch(&self, inst: Inst) -> bool {
        matches!(self.dfg.inst(inst).family(), OpcodeFamily::Brif)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "function {}", self.name)
    }
}

//! A control flow graph represented as mappings of basic blocks to their
//! predecessors and successors.
//!
//! Successors are blocks; predecessors are `(block, branch/jump instruction)`
//! pairs, since a block can (in principle) be reached by more than one
//! instruction in the same predecessor. Adjacency is kept in plain
//! `SmallVec`s: this crate's blocks have at most two successors (a `brif`
//! has exactly two; nothing else branches), so a forest-backed set buys
//! nothing here.

use crate::ir::{BranchInfo, Function};
use crate::ir::{Block, Inst};
use cranelift_entity::SecondaryMap;
use smallvec::SmallVec;

/// A basic block denoted by its enclosing block and the branch/jump
/// instruction that targets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPredecessor {
    pub block: Block,
    pub inst: Inst,
}

impl BlockPredecessor {
    pub fn new(block: Block, inst: Inst) -> Self {
        Self { block, inst }
    }
}

#[derive(Clone, Default)]
struct CfgNode {
    predecessors: SmallVec<[BlockPredecessor; 4]>,
    successors: SmallVec<[Block; 2]>,
}

/// The control flow graph of a function.
pub struct ControlFlowGraph {
    data: SecondaryMap<Block, CfgNode>,
    valid: bool,
}

impl ControlFlowGraph {
    pub fn new() -> Self {
        Self {
            data: SecondaryMap::new(),
            valid: false,
        }
    }

    pub fn with_function(func: &Function) -> Self {
        let mut cfg = Self::new();
        cfg.compute(func);
        cfg
    }

    pub fn compute(&mut self, func: &Function) {
        self.data.clear();
        for block in func.layout.blocks() {
            self.compute_block(func, block);
        }
        self.valid = true;
    }

    fn compute_block(&mut self, func: &Function, block: Block) {
        let Some(terminator) = func.layout.terminator(block) else {
            return;
        };
        match func.analyze_branch(terminator) {
            BranchInfo::Brif {
                then_block,
                else_block,
                ..
            } => {
                self.add_edge(block, terminator, then_block);
                self.add_edge(block, terminator, else_block);
            }
            BranchInfo::Jump(dest) => self.add_edge(block, terminator, dest),
            BranchInfo::NotABranch => {}
        }
    }

    fn add_edge(&mut self, from: Block, from_inst: Inst, to: Block) {
        if !self.data[from].successors.contains(&to) {
            self.data[from].successors.push(to);
        }
        let pred = BlockPredecessor::new(from, from_inst);
        if !self.data[to].predecessors.contains(&pred) {
            self.data[to].predecessors.push(pred);
        }
    }

    pub fn pred_iter(&self, block: Block) -> impl Iterator<Item = BlockPredecessor> + '_ {
        self.data[block].predecessors.iter().copied()
    }

    pub fn succ_iter(&self, block: Block) -> impl Iterator<Item = Block> + '_ {
        self.data[block].successors.iter().copied()
    }

    pub fn pred_count(&self, block: Block) -> usize {
        self.data[block].predecessors.len()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl Default for ControlFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FunctionBuilder;

    #[test]
    fn empty() {
        let func = FunctionBuilder::new("f").finish_empty();
        ControlFlowGraph::with_function(&func);
    }

    #[test]
    fn branches_and_jumps() {
        let mut b = FunctionBuilder::new("f");
        let block0 = b.create_block();
        let block1 = b.create_block();
        let block2 = b.create_block();
        b.switch_to_block(block0);
        let cond = b.bool_const(true);
        b.brif(cond, block1, block2);
        b.switch_to_block(block1);
        b.jump(block2);
        b.switch_to_block(block2);
        b.ret(&[]);
        let func = b.finish();

        let cfg = ControlFlowGraph::with_function(&func);
        assert_eq!(cfg.pred_iter(block0).count(), 0);
        assert_eq!(cfg.pred_iter(block1).count(), 1);
        assert_eq!(cfg.pred_iter(block2).count(), 2);
        assert_eq!(cfg.succ_iter(block0).collect::<Vec<_>>(), [block1, block2]);
        assert_eq!(cfg.succ_iter(block2).count(), 0);
    }
}

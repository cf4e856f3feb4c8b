//! A dominator tree, computed with Keith D. Cooper's "Simple, Fast Dominator
//! Algorithm", adapted to this crate's `Vec`-backed CFG (no jump tables, at
//! most two successors per block).

use crate::flowgraph::{BlockPredecessor, ControlFlowGraph};
use crate::ir::{Block, Function};
use cranelift_entity::SecondaryMap;

const SEEN: u32 = 1;
const DONE: u32 = 2;

#[derive(Clone, Default)]
struct DomNode {
    /// Reverse post-order number; 0 means unreached.
    rpo_number: u32,
    idom: Option<Block>,
}

pub struct DominatorTree {
    nodes: SecondaryMap<Block, DomNode>,
    postorder: Vec<Block>,
    valid: bool,
}

impl DominatorTree {
    pub fn new() -> Self {
        Self {
            nodes: SecondaryMap::new(),
            postorder: Vec::new(),
            valid: false,
        }
    }

    pub fn with_function(func: &Function, cfg: &ControlFlowGraph) -> Self {
        let mut dt = Self::new();
        dt.compute(func, cfg);
        dt
    }

    pub fn compute(&mut self, func: &Function, cfg: &ControlFlowGraph) {
        debug_assert!(cfg.is_valid());
        self.compute_postorder(func, cfg);
        self.compute_domtree(cfg);
        self.valid = true;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_reachable(&self, block: Block) -> bool {
        self.nodes[block].rpo_number != 0
    }

    /// The CFG post-order used to compute this tree, entry block last.
    pub fn cfg_postorder(&self) -> &[Block] {
        &self.postorder
    }

    pub fn idom(&self, block: Block) -> Option<Block> {
        self.nodes[block].idom
    }

    /// Does `a` dominate `b`? (A block dominates itself.)
    pub fn dominates(&self, a: Block, b: Block) -> bool {
        if a == b {
            return true;
        }
        let mut cur = b;
        loop {
            match self.idom(cur) {
                Some(next) => {
                    if next == a {
                        return true;
                    }
                    cur = next;
                }
                None => return false,
            }
        }
    }

    fn compute_postorder(&mut self, func: &Function, cfg: &ControlFlowGraph) {
        self.nodes.clear();
        self.postorder.clear();
        let Some(entry) = func.layout.entry_block() else {
            return;
        };

        let mut stack = vec![entry];
        self.nodes[entry].rpo_number = SEEN;
        while let Some(block) = stack.pop() {
            match self.nodes[block].rpo_number {
                SEEN => {
                    self.nodes[block].rpo_number = DONE;
                    stack.push(block);
                    for succ in cfg.succ_iter(block) {
                        if self.nodes[succ].rpo_number == 0 {
                            self.nodes[succ].rpo_number = SEEN;
                            stack.push(succ);
                        }
                    }
                }
                DONE => self.postorder.push(block),
                _ => unreachable!(),
            }
        }
    }

    fn compute_domtree(&mut self, cfg: &ControlFlowGraph) {
        let Some((&entry, rest)) = self.postorder.as_slice().split_last() else {
            return;
        };
        self.nodes[entry].rpo_number = 2;
        self.nodes[entry].idom = None;

        for (idx, &block) in rest.iter().rev().enumerate() {
            self.nodes[block].rpo_number = idx as u32 + 3;
        }

        let mut changed = true;
        while changed {
            changed = false;
            for &block in rest.iter().rev() {
                let new_idom = self.compute_idom(block, cfg);
                if self.nodes[block].idom != new_idom {
                    self.nodes[block].idom = new_idom;
                    changed = true;
                }
            }
        }
    }

    fn compute_idom(&self, block: Block, cfg: &ControlFlowGraph) -> Option<Block> {
        let mut preds = cfg
            .pred_iter(block)
            .map(|BlockPredecessor { block, .. }| block)
            .filter(|&p| self.nodes[p].rpo_number > 0);

        let mut idom = preds.next()?;
        for pred in preds {
            idom = self.intersect(idom, pred);
        }
        Some(idom)
    }

    /// The nearest common dominator of `a` and `b`, walking up by RPO number.
    fn intersect(&self, mut a: Block, mut b: Block) -> Block {
        loop {
            match self.nodes[a].rpo_number.cmp(&self.nodes[b].rpo_number) {
                std::cmp::Ordering::Greater => {
                    a = self.nodes[a].idom.expect("reachable block has idom");
                }
                std::cmp::Ordering::Less => {
                    b = self.nodes[b].idom.expect("reachable block has idom");
                }
                std::cmp::Ordering::Equal => return a,
            }
        }
    }
}

impl Default for DominatorTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FunctionBuilder;

    #[test]
    fn diamond() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block();
        let left = b.create_block();
        let right = b.create_block();
        let join = b.create_block();
        b.switch_to_block(entry);
        let c = b.bool_const(true);
        b.brif(c, left, right);
        b.switch_to_block(left);
        b.jump(join);
        b.switch_to_block(right);
        b.jump(join);
        b.switch_to_block(join);
        b.ret(&[]);
        let func = b.finish();

        let cfg = ControlFlowGraph::with_function(&func);
        let dt = DominatorTree::with_function(&func, &cfg);
        assert_eq!(dt.idom(left), Some(entry));
        assert_eq!(dt.idom(right), Some(entry));
        assert_eq!(dt.idom(join), Some(entry));
        assert!(dt.dominates(entry, join));
        assert!(!dt.dominates(left, join));
    }
}

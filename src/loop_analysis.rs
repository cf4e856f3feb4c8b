//! Natural loop analysis over the dominator tree.
//!
//! This module follows the same shape as
//! [`dominator_tree`](crate::dominator_tree) and
//! [`flowgraph`](crate::flowgraph): a `compute`-then-query object built once
//! per function and consulted by the DFG builder's Phase E.

use crate::dominator_tree::DominatorTree;
use crate::flowgraph::ControlFlowGraph;
use crate::ir::{Block, Function};
use cranelift_entity::{entity_impl, PrimaryMap, SecondaryMap};

/// An opaque reference to a natural loop.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Loop(u32);
entity_impl!(Loop, "loop");

struct LoopData {
    header: Block,
    /// Blocks inside the loop whose terminator jumps back to `header`.
    latches: Vec<Block>,
    /// All blocks contained in the loop, including the header and latches.
    blocks: Vec<Block>,
    parent: Option<Loop>,
}

/// Natural loop information for one function, computed from its dominator
/// tree: a back edge `latch -> header` where `header` dominates `latch`
/// defines a loop, grown by the standard worklist over predecessors.
pub struct LoopAnalysis {
    loops: PrimaryMap<Loop, LoopData>,
    block_loop: SecondaryMap<Block, Option<Loop>>,
}

impl LoopAnalysis {
    pub fn new() -> Self {
        Self {
            loops: PrimaryMap::new(),
            block_loop: SecondaryMap::new(),
        }
    }

    pub fn with_function(func: &Function, cfg: &ControlFlowGraph, domtree: &DominatorTree) -> Self {
        let mut la = Self::new();
        la.compute(func, cfg, domtree);
        la
    }

    pub fn compute(&mut self, func: &Function, cfg: &ControlFlowGraph, domtree: &DominatorTree) {
        self.loops.clear();
        self.block_loop.clear();

        for header in func.layout.blocks() {
            if !domtree.is_reachable(header) {
                continue;
            }
            let latches: Vec<Block> = cfg
                .pred_iter(header)
                .map(|p| p.block)
                .filter(|&pred| domtree.dominates(header, pred))
                .collect();
            if latches.is_empty() {
                continue;
            }

            let blocks = self.collect_body(header, &latches, cfg);
            let lp = self.loops.push(LoopData {
                header,
                latches,
                blocks: blocks.clone(),
                parent: None,
            });
            for block in blocks {
                self.block_loop[block] = Some(lp);
            }
        }

        self.assign_parents();
    }

    /// Walks predecessors backward from every latch until `header` is
    /// reached, collecting every block found along the way.
    fn collect_body(&self, header: Block, latches: &[Block], cfg: &ControlFlowGraph) -> Vec<Block> {
        let mut body = vec![header];
        let mut worklist: Vec<Block> = latches.to_vec();
        while let Some(block) = worklist.pop() {
            if body.contains(&block) {
                continue;
            }
            body.push(block);
            for pred in cfg.pred_iter(block).map(|p| p.block) {
                if !body.contains(&pred) {
                    worklist.push(pred);
                }
            }
        }
        body
    }

    /// A loop containing a strict subset of another's blocks is nested
    /// inside it; the smallest enclosing loop becomes its parent.
    fn assign_parents(&mut self) {
        let keys: Vec<Loop> = self.loops.keys().collect();
        for &inner in &keys {
            let mut best: Option<Loop> = None;
            for &outer in &keys {
                if outer == inner {
                    continue;
                }
                if self.loops[outer].blocks.len() < self.loops[inner].blocks.len() {
                    continue;
                }
                if self.loops[outer].blocks.contains(&self.loops[inner].header) {
                    let smaller_than_best = match best {
                        Some(b) => self.loops[outer].blocks.len() < self.loops[b].blocks.len(),
                        None => true,
                    };
                    if smaller_than_best {
                        best = Some(outer);
                    }
                }
            }
            self.loops[inner].parent = best;
        }
    }

    pub fn loop_of(&self, block: Block) -> Option<Loop> {
        self.block_loop[block]
    }

    pub fn header(&self, lp: Loop) -> Block {
        self.loops[lp].header
    }

    pub fn latches(&self, lp: Loop) -> &[Block] {
        &self.loops[lp].latches
    }

    pub fn is_header(&self, lp: Loop, block: Block) -> bool {
        self.loops[lp].header == block
    }

    pub fn contains(&self, lp: Loop, block: Block) -> bool {
        self.loops[lp].blocks.contains(&block)
    }

    pub fn parent(&self, lp: Loop) -> Option<Loop> {
        self.loops[lp].parent
    }

    /// The loop's unique out-of-loop predecessor of its header, if any.
    pub fn preheader(&self, lp: Loop, cfg: &ControlFlowGraph) -> Option<Block> {
        let header = self.header(lp);
        let mut candidates = cfg
            .pred_iter(header)
            .map(|p| p.block)
            .filter(|&pred| !self.contains(lp, pred));
        let preheader = candidates.next()?;
        if candidates.next().is_some() {
            return None;
        }
        Some(preheader)
    }
}

impl Default for LoopAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

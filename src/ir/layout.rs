//! Ordering of blocks and instructions within a function, independent of
//! value identity. A `Vec`-backed ordering, since this crate never needs the
//! O(1) mid-block splicing a production assembler-level IR wants.

use crate::ir::entities::{Block, Inst};
use cranelift_entity::{PrimaryMap, SecondaryMap};

#[derive(Default, Clone)]
struct BlockNode {
    insts: Vec<Inst>,
}

#[derive(Default)]
pub struct Layout {
    order: Vec<Block>,
    blocks: PrimaryMap<Block, BlockNode>,
    inst_block: SecondaryMap<Inst, Option<Block>>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_block(&mut self) -> Block {
        self.blocks.push(BlockNode::default())
    }

    pub fn append_block(&mut self, block: Block) {
        self.order.push(block);
    }

    pub fn append_inst(&mut self, block: Block, inst: Inst) {
        self.blocks[block].insts.push(inst);
        self.inst_block[inst] = Some(block);
    }

    /// Inserts `inst` as the first instruction of `block` (used by the
    /// memory-ordering transform to place the block-head token phi).
    pub fn prepend_inst(&mut self, block: Block, inst: Inst) {
        self.blocks[block].insts.insert(0, inst);
        self.inst_block[inst] = Some(block);
    }

    pub fn entry_block(&self) -> Option<Block> {
        self.order.first().copied()
    }

    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.order.iter().copied()
    }

    pub fn block_insts(&self, block: Block) -> &[Inst] {
        &self.blocks[block].insts
    }

    pub fn inst_block(&self, inst: Inst) -> Option<Block> {
        self.inst_block[inst]
    }

    /// The block's terminator: by construction (§6, "one terminator per
    /// block") this is always the last instruction.
    pub fn terminator(&self, block: Block) -> Option<Inst> {
        self.blocks[block].insts.last().copied()
    }
}

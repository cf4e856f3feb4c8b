//! Error taxonomy (§7), expressed as `thiserror`-derived enums rather than
//! `anyhow`: callers (a future mapper, a CLI driver) want to match on the
//! failure kind, not just format it.

use crate::ir::{Block, Inst};
use thiserror::Error;

/// Malformed IR: the builder returns early, leaves the graph unwritten, and
/// this error is the "one-line reason" §7 asks for.
#[derive(Debug, Error)]
pub enum MalformedIrError {
    #[error("block {0} has no terminator")]
    MissingTerminator(Block),
    #[error("phi in block {block} has {got} incoming values but the block has {expected} predecessors")]
    PhiArityMismatch {
        block: Block,
        expected: usize,
        got: usize,
    },
    #[error("unexpected opcode {opcode} in instruction {inst}")]
    UnexpectedOpcode { inst: Inst, opcode: &'static str },
    #[error("a function declaration (no body) was passed to the DFG builder")]
    DeclarationPassedToBuilder,
    #[error("block {block} is reachable with {pred_count} predecessor(s) but has no token phi")]
    MissingTokenPhi { block: Block, pred_count: usize },
    #[error("predecessor {pred} of block {block} has no recorded out-token when filling phis")]
    MissingOutToken { block: Block, pred: Block },
}

/// Top-level error returned by the build pipeline. I/O failures from the
/// printer are deliberately not part of this taxonomy: §7 treats them as
/// logged no-ops, not propagated failures, so the printer never returns one.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    MalformedIr(#[from] MalformedIrError),
}

//! Instruction data.
//!
//! A single tagged enum carrying the operands inline, with a handful of
//! small `Copy` sub-enums (`BinOp`, `IntCC`, `CastKind`) for the things that
//! need a symbol at print time. This crate only ever produces a single
//! result per instruction, which the DFG builder relies on throughout (phi,
//! load, binary op, compare all produce exactly one value).

use crate::ir::entities::{Block, FuncRef, Value};
use smallvec::SmallVec;
use std::fmt;

/// The coarse family an instruction belongs to, used by the classifier
/// (builder Phase A) and by the pass-through resolver to decide whether a
/// value is "plumbing" (address arithmetic, casts) that never becomes a node.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum OpcodeFamily {
    BinaryOp,
    Compare,
    Load,
    Store,
    AtomicRmw,
    AtomicCas,
    Phi,
    Brif,
    Jump,
    Select,
    Cast,
    AddrArith,
    Call,
    Return,
}

impl OpcodeFamily {
    /// A short name for diagnostics (`MalformedIrError::UnexpectedOpcode`).
    pub fn name(self) -> &'static str {
        match self {
            OpcodeFamily::BinaryOp => "binary op",
            OpcodeFamily::Compare => "compare",
            OpcodeFamily::Load => "load",
            OpcodeFamily::Store => "store",
            OpcodeFamily::AtomicRmw => "atomic rmw",
            OpcodeFamily::AtomicCas => "atomic cas",
            OpcodeFamily::Phi => "phi",
            OpcodeFamily::Brif => "brif",
            OpcodeFamily::Jump => "jump",
            OpcodeFamily::Select => "select",
            OpcodeFamily::Cast => "cast",
            OpcodeFamily::AddrArith => "address arithmetic",
            OpcodeFamily::Call => "call",
            OpcodeFamily::Return => "return",
        }
    }
}

/// A pure arithmetic or bitwise binary operator.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Sdiv,
    Udiv,
    Srem,
    Urem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl BinOp {
    /// A short operator symbol, when one exists (all of them have one).
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Sdiv | BinOp::Udiv => "/",
            BinOp::Srem | BinOp::Urem => "%",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "iadd",
            BinOp::Sub => "isub",
            BinOp::Mul => "imul",
            BinOp::Sdiv => "sdiv",
            BinOp::Udiv => "udiv",
            BinOp::Srem => "srem",
            BinOp::Urem => "urem",
            BinOp::And => "band",
            BinOp::Or => "bor",
            BinOp::Xor => "bxor",
            BinOp::Shl => "ishl",
            BinOp::Shr => "ushr",
        }
    }
}

/// An integer comparison predicate.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum IntCC {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl IntCC {
    pub fn symbol(self) -> &'static str {
        match self {
            IntCC::Eq => "==",
            IntCC::Ne => "!=",
            IntCC::Slt | IntCC::Ult => "<",
            IntCC::Sle | IntCC::Ule => "<=",
            IntCC::Sgt | IntCC::Ugt => ">",
            IntCC::Sge | IntCC::Uge => ">=",
        }
    }
}

/// A floating-point comparison predicate. Kept distinct from `IntCC` because
/// real ISAs give it its own encoding, even though this crate treats it
/// identically to an integer compare once it reaches the DFG.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FloatCC {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl FloatCC {
    pub fn symbol(self) -> &'static str {
        match self {
            FloatCC::Eq => "==",
            FloatCC::Ne => "!=",
            FloatCC::Lt => "<",
            FloatCC::Le => "<=",
            FloatCC::Gt => ">",
            FloatCC::Ge => ">=",
        }
    }
}

/// A cast/conversion kind. All casts are pass-through plumbing: the DFG
/// builder never materializes a node for one (§4.4).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CastKind {
    Bitcast,
    Trunc,
    SignExtend,
    ZeroExtend,
    FpToInt,
    IntToFp,
    FpExtend,
    FpTrunc,
}

/// An atomic read-modify-write operator. Per §4.2, atomic RMWs and
/// compare-exchanges are not converted into the token-passing form; they are
/// simply clamped to sequentially-consistent ordering and otherwise ignored
/// by the memory-ordering transform.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AtomicRmwOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Xchg,
}

/// The callee of a [`InstructionData::Call`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Callee {
    /// An ordinary, opaque external function symbol.
    External(String),
    /// A memory-token intrinsic minted by the memory-ordering transform.
    Intrinsic(IntrinsicKind, crate::ir::types::Type),
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Callee::External(name) => f.write_str(name),
            Callee::Intrinsic(kind, ty) => write!(f, "riptide.{}.{}", kind.infix(), ty),
        }
    }
}

/// Which of the three intrinsic families (§4.2, §6) a callee belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum IntrinsicKind {
    Load,
    Store,
    EntryToken,
}

impl IntrinsicKind {
    fn infix(self) -> &'static str {
        match self {
            IntrinsicKind::Load => "load",
            IntrinsicKind::Store => "store",
            IntrinsicKind::EntryToken => "entry.token",
        }
    }
}

/// One instruction's operation and operands.
#[derive(Clone, Debug)]
pub enum InstructionData {
    BinaryOp {
        op: BinOp,
        args: [Value; 2],
    },
    IntCompare {
        cond: IntCC,
        args: [Value; 2],
    },
    FloatCompare {
        cond: FloatCC,
        args: [Value; 2],
    },
    /// A plain load, as it appears before the memory-ordering transform.
    Load {
        ptr: Value,
    },
    /// A plain store, as it appears before the memory-ordering transform.
    /// Produces no result.
    Store {
        ptr: Value,
        val: Value,
    },
    AtomicRmw {
        op: AtomicRmwOp,
        ptr: Value,
        val: Value,
    },
    AtomicCas {
        ptr: Value,
        expected: Value,
        replacement: Value,
    },
    Phi {
        incoming: SmallVec<[(Block, Value); 4]>,
    },
    Brif {
        cond: Value,
        then_block: Block,
        else_block: Block,
    },
    Jump {
        dest: Block,
    },
    Select {
        cond: Value,
        if_true: Value,
        if_false: Value,
    },
    Cast {
        kind: CastKind,
        arg: Value,
    },
    /// Address computation: a base pointer plus zero or more index operands.
    /// Never materializes a node; §4.4 recurses through it transparently.
    AddrArith {
        base: Value,
        indices: SmallVec<[Value; 2]>,
    },
    /// Either an ordinary call, or (after the memory-ordering transform) a
    /// call to one of the `load[T]`/`store[T]`/`entry_token` intrinsics.
    Call {
        callee: FuncRef,
        args: SmallVec<[Value; 4]>,
    },
    Return {
        args: SmallVec<[Value; 1]>,
    },
}

impl InstructionData {
    pub fn family(&self) -> OpcodeFamily {
        match self {
            InstructionData::BinaryOp { .. } => OpcodeFamily::BinaryOp,
            InstructionData::IntCompare { .. } | InstructionData::FloatCompare { .. } => {
                OpcodeFamily::Compare
            }
            InstructionData::Load { .. } => OpcodeFamily::Load,
            InstructionData::Store { .. } => OpcodeFamily::Store,
            InstructionData::AtomicRmw { .. } => OpcodeFamily::AtomicRmw,
            InstructionData::AtomicCas { .. } => OpcodeFamily::AtomicCas,
            InstructionData::Phi { .. } => OpcodeFamily::Phi,
            InstructionData::Brif { .. } => OpcodeFamily::Brif,
            InstructionData::Jump { .. } => OpcodeFamily::Jump,
            InstructionData::Select { .. } => OpcodeFamily::Select,
            InstructionData::Cast { .. } => OpcodeFamily::Cast,
            InstructionData::AddrArith { .. } => OpcodeFamily::AddrArith,
            InstructionData::Call { .. } => OpcodeFamily::Call,
            InstructionData::Return { .. } => OpcodeFamily::Return,
        }
    }

    /// Does this instruction produce a result value?
    pub fn has_result(&self) -> bool {
        !matches!(
            self,
            InstructionData::Store { .. }
                | InstructionData::Brif { .. }
                | InstructionData::Jump { .. }
                | InstructionData::Return { .. }
        )
    }

    /// All value operands of this instruction, in a fixed order. Block
    /// operands of branches and the `(block, value)` pairs of a phi are not
    /// value operands in this sense; see [`InstructionData::phi_incoming`]
    /// and `Brif`'s fields directly.
    pub fn args(&self) -> SmallVec<[Value; 4]> {
        match self {
            InstructionData::BinaryOp { args, .. }
            | InstructionData::IntCompare { args, .. }
            | InstructionData::FloatCompare { args, .. } => args.iter().copied().collect(),
            InstructionData::Load { ptr } => SmallVec::from_slice(&[*ptr]),
            InstructionData::Store { ptr, val } => SmallVec::from_slice(&[*ptr, *val]),
            InstructionData::AtomicRmw { ptr, val, .. } => SmallVec::from_slice(&[*ptr, *val]),
            InstructionData::AtomicCas {
                ptr,
                expected,
                replacement,
            } => SmallVec::from_slice(&[*ptr, *expected, *replacement]),
            InstructionData::Phi { incoming } => incoming.iter().map(|(_, v)| *v).collect(),
            InstructionData::Brif { cond, .. } => SmallVec::from_slice(&[*cond]),
            InstructionData::Jump { .. } => SmallVec::new(),
            InstructionData::Select {
                cond,
                if_true,
                if_false,
            } => SmallVec::from_slice(&[*cond, *if_true, *if_false]),
            InstructionData::Cast { arg, .. } => SmallVec::from_slice(&[*arg]),
            InstructionData::AddrArith { base, indices } => {
                let mut v = SmallVec::from_slice(&[*base]);
                v.extend(indices.iter().copied());
                v
            }
            InstructionData::Call { args, .. } => args.clone(),
            InstructionData::Return { args } => args.clone(),
        }
    }
}

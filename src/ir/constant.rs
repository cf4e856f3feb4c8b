//! Literal constant values.

use std::fmt;

/// A literal value carried by a `Const`-defined [`Value`](super::Value).
#[derive(Copy, Clone, Debug)]
pub enum ConstantValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// Exact bit-pattern equality rather than `f64`'s own `PartialEq` (where
/// `NaN != NaN` and `-0.0 == 0.0`): the Carry de-duplication heuristic
/// compares literals for "is this the same constant", not for numeric value.
impl PartialEq for ConstantValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConstantValue::Bool(a), ConstantValue::Bool(b)) => a == b,
            (ConstantValue::Int(a), ConstantValue::Int(b)) => a == b,
            (ConstantValue::Float(a), ConstantValue::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for ConstantValue {}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConstantValue::Bool(b) => write!(f, "{b}"),
            ConstantValue::Int(i) => write!(f, "{i}"),
            ConstantValue::Float(v) => write!(f, "{v}"),
        }
    }
}

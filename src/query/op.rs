//! Query operators and their stable numeric codes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EnquireError, Result};

pub const OP_AND: u32 = 0;
pub const OP_OR: u32 = 1;
pub const OP_AND_NOT: u32 = 2;
pub const OP_XOR: u32 = 3;
pub const OP_AND_MAYBE: u32 = 4;
pub const OP_FILTER: u32 = 5;
pub const OP_NEAR: u32 = 6;
pub const OP_PHRASE: u32 = 7;
pub const OP_VALUE_RANGE: u32 = 8;
pub const OP_SCALE_WEIGHT: u32 = 9;
pub const OP_ELITE_SET: u32 = 10;

/// Operators combining subqueries.
///
/// The discriminants are the stable numeric operator codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Op {
    /// Documents matching every subquery.
    And = OP_AND,
    /// Documents matching any subquery.
    Or = OP_OR,
    /// Documents matching the left subquery but not the right.
    AndNot = OP_AND_NOT,
    /// Documents matching an odd number of subqueries.
    Xor = OP_XOR,
    /// Documents matching the left subquery; the right only adds weight.
    AndMaybe = OP_AND_MAYBE,
    /// Documents matching both; only the left contributes weight.
    Filter = OP_FILTER,
    /// All terms occurring within a window of positions, in any order.
    Near = OP_NEAR,
    /// All terms occurring within a window of positions, in query order.
    Phrase = OP_PHRASE,
    /// Documents whose value slot lies in a range.
    ValueRange = OP_VALUE_RANGE,
    /// Multiply the weight of a subquery by a constant.
    ScaleWeight = OP_SCALE_WEIGHT,
    /// OR over the best `k` subqueries.
    EliteSet = OP_ELITE_SET,
}

/// How many subqueries an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// No subqueries.
    Nullary,
    /// Exactly one subquery.
    Unary,
    /// Exactly two subqueries.
    Binary,
    /// Any number of subqueries.
    Variadic,
}

impl Op {
    /// The stable numeric code of this operator.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Decode a numeric operator code.
    pub fn from_code(code: u32) -> Result<Self> {
        let op = match code {
            OP_AND => Op::And,
            OP_OR => Op::Or,
            OP_AND_NOT => Op::AndNot,
            OP_XOR => Op::Xor,
            OP_AND_MAYBE => Op::AndMaybe,
            OP_FILTER => Op::Filter,
            OP_NEAR => Op::Near,
            OP_PHRASE => Op::Phrase,
            OP_VALUE_RANGE => Op::ValueRange,
            OP_SCALE_WEIGHT => Op::ScaleWeight,
            OP_ELITE_SET => Op::EliteSet,
            _ => {
                return Err(EnquireError::invalid_argument(format!(
                    "unknown query operator code {code}"
                )));
            }
        };
        Ok(op)
    }

    /// The keyword used in query descriptions.
    pub fn keyword(self) -> &'static str {
        match self {
            Op::And => "AND",
            Op::Or => "OR",
            Op::AndNot => "AND_NOT",
            Op::Xor => "XOR",
            Op::AndMaybe => "AND_MAYBE",
            Op::Filter => "FILTER",
            Op::Near => "NEAR",
            Op::Phrase => "PHRASE",
            Op::ValueRange => "VALUE_RANGE",
            Op::ScaleWeight => "SCALE_WEIGHT",
            Op::EliteSet => "ELITE_SET",
        }
    }

    /// The number of subqueries this operator takes.
    pub fn arity(self) -> Arity {
        match self {
            Op::ValueRange => Arity::Nullary,
            Op::ScaleWeight => Arity::Unary,
            Op::AndNot | Op::AndMaybe | Op::Filter => Arity::Binary,
            Op::And | Op::Or | Op::Xor | Op::Near | Op::Phrase | Op::EliteSet => Arity::Variadic,
        }
    }

    /// Whether the operator carries a numeric parameter in its description.
    pub fn is_parameterised(self) -> bool {
        matches!(self, Op::Near | Op::Phrase | Op::EliteSet)
    }

    /// Whether the operator checks term positions.
    pub fn is_positional(self) -> bool {
        matches!(self, Op::Near | Op::Phrase)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl TryFrom<u32> for Op {
    type Error = EnquireError;

    fn try_from(code: u32) -> Result<Self> {
        Op::from_code(code)
    }
}

//! Immutable query trees.
//!
//! A [`Query`] is built once and never mutated. Compound nodes keep their
//! children in construction order, and the canonical description reflects
//! that order exactly:
//!
//! ```
//! use enquire::query::{Op, Query};
//!
//! let query = Query::from_terms(Op::Or, ["smoke", "test", "terms"]).unwrap();
//! assert_eq!(query.to_string(), "Xapian::Query((smoke OR test OR terms))");
//! ```

use std::fmt;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{EnquireError, Result};

pub mod op;

pub use op::{
    Arity, OP_AND, OP_AND_MAYBE, OP_AND_NOT, OP_ELITE_SET, OP_FILTER, OP_NEAR, OP_OR, OP_PHRASE,
    OP_SCALE_WEIGHT, OP_VALUE_RANGE, OP_XOR, Op,
};

/// Number of subqueries kept by `ELITE_SET` when none is given.
pub const DEFAULT_ELITE_SET_SIZE: u32 = 10;

/// A node of a query tree.
///
/// Deserialized trees are rebuilt through the checked constructors, so a
/// malformed tree fails to load instead of reaching the matcher.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "QueryRepr")]
pub enum Query {
    /// Matches nothing. Dropped from the children of n-ary operators.
    #[default]
    Empty,
    /// A single term. The empty term matches every document.
    Term {
        /// The term text.
        term: String,
        /// Within-query frequency.
        wqf: u32,
        /// Position of the term in the query.
        pos: u32,
    },
    /// An operator applied to subqueries.
    Compound {
        /// The operator.
        op: Op,
        /// Subqueries, in construction order.
        subqueries: Vec<Query>,
        /// Window size for `NEAR`/`PHRASE`, set size for `ELITE_SET`.
        parameter: u32,
    },
    /// A subquery whose weights are multiplied by `factor`.
    ScaleWeight {
        /// Non-negative multiplier.
        factor: f64,
        /// The scaled subquery.
        subquery: Box<Query>,
    },
    /// Documents whose value in `slot` lies in `begin..=end` (byte order).
    ValueRange {
        /// Value slot number.
        slot: u32,
        /// Inclusive lower bound.
        begin: String,
        /// Inclusive upper bound.
        end: String,
    },
}

impl Query {
    /// A query for a single term.
    pub fn term<T: Into<String>>(term: T) -> Self {
        Query::term_with(term, 1, 0)
    }

    /// A query for a single term with an explicit wqf and query position.
    pub fn term_with<T: Into<String>>(term: T, wqf: u32, pos: u32) -> Self {
        Query::Term {
            term: term.into(),
            wqf,
            pos,
        }
    }

    /// A query matching every document.
    pub fn match_all() -> Self {
        Query::term("")
    }

    /// Combine subqueries with `op`.
    ///
    /// Binary operators (`AND_NOT`, `AND_MAYBE`, `FILTER`) need exactly two
    /// subqueries and `SCALE_WEIGHT` exactly one (scaled by 1.0); otherwise
    /// this fails with [`EnquireError::InvalidArity`]. For n-ary operators,
    /// empty subqueries are dropped, a single survivor is returned as is,
    /// and no survivors give [`Query::Empty`]. `NEAR` and `PHRASE` use a
    /// window equal to the number of subqueries; `ELITE_SET` keeps
    /// [`DEFAULT_ELITE_SET_SIZE`] subqueries.
    pub fn new<I>(op: Op, subqueries: I) -> Result<Self>
    where
        I: IntoIterator<Item = Query>,
    {
        let subqueries: Vec<Query> = subqueries.into_iter().collect();
        match op.arity() {
            Arity::Nullary => Err(EnquireError::invalid_arity(format!(
                "{op} takes no subqueries; use Query::value_range"
            ))),
            Arity::Unary => {
                let [subquery] = exactly::<1>(op, subqueries)?;
                Query::scale(1.0, subquery)
            }
            Arity::Binary => {
                let [left, right] = exactly::<2>(op, subqueries)?;
                Ok(Query::Compound {
                    op,
                    subqueries: vec![left, right],
                    parameter: 0,
                })
            }
            Arity::Variadic => {
                let parameter = match op {
                    Op::EliteSet => DEFAULT_ELITE_SET_SIZE,
                    _ => subqueries.iter().filter(|q| !q.is_empty()).count() as u32,
                };
                Query::variadic(op, subqueries, parameter)
            }
        }
    }

    /// A flat n-ary node over term leaves, e.g. `(a OR b OR c)`.
    ///
    /// Terms are never nested into binary nodes, whatever the operator.
    pub fn from_terms<I, T>(op: Op, terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Query::new(op, terms.into_iter().map(Query::term))
    }

    /// OR over the `size` subqueries with the highest possible weight.
    pub fn elite_set<I>(subqueries: I, size: u32) -> Result<Self>
    where
        I: IntoIterator<Item = Query>,
    {
        if size == 0 {
            return Err(EnquireError::invalid_argument(
                "ELITE_SET size must be at least 1",
            ));
        }
        Query::variadic(Op::EliteSet, subqueries.into_iter().collect(), size)
    }

    /// Terms occurring within `window` positions of each other, in any order.
    pub fn near<I>(subqueries: I, window: u32) -> Result<Self>
    where
        I: IntoIterator<Item = Query>,
    {
        Query::variadic(Op::Near, subqueries.into_iter().collect(), window)
    }

    /// Terms occurring in order within `window` positions.
    pub fn phrase<I>(subqueries: I, window: u32) -> Result<Self>
    where
        I: IntoIterator<Item = Query>,
    {
        Query::variadic(Op::Phrase, subqueries.into_iter().collect(), window)
    }

    /// Multiply the weights from `subquery` by `factor`.
    pub fn scale(factor: f64, subquery: Query) -> Result<Self> {
        if !(factor.is_finite() && factor >= 0.0) {
            return Err(EnquireError::invalid_argument(format!(
                "SCALE_WEIGHT factor must be a non-negative number, got {factor}"
            )));
        }
        Ok(Query::ScaleWeight {
            factor,
            subquery: Box::new(subquery),
        })
    }

    /// Documents whose value in `slot` lies between `begin` and `end` inclusive.
    pub fn value_range<B, E>(slot: u32, begin: B, end: E) -> Self
    where
        B: Into<String>,
        E: Into<String>,
    {
        Query::ValueRange {
            slot,
            begin: begin.into(),
            end: end.into(),
        }
    }

    fn variadic(op: Op, subqueries: Vec<Query>, parameter: u32) -> Result<Self> {
        let mut subqueries: Vec<Query> = subqueries.into_iter().filter(|q| !q.is_empty()).collect();

        if op.is_positional() {
            if let Some(bad) = subqueries.iter().find(|q| !matches!(q, Query::Term { .. })) {
                return Err(EnquireError::invalid_argument(format!(
                    "{op} subqueries must be terms, got {}",
                    bad.describe()
                )));
            }
            if parameter == 0 && !subqueries.is_empty() {
                return Err(EnquireError::invalid_argument(format!(
                    "{op} window must be at least 1"
                )));
            }
        }

        match subqueries.len() {
            0 => Ok(Query::Empty),
            1 => Ok(subqueries.remove(0)),
            _ => Ok(Query::Compound {
                op,
                subqueries,
                parameter,
            }),
        }
    }

    /// Whether this is the empty query.
    pub fn is_empty(&self) -> bool {
        matches!(self, Query::Empty)
    }

    /// The operator at the root, if this is an operator node.
    pub fn op(&self) -> Option<Op> {
        match self {
            Query::Compound { op, .. } => Some(*op),
            Query::ScaleWeight { .. } => Some(Op::ScaleWeight),
            Query::ValueRange { .. } => Some(Op::ValueRange),
            Query::Empty | Query::Term { .. } => None,
        }
    }

    /// Direct subqueries of this node.
    pub fn subqueries(&self) -> &[Query] {
        match self {
            Query::Compound { subqueries, .. } => subqueries,
            Query::ScaleWeight { subquery, .. } => std::slice::from_ref(subquery.as_ref()),
            Query::Empty | Query::Term { .. } | Query::ValueRange { .. } => &[],
        }
    }

    /// Sum of the wqfs of all term leaves.
    pub fn length(&self) -> u32 {
        match self {
            Query::Term { wqf, .. } => *wqf,
            Query::Compound { subqueries, .. } => subqueries.iter().map(Query::length).sum(),
            Query::ScaleWeight { subquery, .. } => subquery.length(),
            Query::Empty | Query::ValueRange { .. } => 0,
        }
    }

    /// Unique terms of the query, ordered by query position and then by term.
    ///
    /// The match-all empty term is not included.
    pub fn terms(&self) -> Vec<String> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves.sort();

        let mut seen = AHashSet::new();
        leaves
            .into_iter()
            .filter(|(_, term)| seen.insert(*term))
            .map(|(_, term)| term.to_string())
            .collect()
    }

    pub(crate) fn collect_leaves<'a>(&'a self, out: &mut Vec<(u32, &'a str)>) {
        match self {
            Query::Term { term, pos, .. } if !term.is_empty() => out.push((*pos, term.as_str())),
            Query::Compound { subqueries, .. } => {
                for subquery in subqueries {
                    subquery.collect_leaves(out);
                }
            }
            Query::ScaleWeight { subquery, .. } => subquery.collect_leaves(out),
            Query::Term { .. } | Query::Empty | Query::ValueRange { .. } => {}
        }
    }

    /// The canonical description, e.g. `Xapian::Query((a OR b))`.
    pub fn description(&self) -> String {
        match self {
            Query::Empty => "Xapian::Query()".to_string(),
            _ => format!("Xapian::Query({})", self.describe()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Query::Empty => "<NULL>".to_string(),
            Query::Term { term, wqf, pos } => {
                let mut extras = Vec::new();
                if *wqf != 1 {
                    extras.push(format!("wqf={wqf}"));
                }
                if *pos != 0 {
                    extras.push(format!("pos={pos}"));
                }
                if extras.is_empty() {
                    term.clone()
                } else {
                    format!("{term}:({})", extras.join(","))
                }
            }
            Query::Compound {
                op,
                subqueries,
                parameter,
            } => {
                let separator = if op.is_parameterised() {
                    format!(" {op} {parameter} ")
                } else {
                    format!(" {op} ")
                };
                let parts: Vec<String> = subqueries.iter().map(Query::describe).collect();
                format!("({})", parts.join(&separator))
            }
            Query::ScaleWeight { factor, subquery } => {
                format!("{factor} * {}", subquery.describe())
            }
            Query::ValueRange { slot, begin, end } => {
                format!("VALUE_RANGE {slot} {begin} {end}")
            }
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

impl From<&str> for Query {
    fn from(term: &str) -> Self {
        Query::term(term)
    }
}

impl From<String> for Query {
    fn from(term: String) -> Self {
        Query::term(term)
    }
}

/// Unchecked wire form of [`Query`].
#[derive(Deserialize)]
enum QueryRepr {
    Empty,
    Term {
        term: String,
        wqf: u32,
        pos: u32,
    },
    Compound {
        op: Op,
        subqueries: Vec<Query>,
        parameter: u32,
    },
    ScaleWeight {
        factor: f64,
        subquery: Box<Query>,
    },
    ValueRange {
        slot: u32,
        begin: String,
        end: String,
    },
}

impl TryFrom<QueryRepr> for Query {
    type Error = EnquireError;

    fn try_from(repr: QueryRepr) -> Result<Self> {
        match repr {
            QueryRepr::Empty => Ok(Query::Empty),
            QueryRepr::Term { term, wqf, pos } => Ok(Query::term_with(term, wqf, pos)),
            QueryRepr::Compound {
                op,
                subqueries,
                parameter,
            } => match op {
                Op::EliteSet => Query::elite_set(subqueries, parameter),
                Op::Near => Query::near(subqueries, parameter),
                Op::Phrase => Query::phrase(subqueries, parameter),
                Op::ScaleWeight | Op::ValueRange => Err(EnquireError::invalid_arity(format!(
                    "{op} cannot be an operator node"
                ))),
                _ => Query::new(op, subqueries),
            },
            QueryRepr::ScaleWeight { factor, subquery } => Query::scale(factor, *subquery),
            QueryRepr::ValueRange { slot, begin, end } => Ok(Query::value_range(slot, begin, end)),
        }
    }
}

fn exactly<const N: usize>(op: Op, subqueries: Vec<Query>) -> Result<[Query; N]> {
    let count = subqueries.len();
    subqueries.try_into().map_err(|_| {
        EnquireError::invalid_arity(format!(
            "{op} needs exactly {N} subquer{}, got {count}",
            if N == 1 { "y" } else { "ies" }
        ))
    })
}

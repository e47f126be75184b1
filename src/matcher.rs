//! Query evaluation.
//!
//! The matcher walks a [`Query`] bottom-up. Each leaf resolves to its posting
//! list, weighted with the active [`Weight`], and each operator combines the
//! docid-ordered hit lists of its children. Every intermediate result is a
//! `Vec<Hit>` sorted by ascending docid.

use std::collections::BTreeMap;

use crate::database::IndexReader;
use crate::document::DocId;
use crate::query::{Op, Query};
use crate::rset::RSet;
use crate::weight::{TermStats, Weight};

/// A matching document with its accumulated weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub docid: DocId,
    pub weight: f64,
}

impl Hit {
    fn new(docid: DocId, weight: f64) -> Self {
        Hit { docid, weight }
    }
}

/// Evaluates queries against one reader with one weighting scheme.
pub(crate) struct Matcher<'a> {
    reader: &'a dyn IndexReader,
    weight: &'a dyn Weight,
    relevant: Vec<DocId>,
    query_length: u32,
}

impl<'a> Matcher<'a> {
    pub fn new(
        reader: &'a dyn IndexReader,
        weight: &'a dyn Weight,
        rset: Option<&RSet>,
        query_length: u32,
    ) -> Self {
        // Relevance judgements about documents that no longer exist are
        // ignored.
        let relevant = rset
            .map(|rset| {
                rset.iter()
                    .filter(|docid| reader.index().document(*docid).is_ok())
                    .collect()
            })
            .unwrap_or_default();

        Matcher {
            reader,
            weight,
            relevant,
            query_length,
        }
    }

    /// Statistics for `term` as seen from this matcher.
    pub fn term_stats(&self, term: &str, wqf: u32) -> TermStats {
        let postlist = self.reader.postlist(term);
        let rel_term_freq = match postlist {
            Some(list) => self
                .relevant
                .iter()
                .filter(|docid| list.get(**docid).is_some())
                .count() as u32,
            None => 0,
        };

        TermStats {
            doc_count: self.reader.doc_count(),
            term_freq: postlist.map_or(0, |list| list.doc_freq()),
            avg_length: self.reader.avg_length(),
            rset_size: self.relevant.len() as u32,
            rel_term_freq,
            wqf,
            query_length: self.query_length,
        }
    }

    /// Query-time weight of `term`.
    pub fn term_weight(&self, term: &str, wqf: u32) -> f64 {
        self.weight.term_weight(&self.term_stats(term, wqf))
    }

    /// All matches for `query`, with the scheme's term-independent part
    /// added, in ascending docid order.
    pub fn run(&self, query: &Query) -> Vec<Hit> {
        let mut hits = self.evaluate(query);
        if self.weight.max_extra(self.query_length) > 0.0 {
            let avg_length = self.reader.avg_length();
            for hit in &mut hits {
                let length = self.reader.doc_length(hit.docid).unwrap_or(0);
                hit.weight += self.weight.sum_extra(length, avg_length, self.query_length);
            }
        }
        log::debug!("{} matched {} documents", query, hits.len());
        hits
    }

    /// Upper bound on the weight any document can get from `query`,
    /// including the term-independent part.
    pub fn max_possible(&self, query: &Query) -> f64 {
        if query.is_empty() {
            return 0.0;
        }
        self.max_weight(query) + self.weight.max_extra(self.query_length)
    }

    /// Upper bound on the weight a document can get from `query`.
    pub fn max_weight(&self, query: &Query) -> f64 {
        match query {
            Query::Empty | Query::ValueRange { .. } => 0.0,
            Query::Term { term, .. } if term.is_empty() => 0.0,
            Query::Term { term, wqf, .. } => {
                if self.reader.term_exists(term) {
                    self.weight.max_part(self.term_weight(term, *wqf))
                } else {
                    0.0
                }
            }
            Query::ScaleWeight { factor, subquery } => factor * self.max_weight(subquery),
            Query::Compound {
                op,
                subqueries,
                parameter,
            } => match op {
                Op::AndNot | Op::Filter => subqueries.first().map_or(0.0, |q| self.max_weight(q)),
                Op::EliteSet => self
                    .elite(subqueries, *parameter)
                    .into_iter()
                    .map(|q| self.max_weight(q))
                    .sum(),
                _ => subqueries.iter().map(|q| self.max_weight(q)).sum(),
            },
        }
    }

    fn evaluate(&self, query: &Query) -> Vec<Hit> {
        match query {
            Query::Empty => Vec::new(),
            Query::Term { term, .. } if term.is_empty() => self
                .reader
                .index()
                .docids()
                .map(|docid| Hit::new(docid, 0.0))
                .collect(),
            Query::Term { term, wqf, .. } => self.evaluate_term(term, *wqf),
            Query::ScaleWeight { factor, subquery } => {
                let mut hits = self.evaluate(subquery);
                for hit in &mut hits {
                    hit.weight *= factor;
                }
                hits
            }
            Query::ValueRange { slot, begin, end } => self
                .reader
                .index()
                .documents()
                .filter(|(_, doc)| {
                    doc.value(*slot)
                        .is_some_and(|value| value >= begin.as_str() && value <= end.as_str())
                })
                .map(|(docid, _)| Hit::new(docid, 0.0))
                .collect(),
            Query::Compound {
                op,
                subqueries,
                parameter,
            } => self.evaluate_compound(*op, subqueries, *parameter),
        }
    }

    fn evaluate_term(&self, term: &str, wqf: u32) -> Vec<Hit> {
        let Some(postlist) = self.reader.postlist(term) else {
            return Vec::new();
        };
        let term_weight = self.term_weight(term, wqf);
        let avg_length = self.reader.avg_length();

        postlist
            .iter()
            .map(|posting| {
                let length = self.reader.doc_length(posting.docid).unwrap_or(0);
                let weight = self
                    .weight
                    .sum_part(term_weight, posting.wdf, length, avg_length);
                Hit::new(posting.docid, weight)
            })
            .collect()
    }

    fn evaluate_compound(&self, op: Op, subqueries: &[Query], parameter: u32) -> Vec<Hit> {
        match op {
            Op::Or => union(subqueries.iter().map(|q| self.evaluate(q)), false),
            Op::Xor => union(subqueries.iter().map(|q| self.evaluate(q)), true),
            Op::EliteSet => union(
                self.elite(subqueries, parameter)
                    .into_iter()
                    .map(|q| self.evaluate(q)),
                false,
            ),
            Op::And => self.intersect_all(subqueries),
            Op::AndNot | Op::AndMaybe | Op::Filter => {
                // Hand-built nodes may have the wrong arity.
                let [left, right] = subqueries else {
                    return Vec::new();
                };
                let (left, right) = (self.evaluate(left), self.evaluate(right));
                match op {
                    Op::AndNot => difference(left, &right),
                    Op::AndMaybe => maybe(left, &right),
                    _ => filter(left, &right),
                }
            }
            Op::Near | Op::Phrase => {
                let candidates = self.intersect_all(subqueries);
                let terms: Vec<&str> = subqueries
                    .iter()
                    .filter_map(|q| match q {
                        Query::Term { term, .. } => Some(term.as_str()),
                        _ => None,
                    })
                    .collect();
                candidates
                    .into_iter()
                    .filter(|hit| self.positions_match(op, &terms, hit.docid, parameter))
                    .collect()
            }
            // Never built as compound nodes.
            Op::ScaleWeight | Op::ValueRange => Vec::new(),
        }
    }

    fn intersect_all(&self, subqueries: &[Query]) -> Vec<Hit> {
        let mut lists = subqueries.iter().map(|q| self.evaluate(q));
        let Some(first) = lists.next() else {
            return Vec::new();
        };
        lists.fold(first, |acc, next| intersect(&acc, &next))
    }

    /// The `size` subqueries with the highest maximum weight, ties going to
    /// the earlier subquery.
    fn elite<'q>(&self, subqueries: &'q [Query], size: u32) -> Vec<&'q Query> {
        let mut ranked: Vec<(usize, f64)> = subqueries
            .iter()
            .enumerate()
            .map(|(i, q)| (i, self.max_weight(q)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(size as usize);
        ranked.sort_by_key(|(i, _)| *i);
        ranked.into_iter().map(|(i, _)| &subqueries[i]).collect()
    }

    fn positions_match(&self, op: Op, terms: &[&str], docid: DocId, window: u32) -> bool {
        let mut positions = Vec::with_capacity(terms.len());
        for term in terms {
            match self
                .reader
                .postlist(term)
                .and_then(|list| list.get(docid))
            {
                Some(posting) if !posting.positions.is_empty() => {
                    positions.push(posting.positions.as_slice())
                }
                _ => return false,
            }
        }
        match op {
            Op::Phrase => phrase_match(&positions, window),
            _ => near_match(&positions, window),
        }
    }
}

/// Merge hit lists, summing weights. With `odd_only`, keep only documents
/// matched by an odd number of lists.
fn union<I>(lists: I, odd_only: bool) -> Vec<Hit>
where
    I: IntoIterator<Item = Vec<Hit>>,
{
    let mut merged: BTreeMap<DocId, (f64, u32)> = BTreeMap::new();
    for list in lists {
        for hit in list {
            let entry = merged.entry(hit.docid).or_insert((0.0, 0));
            entry.0 += hit.weight;
            entry.1 += 1;
        }
    }
    merged
        .into_iter()
        .filter(|(_, (_, count))| !odd_only || count % 2 == 1)
        .map(|(docid, (weight, _))| Hit::new(docid, weight))
        .collect()
}

fn intersect(left: &[Hit], right: &[Hit]) -> Vec<Hit> {
    let mut out = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].docid.cmp(&right[j].docid) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(Hit::new(left[i].docid, left[i].weight + right[j].weight));
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn contains(hits: &[Hit], docid: DocId) -> Option<&Hit> {
    hits.binary_search_by_key(&docid, |hit| hit.docid)
        .ok()
        .map(|i| &hits[i])
}

fn difference(left: Vec<Hit>, right: &[Hit]) -> Vec<Hit> {
    left.into_iter()
        .filter(|hit| contains(right, hit.docid).is_none())
        .collect()
}

fn maybe(left: Vec<Hit>, right: &[Hit]) -> Vec<Hit> {
    left.into_iter()
        .map(|hit| match contains(right, hit.docid) {
            Some(extra) => Hit::new(hit.docid, hit.weight + extra.weight),
            None => hit,
        })
        .collect()
}

fn filter(left: Vec<Hit>, right: &[Hit]) -> Vec<Hit> {
    left.into_iter()
        .filter(|hit| contains(right, hit.docid).is_some())
        .collect()
}

/// Whether one position from each list can be picked, in list order and
/// strictly increasing, spanning fewer than `window` positions.
fn phrase_match(positions: &[&[u32]], window: u32) -> bool {
    let Some((first, rest)) = positions.split_first() else {
        return false;
    };
    if window == 0 {
        return false;
    }
    'start: for &start in first.iter() {
        let mut previous = start;
        for list in rest {
            let next = list.partition_point(|&p| p <= previous);
            match list.get(next) {
                Some(&p) if p - start < window => previous = p,
                _ => continue 'start,
            }
        }
        return true;
    }
    false
}

/// Whether one position from each list fits in a span of fewer than
/// `window` positions, in any order.
fn near_match(positions: &[&[u32]], window: u32) -> bool {
    if window == 0 {
        return false;
    }
    let mut events: Vec<(u32, usize)> = positions
        .iter()
        .enumerate()
        .flat_map(|(list, ps)| ps.iter().map(move |&p| (p, list)))
        .collect();
    events.sort_unstable();

    let needed = positions.len();
    let mut counts = vec![0usize; needed];
    let mut covered = 0;
    let mut lo = 0;
    for hi in 0..events.len() {
        let (_, list) = events[hi];
        if counts[list] == 0 {
            covered += 1;
        }
        counts[list] += 1;

        while events[hi].0 - events[lo].0 >= window {
            let (_, old) = events[lo];
            counts[old] -= 1;
            if counts[old] == 0 {
                covered -= 1;
            }
            lo += 1;
        }
        if covered == needed {
            return true;
        }
    }
    false
}

//! Running queries against a database.
//!
//! [`Enquire`] binds a reader, holds the current query and weighting
//! configuration, and produces [`MSet`]s and [`ESet`]s. It borrows the
//! reader immutably, so the index cannot change while it is in use.
//!
//! ```
//! use enquire::database::inmemory;
//! use enquire::document::Document;
//! use enquire::enquire::Enquire;
//! use enquire::query::{Op, Query};
//!
//! let mut db = inmemory::open();
//! let mut doc = Document::new();
//! doc.add_posting("hello", 1);
//! db.add_document(doc).unwrap();
//!
//! let mut enquire = Enquire::new(&db);
//! enquire.set_query(&Query::from_terms(Op::Or, ["hello", "world"]).unwrap());
//! let mset = enquire.get_mset(0, 10).unwrap();
//! assert_eq!(mset.size(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::iter::FusedIterator;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::database::IndexReader;
use crate::document::{DocId, Document};
use crate::error::{EnquireError, Result};
use crate::eset::{ESet, ESetItem};
use crate::matcher::{Hit, Matcher};
use crate::mset::{self, MSet, MSetItem, TermInfo};
use crate::query::Query;
use crate::rset::RSet;
use crate::weight::{BM25Weight, ExpandWeight, TermStats, Weight};

/// How documents of equal weight are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DocidOrder {
    /// Lower docids first.
    #[default]
    Ascending,
    /// Higher docids first.
    Descending,
    /// Any order; currently the same as `Ascending`.
    DontCare,
}

/// Decides whether a matching document may appear in an [`MSet`].
pub trait MatchDecider: Send + Sync {
    fn accept(&self, document: &Document) -> bool;
}

impl<F> MatchDecider for F
where
    F: Fn(&Document) -> bool + Send + Sync,
{
    fn accept(&self, document: &Document) -> bool {
        self(document)
    }
}

/// Decides whether a term may appear in an [`ESet`].
pub trait ExpandDecider: Send + Sync {
    fn accept(&self, term: &str) -> bool;
}

impl<F> ExpandDecider for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn accept(&self, term: &str) -> bool {
        self(term)
    }
}

/// Iterator over the query terms matching a document.
///
/// Terms come in query order: by query position, then by term. The
/// iterator is single-pass.
#[derive(Debug, Clone)]
pub struct TermIterator {
    terms: std::vec::IntoIter<String>,
}

impl TermIterator {
    fn new(terms: Vec<String>) -> Self {
        TermIterator {
            terms: terms.into_iter(),
        }
    }
}

impl Iterator for TermIterator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.terms.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.terms.size_hint()
    }
}

impl ExactSizeIterator for TermIterator {}

impl FusedIterator for TermIterator {}

/// Query session over one database.
#[derive(Debug)]
pub struct Enquire<'a> {
    reader: &'a dyn IndexReader,
    query: Query,
    weight: Box<dyn Weight>,
    docid_order: DocidOrder,
    percent_cutoff: u32,
    weight_cutoff: f64,
    collapse_key: Option<u32>,
}

impl<'a> Enquire<'a> {
    /// Start a session on `reader` with BM25 weighting and no query.
    pub fn new(reader: &'a dyn IndexReader) -> Self {
        Enquire {
            reader,
            query: Query::Empty,
            weight: Box::new(BM25Weight::new()),
            docid_order: DocidOrder::default(),
            percent_cutoff: 0,
            weight_cutoff: 0.0,
            collapse_key: None,
        }
    }

    /// Set the query to run. The query is copied; nothing runs until an
    /// MSet is requested.
    pub fn set_query(&mut self, query: &Query) {
        self.query = query.clone();
    }

    /// The current query, [`Query::Empty`] if none was set.
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn set_weighting_scheme(&mut self, weight: Box<dyn Weight>) {
        self.weight = weight;
    }

    pub fn weighting_scheme(&self) -> &dyn Weight {
        self.weight.as_ref()
    }

    pub fn set_docid_order(&mut self, order: DocidOrder) {
        self.docid_order = order;
    }

    /// Drop matches below `percent` percent or below `weight`. Zero disables
    /// either cutoff.
    pub fn set_cutoff(&mut self, percent: u32, weight: f64) -> Result<()> {
        if percent > 100 {
            return Err(EnquireError::invalid_argument(format!(
                "percent cutoff must be at most 100, got {percent}"
            )));
        }
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(EnquireError::invalid_argument(format!(
                "weight cutoff must be a non-negative number, got {weight}"
            )));
        }
        self.percent_cutoff = percent;
        self.weight_cutoff = weight;
        Ok(())
    }

    /// Keep only the best-ranked match for each value in `slot`. Matches
    /// with no value in the slot are never collapsed. `None` turns
    /// collapsing off.
    pub fn set_collapse_key(&mut self, slot: Option<u32>) {
        self.collapse_key = slot;
    }

    /// Up to `maxitems` matches starting at rank `first`.
    pub fn get_mset(&self, first: usize, maxitems: usize) -> Result<MSet> {
        self.get_mset_with(first, maxitems, None, None)
    }

    /// Like [`Enquire::get_mset`], with relevance feedback and a filter on
    /// which documents may match.
    pub fn get_mset_with(
        &self,
        first: usize,
        maxitems: usize,
        rset: Option<&RSet>,
        decider: Option<&dyn MatchDecider>,
    ) -> Result<MSet> {
        let query = &self.query;
        if query.is_empty() {
            return Ok(MSet {
                first,
                ..MSet::default()
            });
        }

        let matcher = Matcher::new(self.reader, self.weight.as_ref(), rset, query.length());
        let mut hits = matcher.run(query);

        if let Some(decider) = decider {
            let index = self.reader.index();
            hits.retain(|hit| {
                index
                    .document(hit.docid)
                    .is_ok_and(|document| decider.accept(document))
            });
        }

        self.sort(&mut hits);

        let mut collapsed = AHashMap::new();
        if let Some(slot) = self.collapse_key {
            (hits, collapsed) = self.collapse(hits, slot)?;
        }

        let query_terms = query.terms();
        let max_attained = hits.first().map_or(0.0, |hit| hit.weight);
        let percent_factor = match hits.first() {
            Some(best) if max_attained > 0.0 && !query_terms.is_empty() => {
                let matched = self.matching_terms(&query_terms, best.docid)?.len();
                (matched as f64 / query_terms.len() as f64) / max_attained
            }
            Some(_) if max_attained > 0.0 => 1.0 / max_attained,
            _ => 0.0,
        };

        if self.percent_cutoff > 0 || self.weight_cutoff > 0.0 {
            hits.retain(|hit| {
                hit.weight >= self.weight_cutoff
                    && mset::percent(hit.weight, percent_factor) >= self.percent_cutoff
            });
        }

        let matches = hits.len();
        let mut items = Vec::with_capacity(maxitems.min(matches.saturating_sub(first)));
        for (rank, hit) in hits.iter().enumerate().skip(first).take(maxitems) {
            let document = self.reader.document(hit.docid)?;
            let collapse_key = self
                .collapse_key
                .and_then(|slot| document.value(slot))
                .unwrap_or_default()
                .to_string();
            items.push(MSetItem {
                docid: hit.docid,
                weight: hit.weight,
                rank,
                percent: mset::percent(hit.weight, percent_factor),
                document,
                matching_terms: self.matching_terms(&query_terms, hit.docid)?,
                collapse_key,
                collapse_count: collapsed.get(&hit.docid).copied().unwrap_or(0),
            });
        }

        let mut wqfs = BTreeMap::new();
        collect_wqfs(query, &mut wqfs);
        let terms = wqfs
            .into_iter()
            .map(|(term, wqf)| {
                let info = TermInfo {
                    termfreq: self.reader.term_freq(&term),
                    termweight: matcher.term_weight(&term, wqf),
                };
                (term, info)
            })
            .collect();

        log::debug!(
            "get_mset({first}, {maxitems}) on {}: {matches} matches, {} returned",
            query,
            items.len()
        );

        Ok(MSet {
            first,
            items,
            matches_lower_bound: matches,
            matches_estimated: matches,
            matches_upper_bound: matches,
            max_possible: matcher.max_possible(query),
            max_attained,
            percent_factor,
            terms,
        })
    }

    fn sort(&self, hits: &mut [Hit]) {
        let descending = self.docid_order == DocidOrder::Descending;
        hits.sort_by(|a, b| {
            b.weight.total_cmp(&a.weight).then_with(|| {
                if descending {
                    b.docid.cmp(&a.docid)
                } else {
                    a.docid.cmp(&b.docid)
                }
            })
        });
    }

    /// Drop every hit whose value in `slot` was already seen at a better
    /// rank, counting the drops against the surviving hit.
    fn collapse(&self, hits: Vec<Hit>, slot: u32) -> Result<(Vec<Hit>, AHashMap<DocId, u32>)> {
        let index = self.reader.index();
        let mut leaders: AHashMap<&str, DocId> = AHashMap::new();
        let mut counts: AHashMap<DocId, u32> = AHashMap::new();
        let mut kept = Vec::with_capacity(hits.len());

        for hit in hits {
            let value = index.document(hit.docid)?.value(slot).unwrap_or_default();
            if value.is_empty() {
                kept.push(hit);
                continue;
            }
            match leaders.get(value) {
                Some(leader) => *counts.entry(*leader).or_default() += 1,
                None => {
                    leaders.insert(value, hit.docid);
                    kept.push(hit);
                }
            }
        }
        Ok((kept, counts))
    }

    fn matching_terms(&self, query_terms: &[String], docid: DocId) -> Result<Vec<String>> {
        let document = self.reader.index().document(docid)?;
        Ok(query_terms
            .iter()
            .filter(|term| document.has_term(term))
            .cloned()
            .collect())
    }

    /// Query terms indexing the document of an MSet item, as captured when
    /// the MSet was built.
    pub fn get_matching_terms(&self, item: &MSetItem) -> TermIterator {
        TermIterator::new(item.matching_terms.clone())
    }

    /// Query terms indexing `docid` in the database as it is now.
    pub fn get_matching_terms_for_docid(&self, docid: DocId) -> Result<TermIterator> {
        let terms = self.matching_terms(&self.query.terms(), docid)?;
        Ok(TermIterator::new(terms))
    }

    /// Up to `maxitems` terms from the relevant documents that would best
    /// extend the current query.
    pub fn get_eset(&self, maxitems: usize, rset: &RSet) -> Result<ESet> {
        self.get_eset_with(maxitems, rset, false, None)
    }

    /// Like [`Enquire::get_eset`], optionally keeping terms already in the
    /// query and filtering candidates.
    pub fn get_eset_with(
        &self,
        maxitems: usize,
        rset: &RSet,
        include_query_terms: bool,
        decider: Option<&dyn ExpandDecider>,
    ) -> Result<ESet> {
        let index = self.reader.index();
        let relevant: Vec<(DocId, &Document)> = rset
            .iter()
            .filter_map(|docid| index.document(docid).ok().map(|doc| (docid, doc)))
            .collect();
        if relevant.is_empty() {
            return Ok(ESet::default());
        }

        let query_terms = self.query.terms();
        let avg_length = index.avg_length();
        let expand = ExpandWeight::default();

        // term -> (summed multiplier, relevant documents containing it)
        let mut candidates: AHashMap<&str, (f64, u32)> = AHashMap::new();
        for (docid, document) in &relevant {
            let length = index.doc_length(*docid)?;
            for (term, entry) in document.termlist() {
                if term.is_empty() {
                    continue;
                }
                let candidate = candidates.entry(term).or_insert((0.0, 0));
                candidate.0 += expand.multiplier(entry.wdf, length, avg_length);
                candidate.1 += 1;
            }
        }
        let ebound = candidates.len();

        let mut items: Vec<ESetItem> = candidates
            .into_iter()
            .filter(|(term, _)| {
                include_query_terms || !query_terms.iter().any(|q| q.as_str() == *term)
            })
            .filter(|(term, _)| decider.is_none_or(|d| d.accept(term)))
            .map(|(term, (multiplier, rel_term_freq))| {
                let stats = TermStats {
                    doc_count: index.doc_count(),
                    term_freq: index.term_freq(term),
                    avg_length,
                    rset_size: relevant.len() as u32,
                    rel_term_freq,
                    wqf: 1,
                    query_length: 1,
                };
                ESetItem {
                    term: term.to_string(),
                    weight: expand.weight(multiplier, &stats),
                }
            })
            .collect();

        items.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.term.cmp(&b.term)));
        items.truncate(maxitems);

        log::debug!(
            "get_eset({maxitems}) from {} relevant documents: {} of {ebound} terms",
            relevant.len(),
            items.len()
        );
        Ok(ESet { items, ebound })
    }

    pub fn description(&self) -> String {
        format!(
            "Xapian::Enquire({}, {}, weight={})",
            self.reader.description(),
            self.query,
            self.weight.name()
        )
    }
}

impl fmt::Display for Enquire<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Total wqf of each non-empty term in `query`.
fn collect_wqfs(query: &Query, out: &mut BTreeMap<String, u32>) {
    match query {
        Query::Term { term, wqf, .. } if !term.is_empty() => {
            *out.entry(term.clone()).or_insert(0) += wqf;
        }
        Query::Compound { subqueries, .. } => {
            for subquery in subqueries {
                collect_wqfs(subquery, out);
            }
        }
        Query::ScaleWeight { subquery, .. } => collect_wqfs(subquery, out),
        Query::Empty | Query::Term { .. } | Query::ValueRange { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::inmemory;
    use crate::query::Op;
    use crate::weight::BoolWeight;

    fn database() -> crate::database::WritableDatabase {
        let mut db = inmemory::open();
        for text in ["there is a cat", "is it", "cat and dog", "dog dog dog"] {
            let mut doc = Document::new();
            for (pos, word) in text.split_whitespace().enumerate() {
                doc.add_posting(word, pos as u32 + 1);
            }
            doc.set_data(text);
            db.add_document(doc).unwrap();
        }
        db
    }

    #[test]
    fn test_no_query_gives_empty_mset() {
        let db = database();
        let enquire = Enquire::new(&db);
        let mset = enquire.get_mset(0, 10).unwrap();
        assert!(mset.is_empty());
        assert_eq!(mset.matches_estimated(), 0);
    }

    #[test]
    fn test_ranking_and_statistics() {
        let db = database();
        let mut enquire = Enquire::new(&db);
        enquire.set_query(&Query::from_terms(Op::Or, ["there", "is"]).unwrap());
        let mset = enquire.get_mset(0, 10).unwrap();

        assert_eq!(mset.docids(), vec![1, 2]);
        let best = mset.first_item().unwrap();
        assert_eq!(best.percent(), 100);
        assert_eq!(best.matching_terms(), &["is".to_string(), "there".to_string()]);
        assert_eq!(mset.max_attained(), best.weight());
        assert!(mset.max_possible() >= mset.max_attained());
        assert_eq!(mset.termfreq("is").unwrap(), 2);
        assert!(mset.get_element(1).unwrap().percent() < 100);
    }

    #[test]
    fn test_pagination() {
        let db = database();
        let mut enquire = Enquire::new(&db);
        enquire.set_query(&Query::match_all());

        let all = enquire.get_mset(0, 10).unwrap();
        assert_eq!(all.docids(), vec![1, 2, 3, 4]);

        let page = enquire.get_mset(1, 2).unwrap();
        assert_eq!(page.docids(), vec![2, 3]);
        assert_eq!(page.first(), 1);
        assert_eq!(page.get_element(0).unwrap().rank(), 1);
        assert_eq!(page.matches_estimated(), 4);

        assert!(enquire.get_mset(4, 10).unwrap().is_empty());
        assert!(enquire.get_mset(0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_docid_order_breaks_ties() {
        let db = database();
        let mut enquire = Enquire::new(&db);
        enquire.set_weighting_scheme(Box::new(BoolWeight));
        enquire.set_query(&Query::term("dog"));

        assert_eq!(enquire.get_mset(0, 10).unwrap().docids(), vec![3, 4]);
        enquire.set_docid_order(DocidOrder::Descending);
        assert_eq!(enquire.get_mset(0, 10).unwrap().docids(), vec![4, 3]);
    }

    #[test]
    fn test_match_decider() {
        let db = database();
        let mut enquire = Enquire::new(&db);
        enquire.set_query(&Query::term("dog"));

        let mentions_cat =
            |doc: &Document| doc.data_str().is_some_and(|text| text.contains("cat"));
        let mset = enquire.get_mset_with(0, 10, None, Some(&mentions_cat)).unwrap();
        assert_eq!(mset.docids(), vec![3]);
    }

    #[test]
    fn test_cutoffs() {
        let db = database();
        let mut enquire = Enquire::new(&db);
        enquire.set_query(&Query::from_terms(Op::Or, ["there", "is"]).unwrap());

        enquire.set_cutoff(100, 0.0).unwrap();
        assert_eq!(enquire.get_mset(0, 10).unwrap().docids(), vec![1]);
        assert!(enquire.set_cutoff(101, 0.0).is_err());
        assert!(enquire.set_cutoff(0, -1.0).is_err());
    }

    #[test]
    fn test_matching_terms_for_docid() {
        let db = database();
        let mut enquire = Enquire::new(&db);
        enquire.set_query(&Query::from_terms(Op::Or, ["cat", "dog", "is"]).unwrap());

        let terms: Vec<String> = enquire.get_matching_terms_for_docid(3).unwrap().collect();
        assert_eq!(terms, vec!["cat".to_string(), "dog".to_string()]);
        assert!(matches!(
            enquire.get_matching_terms_for_docid(99),
            Err(EnquireError::DocNotFound(99))
        ));
    }

    #[test]
    fn test_eset_suggests_terms_from_relevant_documents() {
        let db = database();
        let mut enquire = Enquire::new(&db);
        enquire.set_query(&Query::term("cat"));

        let rset: RSet = [1, 3].into_iter().collect();
        let eset = enquire.get_eset(10, &rset).unwrap();
        assert!(!eset.terms().contains(&"cat"));
        assert!(eset.terms().contains(&"dog"));
        assert_eq!(eset.ebound(), 6);

        let with_query = enquire.get_eset_with(10, &rset, true, None).unwrap();
        assert!(with_query.terms().contains(&"cat"));

        let no_dogs = |term: &str| term != "dog";
        let filtered = enquire.get_eset_with(10, &rset, false, Some(&no_dogs)).unwrap();
        assert!(!filtered.terms().contains(&"dog"));

        assert!(enquire.get_eset(10, &RSet::new()).unwrap().is_empty());
    }
}

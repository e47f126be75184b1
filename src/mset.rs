//! Match sets: a ranked window of results with statistics about the match.

use std::collections::BTreeMap;
use std::fmt;

use crate::document::{DocId, Document};
use crate::error::{EnquireError, Result};

/// One ranked match.
///
/// The document and its matching terms are captured when the match runs, so
/// an item stays valid even if the database changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MSetItem {
    pub(crate) docid: DocId,
    pub(crate) weight: f64,
    pub(crate) rank: usize,
    pub(crate) percent: u32,
    pub(crate) document: Document,
    pub(crate) matching_terms: Vec<String>,
    pub(crate) collapse_key: String,
    pub(crate) collapse_count: u32,
}

impl MSetItem {
    pub fn docid(&self) -> DocId {
        self.docid
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Position in the full ranking, counting from 0.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Weight as a percentage of the best possible match.
    pub fn percent(&self) -> u32 {
        self.percent
    }

    /// The document as it was when the match ran.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Query terms indexing this document, in query order.
    pub fn matching_terms(&self) -> &[String] {
        &self.matching_terms
    }

    /// The value this item was collapsed on; empty when collapsing is off
    /// or the document has no value in the collapse slot.
    pub fn collapse_key(&self) -> &str {
        &self.collapse_key
    }

    /// Number of lower-ranked matches with the same collapse key that were
    /// removed in favour of this item.
    pub fn collapse_count(&self) -> u32 {
        self.collapse_count
    }
}

/// Per-term statistics recorded for a match.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TermInfo {
    /// Documents indexed by the term.
    pub termfreq: u32,
    /// Query-time weight of the term.
    pub termweight: f64,
}

/// A window of ranked matches.
#[derive(Debug, Clone, Default)]
pub struct MSet {
    pub(crate) first: usize,
    pub(crate) items: Vec<MSetItem>,
    pub(crate) matches_lower_bound: usize,
    pub(crate) matches_estimated: usize,
    pub(crate) matches_upper_bound: usize,
    pub(crate) max_possible: f64,
    pub(crate) max_attained: f64,
    pub(crate) percent_factor: f64,
    pub(crate) terms: BTreeMap<String, TermInfo>,
}

impl MSet {
    /// Number of items in this window.
    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rank of the first item in the window.
    pub fn first(&self) -> usize {
        self.first
    }

    /// The item at `index` within the window.
    pub fn get_element(&self, index: usize) -> Result<&MSetItem> {
        self.items
            .get(index)
            .ok_or_else(|| EnquireError::index_out_of_range(index, self.items.len()))
    }

    /// The highest ranked item in the window.
    pub fn first_item(&self) -> Option<&MSetItem> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MSetItem> {
        self.items.iter()
    }

    /// Docids of the window in rank order.
    pub fn docids(&self) -> Vec<DocId> {
        self.items.iter().map(|item| item.docid).collect()
    }

    pub fn matches_lower_bound(&self) -> usize {
        self.matches_lower_bound
    }

    pub fn matches_estimated(&self) -> usize {
        self.matches_estimated
    }

    pub fn matches_upper_bound(&self) -> usize {
        self.matches_upper_bound
    }

    /// Upper bound on the weight any document could get.
    pub fn max_possible(&self) -> f64 {
        self.max_possible
    }

    /// Highest weight of any matching document, inside the window or not.
    pub fn max_attained(&self) -> f64 {
        self.max_attained
    }

    /// Express `weight` as a percentage on the same scale as the items.
    pub fn convert_to_percent(&self, weight: f64) -> u32 {
        percent(weight, self.percent_factor)
    }

    /// Number of documents indexed by a query term.
    pub fn termfreq(&self, term: &str) -> Result<u32> {
        self.term_info(term).map(|info| info.termfreq)
    }

    /// Query-time weight of a query term.
    pub fn termweight(&self, term: &str) -> Result<f64> {
        self.term_info(term).map(|info| info.termweight)
    }

    fn term_info(&self, term: &str) -> Result<&TermInfo> {
        self.terms.get(term).ok_or_else(|| {
            EnquireError::invalid_argument(format!("term '{term}' is not in the query"))
        })
    }

    pub fn description(&self) -> String {
        format!(
            "Xapian::MSet(first={}, size={}, matches={}, max_possible={}, max_attained={})",
            self.first,
            self.items.len(),
            self.matches_estimated,
            self.max_possible,
            self.max_attained
        )
    }
}

impl<'a> IntoIterator for &'a MSet {
    type Item = &'a MSetItem;
    type IntoIter = std::slice::Iter<'a, MSetItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for MSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Percentage for `weight` given a scale factor. A factor of 0 means every
/// match has weight 0, and every match is then 100%.
pub(crate) fn percent(weight: f64, factor: f64) -> u32 {
    if factor <= 0.0 {
        return 100;
    }
    let scaled = (weight * factor * 100.0).round();
    if weight > 0.0 && scaled < 1.0 {
        1
    } else {
        scaled.clamp(0.0, 100.0) as u32
    }
}

//! Documents: an opaque data payload plus the terms and values that index it.
//!
//! A document carries three kinds of indexing information:
//!
//! - **postings**: a term occurring at one or more word positions;
//! - **boolean terms**: terms with no positional information (tags, ids);
//! - **values**: strings stored in numbered slots, used for range filters.
//!
//! Once a document has been added to a database it is assigned a [`DocId`],
//! which never changes and is never reused.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EnquireError, Result};

/// Identifier assigned to a document by a database. Valid ids start at 1.
pub type DocId = u32;

/// Per-document information about one term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    /// Within-document frequency.
    pub wdf: u32,
    /// Word positions, in ascending order. A position may repeat.
    pub positions: Vec<u32>,
}

/// A document to be indexed or retrieved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    data: Vec<u8>,
    terms: BTreeMap<String, TermEntry>,
    values: BTreeMap<u32, String>,
    #[serde(skip)]
    docid: Option<DocId>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Document::default()
    }

    /// The id this document has in a database, if it was read from one.
    pub fn docid(&self) -> Option<DocId> {
        self.docid
    }

    pub(crate) fn with_docid(mut self, docid: DocId) -> Self {
        self.docid = Some(docid);
        self
    }

    /// Replace the data payload.
    pub fn set_data<D: Into<Vec<u8>>>(&mut self, data: D) {
        self.data = data.into();
    }

    /// The data payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The data payload as text, if it is valid UTF-8.
    pub fn data_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Record an occurrence of `term` at `position`, incrementing its wdf.
    pub fn add_posting<T: Into<String>>(&mut self, term: T, position: u32) {
        self.add_posting_with_wdf(term, position, 1);
    }

    /// Record an occurrence of `term` at `position`, adding `wdf_inc` to its wdf.
    pub fn add_posting_with_wdf<T: Into<String>>(&mut self, term: T, position: u32, wdf_inc: u32) {
        let entry = self.terms.entry(term.into()).or_default();
        entry.wdf += wdf_inc;
        let at = match entry.positions.binary_search(&position) {
            Ok(i) | Err(i) => i,
        };
        entry.positions.insert(at, position);
    }

    /// Add a term without positional information, incrementing its wdf.
    pub fn add_term<T: Into<String>>(&mut self, term: T) {
        self.add_term_with_wdf(term, 1);
    }

    /// Add a term without positional information, adding `wdf_inc` to its wdf.
    pub fn add_term_with_wdf<T: Into<String>>(&mut self, term: T, wdf_inc: u32) {
        self.terms.entry(term.into()).or_default().wdf += wdf_inc;
    }

    /// Add a term that only filters: it has no positions and contributes no wdf.
    pub fn add_boolean_term<T: Into<String>>(&mut self, term: T) {
        self.terms.entry(term.into()).or_default();
    }

    /// Remove a term and all of its positions.
    pub fn remove_term(&mut self, term: &str) -> Result<()> {
        self.terms.remove(term).map(|_| ()).ok_or_else(|| {
            EnquireError::invalid_argument(format!("term '{term}' is not in the document"))
        })
    }

    /// Remove one occurrence of `term` at `position`, decrementing its wdf.
    pub fn remove_posting(&mut self, term: &str, position: u32) -> Result<()> {
        let entry = self.terms.get_mut(term).ok_or_else(|| {
            EnquireError::invalid_argument(format!("term '{term}' is not in the document"))
        })?;
        let at = entry.positions.binary_search(&position).map_err(|_| {
            EnquireError::invalid_argument(format!("term '{term}' has no position {position}"))
        })?;
        entry.positions.remove(at);
        entry.wdf = entry.wdf.saturating_sub(1);
        Ok(())
    }

    /// Remove every term.
    pub fn clear_terms(&mut self) {
        self.terms.clear();
    }

    /// Terms indexing this document, in ascending term order.
    pub fn termlist(&self) -> impl Iterator<Item = (&str, &TermEntry)> {
        self.terms.iter().map(|(term, entry)| (term.as_str(), entry))
    }

    /// Information about a single term.
    pub fn term(&self, term: &str) -> Option<&TermEntry> {
        self.terms.get(term)
    }

    /// Whether `term` indexes this document.
    pub fn has_term(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    /// Document length: the sum of all wdfs.
    pub fn length(&self) -> u64 {
        self.terms.values().map(|entry| entry.wdf as u64).sum()
    }

    /// Store `value` in `slot`, replacing any previous value.
    pub fn add_value<V: Into<String>>(&mut self, slot: u32, value: V) {
        self.values.insert(slot, value.into());
    }

    /// The value in `slot`, if any.
    pub fn value(&self, slot: u32) -> Option<&str> {
        self.values.get(&slot).map(String::as_str)
    }

    /// Remove the value in `slot`.
    pub fn remove_value(&mut self, slot: u32) -> Option<String> {
        self.values.remove(&slot)
    }

    /// All values, in ascending slot order.
    pub fn values(&self) -> impl Iterator<Item = (u32, &str)> {
        self.values.iter().map(|(slot, value)| (*slot, value.as_str()))
    }

    /// Remove every value.
    pub fn clear_values(&mut self) {
        self.values.clear();
    }

    /// Introspection string.
    pub fn description(&self) -> String {
        format!(
            "Xapian::Document(data={:?}, terms={}, values={})",
            String::from_utf8_lossy(&self.data),
            self.terms.len(),
            self.values.len()
        )
    }
}

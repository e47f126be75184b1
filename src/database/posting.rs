//! Posting lists.
//!
//! A [`PostingList`] holds, for a single term, one [`Posting`] per document
//! containing that term, ordered by document id.

use serde::{Deserialize, Serialize};

use crate::document::{DocId, TermEntry};

/// A single posting in a posting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Document ID.
    pub docid: DocId,
    /// Within-document frequency of the term.
    pub wdf: u32,
    /// Positions of the term in the document, ascending.
    pub positions: Vec<u32>,
}

impl Posting {
    /// Create a posting without positions.
    pub fn new(docid: DocId, wdf: u32) -> Self {
        Posting {
            docid,
            wdf,
            positions: Vec::new(),
        }
    }

    /// Build a posting from a document's entry for the term.
    pub fn from_entry(docid: DocId, entry: &TermEntry) -> Self {
        Posting {
            docid,
            wdf: entry.wdf,
            positions: entry.positions.clone(),
        }
    }
}

/// A posting list for a specific term.
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    /// The postings in this list, sorted by docid.
    postings: Vec<Posting>,
    /// Sum of wdf over all postings.
    collection_freq: u64,
}

impl PostingList {
    /// Create a new empty posting list.
    pub fn new() -> Self {
        PostingList::default()
    }

    /// Add a posting, replacing any existing posting for the same document.
    pub fn add_posting(&mut self, posting: Posting) {
        self.collection_freq += posting.wdf as u64;

        match self
            .postings
            .binary_search_by_key(&posting.docid, |p| p.docid)
        {
            Ok(pos) => {
                let old = std::mem::replace(&mut self.postings[pos], posting);
                self.collection_freq -= old.wdf as u64;
            }
            Err(pos) => self.postings.insert(pos, posting),
        }
    }

    /// Remove the posting for `docid`, returning it if present.
    pub fn remove_posting(&mut self, docid: DocId) -> Option<Posting> {
        let pos = self
            .postings
            .binary_search_by_key(&docid, |p| p.docid)
            .ok()?;
        let removed = self.postings.remove(pos);
        self.collection_freq -= removed.wdf as u64;
        Some(removed)
    }

    /// The posting for `docid`, if the term occurs in it.
    pub fn get(&self, docid: DocId) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&docid, |p| p.docid)
            .ok()
            .map(|pos| &self.postings[pos])
    }

    /// Number of documents the term occurs in.
    pub fn doc_freq(&self) -> u32 {
        self.postings.len() as u32
    }

    /// Total number of occurrences across all documents.
    pub fn collection_freq(&self) -> u64 {
        self.collection_freq
    }

    /// Whether the list has no postings.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Iterate postings in docid order.
    pub fn iter(&self) -> std::slice::Iter<'_, Posting> {
        self.postings.iter()
    }

}

impl<'a> IntoIterator for &'a PostingList {
    type Item = &'a Posting;
    type IntoIter = std::slice::Iter<'a, Posting>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

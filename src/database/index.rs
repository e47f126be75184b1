//! The in-memory inverted index shared by every database backend.
//!
//! The index keeps a forward map (docid → document) and an inverted map
//! (term → posting list). Every mutation updates both, so the inverted map
//! can always be rebuilt from the forward one. Document ids are handed out
//! from a high-water mark that never moves backwards, so a deleted id is
//! never reused.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::database::posting::{Posting, PostingList};
use crate::document::{DocId, Document};
use crate::error::{EnquireError, Result};

/// Forward and inverted mappings for a set of documents.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    documents: BTreeMap<DocId, Document>,
    postings: BTreeMap<String, PostingList>,
    doc_lengths: BTreeMap<DocId, u64>,
    total_length: u64,
    last_docid: DocId,
}

impl InvertedIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        InvertedIndex::default()
    }

    /// Rebuild an index from stored documents and the docid high-water mark.
    pub fn from_documents<I>(documents: I, last_docid: DocId) -> Result<Self>
    where
        I: IntoIterator<Item = (DocId, Document)>,
    {
        let mut index = InvertedIndex::new();
        for (docid, document) in documents {
            if docid == 0 || docid > last_docid {
                return Err(EnquireError::database_opening(format!(
                    "document id {docid} outside 1..={last_docid}"
                )));
            }
            if index.documents.contains_key(&docid) {
                return Err(EnquireError::database_opening(format!(
                    "document id {docid} stored twice"
                )));
            }
            index.insert(docid, document);
        }
        index.last_docid = last_docid;
        Ok(index)
    }

    /// Add a document under the next unused id.
    pub fn add_document(&mut self, document: Document) -> Result<DocId> {
        let docid = self
            .last_docid
            .checked_add(1)
            .ok_or_else(|| EnquireError::other("document id space exhausted"))?;
        self.last_docid = docid;
        self.insert(docid, document);
        Ok(docid)
    }

    /// Replace the document stored under `docid`, or store it there if the
    /// id is unused. Ids beyond the high-water mark advance it.
    pub fn replace_document(&mut self, docid: DocId, document: Document) -> Result<()> {
        if docid == 0 {
            return Err(EnquireError::invalid_argument("document id 0 is invalid"));
        }
        self.remove(docid);
        self.insert(docid, document);
        self.last_docid = self.last_docid.max(docid);
        Ok(())
    }

    /// Delete a document and all of its postings.
    pub fn delete_document(&mut self, docid: DocId) -> Result<Document> {
        self.remove(docid).ok_or(EnquireError::DocNotFound(docid))
    }

    fn insert(&mut self, docid: DocId, document: Document) {
        for (term, entry) in document.termlist() {
            self.postings
                .entry(term.to_string())
                .or_default()
                .add_posting(Posting::from_entry(docid, entry));
        }
        let length = document.length();
        self.doc_lengths.insert(docid, length);
        self.total_length += length;
        self.documents.insert(docid, document.with_docid(docid));
    }

    fn remove(&mut self, docid: DocId) -> Option<Document> {
        let document = self.documents.remove(&docid)?;
        for (term, _) in document.termlist() {
            if let Some(list) = self.postings.get_mut(term) {
                list.remove_posting(docid);
                if list.is_empty() {
                    self.postings.remove(term);
                }
            }
        }
        if let Some(length) = self.doc_lengths.remove(&docid) {
            self.total_length -= length;
        }
        Some(document)
    }

    /// Number of live documents.
    pub fn doc_count(&self) -> u32 {
        self.documents.len() as u32
    }

    /// Highest document id ever assigned.
    pub fn last_docid(&self) -> DocId {
        self.last_docid
    }

    /// Sum of the lengths of all live documents.
    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// Average document length, 0 for an empty index.
    pub fn avg_length(&self) -> f64 {
        if self.documents.is_empty() {
            0.0
        } else {
            self.total_length as f64 / self.documents.len() as f64
        }
    }

    /// Length of one document.
    pub fn doc_length(&self, docid: DocId) -> Result<u64> {
        self.doc_lengths
            .get(&docid)
            .copied()
            .ok_or(EnquireError::DocNotFound(docid))
    }

    /// The posting list for `term`, if any document contains it.
    pub fn postlist(&self, term: &str) -> Option<&PostingList> {
        self.postings.get(term)
    }

    /// Number of documents containing `term`.
    pub fn term_freq(&self, term: &str) -> u32 {
        self.postings.get(term).map_or(0, PostingList::doc_freq)
    }

    /// Number of occurrences of `term` across all documents.
    pub fn collection_freq(&self, term: &str) -> u64 {
        self.postings.get(term).map_or(0, PostingList::collection_freq)
    }

    /// Whether any document contains `term`.
    pub fn term_exists(&self, term: &str) -> bool {
        self.postings.contains_key(term)
    }

    /// A stored document.
    pub fn document(&self, docid: DocId) -> Result<&Document> {
        self.documents
            .get(&docid)
            .ok_or(EnquireError::DocNotFound(docid))
    }

    /// All live documents in docid order.
    pub fn documents(&self) -> impl Iterator<Item = (DocId, &Document)> {
        self.documents.iter().map(|(docid, doc)| (*docid, doc))
    }

    /// All live document ids in ascending order.
    pub fn docids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.documents.keys().copied()
    }

    /// Every indexed term starting with `prefix`, in ascending order.
    pub fn allterms<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.postings
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(term, _)| term.as_str())
            .take_while(move |term| term.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(terms: &[(&str, u32)]) -> Document {
        let mut doc = Document::new();
        for (term, pos) in terms {
            doc.add_posting(*term, *pos);
        }
        doc
    }

    #[test]
    fn test_add_assigns_increasing_ids() {
        let mut index = InvertedIndex::new();
        assert_eq!(index.add_document(doc(&[("a", 1)])).unwrap(), 1);
        assert_eq!(index.add_document(doc(&[("b", 1)])).unwrap(), 2);
        assert_eq!(index.doc_count(), 2);
        assert_eq!(index.document(2).unwrap().docid(), Some(2));
    }

    #[test]
    fn test_inverted_map_tracks_forward_map() {
        let mut index = InvertedIndex::new();
        let first = index.add_document(doc(&[("a", 1), ("b", 2), ("a", 3)])).unwrap();
        let second = index.add_document(doc(&[("b", 1)])).unwrap();

        assert_eq!(index.term_freq("a"), 1);
        assert_eq!(index.term_freq("b"), 2);
        assert_eq!(index.collection_freq("a"), 2);
        assert_eq!(index.postlist("a").unwrap().get(first).unwrap().positions, vec![1, 3]);
        assert_eq!(index.total_length(), 4);
        assert_eq!(index.avg_length(), 2.0);

        index.delete_document(first).unwrap();
        assert!(!index.term_exists("a"));
        assert_eq!(index.term_freq("b"), 1);
        assert_eq!(index.postlist("b").unwrap().iter().next().unwrap().docid, second);
        assert_eq!(index.total_length(), 1);
    }

    #[test]
    fn test_deleted_ids_are_not_reused() {
        let mut index = InvertedIndex::new();
        let first = index.add_document(doc(&[("a", 1)])).unwrap();
        index.delete_document(first).unwrap();

        assert_eq!(index.doc_count(), 0);
        assert_eq!(index.add_document(doc(&[("a", 1)])).unwrap(), 2);
        assert!(matches!(
            index.delete_document(first),
            Err(EnquireError::DocNotFound(1))
        ));
    }

    #[test]
    fn test_replace_document() {
        let mut index = InvertedIndex::new();
        let id = index.add_document(doc(&[("old", 1)])).unwrap();
        index.replace_document(id, doc(&[("new", 1)])).unwrap();

        assert!(!index.term_exists("old"));
        assert_eq!(index.term_freq("new"), 1);

        index.replace_document(10, doc(&[("far", 1)])).unwrap();
        assert_eq!(index.last_docid(), 10);
        assert_eq!(index.add_document(Document::new()).unwrap(), 11);
        assert!(index.replace_document(0, Document::new()).is_err());
    }

    #[test]
    fn test_allterms_prefix() {
        let mut index = InvertedIndex::new();
        index
            .add_document(doc(&[("Zrun", 1), ("apple", 2), ("Zfli", 3), ("Xtag", 4)]))
            .unwrap();

        assert_eq!(index.allterms("Z").collect::<Vec<_>>(), vec!["Zfli", "Zrun"]);
        assert_eq!(index.allterms("").count(), 4);
    }

    #[test]
    fn test_rebuild_rejects_bad_ids() {
        let result = InvertedIndex::from_documents(vec![(5, Document::new())], 3);
        assert!(matches!(result, Err(EnquireError::DatabaseOpening(_))));

        let index = InvertedIndex::from_documents(vec![(2, doc(&[("a", 1)]))], 3).unwrap();
        assert_eq!(index.last_docid(), 3);
        assert_eq!(index.term_freq("a"), 1);
    }
}

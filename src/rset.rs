//! Relevance sets.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::DocId;

/// Documents the user has marked as relevant.
///
/// Used to bias term weights towards terms found in relevant documents and
/// as the source of expansion terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RSet {
    docids: BTreeSet<DocId>,
}

impl RSet {
    pub fn new() -> Self {
        RSet::default()
    }

    /// Mark a document as relevant.
    pub fn add_document(&mut self, docid: DocId) {
        self.docids.insert(docid);
    }

    /// Unmark a document. Returns whether it was marked.
    pub fn remove_document(&mut self, docid: DocId) -> bool {
        self.docids.remove(&docid)
    }

    pub fn contains(&self, docid: DocId) -> bool {
        self.docids.contains(&docid)
    }

    pub fn size(&self) -> usize {
        self.docids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docids.is_empty()
    }

    /// Marked documents in ascending docid order.
    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        self.docids.iter().copied()
    }

    pub fn description(&self) -> String {
        let ids: Vec<String> = self.docids.iter().map(DocId::to_string).collect();
        format!("Xapian::RSet({})", ids.join(", "))
    }
}

impl FromIterator<DocId> for RSet {
    fn from_iter<I: IntoIterator<Item = DocId>>(iter: I) -> Self {
        RSet {
            docids: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for RSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rset_membership() {
        let mut rset = RSet::new();
        assert!(rset.is_empty());

        rset.add_document(3);
        rset.add_document(1);
        rset.add_document(3);

        assert_eq!(rset.size(), 2);
        assert!(rset.contains(1));
        assert_eq!(rset.iter().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(rset.to_string(), "Xapian::RSet(1, 3)");

        assert!(rset.remove_document(1));
        assert!(!rset.remove_document(1));
        assert_eq!(rset.size(), 1);
    }
}

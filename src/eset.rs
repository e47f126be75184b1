//! Expand sets: terms suggested by a set of relevant documents.

use std::fmt;

use crate::error::{EnquireError, Result};

/// A suggested term with its offer weight.
#[derive(Debug, Clone, PartialEq)]
pub struct ESetItem {
    pub(crate) term: String,
    pub(crate) weight: f64,
}

impl ESetItem {
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// Ranked expansion terms, best first.
#[derive(Debug, Clone, Default)]
pub struct ESet {
    pub(crate) items: Vec<ESetItem>,
    pub(crate) ebound: usize,
}

impl ESet {
    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of candidate terms considered.
    pub fn ebound(&self) -> usize {
        self.ebound
    }

    pub fn get_element(&self, index: usize) -> Result<&ESetItem> {
        self.items
            .get(index)
            .ok_or_else(|| EnquireError::index_out_of_range(index, self.items.len()))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ESetItem> {
        self.items.iter()
    }

    /// The suggested terms, best first.
    pub fn terms(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.term.as_str()).collect()
    }

    pub fn description(&self) -> String {
        let items: Vec<String> = self
            .items
            .iter()
            .map(|item| format!("{}={}", item.term, item.weight))
            .collect();
        format!("Xapian::ESet({})", items.join(", "))
    }
}

impl<'a> IntoIterator for &'a ESet {
    type Item = &'a ESetItem;
    type IntoIter = std::slice::Iter<'a, ESetItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for ESet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

//! # enquire
//!
//! A probabilistic full-text search core: documents are indexed into an
//! inverted index, queries are built as immutable operator trees, and
//! matches come back as ranked, weighted match sets.
//!
//! ## Features
//!
//! - Porter stemming and a term generator for free text
//! - In-memory and on-disk databases with single-writer locking
//! - Boolean, positional and weighted query operators
//! - BM25, traditional and boolean weighting with relevance feedback
//! - Query expansion from relevant documents
//!
//! ```
//! use enquire::prelude::*;
//!
//! let mut db = inmemory::open();
//! let mut doc = Document::new();
//! doc.set_data("is there anybody out there");
//! doc.add_posting("is", 1);
//! doc.add_posting("there", 2);
//! db.add_document(doc).unwrap();
//!
//! let mut enquire = Enquire::new(&db);
//! enquire.set_query(&Query::from_terms(Op::Or, ["there", "is"]).unwrap());
//! let mset = enquire.get_mset(0, 10).unwrap();
//!
//! let item = mset.get_element(0).unwrap();
//! let terms: Vec<String> = enquire.get_matching_terms(item).collect();
//! assert_eq!(terms, ["is", "there"]);
//! ```

pub mod analysis;
pub mod cli;
pub mod database;
pub mod document;
pub mod enquire;
pub mod error;
pub mod eset;
pub(crate) mod matcher;
pub mod mset;
pub mod query;
pub mod rset;
pub mod weight;

pub mod prelude {
    pub use crate::analysis::{Stem, StemStrategy, TermGenerator};
    pub use crate::database::{
        Database, DatabaseConfig, DbAction, IndexReader, WritableDatabase, inmemory,
    };
    pub use crate::document::{DocId, Document};
    pub use crate::enquire::{DocidOrder, Enquire, MatchDecider, TermIterator};
    pub use crate::error::{EnquireError, Result};
    pub use crate::eset::ESet;
    pub use crate::mset::{MSet, MSetItem};
    pub use crate::query::{Op, Query};
    pub use crate::rset::RSet;
    pub use crate::weight::{BM25Weight, BoolWeight, TradWeight, Weight};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Turning free text into document postings.
//!
//! [`TermGenerator`] splits text into words on Unicode word boundaries,
//! lowercases them, and adds them to a [`Document`] with increasing word
//! positions. With a stemmer set, stemmed forms are added according to the
//! configured [`StemStrategy`].

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::stem::{Language, Stem};
use crate::document::Document;

/// Prefix for stemmed terms added alongside unstemmed ones.
pub const STEMMED_PREFIX: &str = "Z";

/// How stemmed forms are indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemStrategy {
    /// Index unstemmed words only.
    None,
    /// Index unstemmed words with positions, plus `Z`-prefixed stems without.
    #[default]
    Some,
    /// Index stemmed words only, with positions.
    All,
}

/// Configuration for a [`TermGenerator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermGeneratorConfig {
    /// Stemming strategy.
    pub stem_strategy: StemStrategy,
    /// Words longer than this many bytes are skipped.
    pub max_word_length: usize,
}

impl Default for TermGeneratorConfig {
    fn default() -> Self {
        TermGeneratorConfig {
            stem_strategy: StemStrategy::Some,
            max_word_length: 64,
        }
    }
}

/// Generates terms from free text.
#[derive(Debug, Clone, Default)]
pub struct TermGenerator {
    stemmer: Stem,
    config: TermGeneratorConfig,
    termpos: u32,
}

impl TermGenerator {
    /// Create a term generator with no stemming.
    pub fn new() -> Self {
        TermGenerator::default()
    }

    /// Create a term generator with the given configuration.
    pub fn with_config(config: TermGeneratorConfig) -> Self {
        TermGenerator {
            config,
            ..TermGenerator::default()
        }
    }

    /// Set the stemmer.
    pub fn set_stemmer(&mut self, stemmer: Stem) {
        self.stemmer = stemmer;
    }

    /// Set the stemming strategy.
    pub fn set_stem_strategy(&mut self, strategy: StemStrategy) {
        self.config.stem_strategy = strategy;
    }

    /// The current word position.
    pub fn termpos(&self) -> u32 {
        self.termpos
    }

    /// Set the current word position.
    pub fn set_termpos(&mut self, termpos: u32) {
        self.termpos = termpos;
    }

    /// Leave a gap in word positions, e.g. between fields, so that phrases
    /// do not match across the boundary.
    pub fn increase_termpos(&mut self, delta: u32) {
        self.termpos += delta;
    }

    /// Index `text` into `doc`, prefixing every term with `prefix`.
    pub fn index_text(&mut self, doc: &mut Document, text: &str, prefix: &str) {
        self.index_text_with_wdf(doc, text, 1, prefix);
    }

    /// Index `text` into `doc`, adding `wdf_inc` per occurrence.
    pub fn index_text_with_wdf(
        &mut self,
        doc: &mut Document,
        text: &str,
        wdf_inc: u32,
        prefix: &str,
    ) {
        let stem_strategy = if self.stemmer.language() == Language::None {
            StemStrategy::None
        } else {
            self.config.stem_strategy
        };

        for word in text.unicode_words() {
            if word.len() > self.config.max_word_length {
                continue;
            }
            let word = word.to_lowercase();
            self.termpos += 1;

            match stem_strategy {
                StemStrategy::None => {
                    doc.add_posting_with_wdf(format!("{prefix}{word}"), self.termpos, wdf_inc);
                }
                StemStrategy::Some => {
                    doc.add_posting_with_wdf(format!("{prefix}{word}"), self.termpos, wdf_inc);
                    let stemmed = self.stemmer.stem_word(&word);
                    doc.add_term_with_wdf(format!("{STEMMED_PREFIX}{prefix}{stemmed}"), wdf_inc);
                }
                StemStrategy::All => {
                    let stemmed = self.stemmer.stem_word(&word);
                    doc.add_posting_with_wdf(format!("{prefix}{stemmed}"), self.termpos, wdf_inc);
                }
            }
        }
    }
}

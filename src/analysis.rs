//! Text analysis: stemming and term generation.

pub mod stem;
pub mod term_generator;

pub use stem::{Language, Stem, Stemmer};
pub use term_generator::{StemStrategy, TermGenerator, TermGeneratorConfig};

//! Stemmers: language-parameterised word normalisers.
//!
//! A [`Stem`] is built from a language code and maps word forms to a root
//! form. Stemming is a pure function of (language, word): the same input
//! always yields the same output, and a `Stem` can be shared freely between
//! threads.
//!
//! # Examples
//!
//! ```
//! use enquire::analysis::stem::Stem;
//!
//! let stem = Stem::new("english").unwrap();
//! assert_eq!(stem.to_string(), "Xapian::Stem(english)");
//! assert_eq!(stem.stem_word("running"), "run");
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::{EnquireError, Result};

pub mod identity;
pub mod porter;

pub use identity::IdentityStemmer;
pub use porter::PorterStemmer;

/// Trait for stemming algorithms.
pub trait Stemmer: Send + Sync {
    /// Stem a word to its root form.
    fn stem(&self, word: &str) -> String;

    /// Get the name of this stemmer.
    fn name(&self) -> &'static str;
}

/// Languages with a built-in stemmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// No stemming.
    None,
    /// English, using the Porter algorithm.
    English,
    /// The original Porter algorithm.
    Porter,
}

/// Accepted language codes, including ISO 639 aliases.
const LANGUAGE_CODES: &[(&str, Language)] = &[
    ("", Language::None),
    ("en", Language::English),
    ("english", Language::English),
    ("none", Language::None),
    ("porter", Language::Porter),
];

impl Language {
    /// Resolve a language code such as `"english"` or `"en"`.
    pub fn from_code(code: &str) -> Result<Self> {
        LANGUAGE_CODES
            .iter()
            .find(|(name, _)| *name == code)
            .map(|(_, language)| *language)
            .ok_or_else(|| EnquireError::unsupported_language(code))
    }

    /// The canonical name of this language.
    pub fn name(&self) -> &'static str {
        match self {
            Language::None => "none",
            Language::English => "english",
            Language::Porter => "porter",
        }
    }

    fn stemmer(&self) -> Arc<dyn Stemmer> {
        match self {
            Language::None => Arc::new(IdentityStemmer::new()),
            Language::English | Language::Porter => Arc::new(PorterStemmer::new()),
        }
    }
}

/// A stemmer bound to a language.
#[derive(Clone)]
pub struct Stem {
    language: Language,
    stemmer: Arc<dyn Stemmer>,
}

impl Stem {
    /// Create a stemmer for the given language code.
    ///
    /// Fails with [`EnquireError::UnsupportedLanguage`] for unknown codes.
    pub fn new(language: &str) -> Result<Self> {
        let language = Language::from_code(language)?;
        Ok(Stem::for_language(language))
    }

    /// Create a stemmer for an already-resolved language.
    pub fn for_language(language: Language) -> Self {
        Stem {
            language,
            stemmer: language.stemmer(),
        }
    }

    /// A stemmer which leaves words unchanged.
    pub fn none() -> Self {
        Stem::for_language(Language::None)
    }

    /// Stem a single word.
    pub fn stem_word(&self, word: &str) -> String {
        self.stemmer.stem(word)
    }

    /// The language this stemmer was built for.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Canonical names of all languages with a real stemmer.
    pub fn available_languages() -> Vec<&'static str> {
        vec![Language::English.name(), Language::Porter.name()]
    }

    /// Canonical text form, e.g. `Xapian::Stem(english)`.
    pub fn description(&self) -> String {
        format!("Xapian::Stem({})", self.language.name())
    }
}

impl Default for Stem {
    fn default() -> Self {
        Stem::none()
    }
}

impl Stemmer for Stem {
    fn stem(&self, word: &str) -> String {
        self.stem_word(word)
    }

    fn name(&self) -> &'static str {
        self.language.name()
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

impl fmt::Debug for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stem")
            .field("language", &self.language)
            .field("stemmer", &self.stemmer.name())
            .finish()
    }
}

impl PartialEq for Stem {
    fn eq(&self, other: &Self) -> bool {
        self.language == other.language
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_uses_canonical_name() {
        assert_eq!(
            Stem::new("english").unwrap().description(),
            "Xapian::Stem(english)"
        );
        assert_eq!(Stem::new("en").unwrap().to_string(), "Xapian::Stem(english)");
        assert_eq!(Stem::new("").unwrap().to_string(), "Xapian::Stem(none)");
        assert_eq!(Stem::default().to_string(), "Xapian::Stem(none)");
    }

    #[test]
    fn test_unknown_language() {
        match Stem::new("klingon") {
            Err(EnquireError::UnsupportedLanguage(code)) => assert_eq!(code, "klingon"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_stemming_is_pure() {
        for language in Stem::available_languages() {
            let stem = Stem::new(language).unwrap();
            for word in ["is", "there", "anybody", "out", "connections", "running"] {
                assert_eq!(stem.stem_word(word), stem.stem_word(word));
                assert_eq!(stem.stem_word(word), stem.clone().stem_word(word));
            }
        }
    }

    #[test]
    fn test_none_leaves_words_alone() {
        let stem = Stem::new("none").unwrap();
        assert_eq!(stem.stem_word("Connections"), "Connections");
    }

    #[test]
    fn test_stem_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Stem>();
    }
}

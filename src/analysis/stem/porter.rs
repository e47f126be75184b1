//! Porter stemming algorithm.
//!
//! The classic five-step suffix stripper from M.F. Porter's 1980 paper:
//! 1. Plurals and -ed/-ing suffixes, terminal y → i
//! 2. Double suffixes: -ational → -ate, -tional → -tion, ...
//! 3. -icate → -ic, -ative → "", ...
//! 4. Remove -al, -ance, -ence, ... when the stem is long enough
//! 5. Remove final -e and reduce -ll
//!
//! Words are lowercased first. Anything that is not plain ASCII, or is two
//! characters or shorter, is returned lowercased but otherwise untouched.
//!
//! # Examples
//!
//! ```
//! use enquire::analysis::stem::Stemmer;
//! use enquire::analysis::stem::porter::PorterStemmer;
//!
//! let stemmer = PorterStemmer::new();
//!
//! assert_eq!(stemmer.stem("running"), "run");
//! assert_eq!(stemmer.stem("flies"), "fli");
//! assert_eq!(stemmer.stem("traditional"), "tradit");
//! ```

use crate::analysis::stem::Stemmer;

const STEP2_RULES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("abli", "able"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
];

const STEP3_RULES: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

// "ement" must be tried before "ment" and "ent".
const STEP4_SUFFIXES: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

/// Porter stemming algorithm implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

impl PorterStemmer {
    /// Create a new Porter stemmer.
    pub fn new() -> Self {
        PorterStemmer
    }
}

impl Stemmer for PorterStemmer {
    fn stem(&self, word: &str) -> String {
        let lowered = word.to_lowercase();
        if lowered.len() <= 2 || !lowered.bytes().all(|b| b.is_ascii_lowercase()) {
            return lowered;
        }

        let mut w = Word::new(lowered.into_bytes());
        w.step1a();
        w.step1b();
        w.step1c();
        w.apply_first_rule(STEP2_RULES);
        w.apply_first_rule(STEP3_RULES);
        w.step4();
        w.step5();
        w.into_string()
    }

    fn name(&self) -> &'static str {
        "porter"
    }
}

/// A word being stemmed, as lowercase ASCII bytes.
struct Word {
    b: Vec<u8>,
}

impl Word {
    fn new(b: Vec<u8>) -> Self {
        Word { b }
    }

    fn into_string(self) -> String {
        // Only ASCII bytes are ever written.
        String::from_utf8_lossy(&self.b).into_owned()
    }

    /// Whether the byte at `i` is a consonant. `y` is a consonant at the
    /// start of a word or after a vowel.
    fn is_consonant(&self, i: usize) -> bool {
        match self.b[i] {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !self.is_consonant(i - 1),
            _ => true,
        }
    }

    /// Number of vowel-consonant sequences in the first `len` bytes.
    fn measure(&self, len: usize) -> usize {
        let mut m = 0;
        let mut i = 0;

        while i < len && self.is_consonant(i) {
            i += 1;
        }
        while i < len {
            while i < len && !self.is_consonant(i) {
                i += 1;
            }
            if i >= len {
                break;
            }
            m += 1;
            while i < len && self.is_consonant(i) {
                i += 1;
            }
        }

        m
    }

    fn has_vowel(&self, len: usize) -> bool {
        (0..len).any(|i| !self.is_consonant(i))
    }

    /// Whether the first `len` bytes end in a double consonant.
    fn ends_double_consonant(&self, len: usize) -> bool {
        len >= 2 && self.b[len - 1] == self.b[len - 2] && self.is_consonant(len - 1)
    }

    /// Whether the first `len` bytes end consonant-vowel-consonant, where
    /// the final consonant is not w, x or y.
    fn ends_cvc(&self, len: usize) -> bool {
        len >= 3
            && self.is_consonant(len - 3)
            && !self.is_consonant(len - 2)
            && self.is_consonant(len - 1)
            && !matches!(self.b[len - 1], b'w' | b'x' | b'y')
    }

    fn ends_with(&self, suffix: &str) -> bool {
        self.b.ends_with(suffix.as_bytes())
    }

    /// Length of the word without `suffix` (which must be present).
    fn stem_len(&self, suffix: &str) -> usize {
        self.b.len() - suffix.len()
    }

    fn set_suffix(&mut self, old: &str, new: &str) {
        let len = self.stem_len(old);
        self.b.truncate(len);
        self.b.extend_from_slice(new.as_bytes());
    }

    fn step1a(&mut self) {
        if self.ends_with("sses") {
            self.set_suffix("sses", "ss");
        } else if self.ends_with("ies") {
            self.set_suffix("ies", "i");
        } else if self.ends_with("ss") {
            // unchanged
        } else if self.ends_with("s") {
            self.set_suffix("s", "");
        }
    }

    fn step1b(&mut self) {
        if self.ends_with("eed") {
            if self.measure(self.stem_len("eed")) > 0 {
                self.set_suffix("eed", "ee");
            }
            return;
        }

        let stripped = ["ed", "ing"]
            .into_iter()
            .find(|suffix| self.ends_with(suffix) && self.has_vowel(self.stem_len(suffix)));
        let Some(suffix) = stripped else {
            return;
        };
        self.set_suffix(suffix, "");

        let len = self.b.len();
        if self.ends_with("at") || self.ends_with("bl") || self.ends_with("iz") {
            self.b.push(b'e');
        } else if self.ends_double_consonant(len) && !matches!(self.b[len - 1], b'l' | b's' | b'z')
        {
            self.b.truncate(len - 1);
        } else if self.measure(len) == 1 && self.ends_cvc(len) {
            self.b.push(b'e');
        }
    }

    fn step1c(&mut self) {
        if self.ends_with("y") && self.has_vowel(self.stem_len("y")) {
            self.set_suffix("y", "i");
        }
    }

    /// Apply the first rule whose suffix matches, if the remaining stem has
    /// a positive measure. Later rules are never tried.
    fn apply_first_rule(&mut self, rules: &[(&str, &str)]) {
        if let Some((old, new)) = rules.iter().find(|(old, _)| self.ends_with(old)) {
            if self.measure(self.stem_len(old)) > 0 {
                self.set_suffix(old, new);
            }
        }
    }

    fn step4(&mut self) {
        let Some(suffix) = STEP4_SUFFIXES.iter().find(|s| self.ends_with(s)) else {
            return;
        };
        let len = self.stem_len(suffix);
        if self.measure(len) <= 1 {
            return;
        }
        if *suffix == "ion" && !(len > 0 && matches!(self.b[len - 1], b's' | b't')) {
            return;
        }
        self.b.truncate(len);
    }

    fn step5(&mut self) {
        if self.ends_with("e") {
            let len = self.stem_len("e");
            let m = self.measure(len);
            if m > 1 || (m == 1 && !self.ends_cvc(len)) {
                self.b.truncate(len);
            }
        }

        let len = self.b.len();
        if self.ends_with("ll") && self.measure(len) > 1 {
            self.b.truncate(len - 1);
        }
    }
}

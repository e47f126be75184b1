//! Weighting schemes used to rank matching documents.
//!
//! A [`Weight`] turns collection statistics into a per-term weight once per
//! query, then combines that weight with a document's wdf and length for
//! each match. Relevance feedback enters through [`TermStats::rset_size`]
//! and [`TermStats::rel_term_freq`].

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Statistics about one query term.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TermStats {
    /// Documents in the collection.
    pub doc_count: u32,
    /// Documents indexed by the term.
    pub term_freq: u32,
    /// Average document length.
    pub avg_length: f64,
    /// Documents marked relevant.
    pub rset_size: u32,
    /// Relevant documents indexed by the term.
    pub rel_term_freq: u32,
    /// Within-query frequency of the term.
    pub wqf: u32,
    /// Length of the whole query.
    pub query_length: u32,
}

/// A probabilistic weighting scheme.
pub trait Weight: Send + Sync + Debug {
    /// Name of the scheme.
    fn name(&self) -> &'static str;

    /// Query-time weight of a term, independent of any document.
    fn term_weight(&self, stats: &TermStats) -> f64;

    /// Contribution of a term to a document's weight.
    fn sum_part(&self, term_weight: f64, wdf: u32, doc_length: u64, avg_length: f64) -> f64;

    /// Upper bound of [`Weight::sum_part`] over all documents.
    fn max_part(&self, term_weight: f64) -> f64;

    /// Term-independent contribution to a document's weight.
    fn sum_extra(&self, _doc_length: u64, _avg_length: f64, _query_length: u32) -> f64 {
        0.0
    }

    /// Upper bound of [`Weight::sum_extra`].
    fn max_extra(&self, _query_length: u32) -> f64 {
        0.0
    }

    /// Clone into a box.
    fn box_clone(&self) -> Box<dyn Weight>;
}

impl Clone for Box<dyn Weight> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Robertson/Sparck Jones relevance weight.
///
/// Without relevance information this reduces to an inverse document
/// frequency. Small ratios are squashed into `(1, 2)` so the logarithm stays
/// positive and the weight is monotonic in the term's rarity.
pub fn rsj_weight(stats: &TermStats) -> f64 {
    let n = f64::from(stats.doc_count);
    let n_t = f64::from(stats.term_freq);

    let mut tw = if stats.rset_size > 0 {
        let r = f64::from(stats.rset_size);
        let r_t = f64::from(stats.rel_term_freq);
        ((r_t + 0.5) * (n - r - n_t + r_t + 0.5)) / ((r - r_t + 0.5) * (n_t - r_t + 0.5))
    } else {
        (n - n_t + 0.5) / (n_t + 0.5)
    };

    if tw < 2.0 {
        tw = tw.max(1e-6) * 0.5 + 1.0;
    }
    tw.ln()
}

fn normalised_length(doc_length: u64, avg_length: f64, min_normlen: f64) -> f64 {
    if avg_length <= 0.0 {
        return 1.0_f64.max(min_normlen);
    }
    (doc_length as f64 / avg_length).max(min_normlen)
}

/// Parameters of [`BM25Weight`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BM25Params {
    /// Saturation of the wdf contribution. 0 ignores wdf.
    pub k1: f64,
    /// Weight of the document-length correction in `sum_extra`.
    pub k2: f64,
    /// Saturation of the wqf contribution. 0 ignores wqf.
    pub k3: f64,
    /// Strength of length normalisation, in `0..=1`.
    pub b: f64,
    /// Lower bound on the normalised document length.
    pub min_normlen: f64,
}

impl Default for BM25Params {
    fn default() -> Self {
        BM25Params {
            k1: 1.0,
            k2: 0.0,
            k3: 1.0,
            b: 0.5,
            min_normlen: 0.5,
        }
    }
}

/// Okapi BM25, the default scheme.
#[derive(Debug, Clone, Default)]
pub struct BM25Weight {
    params: BM25Params,
}

impl BM25Weight {
    /// BM25 with default parameters.
    pub fn new() -> Self {
        BM25Weight::default()
    }

    /// BM25 with custom parameters. Negative values are clamped to 0 and
    /// `b` to `0..=1`.
    pub fn with_params(params: BM25Params) -> Self {
        BM25Weight {
            params: BM25Params {
                k1: params.k1.max(0.0),
                k2: params.k2.max(0.0),
                k3: params.k3.max(0.0),
                b: params.b.clamp(0.0, 1.0),
                min_normlen: params.min_normlen.max(0.0),
            },
        }
    }

    /// The parameters in use.
    pub fn params(&self) -> &BM25Params {
        &self.params
    }
}

impl Weight for BM25Weight {
    fn name(&self) -> &'static str {
        "BM25"
    }

    fn term_weight(&self, stats: &TermStats) -> f64 {
        let tw = rsj_weight(stats);
        let k3 = self.params.k3;
        if k3 == 0.0 {
            return tw;
        }
        let wqf = f64::from(stats.wqf);
        tw * ((k3 + 1.0) * wqf / (k3 + wqf))
    }

    fn sum_part(&self, term_weight: f64, wdf: u32, doc_length: u64, avg_length: f64) -> f64 {
        let BM25Params { k1, b, min_normlen, .. } = self.params;
        if k1 == 0.0 {
            return term_weight;
        }
        if wdf == 0 {
            return 0.0;
        }
        let wdf = f64::from(wdf);
        let normlen = normalised_length(doc_length, avg_length, min_normlen);
        let k = k1 * ((1.0 - b) + b * normlen);
        term_weight * (k1 + 1.0) * wdf / (k + wdf)
    }

    fn max_part(&self, term_weight: f64) -> f64 {
        term_weight * (self.params.k1 + 1.0)
    }

    fn sum_extra(&self, doc_length: u64, avg_length: f64, query_length: u32) -> f64 {
        if self.params.k2 == 0.0 {
            return 0.0;
        }
        let normlen = normalised_length(doc_length, avg_length, self.params.min_normlen);
        self.params.k2 * f64::from(query_length) * (1.0 - normlen) / (1.0 + normlen)
    }

    fn max_extra(&self, query_length: u32) -> f64 {
        self.params.k2 * f64::from(query_length)
    }

    fn box_clone(&self) -> Box<dyn Weight> {
        Box::new(self.clone())
    }
}

/// Parameters of [`TradWeight`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradParams {
    /// Strength of length normalisation. 0 ignores wdf and length.
    pub k: f64,
}

impl Default for TradParams {
    fn default() -> Self {
        TradParams { k: 1.0 }
    }
}

/// The traditional probabilistic formula.
#[derive(Debug, Clone, Default)]
pub struct TradWeight {
    params: TradParams,
}

impl TradWeight {
    /// Traditional weighting with default parameters.
    pub fn new() -> Self {
        TradWeight::default()
    }

    /// Traditional weighting with custom parameters.
    pub fn with_params(params: TradParams) -> Self {
        TradWeight {
            params: TradParams {
                k: params.k.max(0.0),
            },
        }
    }
}

impl Weight for TradWeight {
    fn name(&self) -> &'static str {
        "Trad"
    }

    fn term_weight(&self, stats: &TermStats) -> f64 {
        rsj_weight(stats) * f64::from(stats.wqf)
    }

    fn sum_part(&self, term_weight: f64, wdf: u32, doc_length: u64, avg_length: f64) -> f64 {
        let k = self.params.k;
        if k == 0.0 {
            return term_weight;
        }
        if wdf == 0 {
            return 0.0;
        }
        let wdf = f64::from(wdf);
        let normlen = normalised_length(doc_length, avg_length, 0.0);
        term_weight * wdf / (k * normlen + wdf)
    }

    fn max_part(&self, term_weight: f64) -> f64 {
        term_weight
    }

    fn box_clone(&self) -> Box<dyn Weight> {
        Box::new(self.clone())
    }
}

/// Gives every match weight 0, leaving docid order to rank results.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolWeight;

impl Weight for BoolWeight {
    fn name(&self) -> &'static str {
        "Bool"
    }

    fn term_weight(&self, _stats: &TermStats) -> f64 {
        0.0
    }

    fn sum_part(&self, _term_weight: f64, _wdf: u32, _doc_length: u64, _avg_length: f64) -> f64 {
        0.0
    }

    fn max_part(&self, _term_weight: f64) -> f64 {
        0.0
    }

    fn box_clone(&self) -> Box<dyn Weight> {
        Box::new(*self)
    }
}

/// Offer weight used to rank expansion terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpandWeight {
    k: f64,
}

impl Default for ExpandWeight {
    fn default() -> Self {
        ExpandWeight { k: 1.0 }
    }
}

impl ExpandWeight {
    /// Contribution of one relevant document containing the term.
    pub fn multiplier(&self, wdf: u32, doc_length: u64, avg_length: f64) -> f64 {
        if wdf == 0 {
            return 1.0;
        }
        let wdf = f64::from(wdf);
        let normlen = normalised_length(doc_length, avg_length, 0.0);
        (self.k + 1.0) * wdf / (self.k * normlen + wdf)
    }

    /// Weight of a term given its summed multipliers.
    pub fn weight(&self, multiplier: f64, stats: &TermStats) -> f64 {
        multiplier * rsj_weight(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(doc_count: u32, term_freq: u32) -> TermStats {
        TermStats {
            doc_count,
            term_freq,
            avg_length: 10.0,
            wqf: 1,
            query_length: 1,
            ..TermStats::default()
        }
    }

    #[test]
    fn test_rarer_terms_weigh_more() {
        let rare = rsj_weight(&stats(1000, 3));
        let common = rsj_weight(&stats(1000, 600));
        assert!(rare > common);
        assert!(common > 0.0);
    }

    #[test]
    fn test_relevance_feedback_boosts_relevant_terms() {
        let base = stats(100, 10);
        let relevant = TermStats {
            rset_size: 2,
            rel_term_freq: 2,
            ..base
        };
        let irrelevant = TermStats {
            rset_size: 2,
            rel_term_freq: 0,
            ..base
        };
        assert!(rsj_weight(&relevant) > rsj_weight(&irrelevant));
    }

    #[test]
    fn test_bm25_is_monotonic_in_wdf() {
        let weight = BM25Weight::new();
        let tw = weight.term_weight(&stats(100, 5));
        let mut last = 0.0;
        for wdf in 1..20 {
            let part = weight.sum_part(tw, wdf, 10, 10.0);
            assert!(part > last);
            assert!(part <= weight.max_part(tw));
            last = part;
        }
        assert_eq!(weight.sum_part(tw, 0, 10, 10.0), 0.0);
    }

    #[test]
    fn test_bm25_prefers_shorter_documents() {
        let weight = BM25Weight::new();
        let tw = weight.term_weight(&stats(100, 5));
        assert!(weight.sum_part(tw, 2, 5, 10.0) > weight.sum_part(tw, 2, 40, 10.0));
    }

    #[test]
    fn test_bm25_params_are_clamped() {
        let weight = BM25Weight::with_params(BM25Params {
            k1: -1.0,
            b: 3.0,
            ..BM25Params::default()
        });
        assert_eq!(weight.params().k1, 0.0);
        assert_eq!(weight.params().b, 1.0);
    }

    #[test]
    fn test_bm25_without_query_frequency_factor() {
        let weight = BM25Weight::with_params(BM25Params {
            k3: 0.0,
            ..BM25Params::default()
        });
        let no_wqf = TermStats {
            wqf: 0,
            ..stats(100, 5)
        };
        let tw = weight.term_weight(&no_wqf);
        assert!(tw.is_finite());
        assert_eq!(tw, rsj_weight(&no_wqf));
        assert_eq!(weight.term_weight(&stats(100, 5)), tw);
    }

    #[test]
    fn test_trad_and_bool() {
        let trad = TradWeight::new();
        let tw = trad.term_weight(&stats(100, 5));
        assert!(trad.sum_part(tw, 3, 10, 10.0) < trad.max_part(tw));

        let boolean = BoolWeight;
        assert_eq!(boolean.term_weight(&stats(100, 5)), 0.0);
        assert_eq!(boolean.sum_part(1.0, 3, 10, 10.0), 0.0);
        assert_eq!(boolean.box_clone().name(), "Bool");
    }
}

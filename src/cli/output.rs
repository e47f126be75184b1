//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{EnquireArgs, OutputFormat};
use crate::error::Result;

/// Results that know how to print themselves for people.
pub trait HumanOutput {
    fn print_human(&self, args: &EnquireArgs);
}

/// Result structure for indexing.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexResult {
    pub path: String,
    pub documents_added: usize,
    pub doc_count: u32,
    pub last_docid: u32,
    pub duration_ms: u64,
}

/// One ranked hit.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub rank: usize,
    pub docid: u32,
    pub percent: u32,
    pub weight: f64,
    pub data: String,
    pub matching_terms: Vec<String>,
}

/// A suggested expansion term.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExpandTerm {
    pub term: String,
    pub weight: f64,
}

/// Result structure for search operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub matches_estimated: usize,
    pub first: usize,
    pub hits: Vec<SearchHit>,
    pub expand_terms: Vec<ExpandTerm>,
    pub duration_ms: u64,
}

/// Per-term statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct TermStatistics {
    pub term: String,
    pub termfreq: u32,
    pub collection_freq: u64,
}

/// Database statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub path: String,
    pub uuid: String,
    pub doc_count: u32,
    pub last_docid: u32,
    pub avg_length: f64,
    pub term_count: usize,
    pub terms: Vec<TermStatistics>,
}

/// Result structure for deletion.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeletionResult {
    pub deleted: Vec<u32>,
    pub doc_count: u32,
}

/// Output a result in the requested format.
pub fn output_result<T: Serialize + HumanOutput>(result: &T, args: &EnquireArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            result.print_human(args);
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

fn output_json<T: Serialize>(result: &T, args: &EnquireArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

impl HumanOutput for IndexResult {
    fn print_human(&self, args: &EnquireArgs) {
        if args.verbosity() == 0 {
            return;
        }
        println!(
            "Indexed {} documents into {} ({} total, last id {})",
            self.documents_added, self.path, self.doc_count, self.last_docid
        );
        if args.verbosity() > 1 {
            println!("Took {} ms", self.duration_ms);
        }
    }
}

impl HumanOutput for SearchResults {
    fn print_human(&self, args: &EnquireArgs) {
        if args.verbosity() > 0 {
            println!("Performing query `{}'", self.query);
            println!("{} results found", self.matches_estimated);
        }

        for hit in &self.hits {
            println!("ID {} {}% [{}]", hit.docid, hit.percent, hit.data);
            if args.verbosity() > 1 {
                println!(
                    "    rank {} weight {:.4} matching {}",
                    hit.rank,
                    hit.weight,
                    hit.matching_terms.join(" ")
                );
            }
        }

        if !self.expand_terms.is_empty() {
            println!();
            println!("Suggested terms:");
            for term in &self.expand_terms {
                println!("  {} ({:.4})", term.term, term.weight);
            }
        }

        if args.verbosity() > 1 {
            println!("Took {} ms", self.duration_ms);
        }
    }
}

impl HumanOutput for DatabaseStats {
    fn print_human(&self, _args: &EnquireArgs) {
        println!("Database: {}", self.path);
        println!("  UUID:            {}", self.uuid);
        println!("  Documents:       {}", self.doc_count);
        println!("  Last document:   {}", self.last_docid);
        println!("  Average length:  {:.2}", self.avg_length);
        println!("  Distinct terms:  {}", self.term_count);

        for term in &self.terms {
            println!(
                "  {:<16} termfreq {} collection freq {}",
                term.term, term.termfreq, term.collection_freq
            );
        }
    }
}

impl HumanOutput for DeletionResult {
    fn print_human(&self, args: &EnquireArgs) {
        if args.verbosity() == 0 {
            return;
        }
        let ids: Vec<String> = self.deleted.iter().map(u32::to_string).collect();
        println!(
            "Deleted documents {} ({} remaining)",
            ids.join(", "),
            self.doc_count
        );
    }
}

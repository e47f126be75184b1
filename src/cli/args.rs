//! Command line argument parsing using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::analysis::StemStrategy;
use crate::query::Op;

/// enquire - index text and run ranked queries against it
#[derive(Parser, Debug, Clone)]
#[command(name = "enquire")]
#[command(about = "Index text and run ranked probabilistic queries against it")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct EnquireArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl EnquireArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Index paragraphs of text, one document per paragraph
    Index(IndexArgs),

    /// Run a query against a database
    Search(SearchArgs),

    /// Show database statistics
    Stats(StatsArgs),

    /// Delete documents by id
    Delete(DeleteArgs),
}

/// Arguments for indexing
#[derive(Parser, Debug, Clone)]
pub struct IndexArgs {
    /// Path to the database directory
    #[arg(value_name = "DB_PATH")]
    pub db_path: PathBuf,

    /// Text files to index (reads stdin when none are given)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Stemmer language
    #[arg(short, long, default_value = "english")]
    pub stemmer: String,

    /// How stemmed forms are indexed
    #[arg(long, default_value = "some")]
    pub stem_strategy: StemStrategyArg,

    /// Replace any existing database
    #[arg(long)]
    pub overwrite: bool,

    /// Skip fsync when committing
    #[arg(long)]
    pub no_sync: bool,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Path to the database directory
    #[arg(value_name = "DB_PATH")]
    pub db_path: PathBuf,

    /// Query terms
    #[arg(value_name = "TERM", required = true)]
    pub terms: Vec<String>,

    /// Operator combining the terms
    #[arg(short = 'o', long, default_value = "or")]
    pub op: QueryOp,

    /// Window for near/phrase, set size for elite-set
    #[arg(long)]
    pub window: Option<u32>,

    /// Stemmer language applied to the terms
    #[arg(short, long, default_value = "none")]
    pub stemmer: String,

    /// Which indexed form to search for
    #[arg(long, default_value = "none")]
    pub stem_strategy: StemStrategyArg,

    /// Maximum number of results to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Offset for pagination
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Weighting scheme
    #[arg(short = 'w', long, default_value = "bm25")]
    pub weighting: WeightingArg,

    /// Drop results below this percentage
    #[arg(long, default_value = "0")]
    pub percent_cutoff: u32,

    /// Document ids marked relevant (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub relevant: Vec<u32>,

    /// Number of expansion terms to suggest from the relevant documents
    #[arg(long, default_value = "0")]
    pub expand: usize,
}

/// Arguments for statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Path to the database directory
    #[arg(value_name = "DB_PATH")]
    pub db_path: PathBuf,

    /// Also report frequencies for these terms
    #[arg(short, long)]
    pub term: Vec<String>,
}

/// Arguments for deletion
#[derive(Parser, Debug, Clone)]
pub struct DeleteArgs {
    /// Path to the database directory
    #[arg(value_name = "DB_PATH")]
    pub db_path: PathBuf,

    /// Document ids to delete
    #[arg(value_name = "DOCID", required = true)]
    pub docids: Vec<u32>,
}

/// Query operators available from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryOp {
    Or,
    And,
    Xor,
    Near,
    Phrase,
    EliteSet,
}

impl QueryOp {
    pub fn op(self) -> Op {
        match self {
            QueryOp::Or => Op::Or,
            QueryOp::And => Op::And,
            QueryOp::Xor => Op::Xor,
            QueryOp::Near => Op::Near,
            QueryOp::Phrase => Op::Phrase,
            QueryOp::EliteSet => Op::EliteSet,
        }
    }
}

/// Stemming strategies available from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemStrategyArg {
    None,
    Some,
    All,
}

impl From<StemStrategyArg> for StemStrategy {
    fn from(arg: StemStrategyArg) -> Self {
        match arg {
            StemStrategyArg::None => StemStrategy::None,
            StemStrategyArg::Some => StemStrategy::Some,
            StemStrategyArg::All => StemStrategy::All,
        }
    }
}

/// Weighting schemes available from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightingArg {
    Bm25,
    Trad,
    Bool,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let args = EnquireArgs::parse_from([
            "enquire", "-vv", "search", "db", "quick", "fox", "--op", "phrase", "--window", "3",
            "--relevant", "1,2",
        ]);
        assert_eq!(args.verbosity(), 2);
        match args.command {
            Command::Search(search) => {
                assert_eq!(search.terms, vec!["quick", "fox"]);
                assert_eq!(search.op.op(), Op::Phrase);
                assert_eq!(search.window, Some(3));
                assert_eq!(search.relevant, vec![1, 2]);
                assert_eq!(search.weighting, WeightingArg::Bm25);
            }
            other => panic!("expected search, got {other:?}"),
        }
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let args = EnquireArgs::parse_from(["enquire", "-v", "-q", "stats", "db"]);
        assert_eq!(args.verbosity(), 0);
        assert_eq!(args.output_format, OutputFormat::Human);
    }
}

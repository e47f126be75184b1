//! Command implementations for the enquire CLI.

use std::fs;
use std::io::{self, Read};
use std::time::Instant;

use anyhow::Context;

use crate::analysis::term_generator::STEMMED_PREFIX;
use crate::analysis::{Stem, StemStrategy, TermGenerator};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::database::{Database, DatabaseConfig, DbAction, IndexReader, WritableDatabase};
use crate::document::Document;
use crate::enquire::Enquire;
use crate::error::{EnquireError, Result};
use crate::query::{DEFAULT_ELITE_SET_SIZE, Query};
use crate::rset::RSet;
use crate::weight::{BM25Weight, BoolWeight, TradWeight, Weight};

/// Execute a CLI command.
pub fn execute_command(args: EnquireArgs) -> Result<()> {
    match &args.command {
        Command::Index(index_args) => index_documents(index_args.clone(), &args),
        Command::Search(search_args) => search_database(search_args.clone(), &args),
        Command::Stats(stats_args) => show_stats(stats_args.clone(), &args),
        Command::Delete(delete_args) => delete_documents(delete_args.clone(), &args),
    }
}

/// Index paragraphs of text, one document per paragraph.
fn index_documents(args: IndexArgs, cli_args: &EnquireArgs) -> Result<()> {
    let start_time = Instant::now();

    let action = if args.overwrite {
        DbAction::CreateOrOverwrite
    } else {
        DbAction::CreateOrOpen
    };
    let config = DatabaseConfig {
        sync_writes: !args.no_sync,
        ..DatabaseConfig::default()
    };
    let mut db = WritableDatabase::open_with_config(&args.db_path, action, config)?;

    let mut generator = TermGenerator::new();
    generator.set_stemmer(Stem::new(&args.stemmer)?);
    generator.set_stem_strategy(args.stem_strategy.into());

    let mut text = String::new();
    if args.files.is_empty() {
        io::stdin().read_to_string(&mut text)?;
    } else {
        for file in &args.files {
            log::info!("Reading {}", file.display());
            let contents = fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            text.push_str(&contents);
            text.push_str("\n\n");
        }
    }

    let mut documents_added = 0;
    for paragraph in paragraphs(&text) {
        let mut doc = Document::new();
        doc.set_data(paragraph.as_str());
        generator.set_termpos(0);
        generator.index_text(&mut doc, &paragraph, "");
        let docid = db.add_document(doc)?;
        log::debug!("Added document {docid}");
        documents_added += 1;
    }
    db.commit()?;

    let result = IndexResult {
        path: args.db_path.display().to_string(),
        documents_added,
        doc_count: db.doc_count(),
        last_docid: db.last_docid(),
        duration_ms: start_time.elapsed().as_millis() as u64,
    };
    db.close()?;

    output_result(&result, cli_args)
}

/// Split text into blank-line separated paragraphs.
fn paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs
}

/// Turn a command-line word into the term it was indexed under.
fn query_term(word: &str, stemmer: &Stem, strategy: StemStrategy) -> String {
    let word = word.to_lowercase();
    match strategy {
        StemStrategy::None => word,
        StemStrategy::Some => format!("{STEMMED_PREFIX}{}", stemmer.stem_word(&word)),
        StemStrategy::All => stemmer.stem_word(&word),
    }
}

fn build_query(args: &SearchArgs) -> Result<Query> {
    let stemmer = Stem::new(&args.stemmer)?;
    let terms = args
        .terms
        .iter()
        .map(|word| Query::term(query_term(word, &stemmer, args.stem_strategy.into())));

    match args.op {
        QueryOp::Near | QueryOp::Phrase => {
            let window = args.window.unwrap_or(args.terms.len() as u32);
            if args.op == QueryOp::Near {
                Query::near(terms, window)
            } else {
                Query::phrase(terms, window)
            }
        }
        QueryOp::EliteSet => Query::elite_set(terms, args.window.unwrap_or(DEFAULT_ELITE_SET_SIZE)),
        op => Query::new(op.op(), terms),
    }
}

/// Run a query against a database.
fn search_database(args: SearchArgs, cli_args: &EnquireArgs) -> Result<()> {
    let start_time = Instant::now();
    let db = Database::open(&args.db_path)?;
    let query = build_query(&args)?;

    let weighting: Box<dyn Weight> = match args.weighting {
        WeightingArg::Bm25 => Box::new(BM25Weight::new()),
        WeightingArg::Trad => Box::new(TradWeight::new()),
        WeightingArg::Bool => Box::new(BoolWeight),
    };

    let mut enquire = Enquire::new(&db);
    enquire.set_query(&query);
    enquire.set_weighting_scheme(weighting);
    enquire.set_cutoff(args.percent_cutoff, 0.0)?;

    let rset: RSet = args.relevant.iter().copied().collect();
    let rset_ref = (!rset.is_empty()).then_some(&rset);
    let mset = enquire.get_mset_with(args.offset, args.limit, rset_ref, None)?;

    let hits = mset
        .iter()
        .map(|item| SearchHit {
            rank: item.rank(),
            docid: item.docid(),
            percent: item.percent(),
            weight: item.weight(),
            data: String::from_utf8_lossy(item.document().data()).into_owned(),
            matching_terms: enquire.get_matching_terms(item).collect(),
        })
        .collect();

    let expand_terms = if args.expand > 0 {
        if rset.is_empty() {
            return Err(EnquireError::invalid_argument(
                "--expand needs at least one --relevant document",
            ));
        }
        enquire
            .get_eset(args.expand, &rset)?
            .iter()
            .map(|item| ExpandTerm {
                term: item.term().to_string(),
                weight: item.weight(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let result = SearchResults {
        query: query.description(),
        matches_estimated: mset.matches_estimated(),
        first: mset.first(),
        hits,
        expand_terms,
        duration_ms: start_time.elapsed().as_millis() as u64,
    };

    output_result(&result, cli_args)
}

/// Show database statistics.
fn show_stats(args: StatsArgs, cli_args: &EnquireArgs) -> Result<()> {
    let db = Database::open(&args.db_path)?;

    let terms = args
        .term
        .iter()
        .map(|term| TermStatistics {
            term: term.clone(),
            termfreq: db.term_freq(term),
            collection_freq: db.collection_freq(term),
        })
        .collect();

    let result = DatabaseStats {
        path: args.db_path.display().to_string(),
        uuid: db.uuid().to_string(),
        doc_count: db.doc_count(),
        last_docid: db.last_docid(),
        avg_length: db.avg_length(),
        term_count: db.index().allterms("").count(),
        terms,
    };

    output_result(&result, cli_args)
}

/// Delete documents by id.
fn delete_documents(args: DeleteArgs, cli_args: &EnquireArgs) -> Result<()> {
    let mut db = WritableDatabase::open(&args.db_path, DbAction::Open)?;

    for docid in &args.docids {
        db.delete_document(*docid)?;
    }
    db.commit()?;

    let result = DeletionResult {
        deleted: args.docids.clone(),
        doc_count: db.doc_count(),
    };
    db.close()?;

    output_result(&result, cli_args)
}

//! Criterion benchmarks for enquire.
//!
//! Covers the hot paths of a search session:
//! - stemming and term generation
//! - adding documents to an in-memory database
//! - evaluating boolean, positional and expansion queries

use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use enquire::analysis::{Stem, TermGenerator};
use enquire::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const WORDS: &[&str] = &[
    "search", "engine", "full", "text", "index", "query", "document", "field", "term",
    "phrase", "boolean", "relevance", "weight", "analysis", "stemming", "running", "indexing",
    "matching", "ranking", "posting", "feedback", "expansion", "probabilistic", "retrieval",
    "collection", "frequency", "position", "window", "operator", "elite", "filter", "scale",
];

/// Generate test documents for benchmarking.
fn generate_test_documents(count: usize) -> Vec<String> {
    let mut documents = Vec::with_capacity(count);
    for i in 0..count {
        let doc_length = 50 + (i % 100);
        let words: Vec<&str> = (0..doc_length)
            .map(|j| WORDS[(i * 7 + j * 13) % WORDS.len()])
            .collect();
        documents.push(words.join(" "));
    }
    documents
}

fn build_database(texts: &[String]) -> WritableDatabase {
    let mut db = inmemory::open();
    let mut generator = TermGenerator::new();
    generator.set_stemmer(Stem::new("english").unwrap());
    for text in texts {
        let mut doc = Document::new();
        doc.set_data(text.as_str());
        generator.set_termpos(0);
        generator.index_text(&mut doc, text, "");
        db.add_document(doc).unwrap();
    }
    db
}

/// Benchmark stemming and term generation.
fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");
    let stem = Stem::new("english").unwrap();
    let texts = generate_test_documents(100);

    group.throughput(Throughput::Elements(WORDS.len() as u64));
    group.bench_function("stem_words", |b| {
        b.iter(|| {
            for word in WORDS {
                black_box(stem.stem_word(black_box(word)));
            }
        })
    });

    group.throughput(Throughput::Elements(texts.len() as u64));
    group.bench_function("index_text", |b| {
        let mut generator = TermGenerator::new();
        generator.set_stemmer(stem.clone());
        b.iter(|| {
            for text in &texts {
                let mut doc = Document::new();
                generator.set_termpos(0);
                generator.index_text(&mut doc, black_box(text), "");
                black_box(doc);
            }
        })
    });

    group.finish();
}

/// Benchmark database construction.
fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("indexing");
    group.sample_size(20);
    let texts = generate_test_documents(1000);

    group.throughput(Throughput::Elements(texts.len() as u64));
    group.bench_function("build_inmemory_database", |b| {
        b.iter(|| black_box(build_database(&texts)))
    });

    group.finish();
}

/// Benchmark query evaluation.
fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");
    let texts = generate_test_documents(2000);
    let db = build_database(&texts);
    let mut rng = StdRng::seed_from_u64(42);

    let random_terms = |rng: &mut StdRng, n: usize| -> Vec<&'static str> {
        (0..n).map(|_| WORDS[rng.random_range(0..WORDS.len())]).collect()
    };

    let or_query = Query::from_terms(Op::Or, random_terms(&mut rng, 4)).unwrap();
    let and_query = Query::from_terms(Op::And, random_terms(&mut rng, 2)).unwrap();
    let phrase_query = Query::from_terms(Op::Phrase, ["search", "engine"]).unwrap();
    let elite_query =
        Query::elite_set(random_terms(&mut rng, 8).into_iter().map(Query::term), 3).unwrap();

    for (name, query) in [
        ("or", &or_query),
        ("and", &and_query),
        ("phrase", &phrase_query),
        ("elite_set", &elite_query),
    ] {
        group.bench_function(name, |b| {
            let mut enquire = Enquire::new(&db);
            enquire.set_query(query);
            b.iter(|| black_box(enquire.get_mset(0, 10).unwrap()))
        });
    }

    group.bench_function("eset", |b| {
        let mut enquire = Enquire::new(&db);
        enquire.set_query(&or_query);
        let rset: RSet = (1..=10).collect();
        b.iter(|| black_box(enquire.get_eset(10, &rset).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_analysis, bench_indexing, bench_matching);

criterion_main!(benches);

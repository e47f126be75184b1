//! End-to-end smoke test of the public API: stemming, indexing, query
//! descriptions and a first ranked match.

use enquire::prelude::*;
use enquire::query::{OP_ELITE_SET, OP_OR};

#[test]
fn test_smoke() -> Result<()> {
    let stem = Stem::new("english")?;
    assert_eq!(stem.description(), "Xapian::Stem(english)");

    let mut doc = Document::new();
    doc.set_data("is there anybody out there?");
    doc.add_term("XYzzy");
    for (pos, word) in ["is", "there", "anybody", "out", "there"].iter().enumerate() {
        doc.add_posting(stem.stem_word(word), pos as u32 + 1);
    }

    let mut db = inmemory::open();
    db.add_document(doc)?;
    assert_eq!(db.doc_count(), 1);

    let query = Query::from_terms(Op::Or, ["smoke", "test", "terms"])?;
    assert_eq!(query.description(), "Xapian::Query((smoke OR test OR terms))");

    let phrase = Query::from_terms(Op::Phrase, ["smoke", "test", "tuple"])?;
    assert_eq!(
        phrase.description(),
        "Xapian::Query((smoke PHRASE 3 test PHRASE 3 tuple))"
    );

    let xor = Query::new(Op::Xor, [Query::term("smoke"), query.clone(), "string".into()])?;
    assert_eq!(
        xor.description(),
        "Xapian::Query((smoke XOR (smoke OR test OR terms) XOR string))"
    );

    let pair = Query::from_terms(Op::Or, ["a", "b"])?;
    assert_eq!(pair.description(), "Xapian::Query((a OR b))");

    let mut enquire = Enquire::new(&db);
    enquire.set_query(&Query::from_terms(Op::Or, ["there", "is"])?);
    let mset = enquire.get_mset(0, 10)?;
    assert_eq!(mset.size(), 1);
    assert_eq!(mset.iter().count(), mset.size());

    let terms: Vec<String> = enquire.get_matching_terms(mset.get_element(0)?).collect();
    assert_eq!(terms.join(" "), "is there");

    Ok(())
}

#[test]
fn test_operator_codes() {
    assert_eq!(OP_ELITE_SET, 10);
    assert_eq!(OP_OR, 1);
    assert_eq!(Op::EliteSet.code(), OP_ELITE_SET);
}

#[test]
fn test_unsupported_language() {
    assert!(matches!(
        Stem::new("klingon"),
        Err(EnquireError::UnsupportedLanguage(_))
    ));
}

#[test]
fn test_opening_missing_database_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let result = Database::open(dir.path().join("no-such-database"));
    assert!(matches!(result, Err(EnquireError::DatabaseOpening(_))));
}

#[test]
fn test_offset_past_matches_is_empty() -> Result<()> {
    let mut db = inmemory::open();
    let mut doc = Document::new();
    doc.add_posting("there", 1);
    db.add_document(doc)?;

    let mut enquire = Enquire::new(&db);
    enquire.set_query(&Query::term("there"));
    assert_eq!(enquire.get_mset(0, 10)?.size(), 1);
    assert!(enquire.get_mset(1, 10)?.is_empty());
    assert!(enquire.get_mset(100, 10)?.is_empty());
    Ok(())
}

#[test]
fn test_rset_add_document() {
    let mut rset = RSet::new();
    rset.add_document(1);
    assert_eq!(rset.size(), 1);
    assert!(rset.contains(1));
}

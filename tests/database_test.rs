//! Integration tests for on-disk databases: persistence, locking, deletion
//! and corruption handling.

use enquire::analysis::{Stem, TermGenerator};
use enquire::prelude::*;
use tempfile::TempDir;

fn index_paragraphs(db: &mut WritableDatabase, paragraphs: &[&str]) -> Result<Vec<DocId>> {
    let mut generator = TermGenerator::new();
    generator.set_stemmer(Stem::new("english")?);

    let mut ids = Vec::new();
    for text in paragraphs {
        let mut doc = Document::new();
        doc.set_data(*text);
        generator.set_termpos(0);
        generator.index_text(&mut doc, text, "");
        ids.push(db.add_document(doc)?);
    }
    Ok(ids)
}

fn run(reader: &dyn IndexReader, query: &Query) -> Result<Vec<(DocId, f64)>> {
    let mut enquire = Enquire::new(reader);
    enquire.set_query(query);
    let mset = enquire.get_mset(0, 100)?;
    Ok(mset.iter().map(|item| (item.docid(), item.weight())).collect())
}

#[test]
fn test_reopened_database_gives_identical_results() -> Result<()> {
    let dir = TempDir::new()?;
    let query = Query::from_terms(Op::Or, ["fox", "dog", "Zjump"])?;

    let before = {
        let mut db = WritableDatabase::open(dir.path(), DbAction::Create)?;
        index_paragraphs(
            &mut db,
            &[
                "The quick brown fox jumps over the lazy dog",
                "A dog is a loyal animal",
                "Foxes are jumping everywhere",
            ],
        )?;
        db.commit()?;
        let results = run(&db, &query)?;
        db.close()?;
        results
    };

    let db = Database::open(dir.path())?;
    assert_eq!(db.doc_count(), 3);
    assert_eq!(run(&db, &query)?, before);
    assert!(db.term_exists("Zjump"));
    Ok(())
}

#[test]
fn test_docids_are_not_reused_across_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    {
        let mut db = WritableDatabase::open(dir.path(), DbAction::Create)?;
        let ids = index_paragraphs(&mut db, &["one", "two", "three"])?;
        assert_eq!(ids, vec![1, 2, 3]);
        db.delete_document(3)?;
        db.close()?;
    }

    let mut db = WritableDatabase::open(dir.path(), DbAction::Open)?;
    assert_eq!(db.doc_count(), 2);
    assert_eq!(db.last_docid(), 3);
    assert_eq!(index_paragraphs(&mut db, &["four"])?, vec![4]);
    assert!(matches!(
        db.delete_document(3),
        Err(EnquireError::DocNotFound(3))
    ));
    Ok(())
}

#[test]
fn test_delete_removes_postings() -> Result<()> {
    let mut db = inmemory::open();
    index_paragraphs(&mut db, &["unique words here", "shared words"])?;
    assert_eq!(db.term_freq("words"), 2);

    db.delete_document(1)?;
    assert_eq!(db.term_freq("words"), 1);
    assert!(!db.term_exists("unique"));
    assert!(run(&db, &Query::term("unique"))?.is_empty());
    Ok(())
}

#[test]
fn test_second_writer_gets_lock_error() -> Result<()> {
    let dir = TempDir::new()?;
    let first = WritableDatabase::open(dir.path(), DbAction::Create)?;

    let second = WritableDatabase::open(dir.path(), DbAction::CreateOrOpen);
    assert!(matches!(second, Err(EnquireError::DatabaseLock(_))));

    // Readers are not blocked by a writer.
    assert_eq!(Database::open(dir.path())?.doc_count(), 0);

    first.close()?;
    let _reopened = WritableDatabase::open(dir.path(), DbAction::Open)?;
    Ok(())
}

#[test]
fn test_corrupt_record_fails_to_open() -> Result<()> {
    let dir = TempDir::new()?;
    {
        let mut db = WritableDatabase::open(dir.path(), DbAction::Create)?;
        index_paragraphs(&mut db, &["some text to store"])?;
    }

    let record = dir.path().join("record.db");
    let mut bytes = std::fs::read(&record)?;
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0x55;
    std::fs::write(&record, &bytes)?;

    assert!(matches!(
        Database::open(dir.path()),
        Err(EnquireError::DatabaseOpening(_))
    ));
    assert!(matches!(
        WritableDatabase::open(dir.path(), DbAction::Open),
        Err(EnquireError::DatabaseOpening(_))
    ));
    Ok(())
}

#[test]
fn test_open_file_as_database_fails() -> Result<()> {
    let dir = TempDir::new()?;
    let file = dir.path().join("plain.txt");
    std::fs::write(&file, "not a database")?;

    assert!(matches!(
        Database::open(&file),
        Err(EnquireError::DatabaseOpening(_))
    ));
    Ok(())
}

#[test]
fn test_replace_document_and_values() -> Result<()> {
    let dir = TempDir::new()?;
    {
        let mut db = WritableDatabase::open(dir.path(), DbAction::Create)?;
        let mut doc = Document::new();
        doc.add_term("old");
        db.add_document(doc)?;

        let mut replacement = Document::new();
        replacement.add_term("new");
        replacement.add_value(0, "2024");
        replacement.set_data("replaced");
        db.replace_document(1, replacement)?;
    }

    let db = Database::open(dir.path())?;
    let doc = db.document(1)?;
    assert_eq!(doc.data_str(), Some("replaced"));
    assert_eq!(doc.value(0), Some("2024"));
    assert_eq!(doc.docid(), Some(1));
    assert_eq!(db.termlist(1)?, vec!["new".to_string()]);
    Ok(())
}

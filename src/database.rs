//! Databases: the stored collection of documents a query runs against.
//!
//! Two handle types share the [`IndexReader`] read API:
//!
//! - [`Database`] is a read-only snapshot loaded from a database directory.
//! - [`WritableDatabase`] owns a mutable index, either purely in memory
//!   ([`inmemory::open`]) or backed by a directory it persists to on
//!   [`WritableDatabase::commit`].
//!
//! A directory can have at most one writer at a time; a second
//! [`WritableDatabase::open`] on the same directory fails with
//! [`EnquireError::DatabaseLock`].

pub mod disk;
pub mod index;
pub mod posting;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::disk::{DirLock, SnapshotRef};
use crate::database::index::InvertedIndex;
use crate::database::posting::PostingList;
use crate::document::{DocId, Document};
use crate::error::{EnquireError, Result};

/// Read access to an indexed collection.
///
/// Implementors only provide the underlying [`InvertedIndex`] and their
/// identity; the statistics used for matching and weighting are derived
/// from the index.
pub trait IndexReader: Send + Sync + fmt::Debug {
    /// The index holding the documents.
    fn index(&self) -> &InvertedIndex;

    /// Unique identifier of the database, stable across reopens.
    fn uuid(&self) -> Uuid;

    /// A short human-readable description.
    fn description(&self) -> String;

    /// Number of documents in the database.
    fn doc_count(&self) -> u32 {
        self.index().doc_count()
    }

    /// Highest document id ever assigned.
    fn last_docid(&self) -> DocId {
        self.index().last_docid()
    }

    /// Average document length.
    fn avg_length(&self) -> f64 {
        self.index().avg_length()
    }

    /// Length (sum of wdf) of a document.
    fn doc_length(&self, docid: DocId) -> Result<u64> {
        self.index().doc_length(docid)
    }

    /// Number of documents indexed by `term`.
    fn term_freq(&self, term: &str) -> u32 {
        self.index().term_freq(term)
    }

    /// Total number of occurrences of `term`.
    fn collection_freq(&self, term: &str) -> u64 {
        self.index().collection_freq(term)
    }

    /// Whether any document is indexed by `term`.
    fn term_exists(&self, term: &str) -> bool {
        self.index().term_exists(term)
    }

    /// Posting list for `term`.
    fn postlist(&self, term: &str) -> Option<&PostingList> {
        self.index().postlist(term)
    }

    /// A copy of a stored document.
    fn document(&self, docid: DocId) -> Result<Document> {
        self.index().document(docid).cloned()
    }

    /// The terms indexing a document, in ascending order.
    fn termlist(&self, docid: DocId) -> Result<Vec<String>> {
        let document = self.index().document(docid)?;
        Ok(document.termlist().map(|(term, _)| term.to_string()).collect())
    }

    /// All indexed terms starting with `prefix`.
    fn allterms(&self, prefix: &str) -> Vec<String> {
        self.index()
            .allterms(prefix)
            .map(str::to_string)
            .collect()
    }
}

/// What [`WritableDatabase::open`] should do about an existing directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DbAction {
    /// Open the database if it exists, otherwise create it.
    #[default]
    CreateOrOpen,
    /// Create a new database; fail if one already exists.
    Create,
    /// Create a new database, discarding any existing one.
    CreateOrOverwrite,
    /// Open an existing database; fail if there is none.
    Open,
}

/// Settings for disk-backed databases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Call `fsync` on the record before it replaces the previous one.
    pub sync_writes: bool,
    /// Take the directory lock when opening for writing.
    pub use_locking: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            sync_writes: true,
            use_locking: true,
        }
    }
}

/// A read-only database loaded from a directory.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    uuid: Uuid,
    index: InvertedIndex,
}

impl Database {
    /// Open the database stored in `path`.
    ///
    /// Fails with [`EnquireError::DatabaseOpening`] if the path does not
    /// exist, is not a database directory, or holds a damaged record.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = disk::read_snapshot(&path)?;
        let index = InvertedIndex::from_documents(snapshot.documents, snapshot.last_docid)?;

        log::debug!(
            "Opened {} with {} documents",
            path.display(),
            index.doc_count()
        );
        Ok(Database {
            path,
            uuid: snapshot.uuid,
            index,
        })
    }

    /// Re-read the directory, picking up changes committed since opening.
    pub fn reopen(&mut self) -> Result<()> {
        *self = Database::open(&self.path)?;
        Ok(())
    }

    /// Directory the database was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IndexReader for Database {
    fn index(&self) -> &InvertedIndex {
        &self.index
    }

    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn description(&self) -> String {
        format!("Xapian::Database({})", self.path.display())
    }
}

/// A database that accepts modifications.
#[derive(Debug)]
pub struct WritableDatabase {
    path: Option<PathBuf>,
    uuid: Uuid,
    index: InvertedIndex,
    config: DatabaseConfig,
    lock: Option<DirLock>,
    dirty: bool,
    closed: bool,
}

impl WritableDatabase {
    /// Open or create the database in `path` with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P, action: DbAction) -> Result<Self> {
        WritableDatabase::open_with_config(path, action, DatabaseConfig::default())
    }

    /// Open or create the database in `path`.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        action: DbAction,
        config: DatabaseConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let exists = disk::exists(&path);

        let create = match action {
            DbAction::Create if exists => {
                return Err(EnquireError::database_opening(format!(
                    "{} already exists",
                    path.display()
                )));
            }
            DbAction::Open if !exists => {
                return Err(EnquireError::database_opening(format!(
                    "{} is not a database",
                    path.display()
                )));
            }
            DbAction::Create | DbAction::CreateOrOverwrite => true,
            DbAction::CreateOrOpen => !exists,
            DbAction::Open => false,
        };

        std::fs::create_dir_all(&path).map_err(|e| {
            EnquireError::database_opening(format!("cannot create {}: {e}", path.display()))
        })?;

        let lock = if config.use_locking {
            Some(DirLock::acquire(&path)?)
        } else {
            None
        };

        let mut db = if create {
            WritableDatabase {
                path: Some(path),
                uuid: Uuid::new_v4(),
                index: InvertedIndex::new(),
                config,
                lock,
                dirty: true,
                closed: false,
            }
        } else {
            let snapshot = disk::read_snapshot(&path)?;
            let index = InvertedIndex::from_documents(snapshot.documents, snapshot.last_docid)?;
            WritableDatabase {
                path: Some(path),
                uuid: snapshot.uuid,
                index,
                config,
                lock,
                dirty: false,
                closed: false,
            }
        };

        if create {
            db.commit()?;
            log::info!("Created database {}", db.describe_location());
        } else {
            log::debug!(
                "Opened {} for writing with {} documents",
                db.describe_location(),
                db.index.doc_count()
            );
        }
        Ok(db)
    }

    fn in_memory() -> Self {
        WritableDatabase {
            path: None,
            uuid: Uuid::new_v4(),
            index: InvertedIndex::new(),
            config: DatabaseConfig::default(),
            lock: None,
            dirty: false,
            closed: false,
        }
    }

    fn describe_location(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "inmemory".to_string(),
        }
    }

    /// Directory backing the database, `None` when it lives in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether there are changes not yet committed.
    pub fn has_pending_changes(&self) -> bool {
        self.dirty
    }

    /// Add a document, returning the id it was stored under.
    pub fn add_document(&mut self, document: Document) -> Result<DocId> {
        let docid = self.index.add_document(document)?;
        self.dirty = true;
        Ok(docid)
    }

    /// Store `document` under `docid`, replacing any document already there.
    pub fn replace_document(&mut self, docid: DocId, document: Document) -> Result<()> {
        self.index.replace_document(docid, document)?;
        self.dirty = true;
        Ok(())
    }

    /// Remove a document and every posting pointing at it.
    pub fn delete_document(&mut self, docid: DocId) -> Result<()> {
        self.index.delete_document(docid)?;
        self.dirty = true;
        Ok(())
    }

    /// Persist pending changes. A no-op for in-memory databases.
    pub fn commit(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            self.dirty = false;
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        let snapshot = SnapshotRef {
            uuid: self.uuid,
            last_docid: self.index.last_docid(),
            documents: self.index.documents().collect(),
        };
        disk::write_snapshot(path, &snapshot, self.config.sync_writes)?;
        self.dirty = false;
        log::debug!("Committed {}", path.display());
        Ok(())
    }

    /// Commit pending changes and release the directory lock.
    pub fn close(mut self) -> Result<()> {
        self.commit()?;
        self.closed = true;
        if let Some(lock) = self.lock.as_mut() {
            lock.release()?;
        }
        Ok(())
    }
}

impl IndexReader for WritableDatabase {
    fn index(&self) -> &InvertedIndex {
        &self.index
    }

    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn description(&self) -> String {
        format!("Xapian::WritableDatabase({})", self.describe_location())
    }
}

impl Drop for WritableDatabase {
    fn drop(&mut self) {
        if self.closed || !self.dirty {
            return;
        }
        if let Err(e) = self.commit() {
            log::warn!(
                "Failed to commit {} on drop: {e}",
                self.describe_location()
            );
        }
    }
}

/// Databases that live only in memory.
pub mod inmemory {
    use super::WritableDatabase;

    /// Create an empty in-memory database.
    pub fn open() -> WritableDatabase {
        WritableDatabase::in_memory()
    }
}

//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for members, notes and
//!   the key-value settings store.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Load paths hand back persisted status text untouched; status repair is
//!   the engine's job, not the repository's.

use crate::db::DbError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod member_repo;
pub mod note_repo;
pub mod settings_repo;

pub use member_repo::{MemberRepository, PersistedMember};
pub use note_repo::NoteRepository;
pub use settings_repo::SettingsRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for directory persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
    Encoding(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Encoding(err) => write!(f, "settings encoding error: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
            Self::Encoding(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encoding(value)
    }
}

/// The full persistence backend the directory engine writes through to:
/// member and note CRUD plus the settings store for the global tag list.
pub trait DirectoryBackend: MemberRepository + NoteRepository + SettingsRepository {}

impl<T: MemberRepository + NoteRepository + SettingsRepository> DirectoryBackend for T {}

/// SQLite-backed implementation of all repository contracts, owning the
/// connection so write paths can open immediate transactions.
pub struct SqliteDirectoryStore {
    conn: Connection,
}

impl SqliteDirectoryStore {
    /// Wraps a migrated/ready connection (see [`crate::db::open_db`]).
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Releases the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }
}
